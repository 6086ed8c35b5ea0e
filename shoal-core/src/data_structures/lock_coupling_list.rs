use std::ptr;
use std::sync::{Mutex, MutexGuard};

type NodePtr<T> = *mut ListNode<T>;

struct ListNode<T> {
    inner: Mutex<NodeInner<T>>,
}

struct NodeInner<T> {
    /// `None` only on the head sentinel.
    data: Option<T>,
    next: NodePtr<T>,
}

impl<T> ListNode<T> {
    fn sentinel() -> Self {
        ListNode {
            inner: Mutex::new(NodeInner {
                data: None,
                next: ptr::null_mut(),
            }),
        }
    }

    fn new(value: T) -> Self {
        ListNode {
            inner: Mutex::new(NodeInner {
                data: Some(value),
                next: ptr::null_mut(),
            }),
        }
    }
}

///
/// Singly linked list traversed hand-over-hand: each node carries its own
/// mutex, and a walker always locks the successor before releasing the
/// node it stands on.
///
/// ```text
///   [head sentinel] ──> [n0] ──> [n1] ──> null
///        │                │        │
///      Mutex            Mutex    Mutex     (payload + next together)
/// ```
///
/// The coupling discipline means walkers and removers can be active in
/// different regions of the list at once, and a removal can never free a
/// node out from under a traversal: reaching a node requires holding its
/// predecessor's lock first.
///
pub struct LockCouplingList<T> {
    head: ListNode<T>,
}

impl<T> LockCouplingList<T> {
    pub fn new() -> Self {
        LockCouplingList {
            head: ListNode::sentinel(),
        }
    }

    /// Insert a value right behind the head sentinel.
    pub fn push_front(&self, value: T) {
        let new_node = Box::into_raw(Box::new(ListNode::new(value)));
        let mut head = self.head.inner.lock().unwrap();
        // The new node is still private to this thread; its lock is free.
        unsafe {
            (*new_node).inner.lock().unwrap().next = head.next;
        }
        head.next = new_node;
    }

    /// Apply `f` to every value in the list, front to back.
    ///
    /// Holds exactly one node lock while `f` runs, so other threads can
    /// work elsewhere in the list concurrently.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&mut T),
    {
        let mut current: MutexGuard<'_, NodeInner<T>> = self.head.inner.lock().unwrap();
        loop {
            let next_ptr = current.next;
            if next_ptr.is_null() {
                break;
            }
            // Couple: take the successor's lock before releasing the
            // current one, so a remover cannot slip in between.
            let mut next = unsafe { (*next_ptr).inner.lock().unwrap() };
            drop(current);
            f(next.data.as_mut().expect("non-sentinel node holds a value"));
            current = next;
        }
    }

    /// Return a clone of the first value matching `pred`, if any.
    pub fn find_first_if<P>(&self, mut pred: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
        T: Clone,
    {
        let mut current = self.head.inner.lock().unwrap();
        loop {
            let next_ptr = current.next;
            if next_ptr.is_null() {
                return None;
            }
            let next = unsafe { (*next_ptr).inner.lock().unwrap() };
            drop(current);
            let value = next.data.as_ref().expect("non-sentinel node holds a value");
            if pred(value) {
                return Some(value.clone());
            }
            current = next;
        }
    }

    /// Unlink and drop every value matching `pred`.
    pub fn remove_if<P>(&self, mut pred: P)
    where
        P: FnMut(&T) -> bool,
    {
        let mut current = self.head.inner.lock().unwrap();
        loop {
            let next_ptr = current.next;
            if next_ptr.is_null() {
                return;
            }
            let next = unsafe { (*next_ptr).inner.lock().unwrap() };
            if pred(next.data.as_ref().expect("non-sentinel node holds a value")) {
                // Unlink while both locks are held, then keep standing on
                // the predecessor so the walk resumes from the same spot.
                current.next = next.next;
                drop(next);
                // The unlinked node is unreachable now: new walkers stop at
                // the predecessor this thread still holds, and nobody can
                // already be waiting on the node's lock without holding the
                // predecessor's.
                unsafe { drop(Box::from_raw(next_ptr)) };
            } else {
                drop(current);
                current = next;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.inner.lock().unwrap().next.is_null()
    }
}

impl<T> Default for LockCouplingList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockCouplingList<T> {
    fn drop(&mut self) {
        // Drain through the same unlink path used everywhere else.
        self.remove_if(|_| true);
    }
}

// Safety: node pointers never leave the list, and every dereference happens
// under the coupling discipline above.
unsafe impl<T: Send> Send for LockCouplingList<T> {}
unsafe impl<T: Send> Sync for LockCouplingList<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn collect<T: Clone>(list: &LockCouplingList<T>) -> Vec<T> {
        let mut values = Vec::new();
        list.for_each(|value| values.push(value.clone()));
        values
    }

    #[test]
    fn test_push_front_orders_newest_first() {
        let list = LockCouplingList::new();
        list.push_front(1);
        list.push_front(2);
        list.push_front(3);

        assert_eq!(collect(&list), vec![3, 2, 1]);
    }

    #[test]
    fn test_for_each_mutates_in_place() {
        let list = LockCouplingList::new();
        for i in 0..5 {
            list.push_front(i);
        }

        list.for_each(|value| *value *= 10);
        assert_eq!(collect(&list), vec![40, 30, 20, 10, 0]);
    }

    #[test]
    fn test_find_first_if() {
        let list = LockCouplingList::new();
        for i in 0..10 {
            list.push_front(i);
        }

        assert_eq!(list.find_first_if(|&v| v % 4 == 1), Some(9));
        assert_eq!(list.find_first_if(|&v| v > 100), None);
    }

    #[test]
    fn test_remove_if() {
        let list = LockCouplingList::new();
        for i in 0..10 {
            list.push_front(i);
        }

        list.remove_if(|&v| v % 2 == 0);
        assert_eq!(collect(&list), vec![9, 7, 5, 3, 1]);

        list.remove_if(|_| true);
        assert!(list.is_empty());
    }

    #[test]
    fn test_is_empty() {
        let list = LockCouplingList::new();
        assert!(list.is_empty());
        list.push_front("x");
        assert!(!list.is_empty());
    }

    #[test]
    fn test_concurrent_insert_and_walk() {
        let list: Arc<LockCouplingList<usize>> = Arc::new(LockCouplingList::new());
        let writers = 4;
        let per_writer = 500;

        let handles: Vec<_> = (0..writers)
            .map(|w| {
                let list = Arc::clone(&list);
                thread::spawn(move || {
                    for i in 0..per_writer {
                        list.push_front(w * per_writer + i);
                        if i % 64 == 0 {
                            // Walk while other writers keep inserting.
                            list.find_first_if(|&v| v == w * per_writer);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        list.for_each(|_| count += 1);
        assert_eq!(count, writers * per_writer);
    }
}
