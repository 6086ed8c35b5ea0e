use std::ptr;
use std::sync::{Condvar, Mutex};

type NodePtr<T> = *mut QueueNode<T>;

struct QueueNode<T> {
    /// `None` only while this node is the tail sentinel.
    data: Option<T>,
    next: NodePtr<T>,
}

impl<T> QueueNode<T> {
    fn sentinel() -> Self {
        QueueNode {
            data: None,
            next: ptr::null_mut(),
        }
    }
}

///
/// FIFO queue with one lock per end, so a producer and a consumer can run
/// at the same time.
///
/// # Design
///
/// The queue always ends in an empty sentinel node:
///
/// ```text
///   head ──> [v0] ──> [v1] ──> [sentinel] <── tail
///                                  │
///                               data: None
/// ```
///
/// `push` fills the current sentinel with the value and appends a fresh
/// sentinel behind it, touching only the tail lock. `pop` detaches the head
/// node, touching the head lock and taking the tail lock just long enough
/// to compare pointers. The queue is empty exactly when head == tail.
///
/// Lock order is head before tail everywhere both are held, and `push`
/// never holds both at once.
///
pub struct TwoLockQueue<T> {
    head: Mutex<NodePtr<T>>,
    tail: Mutex<NodePtr<T>>,
    not_empty: Condvar,
}

impl<T> TwoLockQueue<T> {
    pub fn new() -> Self {
        let sentinel = Box::into_raw(Box::new(QueueNode::sentinel()));
        TwoLockQueue {
            head: Mutex::new(sentinel),
            tail: Mutex::new(sentinel),
            not_empty: Condvar::new(),
        }
    }

    /// Append a value at the tail.
    pub fn push(&self, value: T) {
        let new_tail = Box::into_raw(Box::new(QueueNode::sentinel()));
        {
            let mut tail = self.tail.lock().unwrap();
            // The current tail is always the sentinel: fill it in place and
            // hang the fresh sentinel behind it.
            unsafe {
                (**tail).data = Some(value);
                (**tail).next = new_tail;
            }
            *tail = new_tail;
        }
        // Pass through the head lock before notifying. A waiter between its
        // emptiness check and its block still holds that lock, so this
        // acquisition cannot complete until the waiter is parked and the
        // notification below cannot be lost.
        drop(self.head.lock().unwrap());
        self.not_empty.notify_one();
    }

    /// Detach the oldest value, or `None` when the queue is empty at the
    /// instant of the check.
    pub fn try_pop(&self) -> Option<T> {
        let mut head = self.head.lock().unwrap();
        if *head == self.tail_snapshot() {
            return None;
        }
        Some(unsafe { Self::take_head(&mut head) })
    }

    /// Block until a value is available, then detach it.
    pub fn wait_and_pop(&self) -> T {
        let mut head = self.head.lock().unwrap();
        while *head == self.tail_snapshot() {
            head = self.not_empty.wait(head).unwrap();
        }
        unsafe { Self::take_head(&mut head) }
    }

    /// Snapshot emptiness check; stale the instant it returns under
    /// concurrent mutation.
    pub fn is_empty(&self) -> bool {
        let head = self.head.lock().unwrap();
        *head == self.tail_snapshot()
    }

    /// Read the tail pointer under its lock. Holding the head lock while
    /// calling this is the one place both locks nest.
    fn tail_snapshot(&self) -> NodePtr<T> {
        *self.tail.lock().unwrap()
    }

    /// Unlink the head node and return its payload.
    ///
    /// # Safety
    /// The caller must hold the head lock and have verified head != tail.
    ///
    unsafe fn take_head(head: &mut NodePtr<T>) -> T {
        let old_head = *head;
        unsafe {
            *head = (*old_head).next;
            let mut node = Box::from_raw(old_head);
            node.data
                .take()
                .expect("node ahead of the sentinel holds a value")
        }
    }
}

impl<T> Default for TwoLockQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for TwoLockQueue<T> {
    fn drop(&mut self) {
        // Walk from head through the sentinel; exclusive access, no locks.
        let mut node = *self.head.get_mut().unwrap();
        while !node.is_null() {
            let next = unsafe { (*node).next };
            unsafe { drop(Box::from_raw(node)) };
            node = next;
        }
    }
}

// Safety: the raw links are only touched under the end locks; values move
// in through push and out through pop.
unsafe impl<T: Send> Send for TwoLockQueue<T> {}
unsafe impl<T: Send> Sync for TwoLockQueue<T> {}
