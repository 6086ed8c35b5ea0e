use std::mem::ManuallyDrop;
use std::ptr;
use std::sync::atomic::Ordering;

use crossbeam_epoch::{self as epoch, Atomic, Owned};

use shoal_core::ConcurrentStack;

struct EpochNode<T> {
    data: ManuallyDrop<T>,
    next: Atomic<EpochNode<T>>,
}

///
/// Lock-free LIFO stack (Treiber) reclaimed through `crossbeam-epoch`.
///
/// Same head-CAS algorithm as `shoal_core::TreiberStack`, different answer to
/// the reclamation question: instead of counting in-flight poppers, every
/// operation pins the global epoch and unlinked nodes are handed to the
/// collector, which frees them once no pinned thread can still reach them.
/// Retired memory is bounded by epoch advancement rather than by luck with
/// the popper count.
///
// The payload sits in a `ManuallyDrop` so ownership can be split: the popper
// moves the value out with `ptr::read`, and the deferred destructor later
// frees the node shell without running the payload's destructor again.
//
pub struct EpochStack<T> {
    head: Atomic<EpochNode<T>>,
}

impl<T> EpochStack<T> {
    pub fn new() -> Self {
        EpochStack {
            head: Atomic::null(),
        }
    }

    /// Push a value. Never blocks; retries the head CAS until the new node
    /// is linked in.
    ///
    pub fn push(&self, value: T) {
        let guard = &epoch::pin();
        let mut new_node = Owned::new(EpochNode {
            data: ManuallyDrop::new(value),
            next: Atomic::null(),
        });

        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            new_node.next.store(head, Ordering::Relaxed);

            match self.head.compare_exchange(
                head,
                new_node,
                Ordering::Release,
                Ordering::Acquire,
                guard,
            ) {
                Ok(_) => return,
                Err(e) => new_node = e.new,
            }
        }
    }

    /// Pop the most recently pushed value, or `None` on an empty stack.
    ///
    pub fn pop(&self) -> Option<T> {
        let guard = &epoch::pin();
        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            let node = match unsafe { head.as_ref() } {
                None => return None,
                Some(node) => node,
            };

            let next = node.next.load(Ordering::Acquire, guard);
            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Acquire, guard)
                .is_ok()
            {
                unsafe {
                    let value = ManuallyDrop::into_inner(ptr::read(&node.data));
                    guard.defer_destroy(head);
                    return Some(value);
                }
            }
        }
    }

    /// Snapshot emptiness check; stale the instant it returns under
    /// concurrent mutation.
    ///
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        self.head.load(Ordering::Acquire, guard).is_null()
    }

    /// Walk the stack and count nodes. Concurrent pushes and pops make the
    /// result approximate; exact only in quiescent moments.
    ///
    pub fn len(&self) -> usize {
        let guard = &epoch::pin();
        let mut count = 0;
        let mut current = self.head.load(Ordering::Acquire, guard);

        while let Some(node) = unsafe { current.as_ref() } {
            count += 1;
            current = node.next.load(Ordering::Acquire, guard);
        }

        count
    }
}

impl<T> Default for EpochStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for EpochStack<T> {
    fn drop(&mut self) {
        // Pop everything so the remaining payloads run their destructors;
        // the node shells go to the collector as in any other pop.
        while self.pop().is_some() {}
    }
}

// Safety: payloads only move in through push and out through pop, so sharing
// the stack needs no more than T: Send.
unsafe impl<T: Send> Send for EpochStack<T> {}
unsafe impl<T: Send> Sync for EpochStack<T> {}

impl<T: Send> ConcurrentStack<T> for EpochStack<T> {
    fn push(&self, value: T) {
        EpochStack::push(self, value)
    }

    fn try_pop(&self) -> Option<T> {
        EpochStack::pop(self)
    }

    fn is_empty(&self) -> bool {
        EpochStack::is_empty(self)
    }
}
