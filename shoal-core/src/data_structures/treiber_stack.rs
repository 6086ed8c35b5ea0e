use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

type NodePtr<T> = *mut StackNode<T>;

#[derive(Debug)]
struct StackNode<T> {
    data: Option<T>,
    next: AtomicPtr<StackNode<T>>,
}

impl<T> StackNode<T> {
    fn new(value: T) -> Self {
        StackNode {
            data: Some(value),
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    #[inline]
    fn get_next(&self) -> NodePtr<T> {
        self.next.load(Ordering::SeqCst)
    }

    #[inline]
    fn set_next(&self, ptr: NodePtr<T>) {
        self.next.store(ptr, Ordering::SeqCst)
    }

    /// Deallocate a node.
    ///
    /// # Safety
    /// - The pointer must have been allocated by this stack via `Box::new`
    /// - Must only be called once, on a node no thread can still reference
    ///
    unsafe fn dealloc_ptr(ptr: NodePtr<T>) {
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

///
/// Lock-free LIFO stack (Treiber) with deferred node reclamation.
///
/// Push and pop are optimistic compare-and-swap loops on the head pointer:
/// unbounded retries under contention, never a blocking lock.
///
// =============================================================================
// RECLAMATION SCHEME (poppers counter + retired list)
// =============================================================================
//
// The hazard: a popper loads `head`, then dereferences `old_head.next` inside
// its CAS loop. If another popper has already unlinked and freed that node,
// the dereference is use-after-free. Freeing must therefore wait until no
// in-flight pop can still hold the pointer.
//
//   pop entry:    poppers += 1
//   after unlink: poppers == 1 observed  -> sole popper; any node unlinked
//                                           earlier is invisible to threads
//                                           entering pop from now on, so the
//                                           retired list can be claimed, and
//                                           freed if the exit decrement also
//                                           observes quiescence
//                 poppers > 1 observed   -> another pop may hold a reference;
//                                           park the node on the retired list
//   pop exit:     poppers -= 1
//
// A node moves onto the retired list only after it is unlinked from the live
// stack, so a claimed retired chain can never be re-observed through `head`.
//
// Known limitation: under sustained pop concurrency the counter never reads
// one and the retired list grows without bound. Callers that cannot accept
// that should use the epoch-based variant in the companion crate.
//
// The quiescence argument compares counter observations against head updates
// made by other threads; it needs the single total order that only SeqCst
// operations share, so every atomic in this module is SeqCst.
//
pub struct TreiberStack<T> {
    head: AtomicPtr<StackNode<T>>,
    /// Threads currently inside `pop`.
    poppers: AtomicUsize,
    /// Unlinked nodes awaiting a quiescent instant before deallocation.
    retired: AtomicPtr<StackNode<T>>,
}

impl<T> TreiberStack<T> {
    pub fn new() -> Self {
        TreiberStack {
            head: AtomicPtr::new(ptr::null_mut()),
            poppers: AtomicUsize::new(0),
            retired: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Push a value. Never blocks, never fails; retries the head CAS until
    /// the new node is linked in.
    ///
    pub fn push(&self, value: T) {
        let new_node = Box::into_raw(Box::new(StackNode::new(value)));
        let mut head = self.head.load(Ordering::SeqCst);

        loop {
            unsafe { (*new_node).set_next(head) };
            match self
                .head
                .compare_exchange_weak(head, new_node, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return,
                Err(observed) => head = observed,
            }
        }
    }

    /// Pop the most recently pushed live value, or `None` on an empty stack.
    ///
    pub fn pop(&self) -> Option<T> {
        self.poppers.fetch_add(1, Ordering::SeqCst);

        let mut old_head = self.head.load(Ordering::SeqCst);
        loop {
            if old_head.is_null() {
                break;
            }
            let next = unsafe { (*old_head).get_next() };
            match self
                .head
                .compare_exchange_weak(old_head, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(observed) => old_head = observed,
            }
        }

        if old_head.is_null() {
            // Nothing was unlinked; leave the retire machinery untouched.
            self.poppers.fetch_sub(1, Ordering::SeqCst);
            return None;
        }

        // Only the unlinking thread reaches the payload; racing poppers read
        // the node's next pointer at most.
        let value = unsafe { (*old_head).data.take() };
        self.try_reclaim(old_head);
        value
    }

    /// Snapshot emptiness check; stale the instant it returns under
    /// concurrent mutation.
    ///
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::SeqCst).is_null()
    }

    // =========================================================================
    // Deferred reclamation
    // =========================================================================

    fn try_reclaim(&self, old_head: NodePtr<T>) {
        if self.poppers.load(Ordering::SeqCst) == 1 {
            // Sole popper at this instant: claim the retired chain. Threads
            // entering pop from here on load a head that no longer reaches
            // anything already unlinked.
            let claimed = self.retired.swap(ptr::null_mut(), Ordering::SeqCst);

            if self.poppers.fetch_sub(1, Ordering::SeqCst) == 1 {
                // Quiescent on exit as well: every pop that could have held a
                // reference into the claimed chain has left.
                unsafe { Self::free_chain(claimed) };
            } else if !claimed.is_null() {
                // A popper slipped in between the check and the decrement;
                // hand the chain back for a later attempt.
                unsafe { self.retire_chain(claimed) };
            }

            // The node unlinked by this call is always safe here: it became
            // unreachable before any of the new poppers loaded head.
            unsafe { StackNode::dealloc_ptr(old_head) };
        } else {
            // Another pop is in flight and may still dereference this node.
            unsafe { self.retire_node(old_head) };
            self.poppers.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Park a single unlinked node on the retired list.
    ///
    /// # Safety
    /// `node` must be unlinked and unreachable through `head`.
    ///
    unsafe fn retire_node(&self, node: NodePtr<T>) {
        unsafe { self.retire_span(node, node) };
    }

    /// Park a whole unlinked chain on the retired list.
    ///
    /// # Safety
    /// Every node in the chain must be unlinked and unreachable.
    ///
    unsafe fn retire_chain(&self, chain: NodePtr<T>) {
        let mut last = chain;
        unsafe {
            while !(*last).get_next().is_null() {
                last = (*last).get_next();
            }
            self.retire_span(chain, last);
        }
    }

    /// Splice the chain `first..=last` onto the retired list head.
    ///
    /// # Safety
    /// `first..=last` must form a valid chain of unlinked nodes.
    ///
    unsafe fn retire_span(&self, first: NodePtr<T>, last: NodePtr<T>) {
        let mut retired = self.retired.load(Ordering::SeqCst);
        loop {
            unsafe { (*last).set_next(retired) };
            match self.retired.compare_exchange_weak(
                retired,
                first,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return,
                Err(observed) => retired = observed,
            }
        }
    }

    /// Free every node in a chain.
    ///
    /// # Safety
    /// No thread may still hold a reference into the chain.
    ///
    unsafe fn free_chain(mut node: NodePtr<T>) {
        while !node.is_null() {
            let next = unsafe { (*node).get_next() };
            unsafe { StackNode::dealloc_ptr(node) };
            node = next;
        }
    }
}

impl<T> Default for TreiberStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for TreiberStack<T> {
    fn drop(&mut self) {
        // Exclusive access: both chains can be torn down directly.
        unsafe {
            Self::free_chain(self.head.load(Ordering::SeqCst));
            Self::free_chain(self.retired.load(Ordering::SeqCst));
        }
    }
}

// Safety: nodes are owned by the stack; payloads only move in through push
// and out through pop, so sharing the stack needs no more than T: Send.
unsafe impl<T: Send> Send for TreiberStack<T> {}
unsafe impl<T: Send> Sync for TreiberStack<T> {}
