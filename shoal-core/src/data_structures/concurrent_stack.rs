use super::{LockedStack, TreiberStack};

///
/// The operations every stack in this workspace agrees on, whatever its
/// locking (or non-locking) strategy.
///
/// Lets contract tests and benchmarks run unchanged against the coarse
/// lock, counter-reclaimed, and epoch-reclaimed implementations.
///
pub trait ConcurrentStack<T> {
    /// Push a value onto the top.
    fn push(&self, value: T);

    /// Pop the top value, or `None` when the stack is observed empty.
    fn try_pop(&self) -> Option<T>;

    /// Snapshot emptiness check.
    fn is_empty(&self) -> bool;
}

impl<T: Send> ConcurrentStack<T> for TreiberStack<T> {
    fn push(&self, value: T) {
        TreiberStack::push(self, value)
    }

    fn try_pop(&self) -> Option<T> {
        TreiberStack::pop(self)
    }

    fn is_empty(&self) -> bool {
        TreiberStack::is_empty(self)
    }
}

impl<T> ConcurrentStack<T> for LockedStack<T> {
    fn push(&self, value: T) {
        LockedStack::push(self, value)
    }

    fn try_pop(&self) -> Option<T> {
        LockedStack::try_pop(self)
    }

    fn is_empty(&self) -> bool {
        LockedStack::is_empty(self)
    }
}
