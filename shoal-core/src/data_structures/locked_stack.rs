use std::sync::Mutex;

use crate::error::EmptyError;

/// Coarse-grained stack: one mutex around a `Vec`.
///
/// The baseline against which the lock-free variants are measured, and the
/// chunk pool behind the parallel sorter. Every operation takes the single
/// lock, so progress is blocking but trivially correct.
///
pub struct LockedStack<T> {
    items: Mutex<Vec<T>>,
}

impl<T> LockedStack<T> {
    pub fn new() -> Self {
        LockedStack {
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, value: T) {
        self.items.lock().unwrap().push(value);
    }

    /// Pop the top value, treating emptiness as an error.
    pub fn pop(&self) -> Result<T, EmptyError> {
        self.items.lock().unwrap().pop().ok_or(EmptyError)
    }

    /// Pop the top value, treating emptiness as an ordinary outcome.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().unwrap().pop()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

impl<T> Default for LockedStack<T> {
    fn default() -> Self {
        Self::new()
    }
}
