use std::mem;
use std::sync::{Condvar, Mutex};

/// One-shot slot: many candidate producers, the first fulfillment wins,
/// one consumer takes the value out.
///
/// Backs the racing algorithms, where whichever worker resolves a result
/// first publishes it and everyone else's attempt becomes a no-op.
///
pub struct ResultSlot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

enum SlotState<T> {
    Empty,
    Ready(T),
    Consumed,
}

impl<T> ResultSlot<T> {
    pub fn new() -> Self {
        ResultSlot {
            state: Mutex::new(SlotState::Empty),
            ready: Condvar::new(),
        }
    }

    /// Publish a value. Returns whether this call won; a losing value is
    /// dropped.
    pub fn fulfill(&self, value: T) -> bool {
        let mut state = self.state.lock().unwrap();
        match *state {
            SlotState::Empty => {
                *state = SlotState::Ready(value);
                self.ready.notify_all();
                true
            }
            _ => false,
        }
    }

    /// Take the value if one is ready; `None` while the slot is still
    /// empty or after it was consumed.
    pub fn try_take(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        match mem::replace(&mut *state, SlotState::Consumed) {
            SlotState::Ready(value) => Some(value),
            SlotState::Empty => {
                *state = SlotState::Empty;
                None
            }
            SlotState::Consumed => None,
        }
    }

    /// Block until a value is published, then take it.
    ///
    /// # Panics
    /// Panics if the value was already consumed; the slot hands its value
    /// to exactly one taker.
    pub fn wait_and_take(&self) -> T {
        let mut state = self.state.lock().unwrap();
        loop {
            match mem::replace(&mut *state, SlotState::Consumed) {
                SlotState::Ready(value) => return value,
                SlotState::Empty => *state = SlotState::Empty,
                SlotState::Consumed => panic!("result slot already consumed"),
            }
            state = self.ready.wait(state).unwrap();
        }
    }
}

impl<T> Default for ResultSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
