//! Crossbeam-based implementations for shoal collections.
//!
//! This crate provides `EpochStack`, a lock-free stack whose nodes are
//! reclaimed through `crossbeam-epoch` instead of the hand-rolled
//! popper-counting scheme `shoal_core::TreiberStack` uses. Both expose the
//! same `ConcurrentStack` interface, so the core crate's contract tests and
//! the benchmarks in this crate run against either.
//!
//! # Usage
//!
//! ```ignore
//! use shoal_crossbeam::EpochStack;
//!
//! let stack: EpochStack<i32> = EpochStack::new();
//! stack.push(42);
//! assert_eq!(stack.pop(), Some(42));
//! ```

pub mod epoch_stack;

// Export the epoch-reclaimed stack
pub use epoch_stack::EpochStack;
