//! Primitives the parallel algorithms are built on.

pub mod result_slot;
pub mod spin_barrier;

pub use result_slot::ResultSlot;
pub use spin_barrier::SpinBarrier;
