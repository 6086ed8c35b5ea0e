//! Concurrent collections and parallel slice algorithms.
//!
//! # Organization
//!
//! - [`data_structures`] - stacks, a queue, a list and a hash map built
//!   for shared mutation through `&self`
//! - [`parallel`] - partition/spawn/join algorithms over slices, where
//!   the calling thread always works a chunk itself
//! - [`synchronization`] - the spinning barrier and one-shot result slot
//!   the algorithms are built on
//! - [`common_tests`] - contract suites companion crates run against
//!   their own implementations
//!
//! Blocking structures treat lock poisoning as a crashed-peer bug and
//! panic; operations that can merely miss (pop on empty, find without a
//! match) report through `Option`, and the one pop contract that treats
//! emptiness as a caller error returns [`EmptyError`].

pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod parallel;
pub mod synchronization;

pub use data_structures::{
    ConcurrentStack, LockCouplingList, LockedStack, StripedHashMap, TreiberStack, TwoLockQueue,
};
pub use error::EmptyError;
pub use parallel::{
    parallel_accumulate, parallel_find, parallel_for_each, parallel_inclusive_scan,
    parallel_quick_sort, partition, ParallelSorter, Partition,
};
pub use synchronization::{ResultSlot, SpinBarrier};
