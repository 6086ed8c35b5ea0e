//! Concurrent collections.
//!
//! Each structure picks a different point on the blocking spectrum:
//!
//! - [`LockedStack`] - one mutex, the trivially correct baseline
//! - [`TreiberStack`] - lock-free CAS loops with counter-gated reclamation
//! - [`TwoLockQueue`] - a lock per end so producers and consumers overlap
//! - [`LockCouplingList`] - a lock per node, traversal by hand-over-hand
//! - [`StripedHashMap`] - a reader-writer lock per bucket
//!
//! All of them are shared by `&self` and guard their own interior state;
//! none require external synchronization.

pub mod concurrent_stack;
pub mod lock_coupling_list;
pub mod locked_stack;
pub mod striped_hash_map;
pub mod treiber_stack;
pub mod two_lock_queue;

pub use concurrent_stack::ConcurrentStack;
pub use lock_coupling_list::LockCouplingList;
pub use locked_stack::LockedStack;
pub use striped_hash_map::{StripedHashMap, DEFAULT_BUCKET_COUNT};
pub use treiber_stack::TreiberStack;
pub use two_lock_queue::TwoLockQueue;
