//! Parallel algorithms over slices.
//!
//! All of them share the same shape: [`partition`] decides how many
//! workers the input deserves, spawned threads take equal chunks, and the
//! calling thread works the final chunk (plus the division remainder)
//! itself before collecting the others. Inputs shorter than one chunk
//! never leave the calling thread.
//!
//! The scan and the sorter deviate where their algorithms demand it: the
//! scan runs one thread per element in barrier lock-step, and the sorter
//! keeps a reusable stealing pool.

pub mod accumulate;
pub mod find;
pub mod for_each;
pub mod partition;
pub mod quick_sort;
pub mod scan;

pub use accumulate::parallel_accumulate;
pub use find::parallel_find;
pub use for_each::parallel_for_each;
pub use partition::{partition, Partition, MIN_CHUNK};
pub use quick_sort::{parallel_quick_sort, ParallelSorter};
pub use scan::parallel_inclusive_scan;
