use log::debug;

/// Elements below which a chunk is not worth a thread of its own.
pub const MIN_CHUNK: usize = 20;

/// Worker count assumed when the hardware cannot be probed.
const FALLBACK_WORKERS: usize = 2;

/// How a parallel call splits its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Total workers, the calling thread included.
    pub workers: usize,
    /// Elements per spawned worker. The caller takes the final chunk,
    /// which also absorbs the division remainder.
    pub chunk_len: usize,
}

/// Decide how many workers `len` elements deserve and how much each gets.
///
/// Workers are capped both by the hardware parallelism and by
/// `len / MIN_CHUNK` rounded up, so short inputs stay on the calling
/// thread entirely.
///
/// # Panics
/// Panics when `len` is zero; callers handle empty inputs first.
pub fn partition(len: usize) -> Partition {
    assert!(len > 0, "cannot partition zero elements");

    let max_workers = len.div_ceil(MIN_CHUNK);
    let detected = num_cpus::get();
    let hardware = if detected > 0 { detected } else { FALLBACK_WORKERS };
    let workers = hardware.min(max_workers);
    let chunk_len = len / workers;

    debug!(
        "partition: len={} workers={} chunk_len={}",
        len, workers, chunk_len
    );
    Partition { workers, chunk_len }
}
