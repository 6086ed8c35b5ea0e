use std::any::Any;
use std::cmp::Ordering as CmpOrdering;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error};

use crate::data_structures::LockedStack;
use crate::synchronization::ResultSlot;

/// What a chunk resolves to: the sorted run, or the payload of a panic
/// raised while sorting it. The panic travels with the chunk and is
/// re-raised on whichever thread was waiting for that run.
type SortOutcome<T> = Result<Vec<T>, Box<dyn Any + Send>>;

/// An unsorted run parked on the shared stack, claimed by whichever
/// worker pops it first.
struct SortChunk<T> {
    data: Vec<T>,
    slot: Arc<ResultSlot<SortOutcome<T>>>,
}

///
/// Work-stealing parallel quicksort.
///
/// Each partition step keeps the upper half on the current thread and
/// parks the lower half on a shared stack for any worker to claim. A
/// thread that needs a parked result it does not yet have steals other
/// pending chunks instead of blocking, so every thread, the caller
/// included, sorts for as long as there is work.
///
/// The pool (hardware parallelism minus the caller) is spawned lazily on
/// the first [`sort`](ParallelSorter::sort) and reused across calls;
/// dropping the sorter signals the workers and joins them.
///
/// The pivot is always a run's first element, so already sorted and
/// reverse-sorted inputs degrade to serial behavior: every partition puts
/// the whole remainder on one side. A recursion budget of about
/// `2 * log2(len)` bounds the damage by handing exhausted runs to
/// [`slice::sort_unstable_by`] instead of recursing further.
///
pub struct ParallelSorter<T, C> {
    shared: Arc<SorterShared<T, C>>,
    workers: Vec<JoinHandle<()>>,
}

struct SorterShared<T, C> {
    chunks: LockedStack<SortChunk<T>>,
    comparator: C,
    end: AtomicBool,
}

impl<T, C> ParallelSorter<T, C>
where
    T: Send + 'static,
    C: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    /// Build a sorter around a strict less-than comparator. No threads
    /// are spawned yet.
    pub fn new(comparator: C) -> Self {
        ParallelSorter {
            shared: Arc::new(SorterShared {
                chunks: LockedStack::new(),
                comparator,
                end: AtomicBool::new(false),
            }),
            workers: Vec::new(),
        }
    }

    /// Sort `data` into a fresh ordering of the same elements.
    pub fn sort(&mut self, data: Vec<T>) -> Vec<T> {
        if data.len() <= 1 {
            return data;
        }
        self.ensure_workers();
        let depth = depth_cap(data.len());
        self.shared.do_sort(data, depth)
    }

    fn ensure_workers(&mut self) {
        let target = num_cpus::get().saturating_sub(1);
        if self.workers.len() >= target {
            return;
        }
        debug!("spawning {} sorter workers", target - self.workers.len());
        while self.workers.len() < target {
            let shared = Arc::clone(&self.shared);
            self.workers.push(thread::spawn(move || shared.worker_loop()));
        }
    }
}

impl<T, C> Drop for ParallelSorter<T, C> {
    fn drop(&mut self) {
        self.shared.end.store(true, Ordering::Release);
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("sorter worker terminated by panic");
            }
        }
    }
}

impl<T, C> SorterShared<T, C>
where
    T: Send,
    C: Fn(&T, &T) -> bool + Sync,
{
    fn worker_loop(&self) {
        while !self.end.load(Ordering::Acquire) {
            if !self.try_sort_chunk() {
                thread::yield_now();
            }
        }
    }

    /// Claim one parked chunk and resolve its slot. Returns false when no
    /// chunk was pending.
    fn try_sort_chunk(&self) -> bool {
        match self.chunks.try_pop() {
            Some(SortChunk { data, slot }) => {
                let depth = depth_cap(data.len());
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| self.do_sort(data, depth)));
                slot.fulfill(outcome);
                true
            }
            None => false,
        }
    }

    fn do_sort(&self, mut data: Vec<T>, depth: usize) -> Vec<T> {
        if data.len() <= 1 {
            return data;
        }
        if depth == 0 {
            // Recursion budget exhausted, most likely a degenerate pivot
            // run; finish on the library sort instead of risking the
            // native stack.
            data.sort_unstable_by(|a, b| self.order(a, b));
            return data;
        }

        let pivot = data.swap_remove(0);
        let mut lower = Vec::new();
        let mut upper = Vec::new();
        for item in data {
            if (self.comparator)(&item, &pivot) {
                lower.push(item);
            } else {
                upper.push(item);
            }
        }

        // Park the lower run for anyone, keep the upper run here.
        let slot = Arc::new(ResultSlot::new());
        self.chunks.push(SortChunk {
            data: lower,
            slot: Arc::clone(&slot),
        });

        let sorted_upper = self.do_sort(upper, depth - 1);

        // Steal pending chunks while the lower run resolves; the claimant
        // may well be this very loop.
        let sorted_lower = loop {
            if let Some(outcome) = slot.try_take() {
                match outcome {
                    Ok(sorted) => break sorted,
                    Err(payload) => {
                        error!("sorter worker panicked; re-raising on the waiting thread");
                        panic::resume_unwind(payload);
                    }
                }
            }
            if !self.try_sort_chunk() {
                thread::yield_now();
            }
        };

        let mut result = sorted_lower;
        result.push(pivot);
        result.extend(sorted_upper);
        result
    }

    fn order(&self, a: &T, b: &T) -> CmpOrdering {
        if (self.comparator)(a, b) {
            CmpOrdering::Less
        } else if (self.comparator)(b, a) {
            CmpOrdering::Greater
        } else {
            CmpOrdering::Equal
        }
    }
}

/// Recursion budget: twice the depth of a perfectly balanced split.
fn depth_cap(len: usize) -> usize {
    2 * (usize::BITS - len.leading_zeros()) as usize
}

/// One-shot convenience around [`ParallelSorter`]: builds the pool, sorts,
/// tears the pool down. Keep a sorter around instead when sorting many
/// batches.
pub fn parallel_quick_sort<T, C>(data: Vec<T>, comparator: C) -> Vec<T>
where
    T: Send + 'static,
    C: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    if data.len() <= 1 {
        return data;
    }
    let mut sorter = ParallelSorter::new(comparator);
    sorter.sort(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sorted_permutation(original: &[i64], sorted: &[i64]) {
        assert_eq!(original.len(), sorted.len());
        assert!(sorted.windows(2).all(|w| w[0] <= w[1]));

        let mut expected = original.to_vec();
        expected.sort_unstable();
        assert_eq!(sorted, expected.as_slice());
    }

    #[test]
    fn test_trivial_inputs() {
        let empty: Vec<i64> = Vec::new();
        assert!(parallel_quick_sort(empty, |a, b| a < b).is_empty());

        let one = vec![9i64];
        assert_eq!(parallel_quick_sort(one, |a, b| a < b), vec![9]);

        let two = vec![5i64, -2];
        assert_eq!(parallel_quick_sort(two, |a, b| a < b), vec![-2, 5]);
    }

    #[test]
    fn test_scrambled_input() {
        let data: Vec<i64> = (0..5000).map(|i| (i * 7919) % 4093 - 2000).collect();
        let sorted = parallel_quick_sort(data.clone(), |a, b| a < b);
        assert_sorted_permutation(&data, &sorted);
    }

    #[test]
    fn test_already_sorted_input() {
        // Degenerate pivots: the depth cap has to carry this one.
        let data: Vec<i64> = (0..2000).collect();
        let sorted = parallel_quick_sort(data.clone(), |a, b| a < b);
        assert_sorted_permutation(&data, &sorted);
    }

    #[test]
    fn test_reverse_sorted_input() {
        let data: Vec<i64> = (0..2000).rev().collect();
        let sorted = parallel_quick_sort(data.clone(), |a, b| a < b);
        assert_sorted_permutation(&data, &sorted);
    }

    #[test]
    fn test_duplicate_heavy_input() {
        let data: Vec<i64> = (0..3000).map(|i| i % 5).collect();
        let sorted = parallel_quick_sort(data.clone(), |a, b| a < b);
        assert_sorted_permutation(&data, &sorted);
    }

    #[test]
    fn test_descending_comparator() {
        let data: Vec<i64> = (0..1000).map(|i| (i * 31) % 257).collect();
        let sorted = parallel_quick_sort(data, |a, b| a > b);
        assert!(sorted.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_sorter_reused_across_calls() {
        let mut sorter = ParallelSorter::new(|a: &i64, b: &i64| a < b);
        for round in 0..5 {
            let data: Vec<i64> = (0..1000).map(|i| (i * 131 + round) % 997).collect();
            let sorted = sorter.sort(data.clone());
            assert_sorted_permutation(&data, &sorted);
        }
    }

    #[test]
    #[should_panic(expected = "deliberate failure")]
    fn test_comparator_panic_propagates() {
        // Wherever the panic fires, a pool worker or the calling thread,
        // it must surface from the sort call itself.
        let data: Vec<i64> = (0..2000).collect();
        parallel_quick_sort(data, |a: &i64, b: &i64| {
            if *a == 1500 {
                panic!("deliberate failure");
            }
            a < b
        });
    }

    #[test]
    fn test_large_input() {
        let data: Vec<i64> = (0..50_000).map(|i| (i * 48271) % 65537 - 30000).collect();
        let sorted = parallel_quick_sort(data.clone(), |a, b| a < b);
        assert_sorted_permutation(&data, &sorted);
    }
}
