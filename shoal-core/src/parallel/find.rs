use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::error;

use super::partition::{partition, Partition};
use crate::synchronization::ResultSlot;

/// What a chunk search reports through the shared slot: a matching index,
/// or the payload of a panic that cut the search short.
type FindOutcome = Result<usize, Box<dyn Any + Send>>;

/// Search `data` for an element satisfying `pred`, racing one worker per
/// chunk.
///
/// Returns the index of the match the winning worker found. When several
/// chunks contain matches the winner is a race, so the index is not
/// guaranteed to be the lowest one; `None` means no element anywhere
/// satisfied `pred`.
///
/// Every worker polls a shared flag and abandons its chunk as soon as any
/// worker has published an outcome, so a hit near the front of one chunk
/// spares the others most of their scan.
pub fn parallel_find<T, P>(data: &[T], pred: P) -> Option<usize>
where
    T: Sync,
    P: Fn(&T) -> bool + Sync,
{
    if data.is_empty() {
        return None;
    }

    let Partition { workers, chunk_len } = partition(data.len());
    let done = AtomicBool::new(false);
    let slot: ResultSlot<FindOutcome> = ResultSlot::new();

    if workers == 1 {
        search_chunk(data, 0, &pred, &done, &slot);
    } else {
        let (spawned, own) = data.split_at(chunk_len * (workers - 1));
        thread::scope(|scope| {
            let pred = &pred;
            let done = &done;
            let slot = &slot;
            for (index, chunk) in spawned.chunks(chunk_len).enumerate() {
                let base = index * chunk_len;
                scope.spawn(move || search_chunk(chunk, base, pred, done, slot));
            }
            search_chunk(own, chunk_len * (workers - 1), pred, done, slot);
        });
    }

    if !done.load(Ordering::Acquire) {
        return None;
    }
    let outcome = slot
        .try_take()
        .expect("done flag is raised only after the slot is fulfilled");
    match outcome {
        Ok(index) => Some(index),
        Err(payload) => {
            error!("parallel_find worker panicked; re-raising on the calling thread");
            panic::resume_unwind(payload)
        }
    }
}

/// Scan one chunk, publishing the first hit or a captured panic.
fn search_chunk<T, P>(
    chunk: &[T],
    base: usize,
    pred: &P,
    done: &AtomicBool,
    slot: &ResultSlot<FindOutcome>,
) where
    T: Sync,
    P: Fn(&T) -> bool + Sync,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        for (offset, item) in chunk.iter().enumerate() {
            if done.load(Ordering::Acquire) {
                return None;
            }
            if pred(item) {
                return Some(base + offset);
            }
        }
        None
    }));

    match result {
        Ok(Some(index)) => {
            // Slot before flag: anyone who observes `done` finds the slot
            // fulfilled.
            slot.fulfill(Ok(index));
            done.store(true, Ordering::Release);
        }
        Ok(None) => {}
        Err(payload) => {
            slot.fulfill(Err(payload));
            done.store(true, Ordering::Release);
        }
    }
}
