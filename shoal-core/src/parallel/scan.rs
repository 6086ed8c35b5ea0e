use std::cell::UnsafeCell;
use std::ops::Add;
use std::thread;

use crate::synchronization::SpinBarrier;

///
/// In-place parallel inclusive prefix sum (Hillis-Steele form).
///
/// One thread per element, strides doubling each round:
///
/// ```text
///   round 0 (stride 1):  s[i] += s[i-1]
///   round 1 (stride 2):  s[i] += s[i-2]
///   round 2 (stride 4):  s[i] += s[i-4]     ...until stride > i
/// ```
///
/// Rounds alternate between the input slice and a scratch buffer: each
/// round reads one and writes the other, and a [`SpinBarrier`] separates
/// the rounds so no slot is read and written concurrently. An element
/// whose stride outgrows its index leaves the barrier with
/// `done_waiting`, first mirroring its finished value into the buffer its
/// last round did not write; later rounds read departed slots from either
/// buffer, so both must be current.
///
/// Spawning a thread per element is the point of the exercise, not a
/// throughput strategy: the algorithm performs O(n log n) additions and
/// oversubscribes the scheduler badly for large `n`. Keep it to small
/// slices.
///
pub fn parallel_inclusive_scan<T>(data: &mut [T])
where
    T: Add<Output = T> + Copy + Send + Sync,
{
    let length = data.len();
    if length <= 1 {
        return;
    }

    let mut scratch = data.to_vec();
    let barrier = SpinBarrier::new(length);
    let sequence = SharedSlots::new(data);
    let scratch_slots = SharedSlots::new(&mut scratch);

    {
        let barrier = &barrier;
        let sequence = &sequence;
        let scratch_slots = &scratch_slots;
        thread::scope(|scope| {
            for i in 0..length - 1 {
                scope.spawn(move || scan_element(sequence, scratch_slots, i, barrier));
            }
            scan_element(sequence, scratch_slots, length - 1, barrier);
        });
    }
}

/// Run every round index `i` participates in, then depart.
fn scan_element<T>(
    sequence: &SharedSlots<'_, T>,
    scratch: &SharedSlots<'_, T>,
    i: usize,
    barrier: &SpinBarrier,
) where
    T: Add<Output = T> + Copy + Send + Sync,
{
    let mut step = 0usize;
    let mut stride = 1usize;

    while stride <= i {
        // Even rounds read the sequence and write the scratch buffer; odd
        // rounds read the scratch buffer and write the sequence. Within a
        // round each slot has exactly one writer (its own thread), and the
        // barrier orders the rounds.
        let (src, dst) = if step % 2 == 0 {
            (sequence, scratch)
        } else {
            (scratch, sequence)
        };
        unsafe {
            let sum = src.get(i) + src.get(i - stride);
            dst.set(i, sum);
        }

        barrier.wait();
        step += 1;
        stride *= 2;
    }

    // Mirror the finished value into whichever buffer the last round did
    // not write. Active threads in the round now running read the other
    // buffer, so this write cannot race; once the departure below lands,
    // both buffers serve this index correctly forever.
    unsafe {
        if step % 2 == 0 {
            scratch.set(i, sequence.get(i));
        } else {
            sequence.set(i, scratch.get(i));
        }
    }
    barrier.done_waiting();
}

/// Shared view of a slice whose slots follow the round discipline above:
/// one writer per slot per round, rounds separated by the barrier.
struct SharedSlots<'a, T> {
    slots: &'a [UnsafeCell<T>],
}

impl<'a, T> SharedSlots<'a, T> {
    fn new(data: &'a mut [T]) -> Self {
        // UnsafeCell<T> has the same layout as T, so the exclusive slice
        // can be reinterpreted as a slice of cells.
        let slots = unsafe { &*(data as *mut [T] as *const [UnsafeCell<T>]) };
        SharedSlots { slots }
    }

    /// # Safety
    /// No thread may be writing `index` concurrently.
    unsafe fn get(&self, index: usize) -> T
    where
        T: Copy,
    {
        unsafe { *self.slots[index].get() }
    }

    /// # Safety
    /// No other thread may be reading or writing `index` concurrently.
    unsafe fn set(&self, index: usize, value: T) {
        unsafe { *self.slots[index].get() = value };
    }
}

// Safety: values only cross threads by copy through get/set; the callers
// uphold the single-writer-per-round contract.
unsafe impl<T: Send> Sync for SharedSlots<'_, T> {}
