use std::hint;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

///
/// Reusable spinning barrier whose membership can shrink between rounds.
///
/// Unlike [`std::sync::Barrier`] this one lets a thread bow out for good
/// with [`done_waiting`](SpinBarrier::done_waiting): the departure counts
/// as the thread's arrival for the current round, and every later round
/// expects one participant fewer. Lock-step algorithms where workers
/// finish at different phases (the prefix scan, for one) need exactly
/// that.
///
/// # Design
///
/// ```text
///   participants   how many arrivals open the next round
///   remaining      arrivals still missing from the current round
///   generation     bumped once per completed round
/// ```
///
/// The last arrival of a round reloads `remaining` from `participants`
/// and bumps `generation`; everyone else spins until they observe the
/// bump. Waiters yield between probes, so oversubscribing the cores (one
/// thread per element, say) degrades instead of livelocking.
///
pub struct SpinBarrier {
    participants: AtomicUsize,
    remaining: AtomicUsize,
    generation: AtomicUsize,
}

impl SpinBarrier {
    /// # Panics
    /// Panics when `participants` is zero.
    pub fn new(participants: usize) -> Self {
        assert!(participants > 0, "barrier needs at least one participant");
        SpinBarrier {
            participants: AtomicUsize::new(participants),
            remaining: AtomicUsize::new(participants),
            generation: AtomicUsize::new(0),
        }
    }

    /// Arrive and wait for the round to complete.
    pub fn wait(&self) {
        let generation = self.generation.load(Ordering::Acquire);
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.open_next_round();
        } else {
            while self.generation.load(Ordering::Acquire) == generation {
                hint::spin_loop();
                thread::yield_now();
            }
        }
    }

    /// Arrive one final time and leave the barrier: later rounds expect
    /// one participant fewer. Does not wait.
    pub fn done_waiting(&self) {
        self.participants.fetch_sub(1, Ordering::AcqRel);
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.open_next_round();
        }
    }

    /// Rounds completed so far.
    pub fn generation(&self) -> usize {
        self.generation.load(Ordering::Acquire)
    }

    /// Arrivals the current round still expects. Snapshot only.
    pub fn participants(&self) -> usize {
        self.participants.load(Ordering::Acquire)
    }

    fn open_next_round(&self) {
        // Reset before the bump: a released thread re-entering wait must
        // find the new round's count already in place.
        self.remaining
            .store(self.participants.load(Ordering::Acquire), Ordering::Release);
        self.generation.fetch_add(1, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_single_participant_never_blocks() {
        let barrier = SpinBarrier::new(1);
        for round in 1..=5 {
            barrier.wait();
            assert_eq!(barrier.generation(), round);
        }
    }

    #[test]
    fn test_generation_advances_once_per_round() {
        let threads = 4;
        let rounds = 100;
        let barrier = Arc::new(SpinBarrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    for _ in 0..rounds {
                        barrier.wait();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(barrier.generation(), rounds);
    }

    #[test]
    fn test_rounds_are_lock_step() {
        // No thread may start round r+1 before every thread finished r.
        let threads = 4;
        let rounds = 50;
        let barrier = Arc::new(SpinBarrier::new(threads));
        let arrivals = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                let arrivals = Arc::clone(&arrivals);
                thread::spawn(move || {
                    for round in 0..rounds {
                        arrivals.fetch_add(1, Ordering::SeqCst);
                        barrier.wait();
                        // Everyone from this round must have arrived.
                        assert!(arrivals.load(Ordering::SeqCst) >= (round + 1) * threads);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_done_waiting_shrinks_membership() {
        let threads = 4;
        let barrier = Arc::new(SpinBarrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|id| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    // Thread `id` participates in `id` full rounds, then
                    // departs; the survivors must keep making progress.
                    for _ in 0..id {
                        barrier.wait();
                    }
                    barrier.done_waiting();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(barrier.participants(), 0);
        // Rounds complete with 4, 3, 2 and finally 1 arrivals.
        assert_eq!(barrier.generation(), threads);
    }

    #[test]
    fn test_departure_releases_waiters() {
        let barrier = Arc::new(SpinBarrier::new(2));

        let waiter = {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || barrier.wait())
        };

        // The departing thread's final arrival completes the round.
        barrier.done_waiting();
        waiter.join().unwrap();
        assert_eq!(barrier.generation(), 1);
        assert_eq!(barrier.participants(), 1);
    }
}
