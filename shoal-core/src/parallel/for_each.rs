use std::panic;
use std::thread;

use log::error;

use super::partition::{partition, Partition};

/// Apply `f` to every element of `data`, splitting the slice across
/// threads per [`partition`].
///
/// The calling thread works the final chunk itself instead of idling.
/// Worker panics are re-raised here, but only after every spawned thread
/// has been joined; a panic in the caller's own chunk likewise waits for
/// the workers before propagating (scoped threads guarantee the join).
pub fn parallel_for_each<T, F>(data: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    if data.is_empty() {
        return;
    }

    let Partition { workers, chunk_len } = partition(data.len());
    if workers == 1 {
        for item in data.iter_mut() {
            f(item);
        }
        return;
    }

    let (spawned, own) = data.split_at_mut(chunk_len * (workers - 1));
    thread::scope(|scope| {
        let f = &f;
        let mut handles = Vec::with_capacity(workers - 1);
        for chunk in spawned.chunks_mut(chunk_len) {
            handles.push(scope.spawn(move || {
                for item in chunk {
                    f(item);
                }
            }));
        }

        for item in own.iter_mut() {
            f(item);
        }

        let mut first_panic = None;
        for handle in handles {
            if let Err(payload) = handle.join() {
                if first_panic.is_none() {
                    first_panic = Some(payload);
                }
            }
        }
        if let Some(payload) = first_panic {
            error!("parallel_for_each worker panicked; re-raising on the calling thread");
            panic::resume_unwind(payload);
        }
    });
}
