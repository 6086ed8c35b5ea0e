use std::panic;
use std::thread;

use log::error;

use super::partition::{partition, Partition};

/// Fold `data` through `op`, one chunk per worker, then fold the partial
/// results in chunk order starting from `init`.
///
/// Each worker seeds its fold from the chunk's own first element, so `op`
/// needs no identity value; it must be associative for the regrouping to
/// preserve the sequential answer. Commutativity is not required: chunk
/// results are combined left to right.
pub fn parallel_accumulate<T, Op>(data: &[T], init: T, op: Op) -> T
where
    T: Clone + Send + Sync,
    Op: Fn(T, &T) -> T + Sync,
{
    if data.is_empty() {
        return init;
    }

    let Partition { workers, chunk_len } = partition(data.len());
    if workers == 1 {
        return data.iter().fold(init, |acc, item| op(acc, item));
    }

    let (spawned, own) = data.split_at(chunk_len * (workers - 1));
    thread::scope(|scope| {
        let op = &op;
        let mut handles = Vec::with_capacity(workers - 1);
        for chunk in spawned.chunks(chunk_len) {
            handles.push(scope.spawn(move || reduce_chunk(chunk, op)));
        }

        let own_partial = reduce_chunk(own, op);

        let mut partials = Vec::with_capacity(workers);
        let mut first_panic = None;
        for handle in handles {
            match handle.join() {
                Ok(partial) => partials.push(partial),
                Err(payload) => {
                    if first_panic.is_none() {
                        first_panic = Some(payload);
                    }
                }
            }
        }
        if let Some(payload) = first_panic {
            error!("parallel_accumulate worker panicked; re-raising on the calling thread");
            panic::resume_unwind(payload);
        }

        partials.push(own_partial);
        partials.into_iter().fold(init, |acc, partial| op(acc, &partial))
    })
}

/// Reduce one non-empty chunk, seeded from its first element.
fn reduce_chunk<T, Op>(chunk: &[T], op: &Op) -> T
where
    T: Clone,
    Op: Fn(T, &T) -> T,
{
    chunk[1..]
        .iter()
        .fold(chunk[0].clone(), |acc, item| op(acc, item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_returns_init() {
        let data: Vec<u64> = Vec::new();
        assert_eq!(parallel_accumulate(&data, 7, |acc, v| acc + v), 7);
    }

    #[test]
    fn test_short_input_runs_sequentially() {
        let data: Vec<u64> = (1..=10).collect();
        assert_eq!(parallel_accumulate(&data, 0, |acc, v| acc + v), 55);
    }

    #[test]
    fn test_matches_sequential_sum() {
        let data: Vec<u64> = (0..100_000).collect();
        let expected: u64 = data.iter().sum();
        assert_eq!(parallel_accumulate(&data, 0, |acc, v| acc + v), expected);
    }

    #[test]
    fn test_uneven_length_matches_sequential() {
        let data: Vec<i64> = (0..4999).map(|i| i * 3 - 7).collect();
        let expected: i64 = data.iter().sum();
        assert_eq!(parallel_accumulate(&data, 0, |acc, v| acc + v), expected);
    }

    #[test]
    fn test_associative_non_commutative_op() {
        // String concatenation is associative but not commutative; the
        // chunk-order combine must keep the sequence intact.
        let data: Vec<String> = (0..200).map(|i| format!("{},", i)).collect();
        let expected: String = data.concat();

        let result = parallel_accumulate(&data, String::new(), |mut acc, item| {
            acc.push_str(item);
            acc
        });
        assert_eq!(result, expected);
    }

    #[test]
    #[should_panic(expected = "deliberate failure")]
    fn test_worker_panic_propagates() {
        let data: Vec<u64> = (0..100_000).collect();
        parallel_accumulate(&data, 0, |acc, v| {
            if *v == 31_337 {
                panic!("deliberate failure");
            }
            acc + v
        });
    }
}
