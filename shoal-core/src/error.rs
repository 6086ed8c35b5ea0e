use thiserror::Error;

/// Failure reported by pop operations that treat emptiness as an error.
///
/// Emptiness is an ordinary condition for a concurrent container, so most
/// pop paths return an `Option` instead; this type backs the contract where
/// the caller asked for a value and an empty collection cannot honor that.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("collection is empty")]
pub struct EmptyError;
