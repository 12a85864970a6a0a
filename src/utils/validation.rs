//! Centralized input limits and checks.
//!
//! Pair generation is a full cross product, so both the record counts and
//! their product are bounded before anything is generated.

/// Maximum number of records accepted on either side of a ranking
pub const MAX_RECORDS: usize = 100_000;

/// Maximum number of pairs a single ranking may generate
pub const MAX_PAIRS: usize = 10_000_000;

/// Input validation error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Too many {side} records: {count} exceeds maximum of {MAX_RECORDS}")]
    TooManyRecords { side: &'static str, count: usize },

    #[error("Too many pairs: {bases} x {candidates} exceeds maximum of {MAX_PAIRS}")]
    TooManyPairs { bases: usize, candidates: usize },

    #[error("Expected a JSON array of records in {0}")]
    NotAnArray(String),
}

/// Check that one side of a ranking stays within [`MAX_RECORDS`].
///
/// # Errors
///
/// Returns `ValidationError::TooManyRecords` if `count` exceeds the limit.
pub fn check_record_limit(side: &'static str, count: usize) -> Result<(), ValidationError> {
    if count > MAX_RECORDS {
        Err(ValidationError::TooManyRecords { side, count })
    } else {
        Ok(())
    }
}

/// Number of pairs a cross product will generate, if within [`MAX_PAIRS`].
///
/// # Examples
///
/// ```
/// use pairwise_rank::utils::validation::check_pair_limit;
///
/// assert_eq!(check_pair_limit(3, 4), Ok(12));
/// assert!(check_pair_limit(100_000, 100_000).is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::TooManyPairs` if the product exceeds the limit or
/// overflows.
pub fn check_pair_limit(bases: usize, candidates: usize) -> Result<usize, ValidationError> {
    match bases.checked_mul(candidates) {
        Some(total) if total <= MAX_PAIRS => Ok(total),
        _ => Err(ValidationError::TooManyPairs { bases, candidates }),
    }
}
