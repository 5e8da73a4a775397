//! Work partitioning
//!
//! Splits a unit list into contiguous, near-equal slices, one per worker.

use crate::{Result, TrawlError};

/// Splits `units` into exactly `workers` contiguous partitions
///
/// The first `len % workers` partitions receive one extra element, so sizes
/// differ by at most one. Every unit appears exactly once and source order is
/// kept, both within and across partitions. When there are more workers than
/// units the trailing partitions are empty.
///
/// # Errors
///
/// `InvalidArgument` if `workers` is zero.
pub fn partition<T: Clone>(units: &[T], workers: usize) -> Result<Vec<Vec<T>>> {
    if workers == 0 {
        return Err(TrawlError::InvalidArgument(
            "workers must be at least 1".to_string(),
        ));
    }

    let base = units.len() / workers;
    let extra = units.len() % workers;

    let mut partitions = Vec::with_capacity(workers);
    let mut start = 0;
    for index in 0..workers {
        let size = base + usize::from(index < extra);
        partitions.push(units[start..start + size].to_vec());
        start += size;
    }

    Ok(partitions)
}
