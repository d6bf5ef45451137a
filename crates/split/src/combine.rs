//! Weighted combination of sampled keys.
//!
//! Each key is read as an unsigned big-endian integer after right-padding to
//! the longest key, multiplied by its weight, summed, and divided by the total
//! weight (truncating). The arithmetic is exact at any key length.

use num_bigint::BigUint;

use crate::error::{Result, SplitError};
use crate::sample::Sample;

/// Interprets `bytes` as an unsigned big-endian integer.
#[must_use]
pub fn decode_magnitude(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Minimal unsigned big-endian encoding of `value`.
///
/// Leading zero bytes are absent, so zero encodes as the empty key.
#[must_use]
pub fn encode_magnitude(value: &BigUint) -> Vec<u8> {
    if *value == BigUint::ZERO {
        return Vec::new();
    }
    value.to_bytes_be()
}

/// Combines samples into a single key: the size-weighted mean of their
/// magnitudes.
///
/// Shorter keys are padded with trailing zero bytes to the length of the
/// longest key before conversion, so `[0x01]` and `[0x01, 0x00]` are the same
/// value. The result is not re-padded and may be shorter than the longest
/// input when its high-order bytes are zero.
///
/// # Errors
///
/// - [`SplitError::NoSamples`] if `samples` is empty.
/// - [`SplitError::ZeroTotalWeight`] if every weight is zero.
pub fn combine_samples(samples: &[Sample]) -> Result<Vec<u8>> {
    if samples.is_empty() {
        return Err(SplitError::NoSamples);
    }

    let max_len = samples.iter().map(|s| s.key.len()).max().unwrap_or(0);
    let total_weight: BigUint = samples.iter().map(|s| BigUint::from(s.weight)).sum();
    if total_weight == BigUint::ZERO {
        return Err(SplitError::ZeroTotalWeight {
            samples: samples.len(),
        });
    }

    let mut weighted_sum = BigUint::ZERO;
    let mut normalized = Vec::with_capacity(max_len);
    for sample in samples {
        normalized.clear();
        normalized.extend_from_slice(&sample.key);
        normalized.resize(max_len, 0);
        weighted_sum += decode_magnitude(&normalized) * sample.weight;
    }

    let combined = weighted_sum / total_weight;
    Ok(encode_magnitude(&combined))
}
