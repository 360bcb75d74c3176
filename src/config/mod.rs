use crate::error::{HashError, Result};

cfg_if::cfg_if! {
    // The index type doubles as the hash type: hashes are folded down to
    // this width before they reach the table, and every bucket index fits
    // in it. The narrow build halves the per-bucket bookkeeping at the
    // cost of capping the capacity at 2^15 buckets.
    if #[cfg(feature = "huge")] {
        /// Bucket index and hash value type.
        pub type HashIdx = u64;
    } else if #[cfg(feature = "tiny")] {
        /// Bucket index and hash value type.
        pub type HashIdx = u16;
    } else {
        /// Bucket index and hash value type.
        pub type HashIdx = u32;
    }
}

/// Sentinel returned by lookups when a key is absent.
///
/// Never a valid bucket index: capacities are kept strictly below it by
/// `round_buckets`.
pub const MISSING: HashIdx = HashIdx::MAX;

/// Fraction of buckets that may be non-empty before a rehash is forced.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.77;

/// Smallest non-zero bucket count.
pub(crate) const MIN_BUCKETS: HashIdx = 4;

/// Rounds a requested bucket count up to a power of two, clamped to at
/// least [`MIN_BUCKETS`].
///
/// Fails when the rounded count cannot be represented below [`MISSING`]
/// in the configured index width.
#[inline]
pub(crate) fn round_buckets(requested: usize) -> Result<HashIdx> {
    if requested <= MIN_BUCKETS as usize {
        return Ok(MIN_BUCKETS);
    }
    let rounded = requested
        .checked_next_power_of_two()
        .ok_or(HashError::CapacityOverflow(requested))?;
    if rounded as u128 >= MISSING as u128 {
        return Err(HashError::CapacityOverflow(requested));
    }
    Ok(rounded as HashIdx)
}

/// Number of non-empty buckets tolerated at the given capacity before an
/// insert must rehash. Saturates below [`MISSING`].
#[inline]
pub(crate) fn upper_bound(n_buckets: HashIdx, load_factor: f64) -> HashIdx {
    let bound = (n_buckets as f64 * load_factor + 0.5) as u64;
    if bound >= MISSING as u64 {
        MISSING - 1
    } else {
        bound as HashIdx
    }
}
