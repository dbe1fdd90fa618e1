//! Hash spreading and bucket index derivation.
//!
//! The table length is always a power of two, so the bucket index is the
//! low bits of the hash. Hash codes whose entropy sits in the high bits
//! would collapse into a handful of buckets under a plain mask; `spread`
//! folds the high bits downward first.

/// Mixes a raw hash code so its high bits influence the low bits used
/// for indexing. Two XOR folds with shifts of 20/12 and 7/4.
#[inline]
pub(crate) fn spread(mut hash: u64) -> u64 {
    hash ^= (hash >> 20) ^ (hash >> 12);
    hash ^ (hash >> 7) ^ (hash >> 4)
}

/// Bucket index for a spread hash in a table of `len` slots.
///
/// `len` must be a power of two; masking replaces the modulo and is a
/// correctness requirement, not an optimization.
#[inline]
pub(crate) fn index_for(hash: u64, len: usize) -> usize {
    debug_assert!(len.is_power_of_two());
    (hash as usize) & (len - 1)
}
