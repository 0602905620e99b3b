//! BLAKE3 helpers for claim keys.
//!
//! Claim point ids in the similarity index are derived from the exact claim text, so
//! inserting the same text twice addresses the same point.

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// A collision maps two different claims onto one index point. Readers compare the stored
/// payload text against the requested text, so a collision degrades to a miss rather than a
/// wrong answer.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Point id for a claim in the similarity index.
#[inline]
pub fn claim_point_id(text: &str) -> u64 {
    hash_to_u64(text.as_bytes())
}
