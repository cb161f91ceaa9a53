//! The acceptance predicate every node applies to a proposed block.

use std::fmt;

use super::{BITS_PER_HEX_DIGIT, Block};

/// A SHA-256 hex digest has 64 digits; anything above this can never be met.
pub const MAX_DIFFICULTY: u32 = 256;

/// Which of the ordered checks a candidate failed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    WrongIndex,
    WrongPreviousHash,
    InsufficientWork,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Rejection::WrongIndex => "index does not follow the tip",
            Rejection::WrongPreviousHash => "previous_hash does not match the tip",
            Rejection::InsufficientWork => "hash misses the difficulty prefix",
        };
        f.write_str(msg)
    }
}

/// Number of leading `'0'` hex digits required for `difficulty` bits.
pub fn required_zero_digits(difficulty: u32) -> usize {
    (difficulty / BITS_PER_HEX_DIGIT) as usize
}

/// Whether `hash` starts with `difficulty / 4` zero hex digits.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let needed = required_zero_digits(difficulty);
    hash.len() >= needed && hash.bytes().take(needed).all(|c| c == b'0')
}

/// Run the three checks in order and report the first failure.
///
/// `difficulty` is the validating node's current setting; the value recorded
/// inside the candidate is ignored. Only the hash prefix is checked, not
/// whether the hash is the digest of the block's fields.
pub fn check_next(candidate: &Block, tip: &Block, difficulty: u32) -> Result<(), Rejection> {
    if candidate.index != tip.index + 1 {
        return Err(Rejection::WrongIndex);
    }
    if candidate.previous_hash != tip.hash {
        return Err(Rejection::WrongPreviousHash);
    }
    if !meets_difficulty(&candidate.hash, difficulty) {
        return Err(Rejection::InsufficientWork);
    }
    Ok(())
}

pub fn is_valid_next(candidate: &Block, tip: &Block, difficulty: u32) -> bool {
    check_next(candidate, tip, difficulty).is_ok()
}
