//! Proof-of-Work search.
//!
//! The nonce walks the whole signed 64-bit range upward from `i64::MIN`; the
//! first nonce whose SHA-256 hex digest carries `difficulty / 4` leading zeros
//! seals the block. Running off the end of the range is an explicit error.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, info};

use super::block::{BlockHeader, hash_preimage, is_wire_safe};
use super::validate::meets_difficulty;
use super::{BLOCK_SEPARATOR, Block, FIELD_SEPARATOR};
use crate::error::NodeError;

/// How many nonces are tried between cancel/deadline checks.
const CHECK_INTERVAL: u64 = 1 << 12;

/// Shared flag that stops an in-flight search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Synchronous, CPU-bound block miner. Both limits are opt-in; a default
/// miner searches until it finds a nonce or exhausts the range.
#[derive(Debug, Clone, Default)]
pub struct Miner {
    cancel: Option<CancelToken>,
    timeout: Option<Duration>,
}

impl Miner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Mine the successor of `previous` carrying `data`, stamped with the current time.
    pub fn mine(&self, previous: &Block, data: &str, difficulty: u32) -> Result<Block, NodeError> {
        self.mine_at(previous, data, difficulty, Utc::now().timestamp_millis())
    }

    /// Same as [`Miner::mine`] with an explicit timestamp (Unix millis).
    pub fn mine_at(
        &self,
        previous: &Block,
        data: &str,
        difficulty: u32,
        timestamp: i64,
    ) -> Result<Block, NodeError> {
        if !is_wire_safe(data) {
            return Err(NodeError::InvalidPayload(format!(
                "data must not contain '{FIELD_SEPARATOR}' or '{BLOCK_SEPARATOR}'"
            )));
        }

        let header = BlockHeader {
            index: previous.index + 1,
            previous_hash: previous.hash.clone(),
            data: data.to_string(),
            timestamp,
            difficulty,
        };
        self.search(&header, i64::MIN..=i64::MAX)
    }

    /// Try every nonce in `nonces` in ascending order.
    pub(crate) fn search(
        &self,
        header: &BlockHeader,
        nonces: RangeInclusive<i64>,
    ) -> Result<Block, NodeError> {
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);
        let prefix = header.preimage_prefix();
        let mut attempts: u64 = 0;

        for nonce in nonces {
            let hash = hash_preimage(&prefix, nonce);
            if meets_difficulty(&hash, header.difficulty) {
                info!(
                    "MINER - sealed block #{} (hash={}, nonce={}, attempts={}, {} ms)",
                    header.index,
                    hash,
                    nonce,
                    attempts + 1,
                    started.elapsed().as_millis()
                );
                return Ok(Block::sealed(header, nonce, hash));
            }

            attempts += 1;
            if attempts % CHECK_INTERVAL == 0 && self.should_stop(deadline) {
                debug!(
                    "MINER - stopped block #{} after {} attempts",
                    header.index, attempts
                );
                return Err(NodeError::MiningCancelled);
            }
        }

        Err(NodeError::ProofOfWorkExhausted)
    }

    fn should_stop(&self, deadline: Option<Instant>) -> bool {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return true;
        }
        deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::validate::is_valid_next;

    #[test]
    fn mined_block_meets_difficulty_and_links() {
        let prev = Block::genesis(8);
        let b = Miner::new().mine(&prev, "Node0 mine", 8).unwrap();
        assert!(b.hash.starts_with("00"));
        assert_eq!(b.index, 1);
        assert_eq!(b.previous_hash, prev.hash);
        assert_eq!(b.difficulty, 8);
        assert!(b.hash_is_intact());
        assert!(is_valid_next(&b, &prev, 8));
    }

    #[test]
    fn zero_difficulty_takes_first_nonce() {
        let prev = Block::genesis(0);
        let b = Miner::new().mine_at(&prev, "x", 0, 5).unwrap();
        assert_eq!(b.nonce, i64::MIN);
        assert_eq!(b.timestamp, 5);
    }

    #[test]
    fn difficulty_below_a_nibble_needs_no_zeros() {
        let prev = Block::genesis(3);
        let b = Miner::new().mine_at(&prev, "x", 3, 5).unwrap();
        assert_eq!(b.nonce, i64::MIN);
    }

    #[test]
    fn same_inputs_same_block() {
        let prev = Block::genesis(8);
        let a = Miner::new().mine_at(&prev, "d", 8, 99).unwrap();
        let b = Miner::new().mine_at(&prev, "d", 8, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn exhausted_range_is_an_error() {
        let header = BlockHeader {
            index: 1,
            previous_hash: "p".into(),
            data: "d".into(),
            timestamp: 0,
            difficulty: 256,
        };
        let err = Miner::new()
            .search(&header, i64::MAX - 10..=i64::MAX)
            .unwrap_err();
        assert!(matches!(err, NodeError::ProofOfWorkExhausted));
    }

    #[test]
    fn cancelled_token_stops_search() {
        let token = CancelToken::new();
        token.cancel();
        let prev = Block::genesis(256);
        let err = Miner::new()
            .with_cancel(token)
            .mine_at(&prev, "d", 256, 0)
            .unwrap_err();
        assert!(matches!(err, NodeError::MiningCancelled));
    }

    #[test]
    fn timeout_stops_search() {
        let prev = Block::genesis(256);
        let err = Miner::new()
            .with_timeout(Duration::from_millis(0))
            .mine_at(&prev, "d", 256, 0)
            .unwrap_err();
        assert!(matches!(err, NodeError::MiningCancelled));
    }

    #[test]
    fn separators_in_payload_are_rejected() {
        let prev = Block::genesis(0);
        for data in ["a,b", "a;b"] {
            let err = Miner::new().mine(&prev, data, 0).unwrap_err();
            assert!(matches!(err, NodeError::InvalidPayload(_)));
        }
    }
}
