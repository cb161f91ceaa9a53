//! Per-node replication coordinator.
//!
//! Owns the chain store, the single pending-block slot and the difficulty
//! setting, and drives mining, broadcast and chain download through a
//! [`Transport`].

pub mod download;
pub mod roster;

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::blockchain::{
    Block, Blockchain, CancelToken, Miner, parse_chain, validate::MAX_DIFFICULTY, verify_links,
};
use crate::error::NodeError;
use crate::transport::{Transport, Vote};

pub use download::select_best_chain;
pub use roster::{NodeId, Roster, SelfDelivery};

/// Length and tip hash, read under one lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub length: usize,
    pub last_hash: String,
}

/// Result of pushing the pending block to the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Every member agreed.
    Accepted,
    /// `peer` disagreed; members visited before it kept the block.
    Rejected { peer: NodeId },
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeStats {
    pub id: NodeId,
    pub length: usize,
    pub difficulty: u32,
    pub pending: bool,
    pub coins: u64,
    pub last_interval_ms: Option<i64>,
}

pub struct Node {
    id: NodeId,
    roster: Roster,
    chain: Mutex<Blockchain>,
    pending: Mutex<Option<Block>>,
    difficulty: AtomicU32,
    coins: AtomicU64,
    mine_timeout: Option<Duration>,
    transport: Arc<dyn Transport>,
}

impl Node {
    pub fn new(roster: Roster, difficulty: u32, transport: Arc<dyn Transport>) -> Self {
        let id = roster.local();
        info!("NODE {id} - launched with genesis block (difficulty={difficulty})");
        Self {
            id,
            roster,
            chain: Mutex::new(Blockchain::new(difficulty)),
            pending: Mutex::new(None),
            difficulty: AtomicU32::new(difficulty),
            coins: AtomicU64::new(0),
            mine_timeout: None,
            transport,
        }
    }

    /// Bound every mining search by `timeout`.
    pub fn with_mine_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.mine_timeout = timeout;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty.load(Ordering::SeqCst)
    }

    /// Affects future mining and future validation only.
    pub fn set_difficulty(&self, difficulty: u32) -> Result<(), NodeError> {
        if difficulty > MAX_DIFFICULTY {
            return Err(NodeError::InvalidDifficulty(difficulty));
        }
        self.difficulty.store(difficulty, Ordering::SeqCst);
        debug!("NODE {} - difficulty set to {}", self.id, difficulty);
        Ok(())
    }

    pub fn coins(&self) -> u64 {
        self.coins.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> Option<Block> {
        self.pending.lock().expect("mutex poisoned").clone()
    }

    pub fn state(&self) -> NodeState {
        let (length, last_hash) = self.chain.lock().expect("mutex poisoned").state();
        NodeState { length, last_hash }
    }

    /// Full chain in wire form.
    pub fn chain_data(&self) -> String {
        self.chain.lock().expect("mutex poisoned").to_wire()
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.chain.lock().expect("mutex poisoned").blocks().to_vec()
    }

    pub fn is_valid_chain(&self) -> bool {
        self.chain.lock().expect("mutex poisoned").is_valid_chain()
    }

    /// Link validity and length of the same chain.
    pub fn validity(&self) -> (bool, usize) {
        let bc = self.chain.lock().expect("mutex poisoned");
        (bc.is_valid_chain(), bc.len())
    }

    pub fn stats(&self) -> NodeStats {
        let (length, last_interval_ms) = {
            let bc = self.chain.lock().expect("mutex poisoned");
            let blocks = bc.blocks();
            let interval = match blocks {
                // Peers may stamp blocks with any i64.
                [.., older, newer] if newer.index > 1 => {
                    Some(newer.timestamp.saturating_sub(older.timestamp).max(0))
                }
                _ => None,
            };
            (bc.len(), interval)
        };

        NodeStats {
            id: self.id,
            length,
            difficulty: self.difficulty(),
            pending: self.pending.lock().expect("mutex poisoned").is_some(),
            coins: self.coins(),
            last_interval_ms,
        }
    }

    /// Handle a block proposed by a peer (or by ourselves): append it if it
    /// extends the tip under the current difficulty.
    pub fn deliver(&self, wire: &str) -> Result<Vote, NodeError> {
        let block = Block::from_wire(wire)?;
        Ok(self.deliver_block(block))
    }

    fn deliver_block(&self, block: Block) -> Vote {
        let difficulty = self.difficulty();
        let index = block.index;
        let hash = block.hash.clone();

        let mut bc = self.chain.lock().expect("mutex poisoned");
        match bc.try_append(block, difficulty) {
            Ok(()) => {
                info!("NODE {} - appended block #{} (hash={})", self.id, index, hash);
                Vote::Agree
            }
            Err(reason) => {
                warn!(
                    "NODE {} - rejected block #{} (hash={}): {}; tip is #{}",
                    self.id,
                    index,
                    hash,
                    reason,
                    bc.last_block().index
                );
                Vote::Disagree
            }
        }
    }

    /// Mine a successor of the current tip and park it in the pending slot,
    /// replacing any earlier unbroadcast block. The chain is not touched.
    pub fn mine(&self, data: &str) -> Result<Block, NodeError> {
        self.mine_with(data, Miner::new())
    }

    /// Like [`Node::mine`], stoppable through `cancel`.
    pub fn mine_cancellable(&self, data: &str, cancel: CancelToken) -> Result<Block, NodeError> {
        self.mine_with(data, Miner::new().with_cancel(cancel))
    }

    fn mine_with(&self, data: &str, miner: Miner) -> Result<Block, NodeError> {
        let miner = match self.mine_timeout {
            Some(timeout) => miner.with_timeout(timeout),
            None => miner,
        };

        // Snapshot the tip; the search itself runs without the chain lock.
        let tip = self.chain.lock().expect("mutex poisoned").last_block().clone();
        let difficulty = self.difficulty();
        debug!(
            "NODE {} - mining on #{} at difficulty {}",
            self.id, tip.index, difficulty
        );

        let block = miner.mine(&tip, data, difficulty)?;

        let mut slot = self.pending.lock().expect("mutex poisoned");
        if let Some(old) = slot.replace(block.clone()) {
            debug!(
                "NODE {} - dropped unbroadcast block #{} (hash={})",
                self.id, old.index, old.hash
            );
        }
        Ok(block)
    }

    /// Send the pending block to every roster member, self included, in
    /// roster order. The first disagreement ends the broadcast; members that
    /// already accepted keep the block. An unreachable member aborts it with
    /// `PeerUnreachable`. The pending slot is consumed either way.
    pub fn broadcast(&self) -> Result<BroadcastOutcome, NodeError> {
        let block = self
            .pending
            .lock()
            .expect("mutex poisoned")
            .take()
            .ok_or(NodeError::NoPendingBlock)?;
        let wire = block.to_wire();
        info!("NODE {} - broadcasting block #{}", self.id, block.index);

        for &peer in self.roster.members() {
            let vote = if peer == self.id && self.roster.self_delivery() == SelfDelivery::Local {
                self.deliver_block(block.clone())
            } else {
                self.transport.propose_block(self.id, peer, &wire)?
            };

            match vote {
                Vote::Agree => debug!(
                    "NODE {} - node {} accepted block #{}",
                    self.id, peer, block.index
                ),
                Vote::Disagree => {
                    warn!(
                        "NODE {} - node {} rejected block #{}",
                        self.id, peer, block.index
                    );
                    return Ok(BroadcastOutcome::Rejected { peer });
                }
            }
        }

        let coins = self.coins.fetch_add(1, Ordering::SeqCst) + 1;
        info!("NODE {} - earned a coin, {} total", self.id, coins);
        Ok(BroadcastOutcome::Accepted)
    }

    /// Fetch every peer's chain and adopt the best one.
    ///
    /// Unreachable peers and chains with broken links are skipped; a chain
    /// that does not decode fails the whole download. With no usable chain
    /// the local chain is kept and `ChainUnavailable` is returned.
    pub fn download_chain(&self) -> Result<NodeState, NodeError> {
        let mut fetched = Vec::new();

        for peer in self.roster.peers() {
            let raw = match self.transport.fetch_chain(self.id, peer) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("NODE {} - skipping node {}: {}", self.id, peer, e);
                    continue;
                }
            };

            let blocks = parse_chain(&raw)?;
            if !blocks.is_empty() && !verify_links(&blocks) {
                warn!(
                    "NODE {} - skipping node {}: chain links do not verify",
                    self.id, peer
                );
                continue;
            }
            fetched.push((peer, blocks));
        }

        let (winner, blocks) = select_best_chain(fetched).ok_or_else(|| {
            warn!("NODE {} - failed to download a chain from any peer", self.id);
            NodeError::ChainUnavailable
        })?;

        let mut bc = self.chain.lock().expect("mutex poisoned");
        bc.replace(blocks);
        let (length, last_hash) = bc.state();
        info!(
            "NODE {} - adopted chain from node {} (length={}, tip={})",
            self.id, winner, length, last_hash
        );
        Ok(NodeState { length, last_hash })
    }
}
