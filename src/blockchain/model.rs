use super::validate::{Rejection, check_next};
use super::{BLOCK_SEPARATOR, Block, GENESIS_HASH};
use crate::error::NodeError;

/// One node's in-memory chain. Index 0 is always the genesis block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    chain: Vec<Block>,
}

impl Blockchain {
    /// Initialize a new chain holding only the genesis block.
    pub fn new(genesis_difficulty: u32) -> Self {
        Self {
            chain: vec![Block::genesis(genesis_difficulty)],
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Length and tip hash read together.
    pub fn state(&self) -> (usize, String) {
        (self.len(), self.last_block().hash.clone())
    }

    /// Validate `block` against the tip under `difficulty` and append it.
    /// On rejection the chain is left untouched.
    pub fn try_append(&mut self, block: Block, difficulty: u32) -> Result<(), Rejection> {
        check_next(&block, self.last_block(), difficulty)?;
        self.chain.push(block);
        Ok(())
    }

    pub fn append(&mut self, block: Block, difficulty: u32) -> bool {
        self.try_append(block, difficulty).is_ok()
    }

    /// Swap in a whole new sequence. Only chain download calls this;
    /// `new_chain` must hold at least the genesis block.
    pub fn replace(&mut self, new_chain: Vec<Block>) {
        debug_assert!(!new_chain.is_empty(), "replacement chain lost its genesis");
        self.chain = new_chain;
    }

    /// Serialize as `block0;block1;...;blockN`, genesis first.
    pub fn to_wire(&self) -> String {
        self.chain
            .iter()
            .map(Block::to_wire)
            .collect::<Vec<_>>()
            .join(&BLOCK_SEPARATOR.to_string())
    }

    /// Check genesis and index/previous-hash continuity of the stored chain.
    pub fn is_valid_chain(&self) -> bool {
        verify_links(&self.chain)
    }
}

/// Decode a serialized chain. An empty string is an empty chain; any bad
/// block fails the whole decode.
pub fn parse_chain(s: &str) -> Result<Vec<Block>, NodeError> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(BLOCK_SEPARATOR).map(Block::from_wire).collect()
}

/// Structural check of a chain: a genesis block at 0, then every block
/// pointing at its predecessor's hash with the next index. Proof-of-work is
/// not re-checked, since difficulty changes are not retroactive.
pub fn verify_links(blocks: &[Block]) -> bool {
    let Some(genesis) = blocks.first() else {
        return false;
    };
    if genesis.index != 0 || genesis.hash != GENESIS_HASH {
        return false;
    }

    blocks
        .windows(2)
        .all(|pair| pair[1].index == pair[0].index + 1 && pair[1].previous_hash == pair[0].hash)
}
