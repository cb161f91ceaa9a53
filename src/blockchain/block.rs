use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{
    BLOCK_SEPARATOR, FIELD_SEPARATOR, GENESIS_DATA, GENESIS_HASH, GENESIS_PREVIOUS_HASH,
    GENESIS_TIMESTAMP,
};
use crate::error::NodeError;

/// Number of comma-separated fields in the wire form of a block.
const WIRE_FIELDS: usize = 7;

/// A single link in the chain.
///
/// Blocks are never mutated after construction; a rejected candidate is
/// simply dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub previous_hash: String,
    pub hash: String,
    pub data: String,
    pub timestamp: i64, // Unix millis (UTC)
    pub difficulty: u32,
    pub nonce: i64,
}

impl Block {
    /// The fixed, unmined block at index 0. Every call returns the same content.
    pub fn genesis(difficulty: u32) -> Self {
        Self {
            index: 0,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
            data: GENESIS_DATA.to_string(),
            timestamp: GENESIS_TIMESTAMP,
            difficulty,
            nonce: 0,
        }
    }

    /// Assemble a block whose hash was already found for `nonce`.
    pub(crate) fn sealed(header: &BlockHeader, nonce: i64, hash: String) -> Self {
        Self {
            index: header.index,
            previous_hash: header.previous_hash.clone(),
            hash,
            data: header.data.clone(),
            timestamp: header.timestamp,
            difficulty: header.difficulty,
            nonce,
        }
    }

    /// Recompute the digest from this block's own fields.
    pub fn compute_hash(&self) -> String {
        BlockHeader::of(self).hash_with_nonce(self.nonce)
    }

    /// True when the cached `hash` is the digest of the other fields.
    /// Genesis carries a sentinel hash and never passes this check.
    pub fn hash_is_intact(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Serialize as `hash,index,previous_hash,data,timestamp,difficulty,nonce`.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }

    /// Parse the seven-field wire form. Any missing, extra or unparsable
    /// field is a `MalformedBlock`.
    pub fn from_wire(s: &str) -> Result<Self, NodeError> {
        let fields: Vec<&str> = s.split(FIELD_SEPARATOR).collect();
        if fields.len() != WIRE_FIELDS {
            return Err(NodeError::MalformedBlock(format!(
                "expected {WIRE_FIELDS} fields, found {} in '{s}'",
                fields.len()
            )));
        }

        Ok(Self {
            hash: fields[0].to_string(),
            index: parse_field(fields[1], "index")?,
            previous_hash: fields[2].to_string(),
            data: fields[3].to_string(),
            timestamp: parse_field(fields[4], "timestamp")?,
            difficulty: parse_field(fields[5], "difficulty")?,
            nonce: parse_field(fields[6], "nonce")?,
        })
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{hash}{sep}{index}{sep}{prev}{sep}{data}{sep}{ts}{sep}{diff}{sep}{nonce}",
            sep = FIELD_SEPARATOR,
            hash = self.hash,
            index = self.index,
            prev = self.previous_hash,
            data = self.data,
            ts = self.timestamp,
            diff = self.difficulty,
            nonce = self.nonce,
        )
    }
}

impl FromStr for Block {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Block::from_wire(s)
    }
}

fn parse_field<T>(raw: &str, name: &str) -> Result<T, NodeError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| NodeError::MalformedBlock(format!("{name} '{raw}': {e}")))
}

/// Everything that goes into a block's digest except the nonce.
#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub index: u64,
    pub previous_hash: String,
    pub data: String,
    pub timestamp: i64,
    pub difficulty: u32,
}

impl BlockHeader {
    pub fn of(block: &Block) -> Self {
        Self {
            index: block.index,
            previous_hash: block.previous_hash.clone(),
            data: block.data.clone(),
            timestamp: block.timestamp,
            difficulty: block.difficulty,
        }
    }

    /// The nonce-less preimage `,index,previous_hash,data,timestamp,difficulty,`.
    /// Appending the nonce gives the wire form minus its leading hash field.
    pub fn preimage_prefix(&self) -> String {
        let sep = FIELD_SEPARATOR;
        format!(
            "{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}",
            self.index, self.previous_hash, self.data, self.timestamp, self.difficulty
        )
    }

    pub fn hash_with_nonce(&self, nonce: i64) -> String {
        hash_preimage(&self.preimage_prefix(), nonce)
    }
}

/// SHA-256 over `prefix || nonce`, hex encoded.
pub(crate) fn hash_preimage(prefix: &str, nonce: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether `data` can travel inside the wire format unchanged.
pub fn is_wire_safe(data: &str) -> bool {
    !data.contains(FIELD_SEPARATOR) && !data.contains(BLOCK_SEPARATOR)
}
