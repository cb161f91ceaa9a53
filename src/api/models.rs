use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::node::{Node, NodeId};

/// Shared application state: the node this process runs.
pub struct AppState {
    pub node: Arc<Node>,
}

impl AppState {
    pub fn new(node: Arc<Node>) -> Self {
        Self { node }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize, Deserialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub chain: Vec<Block>,
}

#[derive(Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}

/* ---------- Mining API Models ---------- */

#[derive(Deserialize)]
pub struct MineRequest {
    pub data: String,
}

#[derive(Serialize, Deserialize)]
pub struct MineResponse {
    /// Wire form of the mined block.
    pub block: String,
    pub index: u64,
    pub hash: String,
    pub nonce: i64,
    pub difficulty: u32,
}

#[derive(Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub accepted: bool,
    pub rejected_by: Option<NodeId>,
}

#[derive(Serialize, Deserialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
}

#[derive(Serialize, Deserialize)]
pub struct SetDifficultyRequest {
    pub difficulty: u32,
}
