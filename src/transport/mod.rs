//! How a node reaches its peers.
//!
//! The coordinator only ever makes two synchronous calls: propose a block and
//! fetch a whole chain. Anything that fails to produce a reply is reported as
//! `NodeError::PeerUnreachable`.

pub mod http;
pub mod local;

use serde::{Deserialize, Serialize};

use crate::error::NodeError;
use crate::node::NodeId;

pub use http::HttpTransport;
pub use local::LocalNetwork;

/// A peer's answer to a proposed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Agree,
    Disagree,
}

impl Vote {
    pub fn from_accepted(accepted: bool) -> Self {
        if accepted { Vote::Agree } else { Vote::Disagree }
    }
}

pub trait Transport: Send + Sync {
    /// Send a wire-encoded block to `to` and wait for its vote.
    fn propose_block(&self, from: NodeId, to: NodeId, block: &str) -> Result<Vote, NodeError>;

    /// Ask `to` for its full wire-encoded chain.
    fn fetch_chain(&self, from: NodeId, to: NodeId) -> Result<String, NodeError>;
}
