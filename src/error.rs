//! Error types shared by the chain, the node coordinator and the HTTP layer.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::node::NodeId;

/// Failures of a node-level operation.
///
/// A peer refusing a proposed block is not an error: it travels back as
/// `Vote::Disagree` / `BroadcastOutcome::Rejected`.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Wire text did not decode into a block (wrong field count or a bad number).
    #[error("malformed block: {0}")]
    MalformedBlock(String),

    /// Broadcast requested while the pending slot is empty.
    #[error("no pending block to broadcast")]
    NoPendingBlock,

    /// Download found no usable chain on any peer.
    #[error("no peer chain available")]
    ChainUnavailable,

    /// Transport failure talking to a peer.
    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: NodeId, reason: String },

    /// Every nonce was tried without meeting the difficulty prefix.
    #[error("nonce space exhausted without meeting difficulty")]
    ProofOfWorkExhausted,

    /// Mining stopped through its cancel token or deadline.
    #[error("mining cancelled")]
    MiningCancelled,

    /// Difficulty above what a SHA-256 hex digest can satisfy.
    #[error("difficulty {0} is out of range")]
    InvalidDifficulty(u32),

    /// Payload cannot be carried by the block wire format.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ResponseError for NodeError {
    fn status_code(&self) -> StatusCode {
        match self {
            NodeError::MalformedBlock(_)
            | NodeError::InvalidPayload(_)
            | NodeError::InvalidDifficulty(_) => StatusCode::BAD_REQUEST,
            NodeError::NoPendingBlock => StatusCode::CONFLICT,
            NodeError::ChainUnavailable | NodeError::PeerUnreachable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            NodeError::ProofOfWorkExhausted | NodeError::MiningCancelled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse {key}='{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid PEERS entry '{0}' (expected id=url)")]
    InvalidPeer(String),

    #[error("node {0} is missing from PEERS")]
    SelfNotInRoster(NodeId),

    #[error("duplicate node id {0} in PEERS")]
    DuplicatePeer(NodeId),

    #[error("failed to build peer client: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            NodeError::MalformedBlock("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(NodeError::NoPendingBlock.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            NodeError::ChainUnavailable.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            NodeError::PeerUnreachable {
                peer: 3,
                reason: "disconnected".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            NodeError::ProofOfWorkExhausted.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn unreachable_message_names_peer() {
        let err = NodeError::PeerUnreachable {
            peer: 2,
            reason: "timeout".into(),
        };
        assert_eq!(err.to_string(), "peer 2 unreachable: timeout");
    }
}
