//! Peer calls over HTTP against another node's `/api/v1` routes.
//!
//! Calls are blocking and must run off the async workers (the API layer
//! wraps them in `web::block`). Every request is bounded by the client
//! timeout; a timeout counts as an unreachable peer.

use std::collections::BTreeMap;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{Transport, Vote};
use crate::error::{ConfigError, NodeError};
use crate::node::NodeId;

pub const DELIVER_PATH: &str = "/api/v1/blocks/deliver/";
pub const CHAIN_DATA_PATH: &str = "/api/v1/chain/data/";

/// Body of a `deliver` reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeliverResponse {
    pub vote: Vote,
}

pub struct HttpTransport {
    client: Client,
    peers: BTreeMap<NodeId, String>,
}

impl HttpTransport {
    /// `peers` maps node ids to base URLs such as `http://127.0.0.1:8081`.
    pub fn new(peers: BTreeMap<NodeId, String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        let peers = peers
            .into_iter()
            .map(|(id, url)| (id, url.trim_end_matches('/').to_string()))
            .collect();
        Ok(Self { client, peers })
    }

    fn url(&self, to: NodeId, path: &str) -> Result<String, NodeError> {
        self.peers
            .get(&to)
            .map(|base| format!("{base}{path}"))
            .ok_or_else(|| NodeError::PeerUnreachable {
                peer: to,
                reason: "no address configured".into(),
            })
    }
}

fn unreachable(peer: NodeId, err: impl ToString) -> NodeError {
    NodeError::PeerUnreachable {
        peer,
        reason: err.to_string(),
    }
}

impl Transport for HttpTransport {
    fn propose_block(&self, from: NodeId, to: NodeId, block: &str) -> Result<Vote, NodeError> {
        let url = self.url(to, DELIVER_PATH)?;
        debug!("HTTP - node {from} proposing to node {to} at {url}");

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(block.to_string())
            .send()
            .map_err(|e| unreachable(to, e))?;

        let status = resp.status();
        if status.is_client_error() {
            // The peer could not accept what we sent.
            return Ok(Vote::Disagree);
        }
        if !status.is_success() {
            return Err(unreachable(to, format!("status {status}")));
        }

        let body: DeliverResponse = resp.json().map_err(|e| unreachable(to, e))?;
        Ok(body.vote)
    }

    fn fetch_chain(&self, from: NodeId, to: NodeId) -> Result<String, NodeError> {
        let url = self.url(to, CHAIN_DATA_PATH)?;
        debug!("HTTP - node {from} fetching chain from node {to} at {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| unreachable(to, e))?;
        resp.text().map_err(|e| unreachable(to, e))
    }
}
