//! Node configuration from the environment. `main` loads `.env` first.
//!
//! Recognized variables:
//! - `HOST`, `PORT` - listen address, default `127.0.0.1:8080`
//! - `NODE_ID` - this node's id, default `0`
//! - `PEERS` - ordered roster as `id=url` pairs joined by commas; empty means a network of one
//! - `DIFFICULTY` - proof-of-work bits, default 20
//! - `PEER_TIMEOUT_MS` - per-peer request timeout, default 5000
//! - `MINE_TIMEOUT_MS` - optional bound on one mining search

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::DEFAULT_DIFFICULTY;
use crate::error::ConfigError;
use crate::node::{NodeId, Roster};

const DEFAULT_PEER_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub node_id: NodeId,
    /// Roster order with each member's base URL.
    pub peers: Vec<(NodeId, String)>,
    pub difficulty: u32,
    pub peer_timeout: Duration,
    pub mine_timeout: Option<Duration>,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or("PORT", get("PORT"), 8080)?;
        let node_id = parse_or("NODE_ID", get("NODE_ID"), 0)?;
        let difficulty = parse_or("DIFFICULTY", get("DIFFICULTY"), DEFAULT_DIFFICULTY)?;
        let peer_timeout = Duration::from_millis(parse_or(
            "PEER_TIMEOUT_MS",
            get("PEER_TIMEOUT_MS"),
            DEFAULT_PEER_TIMEOUT_MS,
        )?);
        let mine_timeout = get("MINE_TIMEOUT_MS")
            .map(|v| parse::<u64>("MINE_TIMEOUT_MS", &v).map(Duration::from_millis))
            .transpose()?;
        let peers = match get("PEERS") {
            Some(raw) => parse_peers(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            host,
            port,
            node_id,
            peers,
            difficulty,
            peer_timeout,
            mine_timeout,
        })
    }

    /// The ordered roster; a node with no `PEERS` is alone.
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        if self.peers.is_empty() {
            return Ok(Roster::solo(self.node_id));
        }
        Roster::new(self.node_id, self.peers.iter().map(|(id, _)| *id).collect())
    }

    /// Base URLs of every member except this node.
    pub fn peer_urls(&self) -> BTreeMap<NodeId, String> {
        self.peers
            .iter()
            .filter(|(id, _)| *id != self.node_id)
            .cloned()
            .collect()
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |v| parse(key, &v))
}

fn parse_peers(raw: &str) -> Result<Vec<(NodeId, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, url) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidPeer(entry.to_string()))?;
            let id = id
                .trim()
                .parse::<NodeId>()
                .map_err(|_| ConfigError::InvalidPeer(entry.to_string()))?;
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::InvalidPeer(entry.to_string()));
            }
            Ok((id, url.to_string()))
        })
        .collect()
}
