//! A small peer-replicated proof-of-work chain.
//!
//! Each node mines blocks on its own tip, proposes them to every member of
//! its roster, and recovers from lag by adopting the longest chain its peers
//! hold.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod node;
pub mod transport;

pub use blockchain::{Block, Blockchain, Miner};
pub use config::NodeConfig;
pub use error::{ConfigError, NodeError};
pub use node::{BroadcastOutcome, Node, NodeId, NodeState, Roster, SelfDelivery};
pub use transport::{HttpTransport, LocalNetwork, Transport, Vote};
