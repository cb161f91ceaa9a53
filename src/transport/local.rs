//! In-process network: nodes in one address space, reached by id, with
//! connect/disconnect switches. A disconnected node can neither send nor
//! receive.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, Weak};

use log::debug;

use super::{Transport, Vote};
use crate::error::NodeError;
use crate::node::{Node, NodeId, Roster};

#[derive(Default)]
pub struct LocalNetwork {
    nodes: RwLock<BTreeMap<NodeId, Weak<Node>>>,
    disconnected: RwLock<HashSet<NodeId>>,
}

impl LocalNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Build `count` connected nodes with ids `0..count`, each knowing the
    /// full dense roster.
    pub fn spawn(count: usize, difficulty: u32) -> (Arc<Self>, Vec<Arc<Node>>) {
        let net = Self::new();
        let nodes = (0..count)
            .map(|id| {
                let transport: Arc<dyn Transport> = net.clone();
                let node = Arc::new(Node::new(Roster::dense(id, count), difficulty, transport));
                net.register(&node);
                node
            })
            .collect();
        (net, nodes)
    }

    pub fn register(&self, node: &Arc<Node>) {
        self.nodes
            .write()
            .expect("lock poisoned")
            .insert(node.id(), Arc::downgrade(node));
    }

    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    pub fn connect(&self, id: NodeId) {
        debug!("NET - connect node {id}");
        self.disconnected.write().expect("lock poisoned").remove(&id);
    }

    pub fn disconnect(&self, id: NodeId) {
        debug!("NET - disconnect node {id}");
        self.disconnected.write().expect("lock poisoned").insert(id);
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        !self.disconnected.read().expect("lock poisoned").contains(&id)
    }

    fn reach(&self, from: NodeId, to: NodeId) -> Result<Arc<Node>, NodeError> {
        let unreachable = |reason: &str| NodeError::PeerUnreachable {
            peer: to,
            reason: reason.to_string(),
        };

        if !self.is_connected(from) {
            return Err(unreachable("sender is disconnected"));
        }
        if !self.is_connected(to) {
            return Err(unreachable("receiver is disconnected"));
        }
        self.nodes
            .read()
            .expect("lock poisoned")
            .get(&to)
            .and_then(Weak::upgrade)
            .ok_or_else(|| unreachable("no such node"))
    }
}

impl Transport for LocalNetwork {
    fn propose_block(&self, from: NodeId, to: NodeId, block: &str) -> Result<Vote, NodeError> {
        let peer = self.reach(from, to)?;
        // A proposal the receiver cannot decode is a refusal, not a lost peer.
        Ok(peer.deliver(block).unwrap_or(Vote::Disagree))
    }

    fn fetch_chain(&self, from: NodeId, to: NodeId) -> Result<String, NodeError> {
        Ok(self.reach(from, to)?.chain_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_nodes_are_unreachable_both_ways() {
        let (net, nodes) = LocalNetwork::spawn(2, 0);
        assert!(net.fetch_chain(0, 1).is_ok());

        net.disconnect(1);
        assert!(!net.is_connected(1));
        assert!(matches!(
            net.fetch_chain(0, 1),
            Err(NodeError::PeerUnreachable { peer: 1, .. })
        ));
        assert!(net.fetch_chain(1, 0).is_err());

        net.connect(1);
        assert_eq!(net.fetch_chain(1, 0).unwrap(), nodes[0].chain_data());
    }

    #[test]
    fn unknown_node_is_unreachable() {
        let (net, _nodes) = LocalNetwork::spawn(1, 0);
        assert!(matches!(
            net.propose_block(0, 7, "x"),
            Err(NodeError::PeerUnreachable { peer: 7, .. })
        ));
    }

    #[test]
    fn garbage_proposal_is_a_disagreement() {
        let (net, _nodes) = LocalNetwork::spawn(2, 0);
        assert_eq!(net.propose_block(0, 1, "garbage").unwrap(), Vote::Disagree);
    }
}
