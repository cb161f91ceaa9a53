use std::collections::HashSet;

use crate::error::ConfigError;

/// Dense integer address of a node.
pub type NodeId = usize;

/// How the originator's own copy of a broadcast block is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfDelivery {
    /// Apply it directly, in roster order, without touching the transport.
    #[default]
    Local,
    /// Send it through the transport like any other peer.
    ViaTransport,
}

/// Ordered membership of the network as seen by one node. Broadcast visits
/// members in this order (the local node included); download visits them in
/// this order with the local node skipped.
#[derive(Debug, Clone)]
pub struct Roster {
    local: NodeId,
    members: Vec<NodeId>,
    self_delivery: SelfDelivery,
}

impl Roster {
    pub fn new(local: NodeId, members: Vec<NodeId>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for id in &members {
            if !seen.insert(*id) {
                return Err(ConfigError::DuplicatePeer(*id));
            }
        }
        if !seen.contains(&local) {
            return Err(ConfigError::SelfNotInRoster(local));
        }
        Ok(Self {
            local,
            members,
            self_delivery: SelfDelivery::default(),
        })
    }

    /// Nodes `0..count`, as spawned by a test harness.
    pub fn dense(local: NodeId, count: usize) -> Self {
        let mut members: Vec<NodeId> = (0..count).collect();
        if !members.contains(&local) {
            members.push(local);
        }
        Self {
            local,
            members,
            self_delivery: SelfDelivery::default(),
        }
    }

    /// A network of one.
    pub fn solo(local: NodeId) -> Self {
        Self::dense(local, 0)
    }

    pub fn with_self_delivery(mut self, self_delivery: SelfDelivery) -> Self {
        self.self_delivery = self_delivery;
        self
    }

    pub fn local(&self) -> NodeId {
        self.local
    }

    pub fn self_delivery(&self) -> SelfDelivery {
        self.self_delivery
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Members other than the local node, in roster order.
    pub fn peers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.members.iter().copied().filter(move |id| *id != self.local)
    }
}
