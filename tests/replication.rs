use std::sync::Arc;
use std::thread;

use replichain::{
    Block, BroadcastOutcome, LocalNetwork, Miner, Node, NodeError, Roster, SelfDelivery,
    Transport, Vote,
};

/// Two leading hex zeros.
const DIFFICULTY: u32 = 8;

fn assert_all_agree(nodes: &[Arc<Node>], length: usize) -> String {
    let first = nodes[0].state();
    for node in nodes {
        let st = node.state();
        assert_eq!(st.length, length, "node {} length", node.id());
        assert_eq!(st.last_hash, first.last_hash, "node {} tip", node.id());
        assert!(node.is_valid_chain(), "node {} chain links", node.id());
    }
    first.last_hash
}

#[test]
fn initial_state_is_genesis_only() {
    let (_net, nodes) = LocalNetwork::spawn(3, DIFFICULTY);
    let hash = assert_all_agree(&nodes, 1);
    assert_eq!(hash, Block::genesis(DIFFICULTY).hash);
}

#[test]
fn single_node_mines_and_broadcasts_to_itself() {
    let (_net, nodes) = LocalNetwork::spawn(1, DIFFICULTY);
    let node = &nodes[0];

    node.mine("Node0 mine").unwrap();
    assert_eq!(node.state().length, 1);
    assert_eq!(node.broadcast().unwrap(), BroadcastOutcome::Accepted);

    let st = node.state();
    assert_eq!(st.length, 2);
    assert!(st.last_hash.starts_with("00"));
}

#[test]
fn three_nodes_share_one_broadcast_block() {
    let (_net, nodes) = LocalNetwork::spawn(3, DIFFICULTY);

    let mined = nodes[0].mine("Node0 mine").unwrap();
    for node in &nodes {
        assert_eq!(node.state().length, 1);
    }
    assert_eq!(nodes[0].broadcast().unwrap(), BroadcastOutcome::Accepted);

    let hash = assert_all_agree(&nodes, 2);
    assert_eq!(hash, mined.hash);
    assert_eq!(nodes[0].coins(), 1);
    assert_eq!(nodes[1].coins(), 0);
}

#[test]
fn rotating_miners_extend_one_chain() {
    let (_net, nodes) = LocalNetwork::spawn(3, DIFFICULTY);

    for round in 0..6 {
        let node = &nodes[round % nodes.len()];
        node.mine(&format!("Test node {} mine", node.id())).unwrap();
        assert_eq!(node.broadcast().unwrap(), BroadcastOutcome::Accepted);
    }

    assert_all_agree(&nodes, 7);
    for node in &nodes {
        assert_eq!(node.coins(), 2);
    }
}

#[test]
fn concurrent_broadcasts_settle_on_one_block() {
    let (_net, nodes) = LocalNetwork::spawn(4, DIFFICULTY);

    // Every candidate is built on genesis.
    thread::scope(|s| {
        for node in &nodes {
            s.spawn(move || node.mine(&format!("Thread node {} mine", node.id())).unwrap());
        }
    });

    let outcomes: Vec<BroadcastOutcome> = thread::scope(|s| {
        let handles: Vec<_> = nodes
            .iter()
            .map(|node| s.spawn(move || node.broadcast().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Node 0 is first in every broadcast, so only its first choice spreads.
    let accepted = outcomes
        .iter()
        .filter(|o| **o == BroadcastOutcome::Accepted)
        .count();
    assert_eq!(accepted, 1);
    assert!(
        outcomes
            .iter()
            .all(|o| matches!(o, BroadcastOutcome::Accepted | BroadcastOutcome::Rejected { peer: 0 }))
    );
    assert_all_agree(&nodes, 2);
}

#[test]
fn reconnected_node_catches_up_by_download() {
    let (net, nodes) = LocalNetwork::spawn(4, DIFFICULTY);

    net.disconnect(3);
    for round in 0..2 {
        let node = &nodes[round % 3];
        node.mine(&format!("Test node {} mine", node.id())).unwrap();
        // Node 3 is last in the roster: everyone before it keeps the block.
        assert!(matches!(
            node.broadcast(),
            Err(NodeError::PeerUnreachable { peer: 3, .. })
        ));
    }

    let hash = assert_all_agree(&nodes[..3], 3);
    assert_eq!(nodes[3].state().length, 1);

    net.connect(3);
    let st = nodes[3].download_chain().unwrap();
    assert_eq!(st.length, 3);
    assert_eq!(st.last_hash, hash);
    assert_all_agree(&nodes, 3);
}

#[test]
fn download_while_disconnected_is_unavailable() {
    let (net, nodes) = LocalNetwork::spawn(3, DIFFICULTY);
    net.disconnect(2);
    assert!(matches!(
        nodes[2].download_chain(),
        Err(NodeError::ChainUnavailable)
    ));
    assert_eq!(nodes[2].state().length, 1);
}

#[test]
fn rejection_mid_roster_leaves_earlier_members_ahead() {
    let (_net, nodes) = LocalNetwork::spawn(4, DIFFICULTY);
    // Node 2 now demands 16 leading zeros.
    nodes[2].set_difficulty(64).unwrap();

    nodes[0].mine("Node0 mine").unwrap();
    assert_eq!(
        nodes[0].broadcast().unwrap(),
        BroadcastOutcome::Rejected { peer: 2 }
    );

    let lengths: Vec<usize> = nodes.iter().map(|n| n.state().length).collect();
    assert_eq!(lengths, vec![2, 2, 1, 1]);
    assert_eq!(nodes[0].coins(), 0);
    assert!(nodes[0].pending().is_none());
}

#[test]
fn download_breaks_length_ties_by_earliest_last_timestamp() {
    let (_net, nodes) = LocalNetwork::spawn(3, DIFFICULTY);
    let miner = Miner::new();
    let genesis = Block::genesis(DIFFICULTY);

    // Nodes 1 and 2 grow different chains of length 3.
    for (node, last_ts) in [(&nodes[1], 2_000), (&nodes[2], 1_000)] {
        let a = miner
            .mine_at(&genesis, &format!("n{}-a", node.id()), DIFFICULTY, 500)
            .unwrap();
        let b = miner
            .mine_at(&a, &format!("n{}-b", node.id()), DIFFICULTY, last_ts)
            .unwrap();
        assert_eq!(node.deliver(&a.to_wire()).unwrap(), Vote::Agree);
        assert_eq!(node.deliver(&b.to_wire()).unwrap(), Vote::Agree);
    }

    let st = nodes[0].download_chain().unwrap();
    assert_eq!(st, nodes[2].state());
    assert_ne!(st.last_hash, nodes[1].state().last_hash);
}

#[test]
fn download_prefers_longest_chain() {
    let (net, nodes) = LocalNetwork::spawn(3, DIFFICULTY);

    net.disconnect(2);
    nodes[0].mine("one").unwrap();
    let _ = nodes[0].broadcast();
    net.connect(2);

    nodes[2].mine("lonely").unwrap();
    // Node 0 and 1 are a block ahead; node 2's own block does not fit there.
    assert_eq!(
        nodes[2].broadcast().unwrap(),
        BroadcastOutcome::Rejected { peer: 0 }
    );

    let st = nodes[2].download_chain().unwrap();
    assert_eq!(st, nodes[0].state());
}

#[test]
fn self_delivery_through_transport() {
    let net = LocalNetwork::new();
    let nodes: Vec<Arc<Node>> = (0..2)
        .map(|id| {
            let roster = Roster::dense(id, 2).with_self_delivery(SelfDelivery::ViaTransport);
            let transport: Arc<dyn Transport> = net.clone();
            let node = Arc::new(Node::new(roster, DIFFICULTY, transport));
            net.register(&node);
            node
        })
        .collect();

    nodes[1].mine("via transport").unwrap();
    assert_eq!(nodes[1].broadcast().unwrap(), BroadcastOutcome::Accepted);
    assert_all_agree(&nodes, 2);

    // A disconnected sender cannot even reach itself.
    net.disconnect(0);
    nodes[0].mine("stuck").unwrap();
    assert!(matches!(
        nodes[0].broadcast(),
        Err(NodeError::PeerUnreachable { peer: 0, .. })
    ));
    assert_eq!(nodes[0].state().length, 2);
}
