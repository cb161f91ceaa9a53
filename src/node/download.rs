//! Longest-chain selection over chains fetched from peers.

use log::info;

use super::NodeId;
use crate::blockchain::Block;

/// Pick the best chain among `candidates`, visited in the given order.
///
/// A strictly longer chain always wins. On equal length the chain whose last
/// block has the strictly earlier timestamp wins; a full tie keeps the one
/// seen first. Empty chains never win.
pub fn select_best_chain<I>(candidates: I) -> Option<(NodeId, Vec<Block>)>
where
    I: IntoIterator<Item = (NodeId, Vec<Block>)>,
{
    let mut best: Option<(NodeId, Vec<Block>)> = None;

    for (peer, chain) in candidates {
        let Some(last) = chain.last() else {
            continue;
        };

        let better = match &best {
            None => true,
            Some((_, current)) => {
                if chain.len() != current.len() {
                    chain.len() > current.len()
                } else {
                    current
                        .last()
                        .is_some_and(|cur_last| last.timestamp < cur_last.timestamp)
                }
            }
        };

        if better {
            info!("DOWNLOAD - chain from node {} (length {}) is the new best", peer, chain.len());
            best = Some((peer, chain));
        }
    }

    best
}
