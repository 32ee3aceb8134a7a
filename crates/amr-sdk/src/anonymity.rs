//! Anonymity-set reconstruction from the ledger's event log.
//!
//! Trees are rebuilt from genesis on every operation and never persisted;
//! the event log is the only durable store. The withdraw tree covers every
//! accepted commitment, the reward tree only those at or before the most
//! recent reward checkpoint.

use tracing::debug;

use crate::error::{ClientError, Result};
use crate::ledger::{CommitmentEvent, LedgerGateway};
use crate::merkle::{MerkleProof, MerkleTree};

/// Ordered leaves from raw events. Transports may deliver events out of
/// order, so the declared leaf index decides placement, not arrival order.
fn leaves_from_events(mut events: Vec<CommitmentEvent>) -> Vec<[u8; 32]> {
    events.sort_by_key(|e| e.leaf_index);
    events.into_iter().map(|e| e.commitment).collect()
}

/// Rebuild the withdraw-path tree: all commitments, genesis to latest.
pub async fn build_withdraw_tree<L: LedgerGateway>(
    ledger: &L,
    tree_height: usize,
) -> Result<MerkleTree> {
    let events = ledger.commitment_events(0, None).await?;
    debug!("rebuilding withdraw tree from {} deposit events", events.len());
    MerkleTree::new(tree_height, &leaves_from_events(events))
}

/// Rebuild the reward-path tree: commitments up to the latest checkpoint.
pub async fn build_reward_tree<L: LedgerGateway>(
    ledger: &L,
    tree_height: usize,
) -> Result<MerkleTree> {
    let checkpoints = ledger.reward_checkpoints().await?;
    let checkpoint = checkpoints.last().ok_or(ClientError::NoRewardCheckpoint)?;

    let events = ledger
        .commitment_events(0, Some(checkpoint.update_at_block))
        .await?;
    debug!(
        "rebuilding reward tree from {} deposit events up to block {}",
        events.len(),
        checkpoint.update_at_block
    );
    MerkleTree::new(tree_height, &leaves_from_events(events))
}

/// Locate the commitment's leaf and derive its sibling path.
pub fn prove_membership(tree: &MerkleTree, commitment: &[u8; 32]) -> Result<MerkleProof> {
    let leaf_index = tree
        .leaf_index_of(commitment)
        .ok_or(ClientError::CommitmentNotFound)?;
    tree.proof(leaf_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(leaf_index: u64, tag: u8) -> CommitmentEvent {
        let mut commitment = [0u8; 32];
        commitment[31] = tag;
        CommitmentEvent {
            commitment,
            leaf_index,
            timestamp: 1_700_000_000 + leaf_index,
            block_number: 100 + leaf_index,
            tx_hash: format!("0x{:064x}", leaf_index),
        }
    }

    #[test]
    fn test_leaves_follow_declared_indices() {
        // shuffled arrival order
        let events = vec![event(2, 30), event(0, 10), event(3, 40), event(1, 20)];
        let leaves = leaves_from_events(events);

        let tags: Vec<u8> = leaves.iter().map(|l| l[31]).collect();
        assert_eq!(tags, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_membership_absent_commitment() {
        let leaves = leaves_from_events(vec![event(0, 1), event(1, 2)]);
        let tree = MerkleTree::new(8, &leaves).unwrap();

        let mut stranger = [0u8; 32];
        stranger[31] = 99;
        match prove_membership(&tree, &stranger) {
            Err(ClientError::CommitmentNotFound) => {}
            other => panic!("expected CommitmentNotFound, got {:?}", other.map(|p| p.root)),
        }
    }

    #[test]
    fn test_membership_path_verifies() {
        let leaves = leaves_from_events(vec![event(0, 1), event(1, 2), event(2, 3)]);
        let tree = MerkleTree::new(8, &leaves).unwrap();

        let proof = prove_membership(&tree, &leaves[1]).unwrap();
        assert!(MerkleTree::verify_proof(&leaves[1], &proof).unwrap());
        assert_eq!(proof.root, tree.root());
    }
}
