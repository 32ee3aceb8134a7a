//! Fixed-height Merkle tree over the anonymity set.
//!
//! Leaves are commitments in leaf-index order; positions beyond the leaf
//! count take precomputed empty-subtree values. Internal nodes use the same
//! Poseidon parameter set as the commitments.

use serde::{Deserialize, Serialize};

use crate::crypto::poseidon_hash;
use crate::error::{ClientError, Result};

/// Tree height used by deployed pools.
pub const DEFAULT_TREE_HEIGHT: usize = 20;

const ZERO_LEAF: [u8; 32] = [0u8; 32];

/// Sibling path from a leaf to the root. `path_indices[i]` is the leaf-side
/// position at level `i`: 0 when the current node is the left child.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MerkleProof {
    pub root: [u8; 32],
    pub path_elements: Vec<[u8; 32]>,
    pub path_indices: Vec<u8>,
}

pub struct MerkleTree {
    height: usize,
    /// layers[0] are the leaves, layers[height] the root layer.
    layers: Vec<Vec<[u8; 32]>>,
    /// zeros[l] is the root of an empty subtree of depth l.
    zeros: Vec<[u8; 32]>,
}

impl MerkleTree {
    pub fn new(height: usize, leaves: &[[u8; 32]]) -> Result<Self> {
        if height == 0 || height > 32 {
            return Err(ClientError::Crypto(format!(
                "unsupported tree height {}",
                height
            )));
        }
        if height < 32 && leaves.len() > 1usize << height {
            return Err(ClientError::Crypto(format!(
                "{} leaves exceed tree capacity 2^{}",
                leaves.len(),
                height
            )));
        }

        let mut zeros = Vec::with_capacity(height + 1);
        zeros.push(ZERO_LEAF);
        for level in 0..height {
            let zero = hash_pair(&zeros[level], &zeros[level])?;
            zeros.push(zero);
        }

        let mut layers = Vec::with_capacity(height + 1);
        layers.push(leaves.to_vec());
        for level in 0..height {
            let below = &layers[level];
            let mut above = Vec::with_capacity(below.len().div_ceil(2));
            for pair in below.chunks(2) {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(zeros[level]);
                above.push(hash_pair(&left, &right)?);
            }
            layers.push(above);
        }

        Ok(Self {
            height,
            layers,
            zeros,
        })
    }

    pub fn root(&self) -> [u8; 32] {
        self.layers[self.height]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.height])
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn leaves(&self) -> &[[u8; 32]] {
        &self.layers[0]
    }

    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    pub fn leaf_index_of(&self, commitment: &[u8; 32]) -> Option<usize> {
        self.layers[0].iter().position(|leaf| leaf == commitment)
    }

    /// Sibling path for the leaf at `leaf_index`.
    pub fn proof(&self, leaf_index: usize) -> Result<MerkleProof> {
        if leaf_index >= self.len() {
            return Err(ClientError::CommitmentNotFound);
        }

        let mut path_elements = Vec::with_capacity(self.height);
        let mut path_indices = Vec::with_capacity(self.height);
        let mut index = leaf_index;
        for level in 0..self.height {
            let sibling = self.layers[level]
                .get(index ^ 1)
                .copied()
                .unwrap_or(self.zeros[level]);
            path_elements.push(sibling);
            path_indices.push((index & 1) as u8);
            index >>= 1;
        }

        Ok(MerkleProof {
            root: self.root(),
            path_elements,
            path_indices,
        })
    }

    /// Recompute the root from a leaf and its path.
    pub fn verify_proof(leaf: &[u8; 32], proof: &MerkleProof) -> Result<bool> {
        let mut current = *leaf;
        for (element, bit) in proof.path_elements.iter().zip(&proof.path_indices) {
            current = if *bit == 0 {
                hash_pair(&current, element)?
            } else {
                hash_pair(element, &current)?
            };
        }
        Ok(current == proof.root)
    }
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> Result<[u8; 32]> {
    poseidon_hash(&[left.as_slice(), right.as_slice()])
}
