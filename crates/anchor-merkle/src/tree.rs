//! # Merkle Tree Construction
//!
//! Binary Merkle tree over leaf hashes with every level retained.
//!
//! ## Algorithm
//!
//! Nodes pair left-to-right; a trailing node with no partner is paired
//! with itself. Construction is O(n), proofs are O(log n), and the
//! retained levels make proof extraction a pure array walk with no
//! rehashing.

use crate::error::MerkleError;
use crate::proof::{Position, ProofNode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::Hash;

/// Domain prefix for internal-node digests. Distinct from the leaf
/// prefix so a leaf can never masquerade as an internal node.
pub const NODE_DOMAIN: &[u8] = b"ledger-anchor:node:v1\0";

/// Hash two child nodes into their parent.
pub fn node_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// A fully materialized Merkle tree.
///
/// `levels[0]` holds the leaves in batch member order; the last level
/// holds exactly the root. A single-leaf tree has one level and its
/// root equals the leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree over the given leaves.
    ///
    /// # Errors
    ///
    /// Returns `MerkleError::EmptyTree` for an empty slice; an anchored
    /// batch always commits to at least one transaction.
    pub fn build(leaves: &[Hash]) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }

        let mut levels: Vec<Vec<Hash>> = vec![leaves.to_vec()];

        while levels.last().map_or(0, Vec::len) > 1 {
            let level = &levels[levels.len() - 1];
            let mut next_level = Vec::with_capacity((level.len() + 1) / 2);

            for chunk in level.chunks(2) {
                let left = &chunk[0];
                let right = chunk.get(1).unwrap_or(left); // Duplicate last if odd
                next_level.push(node_hash(left, right));
            }

            levels.push(next_level);
        }

        Ok(Self { levels })
    }

    /// The root hash.
    pub fn root(&self) -> Hash {
        // build() guarantees a final single-element level
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of internal levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// All retained levels, leaves first.
    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    /// Extract the sibling path for the leaf at `leaf_index`.
    ///
    /// Walks the retained levels bottom-up: the sibling of position `i`
    /// is `i + 1` (even) or `i - 1` (odd); a trailing node with no
    /// partner uses itself as a right sibling, mirroring construction.
    pub fn proof_path(&self, leaf_index: usize) -> Result<Vec<ProofNode>, MerkleError> {
        let leaf_count = self.leaf_count();
        if leaf_index >= leaf_count {
            return Err(MerkleError::LeafIndexOutOfRange {
                index: leaf_index,
                leaf_count,
            });
        }

        let mut path = Vec::with_capacity(self.depth());
        let mut index = leaf_index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = if index % 2 == 0 { index + 1 } else { index - 1 };

            if sibling_index < level.len() {
                let position = if index % 2 == 0 {
                    Position::Right // Sibling is on the right
                } else {
                    Position::Left // Sibling is on the left
                };
                path.push(ProofNode {
                    hash: level[sibling_index],
                    position,
                });
            } else {
                // Last element with no pair - duplicate self
                path.push(ProofNode {
                    hash: level[index],
                    position: Position::Right,
                });
            }

            index /= 2;
        }

        Ok(path)
    }

    /// Persistable form of this tree.
    pub fn into_snapshot(self) -> TreeSnapshot {
        TreeSnapshot {
            levels: self.levels,
        }
    }

    /// Rebuild from a stored snapshot, re-deriving every level.
    ///
    /// Proofs served from storage go through this path, so a corrupted
    /// or tampered snapshot is rejected rather than silently producing
    /// paths that fail to verify.
    pub fn from_snapshot(snapshot: &TreeSnapshot) -> Result<Self, MerkleError> {
        let rebuilt = Self::build(snapshot.leaves())?;
        for (level, stored) in snapshot.levels.iter().enumerate().skip(1) {
            if rebuilt.levels.get(level) != Some(stored) {
                return Err(MerkleError::SnapshotMismatch { level });
            }
        }
        if rebuilt.levels.len() != snapshot.levels.len() {
            return Err(MerkleError::SnapshotMismatch {
                level: snapshot.levels.len().min(rebuilt.levels.len()),
            });
        }
        Ok(rebuilt)
    }
}

/// Stored per-level node arrays of a batch's tree.
///
/// Persisted alongside the batch so proofs can be served long after
/// formation without rehashing member content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Node hashes per level, leaves first, root level last.
    pub levels: Vec<Vec<Hash>>,
}

impl TreeSnapshot {
    /// The leaf level.
    pub fn leaves(&self) -> &[Hash] {
        self.levels.first().map_or(&[], Vec::as_slice)
    }

    /// Number of leaves committed.
    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// The recorded root.
    pub fn root(&self) -> Option<Hash> {
        self.levels.last().and_then(|level| level.first()).copied()
    }
}
