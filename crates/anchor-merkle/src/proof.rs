//! # Proof Value Objects
//!
//! Immutable value types describing an inclusion proof.

use serde::{Deserialize, Serialize};
use shared_types::{BatchId, Hash, TransactionId};

/// Position of a sibling in the proof path (left or right).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Position {
    /// Sibling is on the left.
    Left,
    /// Sibling is on the right.
    Right,
}

/// Node in a Merkle proof path.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofNode {
    /// Hash of the sibling node.
    pub hash: Hash,
    /// Position of the sibling.
    pub position: Position,
}

impl ProofNode {
    /// Create a left sibling node.
    pub fn left(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Left,
        }
    }

    /// Create a right sibling node.
    pub fn right(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Right,
        }
    }
}

/// Inclusion proof for one transaction in an anchored batch.
///
/// Everything a verifier needs besides the published root: the leaf
/// hash, the bottom-up sibling path, and enough context to locate the
/// batch commitment on the ledger.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InclusionProof {
    /// Transaction being proven.
    pub transaction_id: TransactionId,
    /// Batch whose root the path folds up to.
    pub batch_id: BatchId,
    /// Position of the leaf in the batch's member order.
    pub leaf_index: usize,
    /// Hash of the transaction content.
    pub leaf_hash: Hash,
    /// Sibling path from leaf level to just below the root.
    pub path: Vec<ProofNode>,
    /// Root the path reconstructs.
    pub root_hash: Hash,
}
