//! Error types for Merkle aggregation

use thiserror::Error;

/// Merkle construction and proof errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MerkleError {
    /// A batch must contain at least one leaf
    #[error("Cannot build a Merkle tree with no leaves")]
    EmptyTree,

    /// Requested proof for a leaf position that does not exist
    #[error("Leaf index {index} out of range: tree has {leaf_count} leaves")]
    LeafIndexOutOfRange { index: usize, leaf_count: usize },

    /// Stored levels do not recompute to themselves
    #[error("Snapshot corrupt: level {level} does not recompute from the level below")]
    SnapshotMismatch { level: usize },
}
