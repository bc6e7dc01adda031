//! # Inclusion Verification
//!
//! Storage-free proof verification.
//!
//! A verifier needs only the transaction content (or its leaf hash), the
//! sibling path, and a root obtained from the ledger commitment. Nothing
//! here touches stores or services, so the same fold runs inside this
//! system and in any external auditor.

use crate::leaf::leaf_hash;
use crate::proof::{InclusionProof, Position, ProofNode};
use crate::tree::node_hash;
use shared_types::{Hash, TransactionRecord};

/// Fold a sibling path from a leaf hash and compare against a root.
///
/// # Algorithm
///
/// 1. Start with the leaf hash as current hash
/// 2. For each node in the path:
///    - If sibling is on left: hash = node(sibling, current)
///    - If sibling is on right: hash = node(current, sibling)
/// 3. Final hash must equal the expected root
///
/// An empty path is valid only for a single-leaf batch, where the leaf
/// is the root.
///
/// # Time Complexity: O(log n)
/// # Space Complexity: O(1)
pub fn verify_inclusion(leaf: &Hash, path: &[ProofNode], expected_root: &Hash) -> bool {
    if path.is_empty() {
        return leaf == expected_root;
    }

    let mut current = *leaf;

    for node in path {
        current = match node.position {
            Position::Left => node_hash(&node.hash, &current),
            Position::Right => node_hash(&current, &node.hash),
        };
    }

    current == *expected_root
}

/// Verify a proof against the transaction content itself.
///
/// The leaf hash is recomputed from `record`, never trusted from the
/// proof, so any single-byte change to the content fails verification.
pub fn verify_record(
    record: &TransactionRecord,
    proof: &InclusionProof,
    expected_root: &Hash,
) -> bool {
    verify_inclusion(&leaf_hash(record), &proof.path, expected_root)
}
