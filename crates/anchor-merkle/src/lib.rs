//! # anchor-merkle
//!
//! The pure hashing core of the anchoring pipeline: deterministic leaf
//! hashing of transaction content, binary Merkle tree construction, and
//! offline-verifiable inclusion proofs.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Leaf Hashing**: versioned, domain-separated SHA-256 over a
//!   canonical encoding of a transaction record
//! - **Tree Construction**: left-to-right pairing with the trailing odd
//!   node paired against itself, all levels retained
//! - **Inclusion Proofs**: O(log n) sibling paths extracted from the
//!   retained levels
//! - **Verification**: a storage-free fold anyone can run against a
//!   published root
//!
//! ## Domain Separation
//!
//! Leaf and internal-node hashes use distinct prefixes so a leaf can
//! never be reinterpreted as an internal node (second-preimage guard).
//! The `v1` tag is part of the hashed input: if the encoding ever
//! changes, old proofs stay verifiable under the old tag.
//!
//! ## Example
//!
//! ```rust,ignore
//! use anchor_merkle::{leaf_hash, verify_record, MerkleTree};
//!
//! let leaves: Vec<_> = records.iter().map(leaf_hash).collect();
//! let tree = MerkleTree::build(&leaves)?;
//! let proof = tree.proof_path(2)?;
//! assert!(verify_inclusion(&leaves[2], &proof, &tree.root()));
//! ```

pub mod error;
pub mod leaf;
pub mod proof;
pub mod tree;
pub mod verify;

pub use error::MerkleError;
pub use leaf::{leaf_hash, LEAF_DOMAIN};
pub use proof::{InclusionProof, Position, ProofNode};
pub use tree::{node_hash, MerkleTree, TreeSnapshot, NODE_DOMAIN};
pub use verify::{verify_inclusion, verify_record};
