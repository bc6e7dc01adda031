//! Inclusion proofs: portable evidence that a record is under an
//! anchored root.
//!
//! The leaf hash is always recomputed from current record content,
//! never read back from storage. A record edited after anchoring
//! therefore fails here instead of producing a proof that cannot
//! verify.

use crate::domain::BatchStatus;
use crate::error::{AnchorError, AnchorResult};
use crate::ports::outbound::{BatchStore, TransactionStore};
use anchor_merkle::{leaf_hash, InclusionProof, MerkleTree};
use shared_types::TransactionId;
use std::sync::Arc;
use tracing::debug;

/// Builds inclusion proofs from stored tree snapshots.
pub struct ProofService<T, B>
where
    T: TransactionStore,
    B: BatchStore,
{
    transactions: Arc<T>,
    batches: Arc<B>,
}

impl<T, B> ProofService<T, B>
where
    T: TransactionStore,
    B: BatchStore,
{
    pub fn new(transactions: Arc<T>, batches: Arc<B>) -> Self {
        Self {
            transactions,
            batches,
        }
    }

    /// Produce a proof for a transaction whose batch has reached
    /// `Anchored` or `Confirmed`.
    pub async fn prove_inclusion(
        &self,
        transaction_id: TransactionId,
    ) -> AnchorResult<InclusionProof> {
        let record = self
            .transactions
            .get(transaction_id)
            .await?
            .ok_or(AnchorError::TransactionNotFound { transaction_id })?;
        let batch_id = record
            .claimed_batch
            .ok_or(AnchorError::NotYetAnchored { transaction_id })?;
        let batch = self
            .batches
            .batch(batch_id)
            .await?
            .ok_or(AnchorError::BatchNotFound { batch_id })?;
        if !matches!(batch.status, BatchStatus::Anchored | BatchStatus::Confirmed) {
            return Err(AnchorError::NotYetAnchored { transaction_id });
        }

        let leaf_index = batch.member_index(transaction_id).ok_or_else(|| AnchorError::Store {
            reason: format!(
                "record {transaction_id} claims batch {batch_id} but is not in its member list"
            ),
        })?;

        let snapshot = self
            .batches
            .snapshot(batch_id)
            .await?
            .ok_or(AnchorError::SnapshotMissing { batch_id })?;
        let tree = MerkleTree::from_snapshot(&snapshot)?;

        let leaf = leaf_hash(&record);
        if tree.levels()[0].get(leaf_index) != Some(&leaf) {
            return Err(AnchorError::ContentDrift { transaction_id });
        }

        let path = tree.proof_path(leaf_index)?;
        debug!(
            "[prover] Proof for {} in batch {}: leaf {} of {}, path length {}",
            transaction_id,
            batch_id,
            leaf_index,
            batch.leaf_count,
            path.len()
        );
        Ok(InclusionProof {
            transaction_id,
            batch_id,
            leaf_index,
            leaf_hash: leaf,
            path,
            root_hash: tree.root(),
        })
    }
}
