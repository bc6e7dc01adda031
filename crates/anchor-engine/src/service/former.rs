//! Batch formation: claim eligible records under a fresh Merkle root.

use crate::config::AnchorConfig;
use crate::domain::{eligibility_violation, Batch};
use crate::error::{AnchorError, AnchorResult};
use crate::ports::inbound::FormationOutcome;
use crate::ports::outbound::{
    BatchStore, EligibilityFilter, FormationLease, NotificationPort, TransactionStore,
};
use anchor_merkle::{leaf_hash, MerkleTree};
use shared_bus::AnchorEvent;
use shared_types::{short_hex, Hash, TransactionId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Forms batches from eligible transactions.
///
/// One forming instance at a time: the lease serializes cycles across
/// processes, and the atomic insert-and-claim keeps concurrent cycles
/// from double-claiming even if a lease backend misbehaves.
pub struct BatchFormer<T, B, L, N>
where
    T: TransactionStore,
    B: BatchStore,
    L: FormationLease,
    N: NotificationPort,
{
    config: AnchorConfig,
    transactions: Arc<T>,
    batches: Arc<B>,
    lease: Arc<L>,
    notifier: Arc<N>,
}

impl<T, B, L, N> BatchFormer<T, B, L, N>
where
    T: TransactionStore,
    B: BatchStore,
    L: FormationLease,
    N: NotificationPort,
{
    pub fn new(
        config: AnchorConfig,
        transactions: Arc<T>,
        batches: Arc<B>,
        lease: Arc<L>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            config,
            transactions,
            batches,
            lease,
            notifier,
        }
    }

    /// Run one formation cycle.
    ///
    /// Takes the lease, fetches candidates in stable `(created_at, id)`
    /// order, re-validates them, builds the tree, then persists batch
    /// and claims in a single atomic store call. A crash before that
    /// call leaves nothing behind and the next cycle re-forms from
    /// scratch.
    pub async fn form_batch(&self, filter: &EligibilityFilter) -> AnchorResult<FormationOutcome> {
        let Some(_lease) = self.lease.try_acquire().await? else {
            debug!("[former] Formation lease held elsewhere, skipping cycle");
            return Ok(FormationOutcome::LeaseHeld);
        };

        let candidates = self
            .transactions
            .eligible_transactions(filter, self.config.max_batch_size)
            .await?;

        // The store query should only return eligible records. Check
        // again and abort the cycle on disagreement rather than anchor
        // a record whose content can still change.
        for record in &candidates {
            if let Some(reason) = eligibility_violation(record) {
                warn!(
                    "[former] Store returned ineligible record {}: {}",
                    record.id, reason
                );
                return Err(AnchorError::IneligibleTransaction {
                    transaction_id: record.id,
                    reason: reason.to_string(),
                });
            }
        }

        if candidates.len() < self.config.min_batch_size.max(1) {
            debug!(
                "[former] {} eligible record(s), need {}; waiting for more",
                candidates.len(),
                self.config.min_batch_size
            );
            return Ok(FormationOutcome::NotEnoughEligible {
                available: candidates.len(),
            });
        }

        let leaves: Vec<Hash> = candidates.iter().map(leaf_hash).collect();
        let tree = MerkleTree::build(&leaves)?;
        let root_hash = tree.root();
        let members: Vec<TransactionId> = candidates.iter().map(|r| r.id).collect();
        let batch = Batch::new(root_hash, members);
        let batch_id = batch.id;
        let leaf_count = batch.leaf_count;

        // Nothing is visible until this single call succeeds.
        self.batches
            .insert_pending(&batch, &tree.into_snapshot())
            .await?;

        info!(
            "[former] Formed batch {} with {} leaves, root {}",
            batch_id,
            leaf_count,
            short_hex(&root_hash)
        );
        self.notify(AnchorEvent::BatchFormed {
            batch_id,
            root_hash,
            leaf_count,
        })
        .await;

        Ok(FormationOutcome::Formed {
            batch_id,
            root_hash,
            leaf_count,
        })
    }

    async fn notify(&self, event: AnchorEvent) {
        if let Err(e) = self.notifier.notify(event).await {
            warn!("[former] Notification failed: {}", e);
        }
    }
}
