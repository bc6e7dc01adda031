//! Confirmation tracking: watch submitted commitments accumulate depth.
//!
//! The monitor owns every transition out of `Submitted` that the
//! anchorer does not: advancing to `Anchored` on first visibility,
//! confirming once the depth threshold is reached, dropping commits
//! that never became visible, and revoking batches lost to a reorg.

use crate::config::AnchorConfig;
use crate::domain::{Batch, BatchFailure, BatchStatus, CommitKnowledge};
use crate::error::AnchorResult;
use crate::ports::inbound::PollReport;
use crate::ports::outbound::{BatchStore, FinalityStatus, LedgerClient, NotificationPort};
use shared_bus::AnchorEvent;
use shared_types::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-batch outcome of a confirmation poll.
enum PollOutcome {
    Confirmed,
    Advanced,
    Waiting,
    Dropped,
    Reorged,
    /// The ledger could not answer; try again next poll.
    Unavailable,
}

/// Polls the ledger and settles in-flight batches.
pub struct ConfirmationMonitor<B, L, N>
where
    B: BatchStore,
    L: LedgerClient,
    N: NotificationPort,
{
    config: AnchorConfig,
    batches: Arc<B>,
    ledger: Arc<L>,
    notifier: Arc<N>,
}

impl<B, L, N> ConfirmationMonitor<B, L, N>
where
    B: BatchStore,
    L: LedgerClient,
    N: NotificationPort,
{
    pub fn new(config: AnchorConfig, batches: Arc<B>, ledger: Arc<L>, notifier: Arc<N>) -> Self {
        Self {
            config,
            batches,
            ledger,
            notifier,
        }
    }

    /// Poll every in-flight batch once and tally the outcomes.
    pub async fn poll_confirmations(&self) -> AnchorResult<PollReport> {
        let mut watched = self.batches.list_by_status(BatchStatus::Submitted).await?;
        watched.extend(self.batches.list_by_status(BatchStatus::Anchored).await?);

        let mut report = PollReport::default();
        for batch in watched {
            match self.poll_one(&batch).await {
                Ok(PollOutcome::Confirmed) => report.confirmed += 1,
                Ok(PollOutcome::Advanced) => report.advanced += 1,
                Ok(PollOutcome::Waiting) => report.waiting += 1,
                Ok(PollOutcome::Dropped) | Ok(PollOutcome::Reorged) => report.failed += 1,
                Ok(PollOutcome::Unavailable) => report.errors += 1,
                Err(e) => {
                    warn!("[monitor] Poll bookkeeping failed for batch {}: {}", batch.id, e);
                    report.errors += 1;
                }
            }
        }
        if report != PollReport::default() {
            info!(
                "[monitor] Poll done: {} confirmed, {} advanced, {} waiting, {} failed",
                report.confirmed, report.advanced, report.waiting, report.failed
            );
        }
        Ok(report)
    }

    async fn poll_one(&self, batch: &Batch) -> AnchorResult<PollOutcome> {
        let Some(tx_ref) = batch.ledger_tx_ref.clone() else {
            return self.poll_refless(batch).await;
        };

        let finality = match self.ledger.finality(&tx_ref).await {
            Ok(f) => f,
            Err(e) => {
                warn!("[monitor] Finality check failed for batch {}: {}", batch.id, e);
                return Ok(PollOutcome::Unavailable);
            }
        };

        match finality {
            FinalityStatus::Included {
                depth,
                block_number,
            } => {
                if depth >= self.config.confirmation_depth {
                    return self.confirm(batch, depth, block_number).await;
                }
                if batch.status == BatchStatus::Submitted {
                    if self
                        .batches
                        .try_transition(batch.id, BatchStatus::Submitted, BatchStatus::Anchored)
                        .await?
                    {
                        self.batches
                            .record_submission(batch.id, &tx_ref, Some(block_number))
                            .await?;
                        info!(
                            "[monitor] Batch {} visible at block {} (depth {}/{})",
                            batch.id, block_number, depth, self.config.confirmation_depth
                        );
                        self.notify(AnchorEvent::BatchAnchored {
                            batch_id: batch.id,
                            ledger_tx_ref: tx_ref,
                            block_number: Some(block_number),
                        })
                        .await;
                        return Ok(PollOutcome::Advanced);
                    }
                    return Ok(PollOutcome::Waiting);
                }
                debug!(
                    "[monitor] Batch {} at depth {}/{}",
                    batch.id, depth, self.config.confirmation_depth
                );
                Ok(PollOutcome::Waiting)
            }
            FinalityStatus::NotFound => match batch.status {
                // Still propagating, unless the patience window has
                // passed and the ledger confirms nothing landed.
                BatchStatus::Submitted => {
                    if self.past_drop_patience(batch) {
                        if let Ok(None) = self.ledger.lookup(&batch.idempotency_key()).await {
                            return self.drop_stalled(batch).await;
                        }
                    }
                    Ok(PollOutcome::Waiting)
                }
                // Was visible before; vanishing now means the chain
                // reorganized under it.
                _ => self.fail_reorged(batch).await,
            },
            FinalityStatus::Reorged => self.fail_reorged(batch).await,
        }
    }

    /// A `Submitted` batch with no ledger reference belongs to the
    /// anchorer, except past the patience window, where the key lookup
    /// either adopts a landed commit or proves there is none.
    async fn poll_refless(&self, batch: &Batch) -> AnchorResult<PollOutcome> {
        if !self.past_drop_patience(batch) {
            return Ok(PollOutcome::Waiting);
        }
        match self.ledger.lookup(&batch.idempotency_key()).await {
            Ok(Some(tx_ref)) => {
                info!(
                    "[monitor] Batch {} found on the ledger as {}; adopting",
                    batch.id, tx_ref
                );
                self.batches
                    .record_submission(batch.id, &tx_ref, None)
                    .await?;
                Ok(PollOutcome::Waiting)
            }
            Ok(None) => self.drop_stalled(batch).await,
            Err(e) => {
                warn!("[monitor] Lookup failed for batch {}: {}", batch.id, e);
                Ok(PollOutcome::Unavailable)
            }
        }
    }

    async fn confirm(&self, batch: &Batch, depth: u64, block_number: u64) -> AnchorResult<PollOutcome> {
        if batch.status == BatchStatus::Submitted {
            // Pass through Anchored on the way; confirmation depth can
            // arrive before the first visibility poll.
            self.batches
                .try_transition(batch.id, BatchStatus::Submitted, BatchStatus::Anchored)
                .await?;
        }
        if !self.batches.confirm(batch.id, Some(block_number)).await? {
            return Ok(PollOutcome::Waiting);
        }
        info!(
            "[monitor] Batch {} confirmed at depth {} ({} transaction(s) anchored)",
            batch.id, depth, batch.leaf_count
        );
        self.notify(AnchorEvent::BatchConfirmed {
            batch_id: batch.id,
            root_hash: batch.root_hash,
            depth,
            transaction_count: batch.leaf_count,
        })
        .await;
        Ok(PollOutcome::Confirmed)
    }

    async fn drop_stalled(&self, batch: &Batch) -> AnchorResult<PollOutcome> {
        let reason = "commit never became visible within the patience window".to_string();
        let applied = self
            .batches
            .fail(
                batch.id,
                BatchFailure::new(reason.clone(), CommitKnowledge::ProvenAbsent),
                true,
            )
            .await?;
        if !applied {
            return Ok(PollOutcome::Waiting);
        }
        warn!("[monitor] Dropping batch {}: {}", batch.id, reason);
        self.notify(AnchorEvent::BatchFailed {
            batch_id: batch.id,
            reason,
            members_released: true,
        })
        .await;
        self.notify(AnchorEvent::TransactionsReleased {
            batch_id: batch.id,
            transaction_ids: batch.members.clone(),
        })
        .await;
        Ok(PollOutcome::Dropped)
    }

    async fn fail_reorged(&self, batch: &Batch) -> AnchorResult<PollOutcome> {
        let reason = "commitment reorganized away".to_string();
        let applied = self
            .batches
            .fail(
                batch.id,
                BatchFailure::new(reason.clone(), CommitKnowledge::ReorgedOut),
                true,
            )
            .await?;
        if !applied {
            return Ok(PollOutcome::Waiting);
        }
        warn!(
            "[monitor] Batch {} lost its commitment to a reorg; releasing {} member(s)",
            batch.id, batch.leaf_count
        );
        self.notify(AnchorEvent::BatchFailed {
            batch_id: batch.id,
            reason,
            members_released: true,
        })
        .await;
        self.notify(AnchorEvent::TransactionsReleased {
            batch_id: batch.id,
            transaction_ids: batch.members.clone(),
        })
        .await;
        self.notify(AnchorEvent::ProofsRevoked {
            batch_id: batch.id,
            root_hash: batch.root_hash,
        })
        .await;
        self.notify(AnchorEvent::OperatorAlert {
            batch_id: Some(batch.id),
            message: format!(
                "batch {} was reorganized away; proofs under its root are void until members re-anchor",
                batch.id
            ),
        })
        .await;
        Ok(PollOutcome::Reorged)
    }

    fn past_drop_patience(&self, batch: &Batch) -> bool {
        batch.submitted_at.map_or(false, |t| {
            (Utc::now() - t).num_seconds() >= self.config.drop_patience_secs as i64
        })
    }

    async fn notify(&self, event: AnchorEvent) {
        if let Err(e) = self.notifier.notify(event).await {
            warn!("[monitor] Notification failed: {}", e);
        }
    }
}
