//! Ledger submission: drive pending batches to the anchoring ledger.
//!
//! Every commit for a batch goes out under the same idempotency key, so
//! retries, crashed workers, and concurrent cycles collapse to at most
//! one effective ledger write per batch.

use crate::config::AnchorConfig;
use crate::domain::{Batch, BatchFailure, BatchStatus, CommitKnowledge};
use crate::error::{AnchorResult, LedgerError};
use crate::ports::inbound::SubmissionReport;
use crate::ports::outbound::{
    BatchStore, CommitMetadata, CommitReceipt, LedgerClient, NotificationPort,
};
use shared_bus::AnchorEvent;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Per-batch outcome of a submission cycle.
enum SubmissionOutcome {
    Committed,
    Deferred,
    Failed,
    Skipped,
}

/// Submits pending batches to the ledger with bounded retries.
pub struct Anchorer<B, L, N>
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

impl<B, L, N> Anchorer<B, L, N>
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

    /// Submit every due batch concurrently and tally the outcomes.
    ///
    /// Due means `Pending`, plus `Submitted` batches that never got a
    /// ledger reference (deferred by rate limiting or interrupted
    /// mid-commit); the latter are re-driven under their original
    /// idempotency key.
    pub async fn submit_pending(&self) -> AnchorResult<SubmissionReport> {
        let pending = self.batches.list_by_status(BatchStatus::Pending).await?;
        let stalled: Vec<Batch> = self
            .batches
            .list_by_status(BatchStatus::Submitted)
            .await?
            .into_iter()
            .filter(|b| b.ledger_tx_ref.is_none())
            .collect();

        let mut work: Vec<(Batch, bool)> = pending.into_iter().map(|b| (b, true)).collect();
        work.extend(stalled.into_iter().map(|b| (b, false)));
        if work.is_empty() {
            return Ok(SubmissionReport::default());
        }

        let results = futures::future::join_all(
            work.into_iter()
                .map(|(batch, needs_claim)| self.submit_one(batch, needs_claim)),
        )
        .await;

        let mut report = SubmissionReport::default();
        for result in results {
            match result {
                Ok(SubmissionOutcome::Committed) => report.committed += 1,
                Ok(SubmissionOutcome::Deferred) => report.deferred += 1,
                Ok(SubmissionOutcome::Failed) => report.failed += 1,
                Ok(SubmissionOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!("[anchorer] Submission bookkeeping failed: {}", e);
                    report.errors += 1;
                }
            }
        }
        info!(
            "[anchorer] Cycle done: {} committed, {} deferred, {} failed, {} skipped",
            report.committed, report.deferred, report.failed, report.skipped
        );
        Ok(report)
    }

    async fn submit_one(&self, batch: Batch, needs_claim: bool) -> AnchorResult<SubmissionOutcome> {
        if needs_claim {
            // Exactly one worker wins the flip to Submitted.
            if !self
                .batches
                .try_transition(batch.id, BatchStatus::Pending, BatchStatus::Submitted)
                .await?
            {
                debug!("[anchorer] Batch {} taken by another worker", batch.id);
                return Ok(SubmissionOutcome::Skipped);
            }
        }

        let key = batch.idempotency_key();
        let metadata = CommitMetadata {
            batch_id: batch.id,
            leaf_count: batch.leaf_count,
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.ledger.commit(&key, batch.root_hash, &metadata).await {
                Ok(receipt) => return self.record_commit(&batch, receipt).await,
                Err(LedgerError::Rejected { reason }) => {
                    // Definitive: the root never landed, members go
                    // straight back to the pool.
                    warn!("[anchorer] Ledger rejected batch {}: {}", batch.id, reason);
                    self.fail_released(
                        &batch,
                        format!("ledger rejected commit: {reason}"),
                        CommitKnowledge::ProvenAbsent,
                    )
                    .await?;
                    return Ok(SubmissionOutcome::Failed);
                }
                Err(LedgerError::RateLimited { retry_after_secs }) => {
                    // The batch stays Submitted without a reference and
                    // the next cycle re-drives it under the same key.
                    warn!(
                        "[anchorer] Rate limited, deferring batch {} for {}s",
                        batch.id, retry_after_secs
                    );
                    return Ok(SubmissionOutcome::Deferred);
                }
                Err(err) => {
                    // Timeout or unreachable: the commit may have landed.
                    // Ask the ledger before burning another attempt.
                    warn!(
                        "[anchorer] Commit attempt {}/{} for batch {} failed: {}",
                        attempt, self.config.max_submit_attempts, batch.id, err
                    );
                    if let Ok(Some(tx_ref)) = self.ledger.lookup(&key).await {
                        info!(
                            "[anchorer] Batch {} had already landed as {}",
                            batch.id, tx_ref
                        );
                        let receipt = CommitReceipt {
                            tx_ref,
                            block_number: None,
                        };
                        return self.record_commit(&batch, receipt).await;
                    }
                    if attempt >= self.config.max_submit_attempts {
                        // The negative lookup above is untrusted after an
                        // ambiguous error, so members stay claimed until
                        // an operator settles the question.
                        self.fail_retained(&batch, format!("commit attempts exhausted: {err}"))
                            .await?;
                        return Ok(SubmissionOutcome::Failed);
                    }
                    let backoff = backoff_ms(self.config.submit_backoff_ms, attempt);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
            }
        }
    }

    async fn record_commit(
        &self,
        batch: &Batch,
        receipt: CommitReceipt,
    ) -> AnchorResult<SubmissionOutcome> {
        self.batches
            .record_submission(batch.id, &receipt.tx_ref, receipt.block_number)
            .await?;
        info!("[anchorer] Batch {} committed as {}", batch.id, receipt.tx_ref);
        self.notify(AnchorEvent::BatchSubmitted {
            batch_id: batch.id,
            ledger_tx_ref: receipt.tx_ref.clone(),
        })
        .await;

        if let Some(block_number) = receipt.block_number {
            // The ledger included synchronously; skip one monitor round
            // trip and advance to Anchored now.
            if self
                .batches
                .try_transition(batch.id, BatchStatus::Submitted, BatchStatus::Anchored)
                .await?
            {
                self.notify(AnchorEvent::BatchAnchored {
                    batch_id: batch.id,
                    ledger_tx_ref: receipt.tx_ref.clone(),
                    block_number: Some(block_number),
                })
                .await;
            }
        }
        Ok(SubmissionOutcome::Committed)
    }

    async fn fail_released(
        &self,
        batch: &Batch,
        reason: String,
        knowledge: CommitKnowledge,
    ) -> AnchorResult<()> {
        let applied = self
            .batches
            .fail(batch.id, BatchFailure::new(reason.clone(), knowledge), true)
            .await?;
        if !applied {
            return Ok(());
        }
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
        Ok(())
    }

    async fn fail_retained(&self, batch: &Batch, reason: String) -> AnchorResult<()> {
        let applied = self
            .batches
            .fail(
                batch.id,
                BatchFailure::new(reason.clone(), CommitKnowledge::Ambiguous),
                false,
            )
            .await?;
        if !applied {
            return Ok(());
        }
        self.notify(AnchorEvent::BatchFailed {
            batch_id: batch.id,
            reason,
            members_released: false,
        })
        .await;
        self.notify(AnchorEvent::OperatorAlert {
            batch_id: Some(batch.id),
            message: format!(
                "batch {} failed ambiguously; its commitment may still land and {} member(s) remain claimed",
                batch.id, batch.leaf_count
            ),
        })
        .await;
        Ok(())
    }

    async fn notify(&self, event: AnchorEvent) {
        if let Err(e) = self.notifier.notify(event).await {
            warn!("[anchorer] Notification failed: {}", e);
        }
    }
}

/// Exponential backoff for commit retries. The doubling is capped and
/// the multiply saturates so an oversized `max_submit_attempts` cannot
/// shift the base out of the u64 range.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let doublings = attempt.saturating_sub(1).min(32);
    base_ms.saturating_mul(1u64 << doublings)
}
