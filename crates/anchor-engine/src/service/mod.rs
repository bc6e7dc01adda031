//! Services implementing the anchoring pipeline.
//!
//! Each stage is its own service so schedulers can drive them on
//! independent cadences; [`AnchorService`] bundles them behind the
//! inbound [`AnchorApi`] for callers that want one handle.

pub mod anchorer;
pub mod former;
pub mod monitor;
pub mod prover;

pub use anchorer::Anchorer;
pub use former::BatchFormer;
pub use monitor::ConfirmationMonitor;
pub use prover::ProofService;

use crate::config::AnchorConfig;
use crate::domain::BatchStatus;
use crate::error::AnchorResult;
use crate::ports::inbound::{
    AnchorApi, AnchorStatus, FormationOutcome, PollReport, SubmissionReport,
};
use crate::ports::outbound::{
    BatchStore, EligibilityFilter, FormationLease, LedgerClient, NotificationPort,
    TransactionStore,
};
use anchor_merkle::InclusionProof;
use async_trait::async_trait;
use shared_types::TransactionId;
use std::sync::Arc;

/// The whole pipeline behind one handle.
pub struct AnchorService<T, B, L, F, N>
where
    T: TransactionStore,
    B: BatchStore,
    L: LedgerClient,
    F: FormationLease,
    N: NotificationPort,
{
    former: BatchFormer<T, B, F, N>,
    anchorer: Anchorer<B, L, N>,
    monitor: ConfirmationMonitor<B, L, N>,
    prover: ProofService<T, B>,
    transactions: Arc<T>,
    batches: Arc<B>,
}

impl<T, B, L, F, N> AnchorService<T, B, L, F, N>
where
    T: TransactionStore,
    B: BatchStore,
    L: LedgerClient,
    F: FormationLease,
    N: NotificationPort,
{
    pub fn new(
        config: AnchorConfig,
        transactions: Arc<T>,
        batches: Arc<B>,
        ledger: Arc<L>,
        lease: Arc<F>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            former: BatchFormer::new(
                config.clone(),
                transactions.clone(),
                batches.clone(),
                lease,
                notifier.clone(),
            ),
            anchorer: Anchorer::new(
                config.clone(),
                batches.clone(),
                ledger.clone(),
                notifier.clone(),
            ),
            monitor: ConfirmationMonitor::new(config, batches.clone(), ledger, notifier),
            prover: ProofService::new(transactions.clone(), batches.clone()),
            transactions,
            batches,
        }
    }
}

#[async_trait]
impl<T, B, L, F, N> AnchorApi for AnchorService<T, B, L, F, N>
where
    T: TransactionStore + 'static,
    B: BatchStore + 'static,
    L: LedgerClient + 'static,
    F: FormationLease + 'static,
    N: NotificationPort + 'static,
{
    async fn form_batch(&self, filter: &EligibilityFilter) -> AnchorResult<FormationOutcome> {
        self.former.form_batch(filter).await
    }

    async fn submit_pending(&self) -> AnchorResult<SubmissionReport> {
        self.anchorer.submit_pending().await
    }

    async fn poll_confirmations(&self) -> AnchorResult<PollReport> {
        self.monitor.poll_confirmations().await
    }

    async fn prove_inclusion(&self, transaction_id: TransactionId) -> AnchorResult<InclusionProof> {
        self.prover.prove_inclusion(transaction_id).await
    }

    async fn status(&self) -> AnchorResult<AnchorStatus> {
        Ok(AnchorStatus {
            pending_batches: self.batches.list_by_status(BatchStatus::Pending).await?.len(),
            submitted_batches: self
                .batches
                .list_by_status(BatchStatus::Submitted)
                .await?
                .len(),
            anchored_batches: self
                .batches
                .list_by_status(BatchStatus::Anchored)
                .await?
                .len(),
            confirmed_batches: self
                .batches
                .list_by_status(BatchStatus::Confirmed)
                .await?
                .len(),
            failed_batches: self.batches.list_by_status(BatchStatus::Failed).await?.len(),
            unanchored_transactions: self.transactions.unanchored_count().await?,
        })
    }
}
