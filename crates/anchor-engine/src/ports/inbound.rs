//! Inbound port: the operations callers drive the engine with.

use crate::error::AnchorResult;
use crate::ports::outbound::EligibilityFilter;
use anchor_merkle::InclusionProof;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, Hash, TransactionId};

/// Result of one formation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormationOutcome {
    /// Another instance holds the formation lease.
    LeaseHeld,
    /// Fewer eligible records than the configured minimum.
    NotEnoughEligible { available: usize },
    /// A batch was formed and persisted.
    Formed {
        batch_id: BatchId,
        root_hash: Hash,
        leaf_count: usize,
    },
}

/// Tally of one submission cycle across all due batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Commits that landed and were recorded.
    pub committed: usize,
    /// Batches left for a later cycle (rate limiting).
    pub deferred: usize,
    /// Batches moved to `Failed` this cycle.
    pub failed: usize,
    /// Batches another worker claimed first.
    pub skipped: usize,
    /// Store or bookkeeping errors, logged and counted.
    pub errors: usize,
}

/// Tally of one confirmation poll across all watched batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Batches that reached the confirmation depth.
    pub confirmed: usize,
    /// Batches that became visible and advanced to `Anchored`.
    pub advanced: usize,
    /// Batches still waiting for visibility or depth.
    pub waiting: usize,
    /// Batches dropped or reorged out this poll.
    pub failed: usize,
    /// Ledger or store errors, logged and counted.
    pub errors: usize,
}

/// Point-in-time view of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorStatus {
    pub pending_batches: usize,
    pub submitted_batches: usize,
    pub anchored_batches: usize,
    pub confirmed_batches: usize,
    pub failed_batches: usize,
    /// Records not yet under a confirmed root.
    pub unanchored_transactions: usize,
}

/// The anchoring engine's public operation surface.
#[async_trait]
pub trait AnchorApi: Send + Sync {
    /// Form one batch from eligible records, if enough are available
    /// and no other instance is forming.
    async fn form_batch(&self, filter: &EligibilityFilter) -> AnchorResult<FormationOutcome>;

    /// Submit every due batch to the ledger.
    async fn submit_pending(&self) -> AnchorResult<SubmissionReport>;

    /// Poll the ledger for visibility and depth of in-flight batches.
    async fn poll_confirmations(&self) -> AnchorResult<PollReport>;

    /// Produce an offline-verifiable inclusion proof for a transaction.
    async fn prove_inclusion(&self, transaction_id: TransactionId) -> AnchorResult<InclusionProof>;

    /// Current pipeline counts.
    async fn status(&self) -> AnchorResult<AnchorStatus>;
}
