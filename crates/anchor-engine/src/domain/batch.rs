//! Batch lifecycle: the unit of anchoring work.
//!
//! A batch is born `Pending` with a fixed member list and root hash,
//! moves forward through `Submitted` and `Anchored` as the ledger
//! accepts and buries the commitment, and settles in exactly one of the
//! terminal states `Confirmed` or `Failed`. Terminal states never
//! transition again.

use crate::error::{AnchorError, AnchorResult};
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, DateTime, Hash, LedgerTxRef, TransactionId, Utc};

/// Lifecycle status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchStatus {
    /// Formed and persisted, not yet handed to the ledger.
    Pending,
    /// A submission cycle owns it; a commit may or may not have landed.
    Submitted,
    /// Visible on the ledger, accumulating depth.
    Anchored,
    /// Buried past the confirmation depth. Terminal.
    Confirmed,
    /// Given up on. Terminal. Whether members were released depends on
    /// what could be proven about the commitment.
    Failed,
}

impl Default for BatchStatus {
    fn default() -> Self {
        BatchStatus::Pending
    }
}

impl BatchStatus {
    /// Check if a transition to the target status is allowed.
    pub fn can_transition_to(&self, target: BatchStatus) -> bool {
        use BatchStatus::*;
        matches!(
            (self, target),
            (Pending, Submitted)
                | (Submitted, Anchored)
                | (Anchored, Confirmed)
                | (Pending, Failed)
                | (Submitted, Failed)
                | (Anchored, Failed)
        )
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Confirmed | BatchStatus::Failed)
    }
}

/// What the engine could prove about a failed batch's commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitKnowledge {
    /// The ledger rejected the commit, or a negative lookup settled the
    /// question after the patience window. Members were released.
    ProvenAbsent,
    /// Retries exhausted without a trustworthy answer either way. The
    /// root may still land, so members stay claimed until an operator
    /// resolves it.
    Ambiguous,
    /// The commitment was visible and then reorganized away. Members
    /// were released and any issued proofs revoked.
    ReorgedOut,
}

/// Failure record attached to a batch in the `Failed` state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub reason: String,
    pub knowledge: CommitKnowledge,
    pub failed_at: DateTime<Utc>,
}

impl BatchFailure {
    pub fn new(reason: impl Into<String>, knowledge: CommitKnowledge) -> Self {
        Self {
            reason: reason.into(),
            knowledge,
            failed_at: Utc::now(),
        }
    }
}

/// A batch of transactions anchored under a single Merkle root.
///
/// The member list is fixed at formation time and its order defines
/// leaf indices; reordering after formation would silently break every
/// proof for the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub root_hash: Hash,
    pub leaf_count: usize,
    /// Members in leaf order.
    pub members: Vec<TransactionId>,
    pub status: BatchStatus,
    /// Ledger coordinates, recorded once a commit succeeds.
    pub ledger_tx_ref: Option<LedgerTxRef>,
    pub ledger_block_number: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub failure: Option<BatchFailure>,
}

impl Batch {
    /// Create a pending batch over the given members (in leaf order).
    pub fn new(root_hash: Hash, members: Vec<TransactionId>) -> Self {
        Self {
            id: BatchId::new(),
            root_hash,
            leaf_count: members.len(),
            members,
            status: BatchStatus::Pending,
            ledger_tx_ref: None,
            ledger_block_number: None,
            created_at: Utc::now(),
            submitted_at: None,
            confirmed_at: None,
            failure: None,
        }
    }

    /// Advance the lifecycle, rejecting anything the state machine
    /// does not allow.
    pub fn transition_to(&mut self, target: BatchStatus) -> AnchorResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(AnchorError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", target),
            });
        }
        self.status = target;
        Ok(())
    }

    /// Key under which every commit attempt for this batch is made.
    /// Stable across retries and restarts so the ledger can deduplicate.
    pub fn idempotency_key(&self) -> String {
        format!("anchor:{}", self.id)
    }

    /// Leaf index of a member, if it belongs to this batch.
    pub fn member_index(&self, transaction_id: TransactionId) -> Option<usize> {
        self.members.iter().position(|id| *id == transaction_id)
    }
}
