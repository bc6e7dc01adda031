//! Anchoring events.
//!
//! Every observable step of the batch lifecycle is published here so
//! downstream consumers (notification fan-out, operator tooling, the
//! runtime's event log) can follow the pipeline without calling into
//! the engine.

use serde::{Deserialize, Serialize};
use shared_types::{BatchId, Hash, LedgerTxRef, TransactionId};

/// Events emitted by the anchoring pipeline.
///
/// Delivery is at-least-once from the publisher's point of view;
/// consumers must tolerate duplicates across process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnchorEvent {
    /// A batch was formed and persisted as pending.
    BatchFormed {
        batch_id: BatchId,
        root_hash: Hash,
        leaf_count: usize,
    },

    /// A batch's root landed on the ledger and its reference was recorded.
    BatchSubmitted {
        batch_id: BatchId,
        ledger_tx_ref: LedgerTxRef,
    },

    /// The commitment became visible on the ledger below the
    /// confirmation depth.
    BatchAnchored {
        batch_id: BatchId,
        ledger_tx_ref: LedgerTxRef,
        block_number: Option<u64>,
    },

    /// The commitment reached the confirmation depth; every member
    /// record is now flagged anchored under the root.
    BatchConfirmed {
        batch_id: BatchId,
        root_hash: Hash,
        depth: u64,
        transaction_count: usize,
    },

    /// A batch reached the terminal failed state.
    BatchFailed {
        batch_id: BatchId,
        reason: String,
        /// Whether the members went back to the eligible pool. False
        /// means the commit outcome is ambiguous and the members stay
        /// claimed until an operator resolves it.
        members_released: bool,
    },

    /// Members of a failed batch returned to the eligible pool.
    TransactionsReleased {
        batch_id: BatchId,
        transaction_ids: Vec<TransactionId>,
    },

    /// A previously anchored root was reorganized away; proofs issued
    /// against it no longer verify on the ledger.
    ProofsRevoked { batch_id: BatchId, root_hash: Hash },

    /// Something needs a human. Also logged at error level by the
    /// publisher.
    OperatorAlert {
        batch_id: Option<BatchId>,
        message: String,
    },
}

impl AnchorEvent {
    /// The topic this event belongs to, for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            AnchorEvent::BatchFormed { .. }
            | AnchorEvent::BatchSubmitted { .. }
            | AnchorEvent::BatchAnchored { .. }
            | AnchorEvent::BatchConfirmed { .. } => EventTopic::Lifecycle,
            AnchorEvent::BatchFailed { .. }
            | AnchorEvent::TransactionsReleased { .. }
            | AnchorEvent::ProofsRevoked { .. } => EventTopic::Failure,
            AnchorEvent::OperatorAlert { .. } => EventTopic::Operator,
        }
    }

    /// The batch this event concerns, when there is one.
    #[must_use]
    pub fn batch_id(&self) -> Option<BatchId> {
        match self {
            AnchorEvent::BatchFormed { batch_id, .. }
            | AnchorEvent::BatchSubmitted { batch_id, .. }
            | AnchorEvent::BatchAnchored { batch_id, .. }
            | AnchorEvent::BatchConfirmed { batch_id, .. }
            | AnchorEvent::BatchFailed { batch_id, .. }
            | AnchorEvent::TransactionsReleased { batch_id, .. }
            | AnchorEvent::ProofsRevoked { batch_id, .. } => Some(*batch_id),
            AnchorEvent::OperatorAlert { batch_id, .. } => *batch_id,
        }
    }

    /// Short name for log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AnchorEvent::BatchFormed { .. } => "batch_formed",
            AnchorEvent::BatchSubmitted { .. } => "batch_submitted",
            AnchorEvent::BatchAnchored { .. } => "batch_anchored",
            AnchorEvent::BatchConfirmed { .. } => "batch_confirmed",
            AnchorEvent::BatchFailed { .. } => "batch_failed",
            AnchorEvent::TransactionsReleased { .. } => "transactions_released",
            AnchorEvent::ProofsRevoked { .. } => "proofs_revoked",
            AnchorEvent::OperatorAlert { .. } => "operator_alert",
        }
    }
}

/// Coarse event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTopic {
    /// Forward progress: formed, submitted, anchored, confirmed.
    Lifecycle,
    /// Failures, releases, and proof revocations.
    Failure,
    /// Operator alerts.
    Operator,
}

/// Filter applied on the subscriber side.
///
/// Empty fields mean "no restriction"; the default filter matches
/// everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Batches to include. Empty means all batches. Events without a
    /// batch id (global operator alerts) always pass this check.
    pub batch_ids: Vec<BatchId>,
}

impl EventFilter {
    /// A filter that accepts every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to the given topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            batch_ids: Vec::new(),
        }
    }

    /// Restrict to one batch's events.
    #[must_use]
    pub fn for_batch(batch_id: BatchId) -> Self {
        Self {
            topics: Vec::new(),
            batch_ids: vec![batch_id],
        }
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &AnchorEvent) -> bool {
        let topic_match = self.topics.is_empty() || self.topics.contains(&event.topic());

        let batch_match = self.batch_ids.is_empty()
            || match event.batch_id() {
                Some(id) => self.batch_ids.contains(&id),
                None => true,
            };

        topic_match && batch_match
    }
}
