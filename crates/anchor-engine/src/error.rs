//! Error types for the anchoring engine.

use shared_types::{BatchId, TransactionId};
use thiserror::Error;

/// Result type for anchoring operations
pub type AnchorResult<T> = Result<T, AnchorError>;

/// Errors that can occur during batch formation, submission,
/// confirmation tracking, or proof generation.
#[derive(Error, Debug)]
pub enum AnchorError {
    #[error("Invalid batch transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Batch not found: {batch_id}")]
    BatchNotFound { batch_id: BatchId },

    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound { transaction_id: TransactionId },

    #[error("Transaction {transaction_id} is not part of an anchored batch yet")]
    NotYetAnchored { transaction_id: TransactionId },

    #[error("Transaction {transaction_id} is not eligible for anchoring: {reason}")]
    IneligibleTransaction {
        transaction_id: TransactionId,
        reason: String,
    },

    #[error("Transaction {transaction_id} is already claimed by batch {batch_id}")]
    AlreadyClaimed {
        transaction_id: TransactionId,
        batch_id: BatchId,
    },

    #[error("No tree snapshot stored for batch {batch_id}")]
    SnapshotMissing { batch_id: BatchId },

    #[error("Transaction {transaction_id} no longer matches its anchored leaf hash")]
    ContentDrift { transaction_id: TransactionId },

    #[error("Merkle error: {0}")]
    Merkle(#[from] anchor_merkle::MerkleError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Store error: {reason}")]
    Store { reason: String },
}

/// Errors reported by the anchoring ledger client.
///
/// The split matters for retry policy: `Rejected` proves the root never
/// landed, while `Timeout` and `Unreachable` leave the outcome unknown
/// until a lookup settles it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger commit timed out after {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    #[error("Ledger unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Ledger rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Ledger rejected commit: {reason}")]
    Rejected { reason: String },
}

impl LedgerError {
    /// True when the error leaves the commit outcome unknown.
    ///
    /// A timed-out or unreachable call may still have landed on the
    /// ledger, so callers must treat a following negative lookup as
    /// untrusted. Rejection and rate limiting are definitive: the
    /// ledger saw the request and did not record it.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, LedgerError::Timeout { .. } | LedgerError::Unreachable { .. })
    }
}
