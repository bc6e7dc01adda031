//! Ports (interfaces) for the anchoring engine.
//!
//! - Inbound: the operations callers drive the engine with.
//! - Outbound: what the engine requires from storage, the ledger, the
//!   notification fan-out, and the formation lease.

pub mod inbound;
pub mod outbound;

pub use inbound::{AnchorApi, AnchorStatus, FormationOutcome, PollReport, SubmissionReport};
pub use outbound::{
    BatchStore, CommitMetadata, CommitReceipt, EligibilityFilter, FinalityStatus, FormationLease,
    LeaseHandle, LedgerClient, NotificationPort, TransactionStore,
};
