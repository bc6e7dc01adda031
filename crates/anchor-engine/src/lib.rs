//! Transaction anchoring engine.
//!
//! Batches settled transaction records under Merkle roots, commits the
//! roots to an external append-only ledger, tracks those commitments to
//! finality, and hands out inclusion proofs that verify offline.
//!
//! # Pipeline
//!
//! ```text
//!  eligible records        ledger commit        visible        depth >= N
//!        |                       |                 |                |
//!        v                       v                 v                v
//!   [ Pending ] ----------> [ Submitted ] ---> [ Anchored ] ---> [ Confirmed ]
//!        |                       |                 |
//!        +-----------------------+-----------------+------------> [ Failed ]
//! ```
//!
//! `Confirmed` and `Failed` are terminal. Failure releases members back
//! to the eligible pool only when the engine can prove the commitment
//! never landed; ambiguous outcomes keep members claimed for an
//! operator to settle.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = AnchorService::new(config, store.clone(), store, ledger, lease, notifier);
//! service.form_batch(&EligibilityFilter::default()).await?;
//! service.submit_pending().await?;
//! service.poll_confirmations().await?;
//! let proof = service.prove_inclusion(transaction_id).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::AnchorConfig;
pub use domain::{Batch, BatchFailure, BatchStatus, CommitKnowledge};
pub use error::{AnchorError, AnchorResult, LedgerError};
pub use ports::inbound::{
    AnchorApi, AnchorStatus, FormationOutcome, PollReport, SubmissionReport,
};
pub use ports::outbound::{
    BatchStore, CommitMetadata, CommitReceipt, EligibilityFilter, FinalityStatus, FormationLease,
    LeaseHandle, LedgerClient, NotificationPort, TransactionStore,
};
pub use service::{AnchorService, Anchorer, BatchFormer, ConfirmationMonitor, ProofService};
