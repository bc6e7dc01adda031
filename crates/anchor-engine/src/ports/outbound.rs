//! Outbound ports: dependencies the engine consumes.
//!
//! Storage atomicity lives here. Every mutation a lifecycle step needs
//! is a single port call, so an adapter backed by a database runs each
//! one in one transaction and a crash between calls never leaves a
//! half-applied step behind.

use crate::domain::{Batch, BatchFailure, BatchStatus};
use crate::error::{AnchorResult, LedgerError};
use anchor_merkle::TreeSnapshot;
use async_trait::async_trait;
use shared_bus::AnchorEvent;
use shared_types::{BatchId, Hash, LedgerTxRef, OwnerId, TransactionId, TransactionRecord};

/// Filter for selecting formation candidates.
#[derive(Debug, Clone, Default)]
pub struct EligibilityFilter {
    /// Restrict formation to one owner's records. `None` spans all owners.
    pub owner: Option<OwnerId>,
}

impl EligibilityFilter {
    pub fn for_owner(owner: OwnerId) -> Self {
        Self { owner: Some(owner) }
    }
}

/// Read access to the transaction store.
///
/// The engine never writes records directly; claim, release, and
/// anchored flags are applied by the batch lifecycle operations on
/// [`BatchStore`] so they stay atomic with the batch itself.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Up to `limit` eligible records, ordered by `(created_at, id)`.
    /// The order is the leaf order of the next batch, so it must be
    /// stable across calls.
    async fn eligible_transactions(
        &self,
        filter: &EligibilityFilter,
        limit: usize,
    ) -> AnchorResult<Vec<TransactionRecord>>;

    /// Load a single record.
    async fn get(&self, id: TransactionId) -> AnchorResult<Option<TransactionRecord>>;

    /// Number of records not yet anchored, for the status view.
    async fn unanchored_count(&self) -> AnchorResult<usize>;
}

/// Persistence for batches, their tree snapshots, and the member
/// bookkeeping that rides along with lifecycle transitions.
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Persist a pending batch with its snapshot and claim every member
    /// in one atomic step. Fails without side effects if any member is
    /// missing, already claimed, or otherwise ineligible.
    async fn insert_pending(&self, batch: &Batch, snapshot: &TreeSnapshot) -> AnchorResult<()>;

    async fn batch(&self, id: BatchId) -> AnchorResult<Option<Batch>>;

    /// The retained tree levels for proof generation.
    async fn snapshot(&self, id: BatchId) -> AnchorResult<Option<TreeSnapshot>>;

    /// Batches currently in the given status, oldest first.
    async fn list_by_status(&self, status: BatchStatus) -> AnchorResult<Vec<Batch>>;

    /// Compare-and-swap the status. Returns `false` when the stored
    /// status no longer equals `from` (another worker moved it first).
    /// Stamps `submitted_at` when `to` is `Submitted`.
    async fn try_transition(
        &self,
        id: BatchId,
        from: BatchStatus,
        to: BatchStatus,
    ) -> AnchorResult<bool>;

    /// Record the ledger coordinates of a successful commit. Safe to
    /// call again to refresh the block number once it becomes known.
    async fn record_submission(
        &self,
        id: BatchId,
        tx_ref: &LedgerTxRef,
        block_number: Option<u64>,
    ) -> AnchorResult<()>;

    /// Atomically confirm a batch: move `Anchored` to `Confirmed`,
    /// stamp `confirmed_at`, and flag every member anchored under the
    /// batch root. All in one step, so no reader ever sees a confirmed
    /// batch with unflagged members. Returns `false` when the batch was
    /// no longer `Anchored` (a concurrent poll got there first).
    async fn confirm(&self, id: BatchId, block_number: Option<u64>) -> AnchorResult<bool>;

    /// Atomically fail a batch and, when `release_members` is set,
    /// return its members to the eligible pool. Returns `false` when
    /// the batch was already terminal.
    async fn fail(
        &self,
        id: BatchId,
        failure: BatchFailure,
        release_members: bool,
    ) -> AnchorResult<bool>;
}

/// Receipt returned by a successful ledger commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub tx_ref: LedgerTxRef,
    /// Present when the ledger includes synchronously at commit time.
    pub block_number: Option<u64>,
}

/// Metadata committed alongside the root hash.
#[derive(Debug, Clone)]
pub struct CommitMetadata {
    pub batch_id: BatchId,
    pub leaf_count: usize,
}

/// Finality report for a previously committed reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalityStatus {
    /// Not (or not yet) visible on the ledger.
    NotFound,
    /// Included at `depth` blocks below the tip (the tip itself is
    /// depth 1).
    Included { depth: u64, block_number: u64 },
    /// The containing block was reorganized away.
    Reorged,
}

/// Client for the anchoring ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Commit a root under an idempotency key. Committing the same key
    /// again returns the original receipt instead of writing twice.
    async fn commit(
        &self,
        idempotency_key: &str,
        root: Hash,
        metadata: &CommitMetadata,
    ) -> Result<CommitReceipt, LedgerError>;

    /// Look up an earlier commit by idempotency key. `Ok(None)` after
    /// an ambiguous failure is itself untrusted; see
    /// [`LedgerError::is_ambiguous`].
    async fn lookup(&self, idempotency_key: &str) -> Result<Option<LedgerTxRef>, LedgerError>;

    /// Current finality of a committed reference.
    async fn finality(&self, tx_ref: &LedgerTxRef) -> Result<FinalityStatus, LedgerError>;
}

/// Downstream notification fan-out. At-least-once; a failed notify is
/// logged by the caller and never fails the batch operation it trails.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn notify(&self, event: AnchorEvent) -> AnchorResult<()>;
}

/// Opaque lease handle. Dropping it releases the lease.
pub trait LeaseHandle: Send {}

/// Mutual exclusion for batch formation. At most one holder at a time
/// across every engine instance sharing the lease backend.
#[async_trait]
pub trait FormationLease: Send + Sync {
    /// Take the lease without blocking. `None` means another holder has
    /// it and this formation cycle should be skipped.
    async fn try_acquire(&self) -> AnchorResult<Option<Box<dyn LeaseHandle>>>;
}
