//! In-memory store backing both store ports.
//!
//! Records, batches, and snapshots live behind one lock, giving the
//! combined lifecycle operations (claim-on-insert, flag-on-confirm,
//! release-on-fail) the same atomicity a database adapter gets from a
//! transaction.

use crate::domain::{eligibility_violation, Batch, BatchFailure, BatchStatus};
use crate::error::{AnchorError, AnchorResult};
use crate::ports::outbound::{BatchStore, EligibilityFilter, TransactionStore};
use anchor_merkle::TreeSnapshot;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{BatchId, LedgerTxRef, TransactionId, TransactionRecord, Utc};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct StoreState {
    records: HashMap<TransactionId, TransactionRecord>,
    batches: HashMap<BatchId, Batch>,
    snapshots: HashMap<BatchId, TreeSnapshot>,
}

/// Shared in-memory backend for [`TransactionStore`] and [`BatchStore`].
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record (seeding and tests).
    pub fn insert_record(&self, record: TransactionRecord) {
        self.state.write().records.insert(record.id, record);
    }

    /// Snapshot of one record.
    pub fn record(&self, id: TransactionId) -> Option<TransactionRecord> {
        self.state.read().records.get(&id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.state.read().records.len()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn eligible_transactions(
        &self,
        filter: &EligibilityFilter,
        limit: usize,
    ) -> AnchorResult<Vec<TransactionRecord>> {
        let state = self.state.read();
        let mut eligible: Vec<TransactionRecord> = state
            .records
            .values()
            .filter(|r| eligibility_violation(r).is_none())
            .filter(|r| filter.owner.map_or(true, |owner| r.owner == owner))
            .cloned()
            .collect();
        eligible.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        eligible.truncate(limit);
        Ok(eligible)
    }

    async fn get(&self, id: TransactionId) -> AnchorResult<Option<TransactionRecord>> {
        Ok(self.state.read().records.get(&id).cloned())
    }

    async fn unanchored_count(&self) -> AnchorResult<usize> {
        Ok(self
            .state
            .read()
            .records
            .values()
            .filter(|r| !r.is_anchored)
            .count())
    }
}

#[async_trait]
impl BatchStore for InMemoryStore {
    async fn insert_pending(&self, batch: &Batch, snapshot: &TreeSnapshot) -> AnchorResult<()> {
        let mut state = self.state.write();

        // Validate every member before touching anything.
        for id in &batch.members {
            let record = state
                .records
                .get(id)
                .ok_or(AnchorError::TransactionNotFound {
                    transaction_id: *id,
                })?;
            if let Some(existing) = record.claimed_batch {
                return Err(AnchorError::AlreadyClaimed {
                    transaction_id: *id,
                    batch_id: existing,
                });
            }
            if let Some(reason) = eligibility_violation(record) {
                return Err(AnchorError::IneligibleTransaction {
                    transaction_id: *id,
                    reason: reason.to_string(),
                });
            }
        }

        for id in &batch.members {
            if let Some(record) = state.records.get_mut(id) {
                record.claimed_batch = Some(batch.id);
            }
        }
        state.snapshots.insert(batch.id, snapshot.clone());
        state.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn batch(&self, id: BatchId) -> AnchorResult<Option<Batch>> {
        Ok(self.state.read().batches.get(&id).cloned())
    }

    async fn snapshot(&self, id: BatchId) -> AnchorResult<Option<TreeSnapshot>> {
        Ok(self.state.read().snapshots.get(&id).cloned())
    }

    async fn list_by_status(&self, status: BatchStatus) -> AnchorResult<Vec<Batch>> {
        let state = self.state.read();
        let mut batches: Vec<Batch> = state
            .batches
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect();
        batches.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(batches)
    }

    async fn try_transition(
        &self,
        id: BatchId,
        from: BatchStatus,
        to: BatchStatus,
    ) -> AnchorResult<bool> {
        let mut state = self.state.write();
        let batch = state
            .batches
            .get_mut(&id)
            .ok_or(AnchorError::BatchNotFound { batch_id: id })?;
        if batch.status != from {
            return Ok(false);
        }
        batch.transition_to(to)?;
        if to == BatchStatus::Submitted && batch.submitted_at.is_none() {
            batch.submitted_at = Some(Utc::now());
        }
        Ok(true)
    }

    async fn record_submission(
        &self,
        id: BatchId,
        tx_ref: &LedgerTxRef,
        block_number: Option<u64>,
    ) -> AnchorResult<()> {
        let mut state = self.state.write();
        let batch = state
            .batches
            .get_mut(&id)
            .ok_or(AnchorError::BatchNotFound { batch_id: id })?;
        batch.ledger_tx_ref = Some(tx_ref.clone());
        if block_number.is_some() {
            batch.ledger_block_number = block_number;
        }
        Ok(())
    }

    async fn confirm(&self, id: BatchId, block_number: Option<u64>) -> AnchorResult<bool> {
        let mut state = self.state.write();

        let (root, members) = {
            let batch = state
                .batches
                .get(&id)
                .ok_or(AnchorError::BatchNotFound { batch_id: id })?;
            if batch.status != BatchStatus::Anchored {
                return Ok(false);
            }
            (batch.root_hash, batch.members.clone())
        };
        for member in &members {
            if !state.records.contains_key(member) {
                return Err(AnchorError::Store {
                    reason: format!("batch {id} member {member} missing from the record store"),
                });
            }
        }

        let batch = state
            .batches
            .get_mut(&id)
            .ok_or(AnchorError::BatchNotFound { batch_id: id })?;
        batch.transition_to(BatchStatus::Confirmed)?;
        batch.confirmed_at = Some(Utc::now());
        if block_number.is_some() {
            batch.ledger_block_number = block_number;
        }
        for member in &members {
            if let Some(record) = state.records.get_mut(member) {
                record.is_anchored = true;
                record.batch_root = Some(root);
            }
        }
        Ok(true)
    }

    async fn fail(
        &self,
        id: BatchId,
        failure: BatchFailure,
        release_members: bool,
    ) -> AnchorResult<bool> {
        let mut state = self.state.write();

        let members = {
            let batch = state
                .batches
                .get(&id)
                .ok_or(AnchorError::BatchNotFound { batch_id: id })?;
            if batch.status.is_terminal() {
                return Ok(false);
            }
            batch.members.clone()
        };

        let batch = state
            .batches
            .get_mut(&id)
            .ok_or(AnchorError::BatchNotFound { batch_id: id })?;
        batch.transition_to(BatchStatus::Failed)?;
        batch.failure = Some(failure);

        if release_members {
            for member in &members {
                if let Some(record) = state.records.get_mut(member) {
                    // Release only claims held by this batch.
                    if record.claimed_batch == Some(id) {
                        record.claimed_batch = None;
                    }
                }
            }
        }
        Ok(true)
    }
}
