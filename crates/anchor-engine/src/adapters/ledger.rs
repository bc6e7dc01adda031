//! Scripted ledger client for tests, demos, and local runs.

use crate::error::LedgerError;
use crate::ports::outbound::{CommitMetadata, CommitReceipt, FinalityStatus, LedgerClient};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Hash, LedgerTxRef};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Scripted outcome for one commit call.
#[derive(Debug, Clone)]
pub enum CommitScript {
    /// Record the commit; the receipt carries no block number.
    Accept,
    /// Record the commit; the receipt includes the block number.
    AcceptWithInclusion,
    /// Record the commit but lose the response.
    AcceptButTimeout,
    Timeout,
    Unreachable,
    RateLimited,
    Reject { reason: String },
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    tx_ref: LedgerTxRef,
    root: Hash,
    block_number: u64,
    reorged: bool,
}

#[derive(Default)]
struct LedgerState {
    /// Entries keyed by idempotency key.
    entries: HashMap<String, LedgerEntry>,
    /// Reverse index: tx reference -> idempotency key.
    by_ref: HashMap<String, String>,
    script: VecDeque<CommitScript>,
    commit_calls: u64,
    next_ref: u64,
    tip: u64,
}

/// In-process stand-in for the anchoring ledger.
///
/// Commits deduplicate by idempotency key, finality is computed against
/// a movable tip, and failures are injected through a queue of scripted
/// outcomes. An empty script accepts everything.
pub struct ScriptedLedger {
    network: String,
    auto_mine: bool,
    state: RwLock<LedgerState>,
}

impl ScriptedLedger {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            auto_mine: false,
            state: RwLock::default(),
        }
    }

    /// Every finality check advances the tip by one block, so demo runs
    /// reach confirmation depth without an external clock.
    pub fn with_auto_mine(network: impl Into<String>) -> Self {
        Self {
            auto_mine: true,
            ..Self::new(network)
        }
    }

    pub fn enqueue(&self, outcome: CommitScript) {
        self.state.write().script.push_back(outcome);
    }

    pub fn enqueue_all(&self, outcomes: Vec<CommitScript>) {
        self.state.write().script.extend(outcomes);
    }

    pub fn advance_tip(&self, blocks: u64) {
        self.state.write().tip += blocks;
    }

    /// Mark an entry as reorganized away.
    pub fn simulate_reorg(&self, tx_ref: &LedgerTxRef) {
        let mut state = self.state.write();
        if let Some(key) = state.by_ref.get(&tx_ref.0).cloned() {
            if let Some(entry) = state.entries.get_mut(&key) {
                entry.reorged = true;
            }
        }
    }

    /// Erase an entry entirely, as if its block never existed.
    pub fn forget(&self, tx_ref: &LedgerTxRef) {
        let mut state = self.state.write();
        if let Some(key) = state.by_ref.remove(&tx_ref.0) {
            state.entries.remove(&key);
        }
    }

    /// Total commit calls, including replays and scripted failures.
    pub fn commit_calls(&self) -> u64 {
        self.state.read().commit_calls
    }

    /// Distinct commitments actually recorded.
    pub fn committed_count(&self) -> usize {
        self.state.read().entries.len()
    }

    /// The root anchored under a reference, for offline verification.
    pub fn root_for(&self, tx_ref: &LedgerTxRef) -> Option<Hash> {
        let state = self.state.read();
        let key = state.by_ref.get(&tx_ref.0)?;
        state.entries.get(key).map(|e| e.root)
    }

    fn insert_entry(state: &mut LedgerState, key: &str, root: Hash) -> LedgerEntry {
        state.next_ref += 1;
        state.tip += 1;
        let entry = LedgerEntry {
            tx_ref: LedgerTxRef::new(format!("ltx-{:08x}", state.next_ref)),
            root,
            block_number: state.tip,
            reorged: false,
        };
        state.by_ref.insert(entry.tx_ref.0.clone(), key.to_string());
        state.entries.insert(key.to_string(), entry.clone());
        entry
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn commit(
        &self,
        idempotency_key: &str,
        root: Hash,
        metadata: &CommitMetadata,
    ) -> Result<CommitReceipt, LedgerError> {
        let mut state = self.state.write();
        state.commit_calls += 1;

        if let Some(entry) = state.entries.get(idempotency_key) {
            // Idempotent replay: hand back the original coordinates.
            debug!(
                "[ledger:{}] Replaying commit for key {}",
                self.network, idempotency_key
            );
            return Ok(CommitReceipt {
                tx_ref: entry.tx_ref.clone(),
                block_number: Some(entry.block_number),
            });
        }

        let outcome = state.script.pop_front().unwrap_or(CommitScript::Accept);
        match outcome {
            CommitScript::Accept => {
                let entry = Self::insert_entry(&mut state, idempotency_key, root);
                debug!(
                    "[ledger:{}] Anchored batch {} as {} at block {}",
                    self.network, metadata.batch_id, entry.tx_ref, entry.block_number
                );
                Ok(CommitReceipt {
                    tx_ref: entry.tx_ref,
                    block_number: None,
                })
            }
            CommitScript::AcceptWithInclusion => {
                let entry = Self::insert_entry(&mut state, idempotency_key, root);
                debug!(
                    "[ledger:{}] Anchored batch {} as {} at block {} (synchronous)",
                    self.network, metadata.batch_id, entry.tx_ref, entry.block_number
                );
                Ok(CommitReceipt {
                    block_number: Some(entry.block_number),
                    tx_ref: entry.tx_ref,
                })
            }
            CommitScript::AcceptButTimeout => {
                Self::insert_entry(&mut state, idempotency_key, root);
                Err(LedgerError::Timeout { waited_ms: 30_000 })
            }
            CommitScript::Timeout => Err(LedgerError::Timeout { waited_ms: 30_000 }),
            CommitScript::Unreachable => Err(LedgerError::Unreachable {
                reason: "connection refused".to_string(),
            }),
            CommitScript::RateLimited => Err(LedgerError::RateLimited {
                retry_after_secs: 60,
            }),
            CommitScript::Reject { reason } => Err(LedgerError::Rejected { reason }),
        }
    }

    async fn lookup(&self, idempotency_key: &str) -> Result<Option<LedgerTxRef>, LedgerError> {
        Ok(self
            .state
            .read()
            .entries
            .get(idempotency_key)
            .map(|e| e.tx_ref.clone()))
    }

    async fn finality(&self, tx_ref: &LedgerTxRef) -> Result<FinalityStatus, LedgerError> {
        let mut state = self.state.write();
        if self.auto_mine {
            state.tip += 1;
        }
        let Some(key) = state.by_ref.get(&tx_ref.0) else {
            return Ok(FinalityStatus::NotFound);
        };
        let Some(entry) = state.entries.get(key) else {
            return Ok(FinalityStatus::NotFound);
        };
        if entry.reorged {
            return Ok(FinalityStatus::Reorged);
        }
        Ok(FinalityStatus::Included {
            depth: state.tip - entry.block_number + 1,
            block_number: entry.block_number,
        })
    }
}
