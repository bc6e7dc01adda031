//! Shared fixtures and the in-memory pipeline harness.

use anchor_engine::adapters::{InMemoryStore, MutexLease, RecordingNotifier, ScriptedLedger};
use anchor_engine::{AnchorConfig, AnchorService};
use chrono::Duration;
use shared_types::{Amount, NaiveDate, OwnerId, TransactionRecord, Utc};
use std::sync::Arc;

/// Everything a test needs to drive and observe the pipeline.
pub struct Pipeline {
    pub store: InMemoryStore,
    pub ledger: Arc<ScriptedLedger>,
    pub notifier: Arc<RecordingNotifier>,
    pub service:
        AnchorService<InMemoryStore, InMemoryStore, ScriptedLedger, MutexLease, RecordingNotifier>,
}

/// Wire the whole pipeline onto fresh in-memory adapters.
pub fn pipeline(config: AnchorConfig) -> Pipeline {
    let store = InMemoryStore::new();
    let ledger = Arc::new(ScriptedLedger::new("testnet"));
    let notifier = Arc::new(RecordingNotifier::new());
    let service = AnchorService::new(
        config,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        ledger.clone(),
        Arc::new(MutexLease::new()),
        notifier.clone(),
    );
    Pipeline {
        store,
        ledger,
        notifier,
        service,
    }
}

/// Test config: batches from one leaf, confirmation at depth 1,
/// two commit attempts with millisecond backoff.
pub fn test_config() -> AnchorConfig {
    AnchorConfig::for_testing()
}

/// A finalized record whose `created_at` is offset by `sequence`
/// seconds, pinning its leaf position when a batch forms.
pub fn sequenced_record(owner: OwnerId, sequence: i64, merchant: &str) -> TransactionRecord {
    let mut record = TransactionRecord::new(
        owner,
        Amount::from_minor_units(-10_000 - sequence * 250),
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        merchant,
        "groceries",
    );
    record.created_at = Utc::now() + Duration::seconds(sequence);
    record
}

/// Seed `count` sequenced records for one owner and return them in
/// formation (leaf) order.
pub fn seed_sequenced(store: &InMemoryStore, owner: OwnerId, count: usize) -> Vec<TransactionRecord> {
    (0..count)
        .map(|i| {
            let record = sequenced_record(owner, i as i64, &format!("Merchant {i}"));
            store.insert_record(record.clone());
            record
        })
        .collect()
}
