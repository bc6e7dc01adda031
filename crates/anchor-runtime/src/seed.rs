//! Demo data seeding for local runs against the scripted ledger.

use anchor_engine::adapters::InMemoryStore;
use chrono::NaiveDate;
use shared_types::{Amount, OwnerId, TransactionRecord};

const MERCHANTS: &[(&str, &str, i64)] = &[
    ("Corner Grocery", "groceries", -43_750),
    ("Metro Transit", "transport", -27_500),
    ("Blue Bottle Cafe", "dining", -6_250),
    ("City Power & Light", "utilities", -891_200),
    ("Monthly Salary", "income", 32_500_000),
    ("Pharmacy Plus", "health", -18_990),
    ("Cloud Hosting Inc", "subscriptions", -120_000),
    ("Hardware Depot", "home", -254_300),
];

/// Insert `count` finalized records for a single demo owner, spread
/// over consecutive dates so formation order is visibly stable.
pub fn seed_demo_records(store: &InMemoryStore, count: usize) -> usize {
    let owner = OwnerId::new();
    let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

    for i in 0..count {
        let (merchant, category, minor_units) = MERCHANTS[i % MERCHANTS.len()];
        let date = start
            .checked_add_days(chrono::Days::new((i / MERCHANTS.len()) as u64))
            .unwrap_or(start);
        store.insert_record(TransactionRecord::new(
            owner,
            Amount::from_minor_units(minor_units),
            date,
            merchant,
            category,
        ));
    }
    count
}
