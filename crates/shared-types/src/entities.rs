//! # Core Domain Entities
//!
//! Defines the entities the anchoring pipeline operates on.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `TransactionId`, `BatchId`, `OwnerId`, `LedgerTxRef`
//! - **Money**: `Amount` (fixed-point, four fraction digits)
//! - **Records**: `TransactionRecord`, `CategoryState`

use crate::errors::AmountError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// Re-export chrono date types for use across all subsystems
pub use chrono::{DateTime, NaiveDate, Utc};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Render a hash as lowercase hex.
pub fn hash_to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Render the first four bytes of a hash for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

/// Unique identifier of a financial transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier of an anchoring batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the account that owns a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque reference to a committed ledger transaction.
///
/// The external ledger assigns this at commit time; its format is
/// ledger-specific and never parsed, only stored and echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerTxRef(pub String);

impl LedgerTxRef {
    /// Wrap a ledger-assigned reference string.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }
}

impl fmt::Display for LedgerTxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER B: MONEY
// =============================================================================

/// A signed monetary amount in minor units at fixed scale 10^-4.
///
/// Ledgers and hashing require one canonical decimal rendering, so the
/// amount is stored as an integer count of ten-thousandths and rendered
/// with exactly four fraction digits (`123.4500`, `-0.0100`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Amount(i64);

impl Amount {
    /// Minor units per whole unit (four decimal places).
    pub const SCALE: i64 = 10_000;

    /// Construct from a raw minor-unit count.
    pub fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    /// Raw minor-unit count.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// The canonical decimal rendering used for hashing and display.
    ///
    /// Always a sign (for negatives), an integer part without leading
    /// zeros, a dot, and exactly four fraction digits.
    pub fn canonical_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        format!("{sign}{whole}.{frac:04}")
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse `[-]digits[.fraction]` with at most four fraction digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole_str, frac_str) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };

        if whole_str.is_empty() || !whole_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed { input: s.to_string() });
        }
        if !frac_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed { input: s.to_string() });
        }
        if frac_str.len() > 4 {
            return Err(AmountError::TooManyFractionDigits {
                input: s.to_string(),
                max: 4,
            });
        }

        let whole: i64 = whole_str
            .parse()
            .map_err(|_| AmountError::Overflow { input: s.to_string() })?;

        // Right-pad the fraction to four digits: "45" means 4500 minor units.
        let mut frac: i64 = 0;
        if !frac_str.is_empty() {
            frac = frac_str
                .parse()
                .map_err(|_| AmountError::Malformed { input: s.to_string() })?;
            for _ in frac_str.len()..4 {
                frac *= 10;
            }
        }

        let units = whole
            .checked_mul(Self::SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(|| AmountError::Overflow { input: s.to_string() })?;

        Ok(Self(if negative { -units } else { units }))
    }
}

// =============================================================================
// CLUSTER C: RECORDS
// =============================================================================

/// Whether a transaction's category assignment is still provisional.
///
/// Records enter the system with a machine-suggested category; once the
/// owner confirms (or the review window lapses) it becomes `Final`.
/// Only `Final` records are eligible for anchoring, since the category
/// participates in the hashed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CategoryState {
    /// Auto-assigned, may still change.
    #[default]
    Provisional,
    /// Confirmed; the category is frozen.
    Final,
}

impl CategoryState {
    /// True once the category can no longer change.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final)
    }
}

/// A finalized financial transaction as seen by the anchoring pipeline.
///
/// The content fields (id, owner, amount, date, merchant, category) are
/// immutable once the record is eligible; the bookkeeping fields below
/// them are maintained by the transaction store as batches progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique record identifier.
    pub id: TransactionId,
    /// Owning account.
    pub owner: OwnerId,
    /// Transaction amount (negative for debits).
    pub amount: Amount,
    /// Calendar date the transaction occurred.
    pub date: NaiveDate,
    /// Merchant or counterparty name as captured.
    pub merchant: String,
    /// Spending category.
    pub category: String,
    /// Whether the category is frozen.
    pub category_state: CategoryState,
    /// Batch currently claiming this record, if any.
    pub claimed_batch: Option<BatchId>,
    /// Root of the batch that anchored this record, if any.
    pub batch_root: Option<Hash>,
    /// Set once the record's batch is confirmed on the ledger.
    pub is_anchored: bool,
    /// When the record entered the system.
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a fresh unclaimed record with a finalized category.
    pub fn new(
        owner: OwnerId,
        amount: Amount,
        date: NaiveDate,
        merchant: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            owner,
            amount,
            date,
            merchant: merchant.into(),
            category: category.into(),
            category_state: CategoryState::Final,
            claimed_batch: None,
            batch_root: None,
            is_anchored: false,
            created_at: Utc::now(),
        }
    }

    /// True while some batch holds a claim on this record.
    pub fn is_claimed(&self) -> bool {
        self.claimed_batch.is_some()
    }
}
