//! Eligibility rules for pulling a transaction into a batch.
//!
//! Anchoring freezes content: once a record is under a root, any edit
//! invalidates its proof. So only records whose content is settled may
//! be claimed.

use shared_types::TransactionRecord;

/// Why a record cannot be batched right now, or `None` if it can.
pub fn eligibility_violation(record: &TransactionRecord) -> Option<&'static str> {
    if record.is_anchored {
        return Some("already anchored");
    }
    if record.claimed_batch.is_some() {
        return Some("claimed by an in-flight batch");
    }
    if !record.category_state.is_final() {
        return Some("category still provisional");
    }
    None
}

/// True when the record may be claimed into a new batch.
pub fn is_eligible(record: &TransactionRecord) -> bool {
    eligibility_violation(record).is_none()
}
