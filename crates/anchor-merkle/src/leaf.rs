//! # Leaf Hashing
//!
//! Deterministic, versioned hashing of transaction content.
//!
//! The digest covers exactly the fields a proof later attests to: id,
//! amount, date, merchant, category, owner. Bookkeeping fields (claims,
//! anchoring flags, timestamps) are excluded so that store-side state
//! changes never alter the hash.

use sha2::{Digest, Sha256};
use shared_types::{Hash, TransactionRecord};

/// Domain prefix for leaf digests. The trailing version tag is hashed
/// along with the content, so an encoding change bumps the tag and old
/// proofs remain verifiable under `v1`.
pub const LEAF_DOMAIN: &[u8] = b"ledger-anchor:leaf:v1\0";

/// Compute the leaf hash of a transaction record.
///
/// # Canonical Encoding
///
/// 1. Domain prefix (with version tag)
/// 2. Transaction id (16 raw bytes)
/// 3. Amount in its canonical decimal rendering
/// 4. Date as ISO-8601 (`YYYY-MM-DD`)
/// 5. Merchant, normalized (trimmed, inner runs of whitespace collapsed
///    to one space, uppercased)
/// 6. Category, verbatim
/// 7. Owner id (16 raw bytes)
///
/// Variable-length fields are length-prefixed so adjacent strings
/// cannot collide.
pub fn leaf_hash(record: &TransactionRecord) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(LEAF_DOMAIN);
    hasher.update(record.id.0.as_bytes());
    update_field(&mut hasher, record.amount.canonical_string().as_bytes());
    update_field(&mut hasher, record.date.to_string().as_bytes());
    update_field(&mut hasher, normalize_merchant(&record.merchant).as_bytes());
    update_field(&mut hasher, record.category.as_bytes());
    hasher.update(record.owner.0.as_bytes());
    hasher.finalize().into()
}

/// Length-prefix a variable-width field.
fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u32).to_be_bytes());
    hasher.update(bytes);
}

/// Collapse incidental whitespace differences in captured merchant names.
fn normalize_merchant(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}
