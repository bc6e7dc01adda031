//! Configuration for the anchoring engine.

use serde::{Deserialize, Serialize};

/// Tuning knobs for batch formation, submission, and confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Smallest batch worth committing. Formation is a no-op below this.
    pub min_batch_size: usize,

    /// Hard cap on leaves per batch. Overflow waits for the next cycle.
    pub max_batch_size: usize,

    /// Blocks of depth a commitment must accumulate before a batch is
    /// considered final.
    pub confirmation_depth: u64,

    /// Commit attempts per submission cycle before a batch is parked
    /// as failed-ambiguous.
    pub max_submit_attempts: u32,

    /// Base backoff between commit attempts, doubled per attempt.
    pub submit_backoff_ms: u64,

    /// How long a submitted batch may stay invisible on the ledger
    /// before it is dropped and its members released.
    pub drop_patience_secs: u64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            min_batch_size: 2,
            max_batch_size: 128,
            confirmation_depth: 6,
            max_submit_attempts: 3,
            submit_backoff_ms: 500,
            drop_patience_secs: 900,
        }
    }
}

impl AnchorConfig {
    /// Settings for fast unit tests: single-leaf batches, shallow
    /// finality, millisecond backoff.
    pub fn for_testing() -> Self {
        Self {
            min_batch_size: 1,
            max_batch_size: 8,
            confirmation_depth: 1,
            max_submit_attempts: 2,
            submit_backoff_ms: 1,
            drop_patience_secs: 3_600,
        }
    }
}
