//! Outbound port adapters.

pub mod lease;
pub mod ledger;
pub mod memory;
pub mod notifier;

pub use lease::{FileLease, MutexLease};
pub use ledger::{CommitScript, ScriptedLedger};
pub use memory::InMemoryStore;
pub use notifier::{BusNotifier, RecordingNotifier};
