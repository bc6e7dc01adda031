//! Domain model for the anchoring engine.

pub mod batch;
pub mod eligibility;

pub use batch::{Batch, BatchFailure, BatchStatus, CommitKnowledge};
pub use eligibility::{eligibility_violation, is_eligible};
