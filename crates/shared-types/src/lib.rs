//! # Shared Types Crate
//!
//! This crate contains the domain vocabulary shared across the anchoring
//! subsystems: hashes, identifiers, money amounts, and the transaction
//! record itself.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Dumb Data**: No business rules live in this crate; eligibility and
//!   lifecycle logic belong to the engine.
//! - **Deterministic Rendering**: `Amount` has exactly one decimal string
//!   form so the same record always hashes the same way.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
