//! # LedgerAnchor Test Suite
//!
//! Unified test crate exercising the full anchoring pipeline over the
//! in-memory adapters.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Shared fixtures and pipeline harness
//! └── integration/
//!     ├── pipeline.rs   # Happy path, claims, idempotency, scheduling
//!     ├── failures.rs   # Release semantics, reorgs, state machine
//!     └── proofs.rs     # Known-vector roots and inclusion proofs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p anchor-tests
//! cargo test -p anchor-tests integration::failures::
//! cargo bench -p anchor-tests
//! ```

#![allow(dead_code)]

pub mod support;
