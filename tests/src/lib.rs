//! # Cross-Chain Swap Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Hot-path measurements (hashing, codec, ids)
//! └── integration/      # Two-chain scenarios
//!     ├── escrow_flows.rs   # Ledger-level swaps, cancellation, MEV
//!     ├── orchestrated.rs   # Orchestrator end to end, partial fills
//!     └── recovery.rs       # Restart from the durable store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p swap-tests
//!
//! # By category
//! cargo test -p swap-tests integration::escrow_flows::
//! cargo test -p swap-tests integration::recovery::
//!
//! # Benchmarks
//! cargo bench -p swap-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod benchmarks;
pub mod integration;
