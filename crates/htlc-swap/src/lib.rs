//! # HTLC Swap
//!
//! Trustless cross-chain asset swaps between an EVM chain and the XRP Ledger
//! using hash time-locked escrows.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Escrows locked by `keccak256(secret)` with a seven-stage timelock
//! - A commit-reveal step on the destination chain so the secret cannot be
//!   front-run out of the mempool
//! - An orchestrator that drives both escrows to completion or refund and
//!   survives restarts
//! - Partial fills of one order through several sub-swaps
//!
//! ## Security Properties
//!
//! | Defense | Description |
//! |---------|-------------|
//! | Timelock ordering | Destination cancels strictly before source |
//! | Commit-reveal | Destination reveal only after the commitment aged |
//! | Finality checks | Chain-specific confirmations before every transition |
//! | Secret hygiene | Zeroized on drop, redacted from logs and public views |
//!
//! ## Module Structure
//!
//! ```text
//! htlc-swap/
//! ├── domain/          # Escrow, timelocks, swap records, errors
//! ├── algorithms/      # Hashing, timelock word, escrow ids, schedules
//! ├── ledger/          # Escrow state machine with balances
//! ├── ports/           # SwapApi, ChainAdapter, SwapStore, TimeSource
//! ├── adapters/        # Simulated chains, JSON store, clocks
//! └── service/         # Orchestrator, retries, partial fills
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod ledger;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    InMemoryChainAdapter, InMemorySwapStore, JsonFileSwapStore, ManualClock, SimulatedChain,
    SystemTimeSource, TokioClock,
};
pub use algorithms::{
    child_order_hash, escrow_id, generate_nonce, generate_secret, hash_secret, keccak256, pack,
    pack_timelocks, plan_deadlines, secret_commitment, unpack, validate_schedule, verify_secret,
};
pub use config::{LedgerConfig, RetryPolicy, SwapConfig};
pub use domain::{
    Address, ChainId, Escrow, EscrowCreateParams, EscrowError, EscrowState, FillStatus, Hash,
    Nonce, PartialFillState, SecureSecret, Side, Stage, SwapError, SwapRecord, SwapRequest,
    SwapStatus, TimelockSchedule, Timelocks, Token,
};
pub use ledger::EscrowLedger;
pub use ports::{ChainAdapter, FinalityStatus, SwapApi, SwapStore, TimeSource};
pub use service::{PartialFillAccountant, SwapOrchestrator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
