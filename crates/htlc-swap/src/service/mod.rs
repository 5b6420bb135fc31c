//! # Service Layer
//!
//! The swap orchestrator, its retry helpers and partial-fill bookkeeping.

pub mod accountant;
pub mod orchestrator;
pub mod retry;

pub use accountant::{FillReceipt, PartialFillAccountant};
pub use orchestrator::SwapOrchestrator;
pub use retry::{retry, with_timeout};
