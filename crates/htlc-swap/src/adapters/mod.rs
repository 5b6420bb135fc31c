//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound ports: simulated chains, swap stores and clocks.

mod clock;
mod in_memory_chain;
mod json_store;
mod memory_store;

pub use clock::{ManualClock, SystemTimeSource, TokioClock};
pub use in_memory_chain::{InMemoryChainAdapter, SimulatedChain};
pub use json_store::JsonFileSwapStore;
pub use memory_store::InMemorySwapStore;
