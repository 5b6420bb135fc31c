//! # Domain Module
//!
//! Core domain types for cross-chain escrow swaps.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod partial_fill;
pub mod secure_secret;
pub mod swap;
pub mod timelocks;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use partial_fill::*;
pub use secure_secret::{Nonce, SecureSecret};
pub use swap::*;
pub use timelocks::*;
pub use value_objects::*;
