//! # Algorithms Module
//!
//! Pure functions: hashing and commitments, the packed timelock word,
//! escrow identity and schedule planning.

pub mod escrow_id;
pub mod schedule;
pub mod secret;
pub mod timelock_codec;

pub use escrow_id::{child_order_hash, escrow_id};
pub use schedule::{plan_deadlines, validate_schedule, SwapDeadlines};
pub use secret::{
    generate_nonce, generate_secret, hash_secret, hash_secret_bytes, keccak256,
    secret_commitment, secret_commitment_bytes, verify_secret,
};
pub use timelock_codec::{pack, pack_timelocks, unpack};
