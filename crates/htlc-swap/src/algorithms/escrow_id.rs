//! # Escrow Identity
//!
//! An escrow is identified by keccak256 of its encoded immutables, so any
//! change to a write-once field yields a different id. Only ledgers call
//! this; clients take the id from the creation result.

use super::secret::keccak256;
use super::timelock_codec::pack_timelocks;
use crate::domain::{EscrowId, Hash, Immutables, Side, Token};

fn encode_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Deterministic byte encoding of the immutables.
pub fn encode_immutables(imm: &Immutables) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    out.extend_from_slice(&imm.order_hash);
    out.extend_from_slice(&imm.hashlock);
    out.push(match imm.side {
        Side::Source => 0,
        Side::Destination => 1,
    });
    encode_str(&mut out, imm.maker.as_str());
    encode_str(&mut out, imm.taker.as_str());
    match &imm.token {
        Token::Native => out.push(0),
        Token::Contract(addr) => {
            out.push(1);
            encode_str(&mut out, addr);
        }
    }
    out.extend_from_slice(&imm.amount.to_be_bytes());
    out.extend_from_slice(&imm.safety_deposit.to_be_bytes());

    let mut word = [0u8; 32];
    pack_timelocks(&imm.timelocks).to_big_endian(&mut word);
    out.extend_from_slice(&word);
    out
}

/// Identity hash of an escrow.
pub fn escrow_id(imm: &Immutables) -> EscrowId {
    keccak256(&[&encode_immutables(imm)[..]])
}

/// Order hash of the `fill_index`-th sub-swap of `parent`.
pub fn child_order_hash(parent: &Hash, fill_index: u32) -> Hash {
    keccak256(&[&parent[..], &fill_index.to_be_bytes()[..]])
}
