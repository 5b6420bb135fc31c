//! # Swap Records
//!
//! The orchestrator's durable view of one swap. Everything needed to resume
//! or cancel lives here and in the two escrows.

use super::errors::{EscrowId, Hash, SwapError, Timestamp};
use super::secure_secret::{Nonce, SecureSecret};
use super::timelocks::TimelockSchedule;
use super::value_objects::{Address, ChainId, Side, SwapStatus, Token};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxRef {
    /// Chain it was submitted to.
    pub chain: ChainId,
    /// Transaction hash.
    pub hash: Hash,
    /// Block (ledger index) it was included in.
    pub block: u64,
}

impl TxRef {
    /// Short hex prefix for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.hash[..4])
    }
}

/// What the order source hands the orchestrator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Signed-order hash; a fresh one is derived when absent.
    pub order_hash: Option<Hash>,
    /// Maker account on the source chain.
    pub maker_src: Address,
    /// Maker account on the destination chain (receives destination funds).
    pub maker_dst: Address,
    /// Resolver account on the source chain (receives source funds).
    pub taker_src: Address,
    /// Resolver account on the destination chain (funds the destination escrow).
    pub taker_dst: Address,
    /// Source asset.
    pub src_token: Token,
    /// Destination asset.
    pub dst_token: Token,
    /// Source principal.
    pub src_amount: u128,
    /// Destination principal.
    pub dst_amount: u128,
    /// Source safety deposit.
    pub src_safety_deposit: u128,
    /// Destination safety deposit.
    pub dst_safety_deposit: u128,
    /// Schedule override; the configured default is used when absent.
    pub schedule: Option<TimelockSchedule>,
}

/// One leg of a swap as persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LegRecord {
    /// Chain hosting the escrow.
    pub chain: ChainId,
    /// Leg.
    pub side: Side,
    /// Ledger-assigned id, set only from the creation result.
    pub escrow_id: Option<EscrowId>,
    /// Maker on this chain.
    pub maker: Address,
    /// Taker on this chain.
    pub taker: Address,
    /// Asset.
    pub token: Token,
    /// Principal.
    pub amount: u128,
    /// Safety deposit.
    pub safety_deposit: u128,
    /// Relative schedule.
    pub schedule: TimelockSchedule,
    /// Packed timelock word including `deployed_at`, once created.
    pub timelocks: Option<U256>,
    /// Withdrawal opens (chain time), once created.
    pub finality_lock: Option<Timestamp>,
    /// Cancellation opens (chain time), once created.
    pub cancel_lock: Option<Timestamp>,
    /// Submitted transactions by purpose (`create`, `commit`, `withdraw`, `cancel`).
    pub tx_refs: BTreeMap<String, TxRef>,
    /// Escrow reached a terminal state on-chain.
    pub settled: bool,
}

/// Link from a sub-swap to its parent order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FillRef {
    /// Parent order.
    pub parent_order: Hash,
    /// Fill index in the parent's history.
    pub fill_index: u32,
}

/// Durable per-swap record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwapRecord {
    /// Unique order hash; the store key.
    pub order_hash: Hash,
    /// keccak256 of the secret.
    pub hashlock: Hash,
    /// Preimage; redacted from every copy leaving the owning process until revealed.
    pub secret: Option<SecureSecret>,
    /// Commitment nonce.
    pub nonce: Option<Nonce>,
    /// Commitment submitted to the destination chain.
    pub commitment: Option<Hash>,
    /// Destination chain time once the commitment was confirmed.
    pub committed_at: Option<Timestamp>,
    /// Current stage.
    pub status: SwapStatus,
    /// Source leg.
    pub src: LegRecord,
    /// Destination leg.
    pub dst: LegRecord,
    /// Partial-fill linkage for sub-swaps.
    pub partial_fill: Option<FillRef>,
    /// Wall-clock creation time.
    pub created_at: Timestamp,
    /// Last error observed while driving, if any.
    pub last_error: Option<String>,
}

impl SwapRecord {
    /// Transition to new status.
    pub fn transition_to(&mut self, next: SwapStatus) -> Result<(), SwapError> {
        if !self.status.can_transition_to(next) {
            return Err(SwapError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Leg by side.
    pub fn leg(&self, side: Side) -> &LegRecord {
        match side {
            Side::Source => &self.src,
            Side::Destination => &self.dst,
        }
    }

    /// Mutable leg by side.
    pub fn leg_mut(&mut self, side: Side) -> &mut LegRecord {
        match side {
            Side::Source => &mut self.src,
            Side::Destination => &mut self.dst,
        }
    }

    /// Copy safe to expose outside the owning process: secret and nonce are
    /// dropped until the secret is public on-chain.
    pub fn public_view(&self) -> SwapRecord {
        let mut view = self.clone();
        if !self.status.secret_is_public() {
            view.secret = None;
            view.nonce = None;
        }
        view
    }

    /// Hex order hash for logs and file names.
    pub fn order_hex(&self) -> String {
        hex::encode(self.order_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(chain: ChainId, side: Side) -> LegRecord {
        LegRecord {
            chain,
            side,
            escrow_id: None,
            maker: Address::new("maker"),
            taker: Address::new("taker"),
            token: Token::Native,
            amount: 1000,
            safety_deposit: 100,
            schedule: TimelockSchedule::default(),
            timelocks: None,
            finality_lock: None,
            cancel_lock: None,
            tx_refs: BTreeMap::new(),
            settled: false,
        }
    }

    fn record() -> SwapRecord {
        SwapRecord {
            order_hash: [9u8; 32],
            hashlock: [8u8; 32],
            secret: Some(SecureSecret::new([7u8; 32])),
            nonce: Some(Nonce::new([6u8; 32])),
            commitment: None,
            committed_at: None,
            status: SwapStatus::Created,
            src: leg(ChainId::Sepolia, Side::Source),
            dst: leg(ChainId::XrplTestnet, Side::Destination),
            partial_fill: None,
            created_at: 0,
            last_error: None,
        }
    }

    #[test]
    fn test_public_view_redacts_until_revealed() {
        let mut rec = record();
        let view = rec.public_view();
        assert!(view.secret.is_none());
        assert!(view.nonce.is_none());

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains(&"07".repeat(32)));

        rec.status = SwapStatus::SecretRevealed;
        assert!(rec.public_view().secret.is_some());
    }

    #[test]
    fn test_transition_rejects_skips() {
        let mut rec = record();
        assert!(rec.transition_to(SwapStatus::SecretCommitted).is_err());
        assert!(rec.transition_to(SwapStatus::DstEscrowFunded).is_ok());
        assert_eq!(rec.status, SwapStatus::DstEscrowFunded);
    }

    #[test]
    fn test_record_json_round_trip_keeps_secret() {
        let rec = record();
        let json = serde_json::to_string(&rec).unwrap();
        let back: SwapRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.secret, rec.secret);
        assert_eq!(back.dst.chain, ChainId::XrplTestnet);
    }
}
