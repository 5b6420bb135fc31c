//! # Outbound Ports
//!
//! Traits for external dependencies: one chain adapter per target chain, a
//! durable swap store and a clock.

use crate::domain::{
    Bytes32, ChainError, ChainId, Escrow, EscrowCreateParams, EscrowId, Hash, Nonce,
    PartialFillState, SecureSecret, StoreError, SwapRecord, Timestamp, TxRef,
};
use async_trait::async_trait;

/// Result of waiting for a transaction to become final.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinalityStatus {
    /// Included and buried under enough blocks.
    Confirmed {
        /// Confirmations observed.
        confirmations: u64,
    },
    /// Dropped, reverted or reorganised away.
    Failed {
        /// Chain-reported reason.
        reason: String,
    },
}

impl FinalityStatus {
    /// Whether the transaction is final.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Chain adapter - outbound port.
///
/// One instance per chain, bound to the signing wallet that submits the
/// transactions. Submissions return once the transaction is included; the
/// caller decides how long to wait for finality.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Chain this adapter talks to.
    fn chain(&self) -> ChainId;

    /// Create and fund an escrow. The returned id is the one the chain
    /// derived; callers never recompute it.
    async fn submit_create_escrow(
        &self,
        params: EscrowCreateParams,
    ) -> Result<(TxRef, EscrowId), ChainError>;

    /// Record a secret commitment.
    async fn submit_commit_secret(&self, commitment: Bytes32) -> Result<TxRef, ChainError>;

    /// Reveal the secret and withdraw.
    async fn submit_reveal_and_withdraw(
        &self,
        escrow_id: EscrowId,
        secret: &SecureSecret,
        nonce: &Nonce,
    ) -> Result<TxRef, ChainError>;

    /// Cancel an escrow.
    async fn submit_cancel(&self, escrow_id: EscrowId) -> Result<TxRef, ChainError>;

    /// Wait until `tx` has `required_confirmations` or is known to have failed.
    async fn await_finality(
        &self,
        tx: &TxRef,
        required_confirmations: u64,
    ) -> Result<FinalityStatus, ChainError>;

    /// Current escrow state, `None` if unknown.
    async fn get_escrow(&self, escrow_id: EscrowId) -> Result<Option<Escrow>, ChainError>;

    /// Chain clock (block timestamp / ledger close time).
    async fn current_chain_time(&self) -> Result<Timestamp, ChainError>;
}

/// Durable repository of swap records and parent-order fill state - outbound port.
pub trait SwapStore: Send + Sync {
    /// Load one record.
    fn get(&self, order_hash: &Hash) -> Result<Option<SwapRecord>, StoreError>;

    /// Insert or replace a record.
    fn put(&self, record: &SwapRecord) -> Result<(), StoreError>;

    /// All records.
    fn list(&self) -> Result<Vec<SwapRecord>, StoreError>;

    /// Load the fill bookkeeping of a parent order.
    fn get_order(&self, order_hash: &Hash) -> Result<Option<PartialFillState>, StoreError>;

    /// Insert or replace the fill bookkeeping of a parent order.
    fn put_order(&self, state: &PartialFillState) -> Result<(), StoreError>;
}

/// Time source abstraction for testability.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in seconds.
    fn now(&self) -> Timestamp;
}
