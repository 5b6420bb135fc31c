//! # Inbound Ports
//!
//! API trait defining what the swap service can do.

use crate::domain::{Hash, PartialFillState, SwapError, SwapRecord, SwapRequest};
use async_trait::async_trait;

/// Swap orchestration API - inbound port.
#[async_trait]
pub trait SwapApi: Send + Sync {
    /// Run a swap end-to-end. Returns the final record, or an error with the
    /// record persisted at the last completed stage.
    async fn create_swap(&self, request: SwapRequest) -> Result<SwapRecord, SwapError>;

    /// Redacted view of a swap.
    fn get_status(&self, order_hash: &Hash) -> Result<SwapRecord, SwapError>;

    /// Force-cancel every created escrow of a swap once its lock elapsed.
    async fn cancel_swap(&self, order_hash: &Hash) -> Result<SwapRecord, SwapError>;

    /// Reload a persisted swap, reconcile it with both chains and keep driving.
    async fn resume_swap(&self, order_hash: &Hash) -> Result<SwapRecord, SwapError>;

    /// Register an order for partial filling.
    fn open_order(&self, order_hash: Hash, total_src: u128, total_dst: u128)
        -> Result<PartialFillState, SwapError>;

    /// Fill part of an order as an independent sub-swap. `template` supplies
    /// accounts, tokens and deposits; its amounts are replaced.
    async fn fill_order(
        &self,
        parent: Hash,
        amount_src: u128,
        amount_dst: u128,
        template: SwapRequest,
    ) -> Result<SwapRecord, SwapError>;
}
