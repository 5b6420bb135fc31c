//! # Partial-Fill Accountant
//!
//! Tracks fill capacity of orders that settle in several sub-swaps.
//! Capacity is reserved when a fill is accepted and handed back only if the
//! sub-swap ends cancelled.

use crate::domain::{FillError, FillRecord, FillStatus, Hash, PartialFillState, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

/// Outcome of an accepted fill.
#[derive(Clone, Debug, PartialEq)]
pub struct FillReceipt {
    /// Parent order.
    pub order_hash: Hash,
    /// History entry just appended.
    pub record: FillRecord,
    /// Source capacity left.
    pub remaining_src: u128,
    /// Destination capacity left.
    pub remaining_dst: u128,
    /// Order status after the fill.
    pub status: FillStatus,
}

/// Per-order fill bookkeeping.
#[derive(Default)]
pub struct PartialFillAccountant {
    orders: RwLock<HashMap<Hash, PartialFillState>>,
}

impl PartialFillAccountant {
    /// Create an empty accountant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an order with its full amounts.
    pub fn open_order(
        &self,
        order_hash: Hash,
        total_src: u128,
        total_dst: u128,
    ) -> Result<PartialFillState, FillError> {
        if total_src == 0 || total_dst == 0 {
            return Err(FillError::ZeroAmount);
        }
        let mut orders = self.orders.write();
        if orders.contains_key(&order_hash) {
            return Err(FillError::OrderAlreadyOpen(order_hash));
        }
        let state = PartialFillState::new(order_hash, total_src, total_dst);
        orders.insert(order_hash, state.clone());
        Ok(state)
    }

    /// Reload bookkeeping of an order from the store.
    pub fn restore(&self, state: PartialFillState) {
        self.orders.write().insert(state.order_hash, state);
    }

    /// Accept a fill only if both legs fit in what remains.
    pub fn request_fill(
        &self,
        order_hash: &Hash,
        amount_src: u128,
        amount_dst: u128,
        timestamp: Timestamp,
    ) -> Result<FillReceipt, FillError> {
        let mut orders = self.orders.write();
        let state = orders
            .get_mut(order_hash)
            .ok_or(FillError::OrderNotFound(*order_hash))?;
        let record = state.apply_fill(amount_src, amount_dst, timestamp)?;

        info!(
            order = %hex::encode(&order_hash[..4]),
            fill = record.index,
            amount_src,
            amount_dst,
            remaining_src = state.remaining_src,
            remaining_dst = state.remaining_dst,
            "[xswap] Fill accepted"
        );
        Ok(FillReceipt {
            order_hash: *order_hash,
            record,
            remaining_src: state.remaining_src,
            remaining_dst: state.remaining_dst,
            status: state.status(),
        })
    }

    /// Hand a fill's capacity back to the order.
    pub fn revert_fill(&self, order_hash: &Hash, index: u32) -> Result<PartialFillState, FillError> {
        let mut orders = self.orders.write();
        let state = orders
            .get_mut(order_hash)
            .ok_or(FillError::OrderNotFound(*order_hash))?;
        state.revert_fill(index)?;
        info!(
            order = %hex::encode(&order_hash[..4]),
            fill = index,
            "[xswap] Fill reverted"
        );
        Ok(state.clone())
    }

    /// Current bookkeeping of an order.
    pub fn state(&self, order_hash: &Hash) -> Option<PartialFillState> {
        self.orders.read().get(order_hash).cloned()
    }

    /// Current fill status of an order.
    pub fn status(&self, order_hash: &Hash) -> Option<FillStatus> {
        self.orders.read().get(order_hash).map(|s| s.status())
    }
}
