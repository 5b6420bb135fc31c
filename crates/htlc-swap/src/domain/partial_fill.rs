//! # Partial-Fill State
//!
//! Per-order bookkeeping for orders settled in several increments. Holds
//! `filled + remaining == total` on both legs across every operation.

use super::errors::{FillError, Hash, Timestamp};
use super::invariants::invariant_fill_conservation;
use serde::{Deserialize, Serialize};

/// Fill progress of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillStatus {
    /// No fill recorded yet.
    Open,
    /// At least one fill recorded, capacity left.
    PartiallyFilled,
    /// Both legs fully filled.
    FullyFilled,
}

/// One accepted fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillRecord {
    /// Position in the history.
    pub index: u32,
    /// When it was accepted.
    pub timestamp: Timestamp,
    /// Source-leg amount.
    pub amount_src: u128,
    /// Destination-leg amount.
    pub amount_dst: u128,
    /// Informational only: share of the original source total.
    pub percentage_of_original: f64,
    /// Capacity was handed back after the sub-swap was cancelled.
    pub reverted: bool,
}

/// Cumulative fill accounting for one order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartialFillState {
    /// Parent order.
    pub order_hash: Hash,
    /// Original source amount.
    pub total_amount_src: u128,
    /// Original destination amount.
    pub total_amount_dst: u128,
    /// Source amount filled so far.
    pub filled_src: u128,
    /// Destination amount filled so far.
    pub filled_dst: u128,
    /// Source amount still available.
    pub remaining_src: u128,
    /// Destination amount still available.
    pub remaining_dst: u128,
    /// Accepted fills in order.
    pub fill_history: Vec<FillRecord>,
}

impl PartialFillState {
    /// Fresh order with nothing filled.
    pub fn new(order_hash: Hash, total_src: u128, total_dst: u128) -> Self {
        Self {
            order_hash,
            total_amount_src: total_src,
            total_amount_dst: total_dst,
            filled_src: 0,
            filled_dst: 0,
            remaining_src: total_src,
            remaining_dst: total_dst,
            fill_history: Vec::new(),
        }
    }

    /// Accept a fill only if both legs fit in what remains. Leaves state
    /// untouched on rejection.
    pub fn apply_fill(
        &mut self,
        amount_src: u128,
        amount_dst: u128,
        timestamp: Timestamp,
    ) -> Result<FillRecord, FillError> {
        if amount_src == 0 || amount_dst == 0 {
            return Err(FillError::ZeroAmount);
        }
        if amount_src > self.remaining_src || amount_dst > self.remaining_dst {
            return Err(FillError::ExceedsRemaining {
                req_src: amount_src,
                req_dst: amount_dst,
                rem_src: self.remaining_src,
                rem_dst: self.remaining_dst,
            });
        }

        self.remaining_src -= amount_src;
        self.remaining_dst -= amount_dst;
        self.filled_src += amount_src;
        self.filled_dst += amount_dst;

        let record = FillRecord {
            index: self.fill_history.len() as u32,
            timestamp,
            amount_src,
            amount_dst,
            percentage_of_original: percentage(amount_src, self.total_amount_src),
            reverted: false,
        };
        self.fill_history.push(record.clone());
        debug_assert!(invariant_fill_conservation(self));
        Ok(record)
    }

    /// Return a fill's amounts to the remaining pool.
    pub fn revert_fill(&mut self, index: u32) -> Result<(), FillError> {
        let record = self
            .fill_history
            .get_mut(index as usize)
            .filter(|r| !r.reverted)
            .ok_or(FillError::UnknownFill(index))?;

        record.reverted = true;
        self.filled_src -= record.amount_src;
        self.filled_dst -= record.amount_dst;
        self.remaining_src += record.amount_src;
        self.remaining_dst += record.amount_dst;
        debug_assert!(invariant_fill_conservation(self));
        Ok(())
    }

    /// Current fill status.
    pub fn status(&self) -> FillStatus {
        if self.remaining_src == 0 && self.remaining_dst == 0 {
            FillStatus::FullyFilled
        } else if self.filled_src > 0 || self.filled_dst > 0 {
            FillStatus::PartiallyFilled
        } else {
            FillStatus::Open
        }
    }

    /// Conservation check on both legs.
    pub fn is_balanced(&self) -> bool {
        self.filled_src.checked_add(self.remaining_src) == Some(self.total_amount_src)
            && self.filled_dst.checked_add(self.remaining_dst) == Some(self.total_amount_dst)
    }
}

fn percentage(part: u128, total: u128) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / total as f64
}
