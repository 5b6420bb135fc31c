//! # Domain Invariants
//!
//! Business rules that must hold for a swap to stay atomic.

use super::entities::Escrow;
use super::errors::{ChainError, Hash, TimelockError, Timestamp};
use super::partial_fill::PartialFillState;
use super::timelocks::TimelockSchedule;

/// Invariant: stage ordering per leg, and destination cancellation strictly
/// before source cancellation.
pub fn invariant_timelock_ordering(schedule: &TimelockSchedule) -> Result<(), TimelockError> {
    schedule.validate()
}

/// Invariant: the destination leg resolves before the source leg can be
/// cancelled, measured in each chain's own clock with a skew margin.
///
/// Clocks of the two chains are not synchronised, so the relative check in
/// [`invariant_timelock_ordering`] is not enough on its own.
pub fn invariant_cross_chain_deadlines(
    schedule: &TimelockSchedule,
    src_now: Timestamp,
    dst_now: Timestamp,
    skew_tolerance_secs: u64,
) -> Result<(), TimelockError> {
    let dst_cancel = dst_now + schedule.dst_cancellation as u64 + skew_tolerance_secs;
    let src_cancel = src_now + schedule.src_cancellation as u64;
    if dst_cancel >= src_cancel {
        return Err(TimelockError::InvalidTimelockOrdering {
            rule: "DstCancellation + skew < SrcCancellation (absolute)",
        });
    }
    Ok(())
}

/// Invariant: both escrows of a swap share one hashlock.
pub fn invariant_hashlock_match(src_hashlock: &Hash, dst_hashlock: &Hash) -> bool {
    src_hashlock == dst_hashlock
}

/// Invariant: an escrow is never both withdrawn and cancelled.
pub fn invariant_terminal_exclusive(escrow: &Escrow) -> bool {
    !(escrow.completed && escrow.cancelled)
}

/// Invariant: `filled + remaining == total` on both legs.
pub fn invariant_fill_conservation(state: &PartialFillState) -> bool {
    state.is_balanced()
}

/// Invariant: sufficient confirmations for finality.
pub fn invariant_sufficient_confirmations(
    confirmations: u64,
    required: u64,
) -> Result<(), ChainError> {
    if confirmations < required {
        return Err(ChainError::FinalityNotReached {
            got: confirmations,
            required,
        });
    }
    Ok(())
}
