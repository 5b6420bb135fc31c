//! # Schedule Planning
//!
//! Checks a relative schedule against the two chains it will run on and
//! projects it onto each chain's clock before any escrow is created.

use crate::domain::{
    invariant_cross_chain_deadlines, invariant_timelock_ordering, ChainId, Side, TimelockError, TimelockSchedule, Timelocks,
    Timestamp,
};

/// A schedule projected onto both chains' clocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapDeadlines {
    /// Source leg, anchored at source chain time.
    pub src: Timelocks,
    /// Destination leg, anchored at destination chain time.
    pub dst: Timelocks,
}

impl SwapDeadlines {
    /// Anchored timelocks of one leg.
    pub fn leg(&self, side: Side) -> &Timelocks {
        match side {
            Side::Source => &self.src,
            Side::Destination => &self.dst,
        }
    }
}

/// Validate a schedule for a chain pair.
///
/// Besides the ordering rules, every window must span at least one block of
/// the chain it runs on, and the gap between the two cancellation stages must
/// exceed the clock skew tolerance.
pub fn validate_schedule(
    schedule: &TimelockSchedule,
    src_chain: ChainId,
    dst_chain: ChainId,
    skew_tolerance_secs: u64,
) -> Result<(), TimelockError> {
    invariant_timelock_ordering(schedule)?;

    let src_block = src_chain.block_time_secs();
    let dst_block = dst_chain.block_time_secs();
    let windows: [(u32, u32, u64, &'static str); 5] = [
        (
            schedule.src_withdrawal,
            schedule.src_public_withdrawal,
            src_block,
            "SrcWithdrawal window shorter than one block",
        ),
        (
            schedule.src_public_withdrawal,
            schedule.src_cancellation,
            src_block,
            "SrcPublicWithdrawal window shorter than one block",
        ),
        (
            schedule.src_cancellation,
            schedule.src_public_cancellation,
            src_block,
            "SrcCancellation window shorter than one block",
        ),
        (
            schedule.dst_withdrawal,
            schedule.dst_public_withdrawal,
            dst_block,
            "DstWithdrawal window shorter than one block",
        ),
        (
            schedule.dst_public_withdrawal,
            schedule.dst_cancellation,
            dst_block,
            "DstPublicWithdrawal window shorter than one block",
        ),
    ];
    for (start, end, block, rule) in windows {
        if ((end - start) as u64) < block {
            return Err(TimelockError::InvalidTimelockOrdering { rule });
        }
    }

    if ((schedule.src_cancellation - schedule.dst_cancellation) as u64) <= skew_tolerance_secs {
        return Err(TimelockError::InvalidTimelockOrdering {
            rule: "SrcCancellation - DstCancellation must exceed clock skew tolerance",
        });
    }
    Ok(())
}

/// Anchor a validated schedule at the current time of each chain, checking
/// the cancellation order in absolute time.
pub fn plan_deadlines(
    schedule: &TimelockSchedule,
    src_now: Timestamp,
    dst_now: Timestamp,
    skew_tolerance_secs: u64,
) -> Result<SwapDeadlines, TimelockError> {
    invariant_cross_chain_deadlines(schedule, src_now, dst_now, skew_tolerance_secs)?;
    Ok(SwapDeadlines {
        src: Timelocks::new(*schedule, src_now)?,
        dst: Timelocks::new(*schedule, dst_now)?,
    })
}
