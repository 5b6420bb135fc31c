//! # Timelock Codec
//!
//! Packs the seven stage offsets plus the deployment timestamp into one
//! 256-bit word, the way escrow contracts store them:
//!
//! ```text
//! bits   0..32   SrcWithdrawal
//! bits  32..64   SrcPublicWithdrawal
//! bits  64..96   SrcCancellation
//! bits  96..128  SrcPublicCancellation
//! bits 128..160  DstWithdrawal
//! bits 160..192  DstPublicWithdrawal
//! bits 192..224  DstCancellation
//! bits 224..256  deployedAt
//! ```

use crate::domain::{Stage, Timelocks, TimelockSchedule, Timestamp, TimelockError};
use primitive_types::U256;

const LANE_BITS: usize = 32;
const DEPLOYED_AT_SHIFT: usize = 224;

fn read_lane(word: U256, lane: usize) -> u32 {
    (word >> (lane * LANE_BITS)).low_u32()
}

/// Pack a schedule and its deployment timestamp.
pub fn pack(schedule: &TimelockSchedule, deployed_at: u32) -> U256 {
    let mut word = U256::from(deployed_at) << DEPLOYED_AT_SHIFT;
    for (lane, offset) in schedule.offsets().iter().enumerate() {
        word = word | (U256::from(*offset) << (lane * LANE_BITS));
    }
    word
}

/// Pack an anchored schedule.
pub fn pack_timelocks(timelocks: &Timelocks) -> U256 {
    pack(&timelocks.schedule, timelocks.deployed_at)
}

/// Deployment timestamp stored in the top lane.
pub fn deployed_at(word: U256) -> u32 {
    read_lane(word, DEPLOYED_AT_SHIFT / LANE_BITS)
}

/// Absolute deadline of `stage`: `deployedAt + offset`.
pub fn unpack(word: U256, stage: Stage) -> Timestamp {
    deployed_at(word) as Timestamp + read_lane(word, stage.lane()) as Timestamp
}

/// Decode the full word back into structured form.
pub fn decode(word: U256) -> Timelocks {
    let mut offsets = [0u32; 7];
    for (lane, offset) in offsets.iter_mut().enumerate() {
        *offset = read_lane(word, lane);
    }
    Timelocks {
        schedule: TimelockSchedule::from_offsets(offsets),
        deployed_at: deployed_at(word),
    }
}

/// Decode and validate ordering.
pub fn decode_checked(word: U256) -> Result<Timelocks, TimelockError> {
    let timelocks = decode(word);
    timelocks.schedule.validate()?;
    Ok(timelocks)
}
