//! # Timelock Schedule
//!
//! Structured view of the seven-stage schedule. The packed 256-bit wire
//! format lives in `algorithms::timelock_codec`; everything else works with
//! these types.

use super::errors::{Timestamp, TimelockError};
use super::value_objects::{Side, Stage};
use serde::{Deserialize, Serialize};

/// Relative stage offsets in seconds from deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockSchedule {
    /// Taker may withdraw source funds.
    pub src_withdrawal: u32,
    /// Anyone may withdraw source funds.
    pub src_public_withdrawal: u32,
    /// Parties may cancel the source escrow.
    pub src_cancellation: u32,
    /// Anyone may cancel the source escrow.
    pub src_public_cancellation: u32,
    /// Taker may withdraw destination funds.
    pub dst_withdrawal: u32,
    /// Anyone may withdraw destination funds.
    pub dst_public_withdrawal: u32,
    /// Destination escrow may be cancelled.
    pub dst_cancellation: u32,
}

impl Default for TimelockSchedule {
    fn default() -> Self {
        Self {
            src_withdrawal: 120,
            src_public_withdrawal: 1_800,
            src_cancellation: 7_200,
            src_public_cancellation: 9_000,
            dst_withdrawal: 60,
            dst_public_withdrawal: 1_200,
            dst_cancellation: 3_600,
        }
    }
}

impl TimelockSchedule {
    /// Build from offsets in lane order.
    pub fn from_offsets(offsets: [u32; 7]) -> Self {
        Self {
            src_withdrawal: offsets[0],
            src_public_withdrawal: offsets[1],
            src_cancellation: offsets[2],
            src_public_cancellation: offsets[3],
            dst_withdrawal: offsets[4],
            dst_public_withdrawal: offsets[5],
            dst_cancellation: offsets[6],
        }
    }

    /// Offsets in lane order.
    pub fn offsets(&self) -> [u32; 7] {
        [
            self.src_withdrawal,
            self.src_public_withdrawal,
            self.src_cancellation,
            self.src_public_cancellation,
            self.dst_withdrawal,
            self.dst_public_withdrawal,
            self.dst_cancellation,
        ]
    }

    /// Offset of a single stage.
    pub fn offset(&self, stage: Stage) -> u32 {
        self.offsets()[stage.lane()]
    }

    /// Cancellation offset for one leg.
    pub fn cancellation(&self, side: Side) -> u32 {
        match side {
            Side::Source => self.src_cancellation,
            Side::Destination => self.dst_cancellation,
        }
    }

    /// Check every ordering rule. Must pass before an escrow is created.
    pub fn validate(&self) -> Result<(), TimelockError> {
        let rules: [(bool, &'static str); 6] = [
            (
                self.src_withdrawal < self.src_public_withdrawal,
                "SrcWithdrawal < SrcPublicWithdrawal",
            ),
            (
                self.src_public_withdrawal < self.src_cancellation,
                "SrcPublicWithdrawal < SrcCancellation",
            ),
            (
                self.src_cancellation < self.src_public_cancellation,
                "SrcCancellation < SrcPublicCancellation",
            ),
            (
                self.dst_withdrawal < self.dst_public_withdrawal,
                "DstWithdrawal < DstPublicWithdrawal",
            ),
            (
                self.dst_public_withdrawal < self.dst_cancellation,
                "DstPublicWithdrawal < DstCancellation",
            ),
            (
                self.dst_cancellation < self.src_cancellation,
                "DstCancellation < SrcCancellation",
            ),
        ];

        match rules.iter().find(|(ok, _)| !ok) {
            Some((_, rule)) => Err(TimelockError::InvalidTimelockOrdering { rule: *rule }),
            None => Ok(()),
        }
    }
}

/// A schedule anchored at its deployment timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timelocks {
    /// Relative offsets.
    pub schedule: TimelockSchedule,
    /// Written by the ledger at creation, never by the caller.
    pub deployed_at: u32,
}

impl Timelocks {
    /// Anchor a schedule at `deployed_at`.
    pub fn new(schedule: TimelockSchedule, deployed_at: Timestamp) -> Result<Self, TimelockError> {
        let deployed_at =
            u32::try_from(deployed_at).map_err(|_| TimelockError::DeployedAtOverflow(deployed_at))?;
        Ok(Self {
            schedule,
            deployed_at,
        })
    }

    /// Absolute deadline of a stage.
    pub fn deadline(&self, stage: Stage) -> Timestamp {
        self.deployed_at as u64 + self.schedule.offset(stage) as u64
    }

    /// Start of the taker-only withdrawal window.
    pub fn withdrawal_start(&self, side: Side) -> Timestamp {
        match side {
            Side::Source => self.deadline(Stage::SrcWithdrawal),
            Side::Destination => self.deadline(Stage::DstWithdrawal),
        }
    }

    /// Start of the public withdrawal window.
    pub fn public_withdrawal_start(&self, side: Side) -> Timestamp {
        match side {
            Side::Source => self.deadline(Stage::SrcPublicWithdrawal),
            Side::Destination => self.deadline(Stage::DstPublicWithdrawal),
        }
    }

    /// Start of cancellation; withdrawal is closed from here on.
    pub fn cancellation_start(&self, side: Side) -> Timestamp {
        match side {
            Side::Source => self.deadline(Stage::SrcCancellation),
            Side::Destination => self.deadline(Stage::DstCancellation),
        }
    }

    /// Start of public cancellation. The destination leg has no private
    /// cancellation window, so it opens together with cancellation.
    pub fn public_cancellation_start(&self, side: Side) -> Timestamp {
        match side {
            Side::Source => self.deadline(Stage::SrcPublicCancellation),
            Side::Destination => self.deadline(Stage::DstCancellation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_valid() {
        assert!(TimelockSchedule::default().validate().is_ok());
    }

    #[test]
    fn test_dst_cancellation_after_src_rejected() {
        let schedule = TimelockSchedule {
            dst_cancellation: 8_000,
            ..TimelockSchedule::default()
        };
        assert_eq!(
            schedule.validate(),
            Err(TimelockError::InvalidTimelockOrdering {
                rule: "DstCancellation < SrcCancellation"
            })
        );
    }

    #[test]
    fn test_equal_offsets_rejected() {
        let schedule = TimelockSchedule {
            src_public_withdrawal: 120,
            ..TimelockSchedule::default()
        };
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_deadlines() {
        let tl = Timelocks::new(TimelockSchedule::default(), 1_000).unwrap();
        assert_eq!(tl.deadline(Stage::SrcCancellation), 8_200);
        assert_eq!(tl.withdrawal_start(Side::Destination), 1_060);
        assert_eq!(tl.public_cancellation_start(Side::Destination), 4_600);
    }

    #[test]
    fn test_deployed_at_overflow() {
        let too_big = u32::MAX as u64 + 1;
        assert_eq!(
            Timelocks::new(TimelockSchedule::default(), too_big),
            Err(TimelockError::DeployedAtOverflow(too_big))
        );
    }

    #[test]
    fn test_offsets_round_trip() {
        let schedule = TimelockSchedule::default();
        assert_eq!(TimelockSchedule::from_offsets(schedule.offsets()), schedule);
    }
}
