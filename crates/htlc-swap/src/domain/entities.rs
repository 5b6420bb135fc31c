//! # Domain Entities
//!
//! Escrow records as an escrow ledger stores them, plus the request and
//! receipt types of its operations.

use super::errors::{EscrowId, Hash, Timestamp};
use super::secure_secret::SecureSecret;
use super::timelocks::{TimelockSchedule, Timelocks};
use super::value_objects::{Address, EscrowState, Side, Token};
use serde::{Deserialize, Serialize};

/// Write-once escrow parameters. Changing any field changes the escrow id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Immutables {
    /// Logical swap order this escrow belongs to.
    pub order_hash: Hash,
    /// keccak256 of the secret.
    pub hashlock: Hash,
    /// Which leg of the swap.
    pub side: Side,
    /// Swap initiator.
    pub maker: Address,
    /// Resolver filling the order.
    pub taker: Address,
    /// Locked asset.
    pub token: Token,
    /// Principal.
    pub amount: u128,
    /// Native-asset incentive paid to whoever executes withdraw/cancel.
    pub safety_deposit: u128,
    /// Schedule anchored at creation.
    pub timelocks: Timelocks,
}

impl Immutables {
    /// Account that funded the escrow and receives refunds.
    pub fn depositor(&self) -> &Address {
        match self.side {
            Side::Source => &self.maker,
            Side::Destination => &self.taker,
        }
    }

    /// Account that receives the principal on withdrawal.
    pub fn recipient(&self) -> &Address {
        match self.side {
            Side::Source => &self.taker,
            Side::Destination => &self.maker,
        }
    }

    /// Whether `account` is the maker or the taker.
    pub fn is_party(&self, account: &Address) -> bool {
        *account == self.maker || *account == self.taker
    }
}

/// Value attached to an escrow creation call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Native value transferred with the call.
    pub native: u128,
    /// Pre-approved token allowance (ignored for native escrows).
    pub token_allowance: u128,
}

impl Deposit {
    /// Native-only deposit.
    pub fn native(value: u128) -> Self {
        Self {
            native: value,
            token_allowance: 0,
        }
    }

    /// Token principal plus native safety deposit.
    pub fn token(allowance: u128, native: u128) -> Self {
        Self {
            native,
            token_allowance: allowance,
        }
    }
}

/// Parameters of an escrow creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCreateParams {
    /// Logical swap order.
    pub order_hash: Hash,
    /// Which leg of the swap.
    pub side: Side,
    /// keccak256 of the secret.
    pub hashlock: Hash,
    /// Swap initiator.
    pub maker: Address,
    /// Resolver.
    pub taker: Address,
    /// Locked asset.
    pub token: Token,
    /// Principal.
    pub amount: u128,
    /// Native incentive.
    pub safety_deposit: u128,
    /// Relative schedule; the ledger anchors it.
    pub schedule: TimelockSchedule,
    /// Funds attached to the call.
    pub deposit: Deposit,
}

impl EscrowCreateParams {
    /// Seconds between creation and the cancellation lock of this leg.
    pub fn cancel_delay_secs(&self) -> u64 {
        self.schedule.cancellation(self.side) as u64
    }

    /// The exact deposit an honest funder attaches.
    pub fn required_deposit(&self) -> Deposit {
        if self.token.is_native() {
            Deposit::native(self.amount + self.safety_deposit)
        } else {
            Deposit::token(self.amount, self.safety_deposit)
        }
    }
}

/// An escrow as stored by a ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    /// Identity hash of the immutables.
    pub id: EscrowId,
    /// Write-once parameters.
    pub immutables: Immutables,
    /// Withdrawn.
    pub completed: bool,
    /// Refunded.
    pub cancelled: bool,
    /// Chain time at creation.
    pub created_at: Timestamp,
    /// Withdrawal is refused before this time.
    pub finality_lock: Timestamp,
    /// Cancellation is refused before this time.
    pub cancel_lock: Timestamp,
}

impl Escrow {
    /// Lifecycle state derived from the flags.
    pub fn state(&self) -> EscrowState {
        match (self.completed, self.cancelled) {
            (true, _) => EscrowState::Withdrawn,
            (_, true) => EscrowState::Cancelled,
            _ => EscrowState::Created,
        }
    }

    /// Withdrawn or cancelled.
    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }
}

/// Record emitted by ledger operations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EscrowEvent {
    /// Funds locked.
    EscrowCreated {
        /// New escrow.
        id: EscrowId,
        /// Order it belongs to.
        order_hash: Hash,
        /// Hashlock.
        hashlock: Hash,
        /// Leg.
        side: Side,
        /// Chain time.
        at: Timestamp,
    },
    /// Commitment stored.
    SecretCommitted {
        /// Commitment value.
        commitment: Hash,
        /// Chain time.
        at: Timestamp,
    },
    /// Secret revealed and funds released.
    Withdrawn {
        /// Escrow.
        id: EscrowId,
        /// Now-public preimage.
        secret: SecureSecret,
        /// Caller who collected the safety deposit.
        caller: Address,
        /// Chain time.
        at: Timestamp,
    },
    /// Funds refunded.
    Cancelled {
        /// Escrow.
        id: EscrowId,
        /// Caller who collected the safety deposit.
        caller: Address,
        /// Chain time.
        at: Timestamp,
    },
}

/// Outcome of a successful reveal-and-withdraw.
#[derive(Clone, Debug)]
pub struct WithdrawReceipt {
    /// Escrow.
    pub escrow_id: EscrowId,
    /// Principal recipient.
    pub recipient: Address,
    /// Principal paid.
    pub amount: u128,
    /// Caller paid the safety deposit.
    pub caller: Address,
    /// Safety deposit paid.
    pub safety_deposit: u128,
    /// The revealed secret, now public.
    pub secret: SecureSecret,
}

/// Outcome of a successful cancellation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelReceipt {
    /// Escrow.
    pub escrow_id: EscrowId,
    /// Original depositor.
    pub refund_to: Address,
    /// Principal refunded.
    pub amount: u128,
    /// Safety deposit refunded.
    pub safety_deposit: u128,
}
