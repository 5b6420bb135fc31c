//! # Domain Errors
//!
//! Error types for every layer of the swap stack, plus the classification
//! the orchestrator uses to decide whether a failure is worth retrying.

use thiserror::Error;

/// 32-byte hash (keccak256).
pub type Hash = [u8; 32];

/// Raw 32-byte word (secrets, nonces, commitments).
pub type Bytes32 = [u8; 32];

/// Escrow identifier: keccak256 of the encoded immutables.
pub type EscrowId = Hash;

/// Unix timestamp in seconds, as reported by a chain.
pub type Timestamp = u64;

/// How a failure should be handled by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller mistake; rejected before any mutation, never retried.
    Validation,
    /// Recoverable by waiting.
    Timing,
    /// The swap already resolved or was misconfigured.
    State,
    /// Wrong caller for the current window.
    Authorization,
    /// Network/RPC failure; retried with backoff.
    Transient,
}

impl ErrorClass {
    /// Whether the retry helper should try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timing | Self::Transient)
    }
}

/// Secret and nonce validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// Secret was not exactly 32 bytes.
    #[error("Invalid secret length: expected 32 bytes, got {0}")]
    InvalidSecretLength(usize),

    /// Nonce was not exactly 32 bytes.
    #[error("Invalid nonce length: expected 32 bytes, got {0}")]
    InvalidNonceLength(usize),
}

/// Timelock schedule errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelockError {
    /// Stage offsets violate the required ordering.
    #[error("Invalid timelock ordering: {rule}")]
    InvalidTimelockOrdering {
        /// The ordering rule that failed.
        rule: &'static str,
    },

    /// Deployment timestamp does not fit the 32-bit lane.
    #[error("Deployment timestamp {0} does not fit in 32 bits")]
    DeployedAtOverflow(u64),
}

/// Escrow state machine errors (what an escrow contract reverts with).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// Value transferred is short of `amount + safety_deposit`.
    #[error("Insufficient deposit: required {required}, provided {provided}")]
    InsufficientDeposit {
        /// Amount the escrow needs.
        required: u128,
        /// Amount actually supplied.
        provided: u128,
    },

    /// Cancellation delay below the ledger minimum.
    #[error("Invalid cancel delay: {got}s < minimum {min}s")]
    InvalidCancelDelay {
        /// Requested delay.
        got: u64,
        /// Ledger minimum.
        min: u64,
    },

    /// Schedule failed validation.
    #[error(transparent)]
    InvalidTimelockOrdering(#[from] TimelockError),

    /// Zero principal.
    #[error("Escrow amount must be non-zero")]
    InvalidAmount,

    /// An escrow with identical immutables already exists.
    #[error("Escrow already exists: {}", hex::encode(.0))]
    EscrowAlreadyExists(EscrowId),

    /// No escrow with this id.
    #[error("Escrow not found: {}", hex::encode(.0))]
    EscrowNotFound(EscrowId),

    /// Escrow was already withdrawn.
    #[error("Escrow already completed")]
    AlreadyCompleted,

    /// Escrow was already cancelled.
    #[error("Escrow already cancelled")]
    AlreadyCancelled,

    /// `hash(secret) != hashlock`.
    #[error("Invalid secret")]
    InvalidSecret,

    /// No matching commitment was recorded.
    #[error("Secret not committed")]
    SecretNotCommitted,

    /// Commitment is younger than the reveal delay.
    #[error("Reveal too early: allowed at {allowed_at}, now {now}")]
    RevealTooEarly {
        /// First timestamp the reveal is accepted.
        allowed_at: Timestamp,
        /// Current chain time.
        now: Timestamp,
    },

    /// Withdrawal window has not opened yet.
    #[error("Finality not reached: withdrawal opens at {opens_at}, now {now}")]
    FinalityNotReached {
        /// Start of the private withdrawal window.
        opens_at: Timestamp,
        /// Current chain time.
        now: Timestamp,
    },

    /// Cancellation window already started; withdrawal is no longer possible.
    #[error("Withdrawal window closed at {closed_at}")]
    WithdrawalWindowClosed {
        /// Start of the cancellation window.
        closed_at: Timestamp,
    },

    /// Cancellation lock has not elapsed.
    #[error("Too early to cancel: allowed at {allowed_at}, now {now}")]
    TooEarly {
        /// First timestamp cancellation is accepted from this caller.
        allowed_at: Timestamp,
        /// Current chain time.
        now: Timestamp,
    },

    /// Caller not allowed in the current (private) window.
    #[error("Unauthorized caller: {0}")]
    Unauthorized(String),
}

impl EscrowError {
    /// Classification used for retry decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InsufficientDeposit { .. }
            | Self::InvalidCancelDelay { .. }
            | Self::InvalidTimelockOrdering(_)
            | Self::InvalidAmount => ErrorClass::Validation,
            Self::RevealTooEarly { .. } | Self::FinalityNotReached { .. } | Self::TooEarly { .. } => {
                ErrorClass::Timing
            }
            Self::EscrowAlreadyExists(_)
            | Self::EscrowNotFound(_)
            | Self::AlreadyCompleted
            | Self::AlreadyCancelled
            | Self::InvalidSecret
            | Self::SecretNotCommitted
            | Self::WithdrawalWindowClosed { .. } => ErrorClass::State,
            Self::Unauthorized(_) => ErrorClass::Authorization,
        }
    }
}

/// Errors surfaced by a chain adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The escrow contract rejected the call.
    #[error("Transaction reverted: {0}")]
    Reverted(#[from] EscrowError),

    /// RPC or network failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Transaction is included but not yet final.
    #[error("Not finalized: {got}/{required} confirmations")]
    FinalityNotReached {
        /// Confirmations observed.
        got: u64,
        /// Confirmations required.
        required: u64,
    },

    /// Transaction reference is unknown to the chain.
    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),
}

impl ChainError {
    /// Classification used for retry decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Reverted(e) => e.class(),
            Self::Transport(_) => ErrorClass::Transient,
            Self::FinalityNotReached { .. } => ErrorClass::Timing,
            Self::UnknownTransaction(_) => ErrorClass::State,
        }
    }
}

/// Swap store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded.
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another process holds the store lock.
    #[error("Store already locked: {0}")]
    Locked(String),
}

/// Partial-fill accounting errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FillError {
    /// Unknown parent order.
    #[error("Order not found: {}", hex::encode(.0))]
    OrderNotFound(Hash),

    /// Order was already registered.
    #[error("Order already open: {}", hex::encode(.0))]
    OrderAlreadyOpen(Hash),

    /// Requested amount exceeds what is left on at least one leg.
    #[error("Fill exceeds remaining: requested ({req_src}, {req_dst}), remaining ({rem_src}, {rem_dst})")]
    ExceedsRemaining {
        /// Requested source amount.
        req_src: u128,
        /// Requested destination amount.
        req_dst: u128,
        /// Remaining source amount.
        rem_src: u128,
        /// Remaining destination amount.
        rem_dst: u128,
    },

    /// Fill of zero on either leg.
    #[error("Fill amounts must be non-zero")]
    ZeroAmount,

    /// Fill index does not exist or was already reverted.
    #[error("Unknown fill index {0}")]
    UnknownFill(u32),
}

/// Orchestrator errors.
#[derive(Debug, Error)]
pub enum SwapError {
    /// Secret/nonce validation.
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Schedule validation.
    #[error(transparent)]
    Timelock(#[from] TimelockError),

    /// Chain call failed.
    #[error("Chain call failed during {stage}: {source}")]
    Chain {
        /// Await point or operation being executed.
        stage: &'static str,
        /// Underlying error.
        #[source]
        source: ChainError,
    },

    /// Partial-fill bookkeeping.
    #[error(transparent)]
    Fill(#[from] FillError),

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No swap with this order hash.
    #[error("Swap not found: {}", hex::encode(.0))]
    SwapNotFound(Hash),

    /// Operation not allowed in the swap's current status.
    #[error("Invalid swap transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Attempted status.
        to: String,
    },

    /// A withdraw for this escrow is already being submitted.
    #[error("Withdraw already in flight for escrow {}", hex::encode(.0))]
    WithdrawInFlight(EscrowId),

    /// An await point exceeded its timeout.
    #[error("Timed out waiting for {stage}")]
    Timeout {
        /// Await point.
        stage: &'static str,
    },

    /// Retries exhausted on a recoverable condition; funds stay locked and recoverable.
    #[error("Pending, retry later ({stage}): {reason}")]
    RetryLater {
        /// Await point.
        stage: &'static str,
        /// Last observed error.
        reason: String,
    },

    /// Funding could not be confirmed; created escrows must be cancelled.
    #[error("Funding failed on {side}: {reason}")]
    FundingFailed {
        /// Leg that failed.
        side: String,
        /// Reason reported by the chain.
        reason: String,
    },

    /// The chain reports a state the orchestrator cannot reconcile.
    #[error("Chain state mismatch: {0}")]
    StateMismatch(String),
}

impl SwapError {
    /// Wrap a chain error with the stage it happened in.
    pub fn chain(stage: &'static str, source: ChainError) -> Self {
        Self::Chain { stage, source }
    }

    /// Classification used for retry decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Secret(_) | Self::Timelock(_) | Self::Fill(_) => ErrorClass::Validation,
            Self::Chain { source, .. } => source.class(),
            Self::Store(_) => ErrorClass::Transient,
            Self::SwapNotFound(_) | Self::InvalidTransition { .. } | Self::StateMismatch(_) => {
                ErrorClass::State
            }
            Self::WithdrawInFlight(_) | Self::FundingFailed { .. } => ErrorClass::State,
            Self::Timeout { .. } | Self::RetryLater { .. } => ErrorClass::Timing,
        }
    }
}
