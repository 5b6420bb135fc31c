//! # Domain Value Objects
//!
//! Immutable value types shared by the ledger, adapters and orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported chains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainId {
    /// Ethereum mainnet.
    Ethereum,
    /// Ethereum Sepolia testnet.
    Sepolia,
    /// XRP Ledger mainnet.
    XrplMainnet,
    /// XRP Ledger testnet.
    XrplTestnet,
}

/// Execution environment of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainFamily {
    /// EVM chain: block timestamps, probabilistic-then-checkpointed finality.
    Evm,
    /// Non-EVM ledger with its own consensus and close times.
    NonEvm,
}

impl ChainId {
    /// Execution environment.
    pub fn family(&self) -> ChainFamily {
        match self {
            ChainId::Ethereum | ChainId::Sepolia => ChainFamily::Evm,
            ChainId::XrplMainnet | ChainId::XrplTestnet => ChainFamily::NonEvm,
        }
    }

    /// Default confirmations before a transaction is treated as final.
    pub fn required_confirmations(&self) -> u64 {
        match self {
            ChainId::Ethereum => 12,
            ChainId::Sepolia => 3,
            // Validated ledgers are final once closed.
            ChainId::XrplMainnet | ChainId::XrplTestnet => 1,
        }
    }

    /// Estimated block (ledger close) time in seconds.
    pub fn block_time_secs(&self) -> u64 {
        match self {
            ChainId::Ethereum | ChainId::Sepolia => 12,
            ChainId::XrplMainnet | ChainId::XrplTestnet => 4,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainId::Ethereum => "ethereum",
            ChainId::Sepolia => "sepolia",
            ChainId::XrplMainnet => "xrpl",
            ChainId::XrplTestnet => "xrpl-testnet",
        };
        f.write_str(name)
    }
}

/// Chain-native account identifier (`0x..` on EVM, `r..` on XRPL).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Wrap a chain-native account string.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Raw account string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asset locked in an escrow.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Token {
    /// The chain's native asset (ETH, XRP).
    Native,
    /// Token contract / issued currency identifier.
    Contract(String),
}

impl Token {
    /// Whether this is the native-asset sentinel.
    pub fn is_native(&self) -> bool {
        matches!(self, Token::Native)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Native => f.write_str("native"),
            Token::Contract(addr) => f.write_str(addr),
        }
    }
}

/// Which leg of a swap an escrow belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Maker's funds, released to the taker on reveal.
    Source,
    /// Resolver's funds, released to the maker on reveal.
    Destination,
}

impl Side {
    /// The destination leg is revealed on first, so only it needs a
    /// matured commitment; by the time the source leg is withdrawn the
    /// secret is already public.
    pub fn requires_commitment(&self) -> bool {
        matches!(self, Side::Destination)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("src"),
            Side::Destination => f.write_str("dst"),
        }
    }
}

/// The seven timelock stages, in lane order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Stage {
    /// Taker may withdraw source funds.
    SrcWithdrawal = 0,
    /// Anyone may withdraw source funds.
    SrcPublicWithdrawal = 1,
    /// Parties may cancel the source escrow.
    SrcCancellation = 2,
    /// Anyone may cancel the source escrow.
    SrcPublicCancellation = 3,
    /// Taker may withdraw destination funds.
    DstWithdrawal = 4,
    /// Anyone may withdraw destination funds.
    DstPublicWithdrawal = 5,
    /// Destination escrow may be cancelled.
    DstCancellation = 6,
}

impl Stage {
    /// All stages in lane order.
    pub const ALL: [Stage; 7] = [
        Stage::SrcWithdrawal,
        Stage::SrcPublicWithdrawal,
        Stage::SrcCancellation,
        Stage::SrcPublicCancellation,
        Stage::DstWithdrawal,
        Stage::DstPublicWithdrawal,
        Stage::DstCancellation,
    ];

    /// Lane index inside the packed word.
    pub fn lane(&self) -> usize {
        *self as usize
    }
}

/// Escrow lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowState {
    /// Funds locked.
    Created,
    /// Secret revealed, funds released (terminal).
    Withdrawn,
    /// Funds refunded (terminal).
    Cancelled,
}

impl EscrowState {
    /// Terminal states accept no further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Withdrawn | Self::Cancelled)
    }
}

/// Orchestrated swap lifecycle.
///
/// The destination escrow is funded first, and the secret is first revealed
/// on the destination chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SwapStatus {
    /// Secret generated, nothing on-chain yet.
    Created,
    /// Destination escrow funded and final.
    DstEscrowFunded,
    /// Both escrows funded and final.
    BothEscrowsFunded,
    /// Commitment confirmed on the destination chain.
    SecretCommitted,
    /// Destination withdrawn; the secret is public.
    SecretRevealed,
    /// Source withdrawn with the public secret.
    SrcWithdrawn,
    /// Swap finished (terminal).
    Completed,
    /// Every created escrow was refunded (terminal).
    Cancelled,
}

impl SwapStatus {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: SwapStatus) -> bool {
        match (self, next) {
            (Self::Created, Self::DstEscrowFunded) => true,
            (Self::DstEscrowFunded, Self::BothEscrowsFunded) => true,
            (Self::BothEscrowsFunded, Self::SecretCommitted) => true,
            (Self::SecretCommitted, Self::SecretRevealed) => true,
            (Self::SecretRevealed, Self::SrcWithdrawn) => true,
            (Self::SrcWithdrawn, Self::Completed) => true,
            // Cancellation is allowed while the secret is still private.
            (
                Self::Created
                | Self::DstEscrowFunded
                | Self::BothEscrowsFunded
                | Self::SecretCommitted,
                Self::Cancelled,
            ) => true,
            _ => false,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the secret has been published on-chain.
    pub fn secret_is_public(&self) -> bool {
        matches!(
            self,
            Self::SecretRevealed | Self::SrcWithdrawn | Self::Completed
        )
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
