//! Swap configuration from environment variables.

use crate::domain::{ChainId, TimelockSchedule};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Bounded exponential backoff for retryable failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Attempts including the first one.
    pub max_attempts: u32,
    /// Growth factor between delays.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 8,
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .max(1)
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Rules enforced by one escrow ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Seconds between a commitment and the matching reveal.
    pub reveal_delay_secs: u64,
    /// Smallest accepted cancellation delay.
    pub min_cancel_delay_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reveal_delay_secs: 60,
            min_cancel_delay_secs: 300,
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct SwapConfig {
    /// Seconds a commitment must age before the reveal.
    pub reveal_delay_secs: u64,
    /// Smallest cancellation delay the ledgers accept.
    pub min_cancel_delay_secs: u64,
    /// Tolerated disagreement between the two chain clocks.
    pub clock_skew_tolerance_secs: u64,
    /// Timeout of each await point.
    pub await_timeout: Duration,
    /// Interval between chain polls while waiting on a lock.
    pub poll_interval: Duration,
    /// Backoff for retryable failures.
    pub retry: RetryPolicy,
    /// Schedule used when a request carries none.
    pub default_schedule: TimelockSchedule,
    /// Confirmation overrides per chain.
    pub confirmations: HashMap<ChainId, u64>,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            reveal_delay_secs: 60,
            min_cancel_delay_secs: 300,
            clock_skew_tolerance_secs: 30,
            await_timeout: Duration::from_secs(600),
            poll_interval: Duration::from_millis(1_000),
            retry: RetryPolicy::default(),
            default_schedule: TimelockSchedule::default(),
            confirmations: HashMap::new(),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl SwapConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `XSWAP_REVEAL_DELAY_SECS`: Commit-to-reveal delay (default: 60)
    /// - `XSWAP_MIN_CANCEL_DELAY_SECS`: Minimum cancellation delay (default: 300)
    /// - `XSWAP_CLOCK_SKEW_SECS`: Cross-chain clock skew tolerance (default: 30)
    /// - `XSWAP_AWAIT_TIMEOUT_SECS`: Timeout per await point (default: 600)
    /// - `XSWAP_POLL_INTERVAL_MS`: Chain poll interval (default: 1000)
    /// - `XSWAP_RETRY_MAX_ATTEMPTS`: Retry attempts per call (default: 8)
    /// - `XSWAP_CONFIRMATIONS_<CHAIN>`: Confirmation override, e.g.
    ///   `XSWAP_CONFIRMATIONS_SEPOLIA=6`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut confirmations = HashMap::new();
        for (chain, key) in [
            (ChainId::Ethereum, "XSWAP_CONFIRMATIONS_ETHEREUM"),
            (ChainId::Sepolia, "XSWAP_CONFIRMATIONS_SEPOLIA"),
            (ChainId::XrplMainnet, "XSWAP_CONFIRMATIONS_XRPL"),
            (ChainId::XrplTestnet, "XSWAP_CONFIRMATIONS_XRPL_TESTNET"),
        ] {
            if let Some(n) = env::var(key).ok().and_then(|v| v.parse().ok()) {
                confirmations.insert(chain, n);
            }
        }

        Self {
            reveal_delay_secs: env_u64("XSWAP_REVEAL_DELAY_SECS", defaults.reveal_delay_secs),
            min_cancel_delay_secs: env_u64(
                "XSWAP_MIN_CANCEL_DELAY_SECS",
                defaults.min_cancel_delay_secs,
            ),
            clock_skew_tolerance_secs: env_u64(
                "XSWAP_CLOCK_SKEW_SECS",
                defaults.clock_skew_tolerance_secs,
            ),
            await_timeout: Duration::from_secs(env_u64(
                "XSWAP_AWAIT_TIMEOUT_SECS",
                defaults.await_timeout.as_secs(),
            )),
            poll_interval: Duration::from_millis(env_u64(
                "XSWAP_POLL_INTERVAL_MS",
                defaults.poll_interval.as_millis() as u64,
            )),
            retry: RetryPolicy {
                max_attempts: env_u64(
                    "XSWAP_RETRY_MAX_ATTEMPTS",
                    defaults.retry.max_attempts as u64,
                ) as u32,
                ..defaults.retry
            },
            default_schedule: defaults.default_schedule,
            confirmations,
        }
    }

    /// Confirmations required on `chain`.
    pub fn required_confirmations(&self, chain: ChainId) -> u64 {
        self.confirmations
            .get(&chain)
            .copied()
            .unwrap_or_else(|| chain.required_confirmations())
    }

    /// Ledger rules matching this configuration.
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            reveal_delay_secs: self.reveal_delay_secs,
            min_cancel_delay_secs: self.min_cancel_delay_secs,
        }
    }
}
