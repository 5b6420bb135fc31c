//! # Integration Tests
//!
//! Two escrow ledgers standing in for an EVM source chain and the XRP
//! Ledger, exercised directly and through the orchestrator.

pub mod escrow_flows;
pub mod orchestrated;
pub mod recovery;

// =============================================================================
// SHARED FIXTURES (only compiled during tests)
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use htlc_swap::domain::Deposit;
    use htlc_swap::{
        Address, EscrowCreateParams, Hash, Side, SwapConfig, SwapRequest, TimelockSchedule, Token,
        RetryPolicy,
    };
    use std::time::Duration;

    pub const T0: u64 = 1_700_000_000;

    pub fn maker_src() -> Address {
        Address::new("0x1111111111111111111111111111111111111111")
    }

    pub fn resolver_src() -> Address {
        Address::new("0x2222222222222222222222222222222222222222")
    }

    pub fn maker_dst() -> Address {
        Address::new("rMakerXXXXXXXXXXXXXXXXXXXXXXXXXXX")
    }

    pub fn resolver_dst() -> Address {
        Address::new("rResolverXXXXXXXXXXXXXXXXXXXXXXXX")
    }

    pub fn attacker() -> Address {
        Address::new("0x6666666666666666666666666666666666666666")
    }

    /// Escrow parameters for one leg of `order`, funded exactly.
    pub fn leg_params(
        order: Hash,
        side: Side,
        hashlock: Hash,
        amount: u128,
        safety_deposit: u128,
        schedule: TimelockSchedule,
    ) -> EscrowCreateParams {
        let (maker, taker) = match side {
            Side::Source => (maker_src(), resolver_src()),
            Side::Destination => (maker_dst(), resolver_dst()),
        };
        EscrowCreateParams {
            order_hash: order,
            side,
            hashlock,
            maker,
            taker,
            token: Token::Native,
            amount,
            safety_deposit,
            schedule,
            deposit: Deposit::native(amount + safety_deposit),
        }
    }

    pub fn swap_request(src_amount: u128, dst_amount: u128) -> SwapRequest {
        SwapRequest {
            order_hash: None,
            maker_src: maker_src(),
            maker_dst: maker_dst(),
            taker_src: resolver_src(),
            taker_dst: resolver_dst(),
            src_token: Token::Native,
            dst_token: Token::Native,
            src_amount,
            dst_amount,
            src_safety_deposit: 10,
            dst_safety_deposit: 5,
            schedule: None,
        }
    }

    pub fn fast_retry_config() -> SwapConfig {
        SwapConfig {
            retry: RetryPolicy {
                initial_delay: Duration::from_millis(50),
                max_delay: Duration::from_millis(500),
                max_attempts: 3,
                multiplier: 2,
            },
            ..SwapConfig::default()
        }
    }
}
