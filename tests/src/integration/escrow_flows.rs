//! # Escrow-Level Swap Flows
//!
//! Drives two ledgers by hand, playing resolver, maker and attacker:
//!
//! 1. **Happy Path**: both escrows settle, everybody paid once
//! 2. **Cancellation**: refunds open exactly at the cancellation delay
//! 3. **MEV**: a copied reveal cannot steal the destination escrow
//! 4. **Codec / Ordering**: timelock word layout and schedule rejection

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use htlc_swap::algorithms::timelock_codec;
    use htlc_swap::{
        escrow_id, generate_nonce, generate_secret, hash_secret, pack, secret_commitment, unpack,
        ChainId, EscrowError, EscrowLedger, EscrowState, LedgerConfig, ManualClock, Side, Stage,
        TimelockSchedule, Token,
    };
    use primitive_types::U256;
    use sha3::{Digest, Keccak256};
    use std::sync::Arc;

    struct Chains {
        clock: Arc<ManualClock>,
        src: EscrowLedger,
        dst: EscrowLedger,
    }

    fn chains() -> Chains {
        let clock = Arc::new(ManualClock::new(T0));
        Chains {
            src: EscrowLedger::new(ChainId::Sepolia, LedgerConfig::default(), clock.clone()),
            dst: EscrowLedger::new(ChainId::XrplTestnet, LedgerConfig::default(), clock.clone()),
            clock,
        }
    }

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[test]
    fn test_swap_1000_for_2000_settles_both_legs() {
        let c = chains();
        let schedule = TimelockSchedule::default();
        let order = [0x01; 32];

        let secret = generate_secret();
        let nonce = generate_nonce();
        let hashlock = hash_secret(&secret);

        let mut hasher = Keccak256::new();
        hasher.update(secret.as_bytes());
        let expected: [u8; 32] = hasher.finalize().into();
        assert_eq!(hashlock, expected);

        let dst_id = c
            .dst
            .create_escrow(leg_params(order, Side::Destination, hashlock, 2_000, 150, schedule))
            .unwrap();
        let src_id = c
            .src
            .create_escrow(leg_params(order, Side::Source, hashlock, 1_000, 100, schedule))
            .unwrap();
        assert_ne!(src_id, dst_id);
        assert_eq!(c.src.total_locked(&Token::Native), 1_100);
        assert_eq!(c.dst.total_locked(&Token::Native), 2_150);

        c.dst.commit_secret(secret_commitment(&secret, &nonce));
        c.clock.advance(60);
        let receipt = c
            .dst
            .reveal_and_withdraw(&resolver_dst(), dst_id, &secret, &nonce)
            .unwrap();
        assert_eq!(receipt.recipient, maker_dst());
        assert_eq!(receipt.secret, secret);

        // The source leg is unlocked with the secret the destination chain published.
        c.clock.advance(60);
        c.src
            .reveal_and_withdraw(&resolver_src(), src_id, &receipt.secret, &nonce)
            .unwrap();

        assert_eq!(c.dst.balance_of(&maker_dst(), &Token::Native), 2_000);
        assert_eq!(c.dst.balance_of(&resolver_dst(), &Token::Native), 150);
        assert_eq!(c.src.balance_of(&resolver_src(), &Token::Native), 1_100);
        assert_eq!(c.src.total_locked(&Token::Native), 0);
        assert_eq!(c.dst.total_locked(&Token::Native), 0);

        for escrow in [c.src.get_escrow(&src_id).unwrap(), c.dst.get_escrow(&dst_id).unwrap()] {
            assert!(escrow.completed && !escrow.cancelled);
            assert_eq!(escrow.state(), EscrowState::Withdrawn);
        }
    }

    // =========================================================================
    // CANCELLATION
    // =========================================================================

    #[test]
    fn test_cancellation_opens_at_3600_seconds() {
        let c = chains();
        let schedule = TimelockSchedule {
            src_cancellation: 3_600,
            dst_cancellation: 3_000,
            ..TimelockSchedule::default()
        };
        let secret = generate_secret();
        let nonce = generate_nonce();
        let hashlock = hash_secret(&secret);
        let order = [0x02; 32];

        let dst_id = c
            .dst
            .create_escrow(leg_params(order, Side::Destination, hashlock, 100, 5, schedule))
            .unwrap();
        let src_id = c
            .src
            .create_escrow(leg_params(order, Side::Source, hashlock, 1_000, 10, schedule))
            .unwrap();
        assert_eq!(c.src.get_escrow(&src_id).unwrap().cancel_lock, T0 + 3_600);

        // The resolver never reveals. Destination refunds first.
        c.clock.advance(3_000);
        c.dst.cancel(&attacker(), dst_id).unwrap();
        assert_eq!(c.dst.balance_of(&resolver_dst(), &Token::Native), 105);

        c.clock.advance(599);
        assert_eq!(
            c.src.cancel(&resolver_src(), src_id),
            Err(EscrowError::TooEarly {
                allowed_at: T0 + 3_600,
                now: T0 + 3_599
            })
        );

        c.clock.advance(1);
        let refund = c.src.cancel(&resolver_src(), src_id).unwrap();
        assert_eq!(refund.refund_to, maker_src());
        assert_eq!(c.src.balance_of(&maker_src(), &Token::Native), 1_010);

        assert_eq!(
            c.src
                .reveal_and_withdraw(&resolver_src(), src_id, &secret, &nonce)
                .unwrap_err(),
            EscrowError::AlreadyCancelled
        );
    }

    // =========================================================================
    // MEV
    // =========================================================================

    #[test]
    fn test_copied_reveal_cannot_front_run_resolver() {
        let c = chains();
        let schedule = TimelockSchedule::default();
        let secret = generate_secret();
        let nonce = generate_nonce();
        let hashlock = hash_secret(&secret);

        let dst_id = c
            .dst
            .create_escrow(leg_params([0x03; 32], Side::Destination, hashlock, 100, 5, schedule))
            .unwrap();
        c.dst.commit_secret(secret_commitment(&secret, &nonce));
        c.clock.advance(60);

        // Attacker copies the pending reveal verbatim.
        assert!(matches!(
            c.dst.reveal_and_withdraw(&attacker(), dst_id, &secret, &nonce),
            Err(EscrowError::Unauthorized(_))
        ));

        // Attacker with its own nonce has no matured commitment.
        let own_nonce = generate_nonce();
        assert_eq!(
            c.dst
                .reveal_and_withdraw(&attacker(), dst_id, &secret, &own_nonce)
                .unwrap_err(),
            EscrowError::SecretNotCommitted
        );
        let committed_at = c.dst.commit_secret(secret_commitment(&secret, &own_nonce));
        assert!(matches!(
            c.dst.reveal_and_withdraw(&attacker(), dst_id, &secret, &own_nonce),
            Err(EscrowError::RevealTooEarly { allowed_at, .. }) if allowed_at == committed_at + 60
        ));

        c.dst
            .reveal_and_withdraw(&resolver_dst(), dst_id, &secret, &nonce)
            .unwrap();
        c.clock.advance(60);
        assert_eq!(
            c.dst
                .reveal_and_withdraw(&attacker(), dst_id, &secret, &own_nonce)
                .unwrap_err(),
            EscrowError::AlreadyCompleted
        );
        assert_eq!(c.dst.balance_of(&attacker(), &Token::Native), 0);
        assert_eq!(c.dst.balance_of(&maker_dst(), &Token::Native), 100);
    }

    #[test]
    fn test_public_window_withdrawal_still_pays_recipient() {
        let c = chains();
        let schedule = TimelockSchedule::default();
        let secret = generate_secret();
        let nonce = generate_nonce();
        let hashlock = hash_secret(&secret);

        let src_id = c
            .src
            .create_escrow(leg_params([0x04; 32], Side::Source, hashlock, 1_000, 10, schedule))
            .unwrap();
        c.clock.advance(1_800);
        c.src
            .reveal_and_withdraw(&attacker(), src_id, &secret, &nonce)
            .unwrap();

        assert_eq!(c.src.balance_of(&resolver_src(), &Token::Native), 1_000);
        assert_eq!(c.src.balance_of(&attacker(), &Token::Native), 10);
    }

    // =========================================================================
    // CODEC / ORDERING
    // =========================================================================

    #[test]
    fn test_timelock_word_round_trip() {
        let schedule = TimelockSchedule::default();
        let deployed_at = 1_700_000_000u32;
        let word = pack(&schedule, deployed_at);

        assert_eq!(word >> 224usize, U256::from(deployed_at));
        for stage in Stage::ALL {
            assert_eq!(
                unpack(word, stage),
                deployed_at as u64 + schedule.offset(stage) as u64
            );
        }
        let decoded = timelock_codec::decode_checked(word).unwrap();
        assert_eq!(decoded.schedule, schedule);
        assert_eq!(decoded.deployed_at, deployed_at);
    }

    #[test]
    fn test_misordered_schedule_rejected_at_creation() {
        let c = chains();
        let schedule = TimelockSchedule {
            dst_cancellation: 8_000,
            ..TimelockSchedule::default()
        };
        let result = c
            .src
            .create_escrow(leg_params([0x05; 32], Side::Source, [9; 32], 1_000, 10, schedule));
        assert!(matches!(result, Err(EscrowError::InvalidTimelockOrdering(_))));
        assert!(c.src.events().is_empty());
    }

    #[test]
    fn test_escrow_id_tracks_every_immutable() {
        let c = chains();
        let schedule = TimelockSchedule::default();
        let params = leg_params([0x06; 32], Side::Source, [9; 32], 1_000, 10, schedule);
        let id = c.src.create_escrow(params.clone()).unwrap();
        let escrow = c.src.get_escrow(&id).unwrap();
        assert_eq!(escrow_id(&escrow.immutables), id);

        let mut other = escrow.immutables.clone();
        other.amount += 1;
        assert_ne!(escrow_id(&other), id);

        assert_eq!(
            c.src.create_escrow(params),
            Err(EscrowError::EscrowAlreadyExists(id))
        );
        assert_eq!(hex::encode(id).len(), 64);
    }
}
