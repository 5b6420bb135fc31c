//! # Orchestrated Swaps
//!
//! The orchestrator against two simulated chains on a paused tokio clock:
//!
//! 1. **Happy Path**: 2000 source for 150 destination
//! 2. **Partial Fills**: one order settled by two sub-swaps
//! 3. **Secret Hygiene**: views only carry the secret once it is public

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use htlc_swap::domain::{EscrowEvent, FillError, FillStatus};
    use htlc_swap::{
        child_order_hash, hash_secret, ChainId, EscrowLedger, InMemorySwapStore, SimulatedChain,
        SwapApi, SwapError, SwapOrchestrator, SwapStatus, SwapStore, Token, TokioClock,
    };
    use std::sync::Arc;

    struct Network {
        src: Arc<SimulatedChain>,
        dst: Arc<SimulatedChain>,
        store: Arc<InMemorySwapStore>,
        orchestrator: SwapOrchestrator,
    }

    fn network() -> Network {
        let config = fast_retry_config();
        let src = SimulatedChain::new(EscrowLedger::new(
            ChainId::Sepolia,
            config.ledger_config(),
            Arc::new(TokioClock::starting_at(T0)),
        ));
        let dst = SimulatedChain::new(EscrowLedger::new(
            ChainId::XrplTestnet,
            config.ledger_config(),
            Arc::new(TokioClock::starting_at(T0 - 3)),
        ));
        let store = Arc::new(InMemorySwapStore::new());
        let orchestrator = SwapOrchestrator::new(
            Arc::new(src.adapter(resolver_src())),
            Arc::new(dst.adapter(resolver_dst())),
            store.clone(),
            config,
        );
        Network {
            src,
            dst,
            store,
            orchestrator,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_swap_2000_for_150_end_to_end() {
        let n = network();
        let record = n.orchestrator.create_swap(swap_request(2_000, 150)).await.unwrap();

        assert_eq!(record.status, SwapStatus::Completed);
        assert_eq!(hash_secret(record.secret.as_ref().unwrap()), record.hashlock);
        assert_eq!(n.src.ledger().balance_of(&resolver_src(), &Token::Native), 2_010);
        assert_eq!(n.dst.ledger().balance_of(&maker_dst(), &Token::Native), 150);
        assert_eq!(n.dst.ledger().balance_of(&resolver_dst(), &Token::Native), 5);

        // Commit precedes the destination reveal.
        let events = n.dst.ledger().events();
        let commit_idx = events
            .iter()
            .position(|e| matches!(e, EscrowEvent::SecretCommitted { .. }))
            .unwrap();
        let withdraw_idx = events
            .iter()
            .position(|e| matches!(e, EscrowEvent::Withdrawn { .. }))
            .unwrap();
        assert!(commit_idx < withdraw_idx);

        // Destination escrow was funded before the source escrow.
        let src_created = n.src.ledger().events().iter().find_map(|e| match e {
            EscrowEvent::EscrowCreated { at, .. } => Some(*at),
            _ => None,
        });
        let dst_created = events.iter().find_map(|e| match e {
            EscrowEvent::EscrowCreated { at, .. } => Some(*at),
            _ => None,
        });
        assert!(dst_created.unwrap() + 3 <= src_created.unwrap());

        let stored = n.store.get(&record.order_hash).unwrap().unwrap();
        assert!(stored.src.tx_refs.contains_key("create"));
        assert!(stored.src.tx_refs.contains_key("withdraw"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_fill_sequence() {
        let n = network();
        let parent = [0x70; 32];
        n.orchestrator.open_order(parent, 1_000, 2_000).unwrap();

        let first = n
            .orchestrator
            .fill_order(parent, 300, 600, swap_request(0, 0))
            .await
            .unwrap();
        assert_eq!(first.status, SwapStatus::Completed);
        assert_eq!(first.partial_fill.as_ref().unwrap().fill_index, 0);

        let state = n.orchestrator.accountant().state(&parent).unwrap();
        assert_eq!((state.remaining_src, state.remaining_dst), (700, 1_400));
        assert_eq!(state.status(), FillStatus::PartiallyFilled);

        let err = n
            .orchestrator
            .fill_order(parent, 800, 1_600, swap_request(0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::Fill(FillError::ExceedsRemaining { .. })));
        assert_eq!(n.orchestrator.accountant().state(&parent).unwrap(), state);

        let second = n
            .orchestrator
            .fill_order(parent, 700, 1_400, swap_request(0, 0))
            .await
            .unwrap();
        assert_eq!(second.status, SwapStatus::Completed);
        assert_eq!(second.order_hash, child_order_hash(&parent, 1));

        let state = n.orchestrator.accountant().state(&parent).unwrap();
        assert_eq!(state.status(), FillStatus::FullyFilled);
        assert!(state.is_balanced());
        assert_eq!(state.fill_history.len(), 2);
        assert_eq!(n.dst.ledger().balance_of(&maker_dst(), &Token::Native), 2_000);
        assert_eq!(n.src.ledger().balance_of(&resolver_src(), &Token::Native), 1_020);
    }

    #[tokio::test(start_paused = true)]
    async fn test_views_redact_secret_until_public() {
        let n = network();
        n.dst.fail_next_finality(1);

        let cancelled = n.orchestrator.create_swap(swap_request(1_000, 100)).await.unwrap();
        assert_eq!(cancelled.status, SwapStatus::Cancelled);
        assert!(cancelled.secret.is_none() && cancelled.nonce.is_none());

        let view = n.orchestrator.get_status(&cancelled.order_hash).unwrap();
        assert!(view.secret.is_none());
        // The owning store keeps it for recovery.
        let stored = n.store.get(&cancelled.order_hash).unwrap().unwrap();
        assert!(stored.secret.is_some());

        let completed = n.orchestrator.create_swap(swap_request(1_000, 100)).await.unwrap();
        assert!(n
            .orchestrator
            .get_status(&completed.order_hash)
            .unwrap()
            .secret
            .is_some());
    }
}
