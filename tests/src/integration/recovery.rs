//! # Restart Recovery
//!
//! A swap interrupted mid-flight is finished by a fresh orchestrator that
//! only has the on-disk store and the chains.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use htlc_swap::domain::{FillError, StoreError};
    use htlc_swap::{
        child_order_hash, ChainId, FillStatus, EscrowLedger, JsonFileSwapStore, SimulatedChain, SwapApi, SwapError,
        SwapOrchestrator, SwapRequest, SwapStatus, SwapStore, Token, TokioClock,
    };
    use std::path::Path;
    use std::sync::Arc;

    fn chains() -> (Arc<SimulatedChain>, Arc<SimulatedChain>) {
        let config = fast_retry_config();
        let src = SimulatedChain::new(EscrowLedger::new(
            ChainId::Sepolia,
            config.ledger_config(),
            Arc::new(TokioClock::starting_at(T0)),
        ));
        let dst = SimulatedChain::new(EscrowLedger::new(
            ChainId::XrplTestnet,
            config.ledger_config(),
            Arc::new(TokioClock::starting_at(T0)),
        ));
        (src, dst)
    }

    fn orchestrator(
        src: &Arc<SimulatedChain>,
        dst: &Arc<SimulatedChain>,
        dir: &Path,
    ) -> SwapOrchestrator {
        let store = Arc::new(JsonFileSwapStore::open(dir).unwrap());
        SwapOrchestrator::new(
            Arc::new(src.adapter(resolver_src())),
            Arc::new(dst.adapter(resolver_dst())),
            store,
            fast_retry_config(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_after_restart_completes_swap() {
        let dir = tempfile::tempdir().unwrap();
        let (src, dst) = chains();
        let order = [0x81; 32];

        {
            let first = orchestrator(&src, &dst, dir.path());
            // Source RPC down: funding stalls after the destination leg.
            src.fail_next_submissions(u32::MAX);
            let request = SwapRequest {
                order_hash: Some(order),
                ..swap_request(1_000, 100)
            };
            let err = first.create_swap(request).await.unwrap_err();
            assert!(matches!(err, SwapError::RetryLater { .. }));
            assert_eq!(first.get_status(&order).unwrap().status, SwapStatus::DstEscrowFunded);
        }

        src.fail_next_submissions(0);
        let second = orchestrator(&src, &dst, dir.path());
        let record = second.resume_swap(&order).await.unwrap();
        assert_eq!(record.status, SwapStatus::Completed);
        assert_eq!(src.ledger().balance_of(&resolver_src(), &Token::Native), 1_010);
        assert_eq!(dst.ledger().balance_of(&maker_dst(), &Token::Native), 100);

        // Only one escrow per leg was ever created.
        assert_eq!(dst.ledger().total_locked(&Token::Native), 0);
        let created = dst
            .ledger()
            .events()
            .iter()
            .filter(|e| matches!(e, htlc_swap::domain::EscrowEvent::EscrowCreated { .. }))
            .count();
        assert_eq!(created, 1);

        let on_disk = dir.path().join(format!("{}.json", hex::encode(order)));
        assert!(on_disk.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_swap_can_be_cancelled_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let (src, dst) = chains();
        let order = [0x82; 32];

        {
            let first = orchestrator(&src, &dst, dir.path());
            src.fail_next_submissions(u32::MAX);
            let request = SwapRequest {
                order_hash: Some(order),
                ..swap_request(1_000, 100)
            };
            assert!(first.create_swap(request).await.is_err());
        }

        tokio::time::sleep(std::time::Duration::from_secs(3_600)).await;
        let second = orchestrator(&src, &dst, dir.path());
        let record = second.cancel_swap(&order).await.unwrap();
        assert_eq!(record.status, SwapStatus::Cancelled);
        assert_eq!(dst.ledger().balance_of(&resolver_dst(), &Token::Native), 105);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_fills_resume_with_durable_order_state() {
        let dir = tempfile::tempdir().unwrap();
        let (src, dst) = chains();
        let parent = [0x83; 32];

        {
            let first = orchestrator(&src, &dst, dir.path());
            first.open_order(parent, 1_000, 2_000).unwrap();
            src.fail_next_submissions(u32::MAX);
            for (amount_src, amount_dst) in [(300, 600), (700, 1_400)] {
                let err = first
                    .fill_order(parent, amount_src, amount_dst, swap_request(0, 0))
                    .await
                    .unwrap_err();
                assert!(matches!(err, SwapError::RetryLater { .. }));
            }
        }

        src.fail_next_submissions(0);
        let second = orchestrator(&src, &dst, dir.path());
        for index in 0..2 {
            let record = second
                .resume_swap(&child_order_hash(&parent, index))
                .await
                .unwrap();
            assert_eq!(record.status, SwapStatus::Completed);
        }
        assert_eq!(dst.ledger().balance_of(&maker_dst(), &Token::Native), 2_000);

        let state = second.order_state(&parent).unwrap();
        assert_eq!(state.status(), FillStatus::FullyFilled);
        assert!(state.is_balanced());
        assert!(matches!(
            second.fill_order(parent, 700, 1_400, swap_request(0, 0)).await,
            Err(SwapError::Fill(FillError::ExceedsRemaining { .. }))
        ));
        assert!(dir
            .path()
            .join("orders")
            .join(format!("{}.json", hex::encode(parent)))
            .exists());
    }

    #[test]
    fn test_store_directory_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSwapStore::open(dir.path()).unwrap();
        assert!(matches!(
            JsonFileSwapStore::open(dir.path()),
            Err(StoreError::Locked(_))
        ));
        assert!(store.list().unwrap().is_empty());
    }
}
