//! In-memory chain simulation implementing `ChainAdapter`.
//!
//! A `SimulatedChain` owns an escrow ledger plus a block counter; every
//! successful submission is included in a new block. Several wallets can
//! act on the same chain through their own `InMemoryChainAdapter`.

use crate::algorithms::keccak256;
use crate::domain::{
    invariant_sufficient_confirmations, Address, Bytes32, ChainError, ChainId, Escrow,
    EscrowCreateParams, EscrowError, EscrowId, Hash, Nonce, SecureSecret, Timestamp, TxRef,
};
use crate::ledger::EscrowLedger;
use crate::ports::{ChainAdapter, FinalityStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Default)]
struct BlockState {
    height: u64,
    txs: HashMap<Hash, TxStatus>,
}

#[derive(Clone, Debug)]
struct TxStatus {
    block: u64,
    failure: Option<String>,
}

/// One simulated chain shared by every wallet acting on it.
pub struct SimulatedChain {
    ledger: EscrowLedger,
    blocks: Mutex<BlockState>,
    auto_mine: AtomicBool,
    failing_submissions: AtomicU32,
    failing_finality: AtomicU32,
}

impl SimulatedChain {
    /// Wrap a ledger. Auto-mining is on: waiting for finality produces
    /// blocks at the chain's block time.
    pub fn new(ledger: EscrowLedger) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            blocks: Mutex::new(BlockState::default()),
            auto_mine: AtomicBool::new(true),
            failing_submissions: AtomicU32::new(0),
            failing_finality: AtomicU32::new(0),
        })
    }

    /// Adapter signing as `wallet`.
    pub fn adapter(self: &Arc<Self>, wallet: Address) -> InMemoryChainAdapter {
        InMemoryChainAdapter {
            chain: Arc::clone(self),
            wallet,
        }
    }

    /// Underlying ledger.
    pub fn ledger(&self) -> &EscrowLedger {
        &self.ledger
    }

    /// Current block height.
    pub fn height(&self) -> u64 {
        self.blocks.lock().height
    }

    /// Produce `n` empty blocks.
    pub fn mine_blocks(&self, n: u64) {
        self.blocks.lock().height += n;
    }

    /// Toggle block production while awaiting finality.
    pub fn set_auto_mine(&self, on: bool) {
        self.auto_mine.store(on, Ordering::SeqCst);
    }

    /// Make the next `n` submissions fail with a transport error.
    pub fn fail_next_submissions(&self, n: u32) {
        self.failing_submissions.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` included transactions fail to finalize.
    pub fn fail_next_finality(&self, n: u32) {
        self.failing_finality.store(n, Ordering::SeqCst);
    }

    fn take_fault(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_transport(&self, op: &str) -> Result<(), ChainError> {
        if Self::take_fault(&self.failing_submissions) {
            warn!(chain = %self.ledger.chain(), op, "[xswap] Injected transport failure");
            return Err(ChainError::Transport(format!(
                "{} rpc unavailable during {}",
                self.ledger.chain(),
                op
            )));
        }
        Ok(())
    }

    fn include(&self, op: &str) -> TxRef {
        let failure = Self::take_fault(&self.failing_finality)
            .then(|| format!("{} reorganised away", op));
        let mut blocks = self.blocks.lock();
        blocks.height += 1;
        let block = blocks.height;
        let hash = keccak256(&[
            self.ledger.chain().to_string().as_bytes(),
            op.as_bytes(),
            &block.to_be_bytes()[..],
            &(blocks.txs.len() as u64).to_be_bytes()[..],
        ]);
        blocks.txs.insert(hash, TxStatus { block, failure });
        TxRef {
            chain: self.ledger.chain(),
            hash,
            block,
        }
    }
}

/// Chain adapter bound to one wallet on a simulated chain.
#[derive(Clone)]
pub struct InMemoryChainAdapter {
    chain: Arc<SimulatedChain>,
    wallet: Address,
}

impl InMemoryChainAdapter {
    /// Signing wallet.
    pub fn wallet(&self) -> &Address {
        &self.wallet
    }

    /// The shared chain.
    pub fn simulated(&self) -> &Arc<SimulatedChain> {
        &self.chain
    }

    fn reverted(&self, op: &str, e: EscrowError) -> ChainError {
        debug!(chain = %self.chain(), op, error = %e, "[xswap] Transaction reverted");
        ChainError::Reverted(e)
    }
}

#[async_trait]
impl ChainAdapter for InMemoryChainAdapter {
    fn chain(&self) -> ChainId {
        self.chain.ledger.chain()
    }

    async fn submit_create_escrow(
        &self,
        params: EscrowCreateParams,
    ) -> Result<(TxRef, EscrowId), ChainError> {
        self.chain.check_transport("create")?;
        let id = self
            .chain
            .ledger
            .create_escrow(params)
            .map_err(|e| self.reverted("create", e))?;
        let tx = self.chain.include("create");
        debug!(chain = %self.chain(), tx = %tx.short(), "[xswap] Escrow creation included");
        Ok((tx, id))
    }

    async fn submit_commit_secret(&self, commitment: Bytes32) -> Result<TxRef, ChainError> {
        self.chain.check_transport("commit")?;
        self.chain.ledger.commit_secret(commitment);
        Ok(self.chain.include("commit"))
    }

    async fn submit_reveal_and_withdraw(
        &self,
        escrow_id: EscrowId,
        secret: &SecureSecret,
        nonce: &Nonce,
    ) -> Result<TxRef, ChainError> {
        self.chain.check_transport("withdraw")?;
        self.chain
            .ledger
            .reveal_and_withdraw(&self.wallet, escrow_id, secret, nonce)
            .map_err(|e| self.reverted("withdraw", e))?;
        Ok(self.chain.include("withdraw"))
    }

    async fn submit_cancel(&self, escrow_id: EscrowId) -> Result<TxRef, ChainError> {
        self.chain.check_transport("cancel")?;
        self.chain
            .ledger
            .cancel(&self.wallet, escrow_id)
            .map_err(|e| self.reverted("cancel", e))?;
        Ok(self.chain.include("cancel"))
    }

    async fn await_finality(
        &self,
        tx: &TxRef,
        required_confirmations: u64,
    ) -> Result<FinalityStatus, ChainError> {
        let block_time = Duration::from_secs(self.chain().block_time_secs());
        loop {
            let (status, height) = {
                let blocks = self.chain.blocks.lock();
                let status = blocks
                    .txs
                    .get(&tx.hash)
                    .cloned()
                    .ok_or_else(|| ChainError::UnknownTransaction(hex::encode(tx.hash)))?;
                (status, blocks.height)
            };
            if let Some(reason) = status.failure {
                return Ok(FinalityStatus::Failed { reason });
            }

            let confirmations = height + 1 - status.block;
            if invariant_sufficient_confirmations(confirmations, required_confirmations).is_ok() {
                return Ok(FinalityStatus::Confirmed { confirmations });
            }

            tokio::time::sleep(block_time).await;
            if self.chain.auto_mine.load(Ordering::SeqCst) {
                self.chain.mine_blocks(1);
            }
        }
    }

    async fn get_escrow(&self, escrow_id: EscrowId) -> Result<Option<Escrow>, ChainError> {
        self.chain.check_transport("get_escrow")?;
        Ok(self.chain.ledger.get_escrow(&escrow_id))
    }

    async fn current_chain_time(&self) -> Result<Timestamp, ChainError> {
        Ok(self.chain.ledger.now())
    }
}
