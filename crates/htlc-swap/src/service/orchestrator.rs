//! # Swap Orchestrator
//!
//! Drives one swap per order hash through
//! `Created -> DstEscrowFunded -> BothEscrowsFunded -> SecretCommitted ->
//! SecretRevealed -> SrcWithdrawn -> Completed`, or to `Cancelled` while the
//! secret is still private.
//!
//! ## Rules
//!
//! - The destination escrow is funded first; the secret is committed and
//!   revealed on the destination chain first.
//! - The record is persisted before every await point, so a restarted
//!   process resumes from the store and the chains.
//! - Local state only advances after `get_escrow` confirms the chain agrees.
//! - Every await point is bounded by `await_timeout`; retryable failures
//!   surface as `RetryLater` with the record left resumable.
//! - `drive` returns `Ok` once the swap is terminal (`Completed` or
//!   `Cancelled`); `last_error` explains a cancellation.

use super::accountant::PartialFillAccountant;
use super::retry::{retry, with_timeout};
use crate::algorithms::{
    child_order_hash, generate_nonce, generate_secret, hash_secret, keccak256, pack_timelocks,
    plan_deadlines, secret_commitment, validate_schedule,
};
use crate::config::SwapConfig;
use crate::domain::{
    invariant_hashlock_match, ChainError, Deposit, Escrow, EscrowCreateParams, EscrowError,
    EscrowId, FillError, FillRef, Hash, LegRecord, PartialFillState, Side, SwapError, SwapRecord,
    SwapRequest, SwapStatus, Timestamp, TxRef,
};
use crate::ports::{ChainAdapter, FinalityStatus, SwapApi, SwapStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const TX_CREATE: &str = "create";
const TX_COMMIT: &str = "commit";
const TX_WITHDRAW: &str = "withdraw";
const TX_CANCEL: &str = "cancel";

fn short(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

fn fresh_order_hash() -> Hash {
    keccak256(&[&uuid::Uuid::new_v4().as_bytes()[..]])
}

fn missing(what: &str, side: Side) -> SwapError {
    SwapError::StateMismatch(format!("{} leg has no {}", side, what))
}

fn is_unauthorized(e: &SwapError) -> bool {
    matches!(
        e,
        SwapError::Chain {
            source: ChainError::Reverted(EscrowError::Unauthorized(_)),
            ..
        }
    )
}

/// Marks an escrow as having a withdraw in flight; released on drop.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<EscrowId>>,
    id: EscrowId,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a Mutex<HashSet<EscrowId>>, id: EscrowId) -> Result<Self, SwapError> {
        if !set.lock().insert(id) {
            return Err(SwapError::WithdrawInFlight(id));
        }
        Ok(Self { set, id })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

/// Swap orchestrator service.
pub struct SwapOrchestrator {
    src: Arc<dyn ChainAdapter>,
    dst: Arc<dyn ChainAdapter>,
    store: Arc<dyn SwapStore>,
    config: SwapConfig,
    accountant: PartialFillAccountant,
    in_flight: Mutex<HashSet<EscrowId>>,
}

impl SwapOrchestrator {
    /// Wire the orchestrator to a source chain, a destination chain and a
    /// store. Both adapters sign as the resolver.
    pub fn new(
        src: Arc<dyn ChainAdapter>,
        dst: Arc<dyn ChainAdapter>,
        store: Arc<dyn SwapStore>,
        config: SwapConfig,
    ) -> Self {
        Self {
            src,
            dst,
            store,
            config,
            accountant: PartialFillAccountant::new(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SwapConfig {
        &self.config
    }

    /// Partial-fill bookkeeping.
    pub fn accountant(&self) -> &PartialFillAccountant {
        &self.accountant
    }

    /// Redacted views of every stored swap.
    pub fn list_swaps(&self) -> Result<Vec<SwapRecord>, SwapError> {
        Ok(self
            .store
            .list()?
            .iter()
            .map(SwapRecord::public_view)
            .collect())
    }

    /// Fill bookkeeping of a parent order, reloaded from the store if this
    /// process has not seen it yet.
    pub fn order_state(&self, parent: &Hash) -> Result<PartialFillState, SwapError> {
        self.load_order(parent)?;
        Ok(self
            .accountant
            .state(parent)
            .ok_or(FillError::OrderNotFound(*parent))?)
    }

    fn adapter(&self, side: Side) -> &dyn ChainAdapter {
        match side {
            Side::Source => self.src.as_ref(),
            Side::Destination => self.dst.as_ref(),
        }
    }

    fn load_order(&self, parent: &Hash) -> Result<(), SwapError> {
        if self.accountant.state(parent).is_none() {
            if let Some(state) = self.store.get_order(parent)? {
                debug!(parent = %short(parent), fills = state.fill_history.len(), "[xswap] Order reloaded");
                self.accountant.restore(state);
            }
        }
        Ok(())
    }

    fn persist_order(&self, parent: &Hash) -> Result<(), SwapError> {
        let state = self
            .accountant
            .state(parent)
            .ok_or(FillError::OrderNotFound(*parent))?;
        Ok(self.store.put_order(&state)?)
    }

    /// Hand the capacity of a cancelled sub-swap back to its parent order.
    fn release_fill(&self, fill: &FillRef) {
        let released = self.load_order(&fill.parent_order).and_then(|()| {
            self.accountant
                .revert_fill(&fill.parent_order, fill.fill_index)?;
            self.persist_order(&fill.parent_order)
        });
        if let Err(e) = released {
            warn!(parent = %short(&fill.parent_order), fill = fill.fill_index, error = %e, "[xswap] Could not release fill");
        }
    }

    fn persist(&self, record: &SwapRecord) -> Result<(), SwapError> {
        self.store.put(record)?;
        Ok(())
    }

    fn load(&self, order_hash: &Hash) -> Result<SwapRecord, SwapError> {
        self.store
            .get(order_hash)?
            .ok_or(SwapError::SwapNotFound(*order_hash))
    }

    // =========================================================================
    // CHAIN HELPERS
    // =========================================================================

    async fn chain_time(&self, side: Side) -> Result<Timestamp, SwapError> {
        let adapter = self.adapter(side);
        retry(&self.config.retry, "chain_time", move || {
            adapter.current_chain_time()
        })
        .await
    }

    async fn fetch_escrow(
        &self,
        side: Side,
        id: EscrowId,
        stage: &'static str,
    ) -> Result<Escrow, SwapError> {
        let adapter = self.adapter(side);
        retry(&self.config.retry, stage, move || adapter.get_escrow(id))
            .await?
            .ok_or_else(|| {
                SwapError::StateMismatch(format!(
                    "{} escrow {} not found on {}",
                    side,
                    short(&id),
                    adapter.chain()
                ))
            })
    }

    async fn confirm(
        &self,
        side: Side,
        tx: &TxRef,
        stage: &'static str,
    ) -> Result<FinalityStatus, SwapError> {
        let adapter = self.adapter(side);
        let required = self.config.required_confirmations(adapter.chain());
        debug!(chain = %adapter.chain(), tx = %tx.short(), required, "[xswap] Awaiting finality");
        with_timeout(
            stage,
            self.config.await_timeout,
            retry(&self.config.retry, stage, move || {
                adapter.await_finality(tx, required)
            }),
        )
        .await
    }

    /// Wait until the chain clock on `side` reaches `target`.
    async fn wait_until(
        &self,
        side: Side,
        target: Timestamp,
        stage: &'static str,
    ) -> Result<(), SwapError> {
        let now = self.chain_time(side).await?;
        if now >= target {
            return Ok(());
        }
        debug!(side = %side, now, target, stage, "[xswap] Waiting for chain time");

        let budget = Duration::from_secs(target - now) + self.config.await_timeout;
        with_timeout(stage, budget, async {
            loop {
                let now = self.chain_time(side).await?;
                if now >= target {
                    return Ok(());
                }
                let remaining = Duration::from_secs(target - now);
                tokio::time::sleep(remaining.max(self.config.poll_interval)).await;
            }
        })
        .await
    }

    // =========================================================================
    // SETUP
    // =========================================================================

    async fn prepare(
        &self,
        request: SwapRequest,
        partial_fill: Option<FillRef>,
    ) -> Result<SwapRecord, SwapError> {
        let skew = self.config.clock_skew_tolerance_secs;
        let schedule = request.schedule.unwrap_or(self.config.default_schedule);
        validate_schedule(&schedule, self.src.chain(), self.dst.chain(), skew)?;

        let src_now = self.chain_time(Side::Source).await?;
        let dst_now = self.chain_time(Side::Destination).await?;
        let deadlines = plan_deadlines(&schedule, src_now, dst_now, skew)?;

        let order_hash = request.order_hash.unwrap_or_else(fresh_order_hash);
        if self.store.get(&order_hash)?.is_some() {
            return Err(SwapError::StateMismatch(format!(
                "order {} already exists",
                short(&order_hash)
            )));
        }

        let secret = generate_secret();
        let nonce = generate_nonce();
        let hashlock = hash_secret(&secret);
        let commitment = secret_commitment(&secret, &nonce);

        let record = SwapRecord {
            order_hash,
            hashlock,
            secret: Some(secret),
            nonce: Some(nonce),
            commitment: Some(commitment),
            committed_at: None,
            status: SwapStatus::Created,
            src: LegRecord {
                chain: self.src.chain(),
                side: Side::Source,
                escrow_id: None,
                maker: request.maker_src,
                taker: request.taker_src,
                token: request.src_token,
                amount: request.src_amount,
                safety_deposit: request.src_safety_deposit,
                schedule,
                timelocks: None,
                finality_lock: None,
                cancel_lock: None,
                tx_refs: BTreeMap::new(),
                settled: false,
            },
            dst: LegRecord {
                chain: self.dst.chain(),
                side: Side::Destination,
                escrow_id: None,
                maker: request.maker_dst,
                taker: request.taker_dst,
                token: request.dst_token,
                amount: request.dst_amount,
                safety_deposit: request.dst_safety_deposit,
                schedule,
                timelocks: None,
                finality_lock: None,
                cancel_lock: None,
                tx_refs: BTreeMap::new(),
                settled: false,
            },
            partial_fill,
            created_at: src_now,
            last_error: None,
        };
        self.persist(&record)?;

        info!(
            order = %short(&order_hash),
            src_chain = %record.src.chain,
            dst_chain = %record.dst.chain,
            dst_cancel_at = deadlines.dst.cancellation_start(Side::Destination),
            src_cancel_at = deadlines.src.cancellation_start(Side::Source),
            "[xswap] Swap created"
        );
        Ok(record)
    }

    fn create_params(record: &SwapRecord, side: Side) -> EscrowCreateParams {
        let leg = record.leg(side);
        let mut params = EscrowCreateParams {
            order_hash: record.order_hash,
            side,
            hashlock: record.hashlock,
            maker: leg.maker.clone(),
            taker: leg.taker.clone(),
            token: leg.token.clone(),
            amount: leg.amount,
            safety_deposit: leg.safety_deposit,
            schedule: leg.schedule,
            deposit: Deposit::default(),
        };
        params.deposit = params.required_deposit();
        params
    }

    // =========================================================================
    // STATE MACHINE
    // =========================================================================

    async fn drive(&self, mut record: SwapRecord) -> Result<SwapRecord, SwapError> {
        loop {
            let step = match record.status {
                SwapStatus::Created => {
                    self.fund_leg(&mut record, Side::Destination, SwapStatus::DstEscrowFunded)
                        .await
                }
                SwapStatus::DstEscrowFunded => {
                    self.fund_leg(&mut record, Side::Source, SwapStatus::BothEscrowsFunded)
                        .await
                }
                SwapStatus::BothEscrowsFunded => self.commit(&mut record).await,
                SwapStatus::SecretCommitted => self.reveal_destination(&mut record).await,
                SwapStatus::SecretRevealed => self.withdraw_source(&mut record).await,
                SwapStatus::SrcWithdrawn => self.complete(&mut record),
                SwapStatus::Completed | SwapStatus::Cancelled => return Ok(record),
            };
            if let Err(error) = step {
                return self.handle_failure(record, error).await;
            }
        }
    }

    async fn fund_leg(
        &self,
        record: &mut SwapRecord,
        side: Side,
        next: SwapStatus,
    ) -> Result<(), SwapError> {
        let stage = match side {
            Side::Source => "fund_src",
            Side::Destination => "fund_dst",
        };
        let adapter = self.adapter(side);

        if record.leg(side).escrow_id.is_none() {
            let params = Self::create_params(record, side);
            let params = &params;
            let (tx, id) = retry(&self.config.retry, stage, move || {
                adapter.submit_create_escrow(params.clone())
            })
            .await?;

            let leg = record.leg_mut(side);
            leg.escrow_id = Some(id);
            leg.tx_refs.insert(TX_CREATE.to_string(), tx);
            self.persist(record)?;
            debug!(order = %short(&record.order_hash), side = %side, escrow = %short(&id), "[xswap] Escrow submitted");
        }

        let leg = record.leg(side);
        let id = leg.escrow_id.ok_or_else(|| missing("escrow id", side))?;
        let tx = leg
            .tx_refs
            .get(TX_CREATE)
            .cloned()
            .ok_or_else(|| missing("creation tx", side))?;

        if let FinalityStatus::Failed { reason } = self.confirm(side, &tx, stage).await? {
            return Err(SwapError::FundingFailed {
                side: side.to_string(),
                reason,
            });
        }

        let escrow = self.fetch_escrow(side, id, stage).await?;
        let imm = &escrow.immutables;
        if !invariant_hashlock_match(&imm.hashlock, &record.hashlock)
            || imm.order_hash != record.order_hash
            || escrow.is_terminal()
        {
            return Err(SwapError::StateMismatch(format!(
                "{} escrow {} does not match the swap",
                side,
                short(&id)
            )));
        }

        let leg = record.leg_mut(side);
        leg.timelocks = Some(pack_timelocks(&imm.timelocks));
        leg.finality_lock = Some(escrow.finality_lock);
        leg.cancel_lock = Some(escrow.cancel_lock);
        record.transition_to(next)?;
        self.persist(record)?;

        info!(
            order = %short(&record.order_hash),
            side = %side,
            escrow = %short(&id),
            status = %record.status,
            "[xswap] Escrow funded"
        );
        Ok(())
    }

    async fn commit(&self, record: &mut SwapRecord) -> Result<(), SwapError> {
        let side = Side::Destination;
        let adapter = self.adapter(side);
        let commitment = record
            .commitment
            .ok_or_else(|| missing("commitment", side))?;

        if !record.dst.tx_refs.contains_key(TX_COMMIT) {
            let tx = retry(&self.config.retry, "commit", move || {
                adapter.submit_commit_secret(commitment)
            })
            .await?;
            record.dst.tx_refs.insert(TX_COMMIT.to_string(), tx);
            self.persist(record)?;
        }

        let tx = record
            .dst
            .tx_refs
            .get(TX_COMMIT)
            .cloned()
            .ok_or_else(|| missing("commit tx", side))?;
        if let FinalityStatus::Failed { reason } = self.confirm(side, &tx, "commit").await? {
            record.dst.tx_refs.remove(TX_COMMIT);
            self.persist(record)?;
            return Err(SwapError::RetryLater {
                stage: "commit",
                reason,
            });
        }

        record.committed_at = Some(self.chain_time(side).await?);
        record.transition_to(SwapStatus::SecretCommitted)?;
        self.persist(record)?;

        info!(order = %short(&record.order_hash), "[xswap] Secret commitment confirmed");
        Ok(())
    }

    async fn reveal_destination(&self, record: &mut SwapRecord) -> Result<(), SwapError> {
        let side = Side::Destination;
        let committed_at = record
            .committed_at
            .ok_or_else(|| missing("commit time", side))?;
        let finality_lock = record
            .dst
            .finality_lock
            .ok_or_else(|| missing("finality lock", side))?;
        let closed_at = record
            .dst
            .cancel_lock
            .ok_or_else(|| missing("cancel lock", side))?;
        let window_closed = || {
            SwapError::chain(
                "reveal_dst",
                ChainError::Reverted(EscrowError::WithdrawalWindowClosed { closed_at }),
            )
        };

        let reveal_at = (committed_at + self.config.reveal_delay_secs).max(finality_lock);
        if reveal_at >= closed_at {
            return Err(window_closed());
        }
        self.wait_until(side, reveal_at, "reveal_delay").await?;
        if self.chain_time(side).await? >= closed_at {
            return Err(window_closed());
        }

        self.withdraw_leg(record, side, "reveal_dst").await?;
        record.transition_to(SwapStatus::SecretRevealed)?;
        self.persist(record)?;

        info!(order = %short(&record.order_hash), "[xswap] Secret revealed on destination");
        Ok(())
    }

    async fn withdraw_source(&self, record: &mut SwapRecord) -> Result<(), SwapError> {
        let side = Side::Source;
        let finality_lock = record
            .src
            .finality_lock
            .ok_or_else(|| missing("finality lock", side))?;
        self.wait_until(side, finality_lock, "src_finality").await?;

        self.withdraw_leg(record, side, "withdraw_src").await?;
        record.transition_to(SwapStatus::SrcWithdrawn)?;
        self.persist(record)?;

        info!(order = %short(&record.order_hash), "[xswap] Source escrow withdrawn");
        Ok(())
    }

    fn complete(&self, record: &mut SwapRecord) -> Result<(), SwapError> {
        record.transition_to(SwapStatus::Completed)?;
        record.last_error = None;
        self.persist(record)?;
        info!(order = %short(&record.order_hash), "[xswap] Swap completed");
        Ok(())
    }

    /// Reveal-and-withdraw one leg, at most one submission in flight per escrow.
    async fn withdraw_leg(
        &self,
        record: &mut SwapRecord,
        side: Side,
        stage: &'static str,
    ) -> Result<(), SwapError> {
        let adapter = self.adapter(side);
        let id = record
            .leg(side)
            .escrow_id
            .ok_or_else(|| missing("escrow id", side))?;

        let escrow = self.fetch_escrow(side, id, stage).await?;
        if escrow.completed {
            record.leg_mut(side).settled = true;
            return Ok(());
        }
        if escrow.cancelled {
            return Err(SwapError::StateMismatch(format!(
                "{} escrow {} was cancelled",
                side,
                short(&id)
            )));
        }

        let _guard = InFlight::acquire(&self.in_flight, id)?;

        if !record.leg(side).tx_refs.contains_key(TX_WITHDRAW) {
            let secret = record.secret.clone().ok_or_else(|| missing("secret", side))?;
            let nonce = record.nonce.clone().ok_or_else(|| missing("nonce", side))?;
            let (secret, nonce) = (&secret, &nonce);
            let submit = move || adapter.submit_reveal_and_withdraw(id, secret, nonce);

            let tx = match retry(&self.config.retry, stage, submit).await {
                Ok(tx) => tx,
                Err(e) if is_unauthorized(&e) => {
                    let public_from = escrow.immutables.timelocks.public_withdrawal_start(side);
                    warn!(
                        order = %short(&record.order_hash),
                        side = %side,
                        public_from,
                        "[xswap] Private window refused, waiting for public withdrawal"
                    );
                    self.wait_until(side, public_from, stage).await?;
                    retry(&self.config.retry, stage, submit).await?
                }
                Err(e) => return Err(e),
            };
            record
                .leg_mut(side)
                .tx_refs
                .insert(TX_WITHDRAW.to_string(), tx);
            self.persist(record)?;
        }

        let tx = record
            .leg(side)
            .tx_refs
            .get(TX_WITHDRAW)
            .cloned()
            .ok_or_else(|| missing("withdraw tx", side))?;
        let status = self.confirm(side, &tx, stage).await?;

        // The chain decides, not the submission result.
        if !self.fetch_escrow(side, id, stage).await?.completed {
            record.leg_mut(side).tx_refs.remove(TX_WITHDRAW);
            self.persist(record)?;
            let reason = match status {
                FinalityStatus::Failed { reason } => reason,
                FinalityStatus::Confirmed { .. } => "withdrawal not observed on chain".to_string(),
            };
            return Err(SwapError::RetryLater { stage, reason });
        }

        record.leg_mut(side).settled = true;
        Ok(())
    }

    // =========================================================================
    // FAILURE / CANCELLATION
    // =========================================================================

    async fn dst_cancellation_open(&self, record: &SwapRecord) -> Result<bool, SwapError> {
        match record.dst.cancel_lock {
            Some(lock) => Ok(self.chain_time(Side::Destination).await? >= lock),
            None => Ok(false),
        }
    }

    async fn handle_failure(
        &self,
        mut record: SwapRecord,
        error: SwapError,
    ) -> Result<SwapRecord, SwapError> {
        record.last_error = Some(error.to_string());
        self.persist(&record)?;

        let cancel = match record.status {
            SwapStatus::Created | SwapStatus::DstEscrowFunded | SwapStatus::BothEscrowsFunded => {
                !error.class().is_retryable()
            }
            SwapStatus::SecretCommitted => match &error {
                SwapError::WithdrawInFlight(_) => false,
                e if !e.class().is_retryable() => true,
                _ => self.dst_cancellation_open(&record).await?,
            },
            _ => false,
        };

        if !cancel {
            warn!(
                order = %short(&record.order_hash),
                status = %record.status,
                error = %error,
                "[xswap] Swap paused"
            );
            return Err(error);
        }

        warn!(
            order = %short(&record.order_hash),
            status = %record.status,
            error = %error,
            "[xswap] Swap aborted, cancelling created escrows"
        );
        self.cancel_legs(record, true).await
    }

    /// Cancel every created, unsettled escrow. With `wait` the call sleeps
    /// until each cancellation lock elapses; otherwise legs still locked are
    /// reported as `RetryLater`.
    async fn cancel_legs(&self, mut record: SwapRecord, wait: bool) -> Result<SwapRecord, SwapError> {
        let mut pending = Vec::new();

        for side in [Side::Destination, Side::Source] {
            let leg = record.leg(side);
            let Some(id) = leg.escrow_id else { continue };
            if leg.settled {
                continue;
            }
            let stage = match side {
                Side::Source => "cancel_src",
                Side::Destination => "cancel_dst",
            };

            let escrow = self.fetch_escrow(side, id, stage).await?;
            if escrow.cancelled {
                record.leg_mut(side).settled = true;
                continue;
            }
            if escrow.completed {
                return Err(SwapError::StateMismatch(format!(
                    "{} escrow {} already withdrawn",
                    side,
                    short(&id)
                )));
            }

            if wait {
                self.wait_until(side, escrow.cancel_lock, stage).await?;
            } else if self.chain_time(side).await? < escrow.cancel_lock {
                pending.push(format!("{} cancel opens at {}", side, escrow.cancel_lock));
                continue;
            }

            let adapter = self.adapter(side);
            let tx = retry(&self.config.retry, stage, move || adapter.submit_cancel(id)).await?;
            record
                .leg_mut(side)
                .tx_refs
                .insert(TX_CANCEL.to_string(), tx.clone());
            self.persist(&record)?;

            self.confirm(side, &tx, stage).await?;
            if !self.fetch_escrow(side, id, stage).await?.cancelled {
                return Err(SwapError::RetryLater {
                    stage,
                    reason: "cancellation not observed on chain".to_string(),
                });
            }
            record.leg_mut(side).settled = true;
            self.persist(&record)?;
            info!(order = %short(&record.order_hash), side = %side, escrow = %short(&id), "[xswap] Escrow refunded");
        }

        if !pending.is_empty() {
            let reason = pending.join(", ");
            record.last_error = Some(reason.clone());
            self.persist(&record)?;
            return Err(SwapError::RetryLater {
                stage: "cancel",
                reason,
            });
        }

        record.transition_to(SwapStatus::Cancelled)?;
        self.persist(&record)?;
        if let Some(fill) = &record.partial_fill {
            self.release_fill(fill);
        }

        info!(order = %short(&record.order_hash), "[xswap] Swap cancelled");
        Ok(record)
    }

    /// Re-derive the stage from both escrows.
    async fn reconcile(&self, mut record: SwapRecord) -> Result<SwapRecord, SwapError> {
        let mut withdrawn = [false; 2];
        let mut any_cancelled = false;

        for (i, side) in [Side::Destination, Side::Source].into_iter().enumerate() {
            let Some(id) = record.leg(side).escrow_id else { continue };
            let escrow = self.fetch_escrow(side, id, "reconcile").await?;
            if escrow.is_terminal() {
                record.leg_mut(side).settled = true;
            }
            withdrawn[i] = escrow.completed;
            any_cancelled |= escrow.cancelled;
        }

        let derived = match (withdrawn[0], withdrawn[1]) {
            (true, true) => SwapStatus::SrcWithdrawn,
            (true, false) => SwapStatus::SecretRevealed,
            _ => record.status,
        };
        if derived != record.status {
            info!(
                order = %short(&record.order_hash),
                from = %record.status,
                to = %derived,
                "[xswap] Reconciled status from chain"
            );
            record.status = derived;
        }
        self.persist(&record)?;

        if any_cancelled && !record.status.secret_is_public() {
            return self.cancel_legs(record, true).await;
        }
        Ok(record)
    }
}

#[async_trait]
impl SwapApi for SwapOrchestrator {
    async fn create_swap(&self, request: SwapRequest) -> Result<SwapRecord, SwapError> {
        let record = self.prepare(request, None).await?;
        Ok(self.drive(record).await?.public_view())
    }

    fn get_status(&self, order_hash: &Hash) -> Result<SwapRecord, SwapError> {
        Ok(self.load(order_hash)?.public_view())
    }

    async fn cancel_swap(&self, order_hash: &Hash) -> Result<SwapRecord, SwapError> {
        let record = self.load(order_hash)?;
        match record.status {
            SwapStatus::Cancelled => return Ok(record.public_view()),
            status if status.is_terminal() || status.secret_is_public() => {
                return Err(SwapError::InvalidTransition {
                    from: status.to_string(),
                    to: SwapStatus::Cancelled.to_string(),
                });
            }
            _ => {}
        }
        Ok(self.cancel_legs(record, false).await?.public_view())
    }

    async fn resume_swap(&self, order_hash: &Hash) -> Result<SwapRecord, SwapError> {
        let record = self.load(order_hash)?;
        if record.status.is_terminal() {
            return Ok(record.public_view());
        }
        if let Some(fill) = &record.partial_fill {
            self.load_order(&fill.parent_order)?;
        }

        info!(order = %short(order_hash), status = %record.status, "[xswap] Resuming swap");
        let record = self.reconcile(record).await?;
        Ok(self.drive(record).await?.public_view())
    }

    fn open_order(
        &self,
        order_hash: Hash,
        total_src: u128,
        total_dst: u128,
    ) -> Result<PartialFillState, SwapError> {
        if self.store.get_order(&order_hash)?.is_some() {
            return Err(FillError::OrderAlreadyOpen(order_hash).into());
        }
        let state = self.accountant.open_order(order_hash, total_src, total_dst)?;
        self.store.put_order(&state)?;
        Ok(state)
    }

    async fn fill_order(
        &self,
        parent: Hash,
        amount_src: u128,
        amount_dst: u128,
        template: SwapRequest,
    ) -> Result<SwapRecord, SwapError> {
        self.load_order(&parent)?;
        let now = self.chain_time(Side::Source).await?;
        let receipt = self
            .accountant
            .request_fill(&parent, amount_src, amount_dst, now)?;
        let index = receipt.record.index;
        let fill = FillRef {
            parent_order: parent,
            fill_index: index,
        };
        if let Err(e) = self.persist_order(&parent) {
            // Not durable, so not accepted.
            let _ = self.accountant.revert_fill(&parent, index);
            return Err(e);
        }

        let request = SwapRequest {
            order_hash: Some(child_order_hash(&parent, index)),
            src_amount: amount_src,
            dst_amount: amount_dst,
            ..template
        };
        let record = match self.prepare(request, Some(fill.clone())).await {
            Ok(record) => record,
            Err(e) => {
                self.release_fill(&fill);
                return Err(e);
            }
        };
        Ok(self.drive(record).await?.public_view())
    }
}
