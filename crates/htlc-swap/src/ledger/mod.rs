//! # Escrow Ledger
//!
//! Per-chain escrow state machine: `Created -> Withdrawn` or
//! `Created -> Cancelled`, both terminal.
//!
//! Every operation validates first and mutates only after all checks pass,
//! under one write lock, so a call either applies fully or not at all.
//! Reads share the lock.
//!
//! ## Withdrawal checks (in order)
//!
//! 1. escrow exists and is neither withdrawn nor cancelled
//! 2. `keccak256(secret) == hashlock`
//! 3. commitment `keccak256(secret || nonce)` recorded at least
//!    `reveal_delay_secs` ago (destination leg)
//! 4. withdrawal window open, and the caller allowed in it

use crate::algorithms::{escrow_id, secret_commitment, verify_secret};
use crate::config::LedgerConfig;
use crate::domain::{
    invariant_terminal_exclusive, invariant_timelock_ordering, Address, Bytes32, CancelReceipt, ChainId, Escrow,
    EscrowCreateParams, EscrowError, EscrowEvent, EscrowId, Immutables, Nonce, SecureSecret, Side,
    Timelocks, Timestamp, Token, WithdrawReceipt,
};
use crate::ports::TimeSource;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct LedgerState {
    escrows: HashMap<EscrowId, Escrow>,
    commitments: HashMap<Bytes32, Timestamp>,
    balances: HashMap<(Address, Token), u128>,
    events: Vec<EscrowEvent>,
}

impl LedgerState {
    fn credit(&mut self, account: &Address, token: &Token, amount: u128) {
        let entry = self
            .balances
            .entry((account.clone(), token.clone()))
            .or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    fn live_escrow(&self, id: &EscrowId) -> Result<&Escrow, EscrowError> {
        let escrow = self.escrows.get(id).ok_or(EscrowError::EscrowNotFound(*id))?;
        if escrow.completed {
            return Err(EscrowError::AlreadyCompleted);
        }
        if escrow.cancelled {
            return Err(EscrowError::AlreadyCancelled);
        }
        Ok(escrow)
    }
}

/// In-process escrow ledger for one chain.
pub struct EscrowLedger {
    chain: ChainId,
    config: LedgerConfig,
    clock: Arc<dyn TimeSource>,
    state: RwLock<LedgerState>,
}

impl EscrowLedger {
    /// Create an empty ledger.
    pub fn new(chain: ChainId, config: LedgerConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            chain,
            config,
            clock,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Chain this ledger simulates.
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Ledger rules.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Ledger clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Lock funds in a new escrow.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `InvalidTimelockOrdering`, `InvalidCancelDelay`,
    /// `InsufficientDeposit`, `EscrowAlreadyExists`.
    pub fn create_escrow(&self, params: EscrowCreateParams) -> Result<EscrowId, EscrowError> {
        if params.amount == 0 {
            return Err(EscrowError::InvalidAmount);
        }
        invariant_timelock_ordering(&params.schedule)?;

        let cancel_delay = params.cancel_delay_secs();
        if cancel_delay < self.config.min_cancel_delay_secs {
            return Err(EscrowError::InvalidCancelDelay {
                got: cancel_delay,
                min: self.config.min_cancel_delay_secs,
            });
        }
        check_deposit(&params)?;

        let now = self.clock.now();
        let timelocks = Timelocks::new(params.schedule, now)?;
        let immutables = Immutables {
            order_hash: params.order_hash,
            hashlock: params.hashlock,
            side: params.side,
            maker: params.maker,
            taker: params.taker,
            token: params.token,
            amount: params.amount,
            safety_deposit: params.safety_deposit,
            timelocks,
        };
        let id = escrow_id(&immutables);

        let mut state = self.state.write();
        if state.escrows.contains_key(&id) {
            return Err(EscrowError::EscrowAlreadyExists(id));
        }

        let escrow = Escrow {
            id,
            finality_lock: timelocks.withdrawal_start(params.side),
            cancel_lock: now + cancel_delay,
            immutables,
            completed: false,
            cancelled: false,
            created_at: now,
        };
        state.events.push(EscrowEvent::EscrowCreated {
            id,
            order_hash: escrow.immutables.order_hash,
            hashlock: escrow.immutables.hashlock,
            side: escrow.immutables.side,
            at: now,
        });
        state.escrows.insert(id, escrow);

        info!(
            chain = %self.chain,
            escrow = %hex::encode(&id[..4]),
            side = %params.side,
            "[xswap] Escrow created"
        );
        Ok(id)
    }

    /// Record a commitment. Idempotent: a repeated commitment keeps its
    /// original timestamp, which is returned.
    pub fn commit_secret(&self, commitment: Bytes32) -> Timestamp {
        let now = self.clock.now();
        let mut state = self.state.write();
        if let Some(at) = state.commitments.get(&commitment) {
            return *at;
        }
        state.commitments.insert(commitment, now);
        state
            .events
            .push(EscrowEvent::SecretCommitted { commitment, at: now });

        debug!(chain = %self.chain, "[xswap] Secret commitment recorded");
        now
    }

    /// When a commitment was recorded.
    pub fn commitment_time(&self, commitment: &Bytes32) -> Option<Timestamp> {
        self.state.read().commitments.get(commitment).copied()
    }

    /// Reveal the secret and release the escrow.
    ///
    /// Pays `amount` to the recipient and the safety deposit to `caller`.
    pub fn reveal_and_withdraw(
        &self,
        caller: &Address,
        id: EscrowId,
        secret: &SecureSecret,
        nonce: &Nonce,
    ) -> Result<WithdrawReceipt, EscrowError> {
        let now = self.clock.now();
        let mut state = self.state.write();

        let escrow = state.live_escrow(&id)?;
        let imm = &escrow.immutables;

        if !verify_secret(secret, &imm.hashlock) {
            return Err(EscrowError::InvalidSecret);
        }

        let commitment = secret_commitment(secret, nonce);
        if imm.side.requires_commitment() {
            let committed_at = state
                .commitments
                .get(&commitment)
                .copied()
                .ok_or(EscrowError::SecretNotCommitted)?;
            let allowed_at = committed_at + self.config.reveal_delay_secs;
            if now < allowed_at {
                return Err(EscrowError::RevealTooEarly { allowed_at, now });
            }
        }

        check_withdraw_window(escrow, caller, now)?;

        let receipt = WithdrawReceipt {
            escrow_id: id,
            recipient: imm.recipient().clone(),
            amount: imm.amount,
            caller: caller.clone(),
            safety_deposit: imm.safety_deposit,
            secret: secret.clone(),
        };
        let token = imm.token.clone();

        if let Some(escrow) = state.escrows.get_mut(&id) {
            escrow.completed = true;
            debug_assert!(invariant_terminal_exclusive(escrow));
        }
        state.credit(&receipt.recipient, &token, receipt.amount);
        state.credit(&receipt.caller, &Token::Native, receipt.safety_deposit);
        state.commitments.remove(&commitment);
        state.events.push(EscrowEvent::Withdrawn {
            id,
            secret: secret.clone(),
            caller: caller.clone(),
            at: now,
        });

        info!(
            chain = %self.chain,
            escrow = %hex::encode(&id[..4]),
            caller = %caller,
            "[xswap] Escrow withdrawn"
        );
        Ok(receipt)
    }

    /// Refund the escrow to its depositor once the cancellation lock elapsed.
    pub fn cancel(&self, caller: &Address, id: EscrowId) -> Result<CancelReceipt, EscrowError> {
        let now = self.clock.now();
        let mut state = self.state.write();

        let escrow = state.live_escrow(&id)?;
        if now < escrow.cancel_lock {
            return Err(EscrowError::TooEarly {
                allowed_at: escrow.cancel_lock,
                now,
            });
        }
        let imm = &escrow.immutables;
        let public_from = imm.timelocks.public_cancellation_start(imm.side);
        if now < public_from && !imm.is_party(caller) {
            return Err(EscrowError::Unauthorized(format!(
                "{} is not a party before public cancellation at {}",
                caller, public_from
            )));
        }

        let receipt = CancelReceipt {
            escrow_id: id,
            refund_to: imm.depositor().clone(),
            amount: imm.amount,
            safety_deposit: imm.safety_deposit,
        };
        let token = imm.token.clone();

        if let Some(escrow) = state.escrows.get_mut(&id) {
            escrow.cancelled = true;
            debug_assert!(invariant_terminal_exclusive(escrow));
        }
        state.credit(&receipt.refund_to, &token, receipt.amount);
        state.credit(&receipt.refund_to, &Token::Native, receipt.safety_deposit);
        state.events.push(EscrowEvent::Cancelled {
            id,
            caller: caller.clone(),
            at: now,
        });

        info!(
            chain = %self.chain,
            escrow = %hex::encode(&id[..4]),
            refund_to = %receipt.refund_to,
            "[xswap] Escrow cancelled"
        );
        Ok(receipt)
    }

    /// Escrow by id.
    pub fn get_escrow(&self, id: &EscrowId) -> Option<Escrow> {
        self.state.read().escrows.get(id).cloned()
    }

    /// Funds released to `account` in `token`.
    pub fn balance_of(&self, account: &Address, token: &Token) -> u128 {
        self.state
            .read()
            .balances
            .get(&(account.clone(), token.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Value of `token` still held by live escrows. Safety deposits count
    /// towards the native asset.
    pub fn total_locked(&self, token: &Token) -> u128 {
        self.state
            .read()
            .escrows
            .values()
            .filter(|e| !e.is_terminal())
            .map(|e| {
                let imm = &e.immutables;
                let principal = if imm.token == *token { imm.amount } else { 0 };
                let deposit = if token.is_native() {
                    imm.safety_deposit
                } else {
                    0
                };
                principal + deposit
            })
            .sum()
    }

    /// Events emitted so far, oldest first.
    pub fn events(&self) -> Vec<EscrowEvent> {
        self.state.read().events.clone()
    }
}

fn check_deposit(params: &EscrowCreateParams) -> Result<(), EscrowError> {
    let deposit = params.deposit;
    if params.token.is_native() {
        let required = params
            .amount
            .checked_add(params.safety_deposit)
            .ok_or(EscrowError::InvalidAmount)?;
        if deposit.native < required {
            return Err(EscrowError::InsufficientDeposit {
                required,
                provided: deposit.native,
            });
        }
    } else {
        if deposit.token_allowance < params.amount {
            return Err(EscrowError::InsufficientDeposit {
                required: params.amount,
                provided: deposit.token_allowance,
            });
        }
        if deposit.native < params.safety_deposit {
            return Err(EscrowError::InsufficientDeposit {
                required: params.safety_deposit,
                provided: deposit.native,
            });
        }
    }
    Ok(())
}

fn check_withdraw_window(escrow: &Escrow, caller: &Address, now: Timestamp) -> Result<(), EscrowError> {
    let imm = &escrow.immutables;
    let side: Side = imm.side;

    if now < escrow.finality_lock {
        return Err(EscrowError::FinalityNotReached {
            opens_at: escrow.finality_lock,
            now,
        });
    }
    let closed_at = imm.timelocks.cancellation_start(side);
    if now >= closed_at {
        return Err(EscrowError::WithdrawalWindowClosed { closed_at });
    }
    let public_from = imm.timelocks.public_withdrawal_start(side);
    if now < public_from && *caller != imm.taker {
        return Err(EscrowError::Unauthorized(format!(
            "{} is not the taker before public withdrawal at {}",
            caller, public_from
        )));
    }
    Ok(())
}
