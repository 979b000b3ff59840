//! Ethereum-lane sender, balance, and gas decorators.

use std::sync::Arc;

use alloy_consensus::Transaction;
use alloy_primitives::U256;

use crate::constants::{ATTRIBUTE_KEY_FEE, EVENT_TYPE_TX};
use crate::tx::require_single_ethereum_message;
use crate::{
    check_sender_balance, eth_tx_priority, verify_fee, AccountKeeper, AnteDecorator, AnteError,
    AnteResult, BankKeeper, Context, Event, EvmAccount, EvmKeeper, GasMeter, Next, Tx,
};

/// Verifies the sender is an externally-owned account whose spendable balance
/// covers the declared cost. CheckTx only.
///
/// An account missing from state is created on the spot: the payload
/// signature already proves the sender controls the key, and a stored account
/// is needed later for the sequence increment.
pub struct EoaVerificationDecorator {
    account_keeper: Arc<dyn AccountKeeper + Send + Sync>,
    bank_keeper: Arc<dyn BankKeeper + Send + Sync>,
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
}

impl EoaVerificationDecorator {
    /// Creates the decorator.
    pub fn new(
        account_keeper: Arc<dyn AccountKeeper + Send + Sync>,
        bank_keeper: Arc<dyn BankKeeper + Send + Sync>,
        evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
    ) -> Self {
        Self { account_keeper, bank_keeper, evm_keeper }
    }
}

impl AnteDecorator for EoaVerificationDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if !ctx.is_check_tx() {
            return next.run(ctx, tx, simulate);
        }

        let msg = require_single_ethereum_message(tx)?;
        let from = msg.sender()?;

        let account = match self.evm_keeper.get_account(from) {
            None => {
                let account = self.account_keeper.new_account_with_address(from);
                self.account_keeper.set_account(account);
                EvmAccount::empty()
            }
            Some(account) if account.is_contract() => {
                return Err(AnteError::InvalidType(format!(
                    "the sender is not EOA: address {from}, codeHash <{}>",
                    account.code_hash
                )));
            }
            Some(account) => account,
        };

        // bank-spendable balance so vesting locks are respected
        let spendable_balance = if account.balance > U256::ZERO {
            let params = self.evm_keeper.get_params();
            self.bank_keeper.spendable_coin(from, &params.evm_denom).amount
        } else {
            account.balance
        };

        check_sender_balance(spendable_balance, msg)?;

        next.run(ctx, tx, simulate)
    }
}

/// Payload sanity checks that need no state: a usable gas limit and fee caps
/// that are internally consistent.
pub struct EthBasicValidationDecorator;

impl AnteDecorator for EthBasicValidationDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let msg = require_single_ethereum_message(tx)?;

        if msg.gas() == 0 {
            return Err(AnteError::InvalidRequest("gas limit must be positive".to_owned()));
        }

        if let Some(tip_cap) = msg.gas_tip_cap() {
            let fee_cap = msg.gas_fee_cap();
            if tip_cap > fee_cap {
                return Err(AnteError::InvalidRequest(format!(
                    "max priority fee per gas higher than max fee per gas ({tip_cap} > {fee_cap})"
                )));
            }
        }

        next.run(ctx, tx, simulate)
    }
}

/// Checks the transfer of the call value against the EVM block context's
/// transfer rule, and the fee cap against the base fee.
pub struct CanTransferDecorator {
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
}

impl CanTransferDecorator {
    /// Creates the decorator.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper + Send + Sync>) -> Self {
        Self { evm_keeper }
    }
}

impl AnteDecorator for CanTransferDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let msg = require_single_ethereum_message(tx)?;
        let from = msg.sender()?;
        let base_fee = self.evm_keeper.get_base_fee().unwrap_or_default();

        if msg.gas_fee_cap() < base_fee {
            return Err(AnteError::InsufficientFee(format!(
                "max fee per gas less than block base fee ({} < {})",
                msg.gas_fee_cap(),
                base_fee
            )));
        }

        let value = msg.data.value();
        if value > U256::ZERO && !self.evm_keeper.can_transfer(from, value) {
            return Err(AnteError::InsufficientFunds(format!(
                "failed to transfer {value} from address {from} using the EVM block context \
                 transfer function"
            )));
        }

        next.run(ctx, tx, simulate)
    }
}

/// Verifies intrinsic gas and the block gas limit, deducts the effective fee,
/// and installs the gas meter the host reads `gas_wanted` from.
pub struct EthGasConsumeDecorator {
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
    max_tx_gas_wanted: u64,
}

impl EthGasConsumeDecorator {
    /// Creates the decorator. `max_tx_gas_wanted` of zero disables the
    /// CheckTx cap.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper + Send + Sync>, max_tx_gas_wanted: u64) -> Self {
        Self { evm_keeper, max_tx_gas_wanted }
    }
}

impl AnteDecorator for EthGasConsumeDecorator {
    fn ante_handle(
        &self,
        mut ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        // Gas was checked during CheckTx already. Re-checks must report a
        // zero gas_wanted: the mempool's post-check treats the meter limit as
        // signed and a real limit here would underflow it, silently dropping
        // the transaction before delivery.
        if ctx.is_re_check_tx() {
            let ctx = ctx.with_gas_meter(GasMeter::infinite_with_limit(0));
            return next.run(ctx, tx, simulate);
        }

        let msg = require_single_ethereum_message(tx)?;
        let from = msg.sender()?;

        let evm_denom = self.evm_keeper.get_params().evm_denom;
        let base_fee = self.evm_keeper.get_base_fee().unwrap_or_default();

        let mut gas_wanted = msg.gas();
        if ctx.is_check_tx() && self.max_tx_gas_wanted != 0 {
            gas_wanted = gas_wanted.min(self.max_tx_gas_wanted);
        }

        let fees = verify_fee(msg, &evm_denom, base_fee, ctx.is_check_tx())?;

        // destructive step, ordered after all fallible validation above
        self.evm_keeper.deduct_tx_costs_from_user_balance(&fees, from)?;

        ctx.emit_event(Event::new(EVENT_TYPE_TX).attribute(ATTRIBUTE_KEY_FEE, fees.to_string()));

        let priority = eth_tx_priority(msg, base_fee);

        // gas_wanted, not the meter's consumption: the meter has only been
        // counting since the lane's setup decorator
        if gas_wanted > ctx.block_gas_limit() {
            return Err(AnteError::OutOfGas(format!(
                "tx gas ({gas_wanted}) exceeds block gas limit ({})",
                ctx.block_gas_limit()
            )));
        }

        // The executor later resets consumption to the gas actually used by
        // the state transition.
        let ctx = ctx
            .with_gas_meter(GasMeter::infinite_with_limit(gas_wanted))
            .with_priority(priority);

        next.run(ctx, tx, simulate)
    }
}

/// Verifies the payload nonce against the account sequence and increments the
/// sequence in the same step, so nothing can observe the account in between.
pub struct EthIncrementSenderSequenceDecorator {
    account_keeper: Arc<dyn AccountKeeper + Send + Sync>,
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
}

impl EthIncrementSenderSequenceDecorator {
    /// Creates the decorator.
    pub fn new(
        account_keeper: Arc<dyn AccountKeeper + Send + Sync>,
        evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
    ) -> Self {
        Self { account_keeper, evm_keeper }
    }
}

impl AnteDecorator for EthIncrementSenderSequenceDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let msg = require_single_ethereum_message(tx)?;
        let from = msg.sender()?;

        let mut account = self
            .account_keeper
            .get_account(from)
            .ok_or_else(|| AnteError::UnknownAddress(format!("account {from} is nil")))?;

        let nonce = msg.data.nonce();
        if nonce != account.sequence {
            return Err(AnteError::InvalidSequence { got: nonce, expected: account.sequence });
        }

        account.sequence = nonce + 1;
        self.account_keeper.set_account(account);

        // contract creations included: the executor must not increment again
        self.evm_keeper.set_flag_sender_nonce_increased_by_ante_handle(true);

        next.run(ctx, tx, simulate)
    }
}
