//! The fee market engine: pure functions computing the required/effective
//! fee and mempool priority of a transaction, for both the legacy
//! validator-local model and the EIP-1559-style dynamic model.

use std::sync::Arc;

use alloy_consensus::Transaction;
use alloy_primitives::U256;

use crate::constants::DEFAULT_PRIORITY_REDUCTION;
use crate::{
    dec_coins_are_zero, intrinsic_gas, AnteError, AnteResult, Coin, Coins, Context, EvmKeeper,
    MsgEthereumTx, Tx,
};

/// Computes the fee a transaction must pay and its mempool priority.
/// The native lane's deduct-fee decorator is parameterized over this.
pub type TxFeeChecker =
    Arc<dyn Fn(&Context, &Tx) -> AnteResult<(Coins, i64)> + Send + Sync>;

/// The default fee logic: the minimum price per unit of gas is fixed by each
/// validator locally, and the priority is computed from the gas price.
///
/// The minimum is only enforced in CheckTx with non-zero configured prices;
/// it is a mempool-local rule, not consensus.
pub fn check_tx_fee_with_validator_min_gas_prices(
    ctx: &Context,
    tx: &Tx,
) -> AnteResult<(Coins, i64)> {
    let fee_coins = tx.fee().amount.clone();
    let gas = tx.fee().gas_limit;
    let min_gas_prices = ctx.min_gas_prices();

    if ctx.is_check_tx() && !dec_coins_are_zero(min_gas_prices) {
        // fee = ceil(minGasPrice * gasLimit), per configured denom
        let required = Coins::from(
            min_gas_prices
                .iter()
                .map(|price| Coin::new(price.denom.clone(), price.amount.mul_int_ceil(gas)))
                .collect::<Vec<_>>(),
        );

        if !fee_coins.is_any_gte(&required) {
            return Err(AnteError::InsufficientFee(format!(
                "insufficient fees; got: {fee_coins} required: {required}"
            )));
        }
    }

    let priority = get_tx_priority(&fee_coins, gas, U256::ZERO)?;
    Ok((fee_coins, priority))
}

/// Returns a [`TxFeeChecker`] applying EIP-1559 dynamic fee rules to native
/// transactions.
///
/// Falls back to the validator-local minimum at genesis or while the base
/// fee is disabled or non-positive. When the transaction opts in through the
/// dynamic-fee extension, the effective fee is
/// `min(tip_cap + base_fee, fee_cap) * gas`; without the extension the
/// declared fee is used unchanged. CheckTx additionally re-validates against
/// the local minimum so a too-low base fee cannot fill the mempool with spam.
pub fn new_dynamic_fee_checker(evm_keeper: Arc<dyn EvmKeeper + Send + Sync>) -> TxFeeChecker {
    Arc::new(move |ctx: &Context, tx: &Tx| {
        if ctx.block_height() == 0 {
            // genesis transactions: fallback to min-gas-price logic
            return check_tx_fee_with_validator_min_gas_prices(ctx, tx);
        }

        let fees = &tx.fee().amount;
        if fees.len() != 1 {
            return Err(AnteError::InvalidCoins(format!(
                "only one fee coin is allowed, got: {}",
                fees.len()
            )));
        }

        let denom = evm_keeper.get_params().evm_denom;
        let fee = &fees[0];
        if fee.denom != denom {
            return Err(AnteError::InvalidCoins(format!(
                "only '{denom}' is allowed as fee, got: {fee}"
            )));
        }

        let base_fee = match evm_keeper.get_base_fee() {
            Some(base_fee) if !base_fee.is_zero() => base_fee,
            // fallback to min-gas-prices logic
            _ => return check_tx_fee_with_validator_min_gas_prices(ctx, tx),
        };

        let gas = tx.fee().gas_limit;
        let effective_fee = match tx.dynamic_fee_tip_cap() {
            Some(tip_cap) => {
                if tip_cap.is_negative() {
                    return Err(AnteError::InsufficientFee(
                        "max priority price cannot be negative".to_owned(),
                    ));
                }
                if gas == 0 {
                    return Err(AnteError::InvalidRequest(
                        "gas limit cannot be zero".to_owned(),
                    ));
                }

                let gas_fee_cap = fee.amount / U256::from(gas);
                // EIP-1559: effective price = min(tip + base fee, fee cap)
                let effective_gas_price =
                    tip_cap.unsigned_abs().saturating_add(base_fee).min(gas_fee_cap);
                Coins::one(denom, effective_gas_price.saturating_mul(U256::from(gas)))
            }
            None => fees.clone(),
        };

        if ctx.is_check_tx() {
            // The base fee may be lower than the node's own floor; re-check
            // against the validator min-gas-prices so the local mempool is
            // not filled with low-fee transactions.
            check_tx_fee_with_validator_min_gas_prices(ctx, tx)?;
        }

        let priority = get_tx_priority(&effective_fee, gas, base_fee)?;
        Ok((effective_fee, priority))
    })
}

/// Derives the mempool priority from the smallest per-coin gas price of
/// `fees`, rejecting any coin whose gas price is below `floor`.
///
/// Prices are reduced by [`DEFAULT_PRIORITY_REDUCTION`] and clamped to
/// `i64::MAX` when they do not fit a signed 64-bit integer.
pub fn get_tx_priority(fees: &Coins, gas: u64, floor: U256) -> AnteResult<i64> {
    let mut priority: Option<i64> = None;

    for fee in fees.iter() {
        if gas == 0 {
            return Err(AnteError::InvalidRequest("gas limit cannot be zero".to_owned()));
        }
        let gas_price = fee.amount / U256::from(gas);
        if gas_price < floor {
            return Err(AnteError::InsufficientFee(format!(
                "gas prices too low, got: {gas_price} required: {floor}. \
                 Please retry using a higher gas price or a higher fee"
            )));
        }

        let reduced = gas_price / U256::from(DEFAULT_PRIORITY_REDUCTION);
        let candidate = if reduced <= U256::from(i64::MAX as u64) {
            reduced.to::<u64>() as i64
        } else {
            i64::MAX
        };
        priority = Some(priority.map_or(candidate, |current| current.min(candidate)));
    }

    Ok(priority.unwrap_or(0))
}

/// Priority of a wrapped Ethereum transaction: its effective gas price under
/// the current base fee, reduced and clamped like [`get_tx_priority`].
pub fn eth_tx_priority(msg: &MsgEthereumTx, base_fee: U256) -> i64 {
    let reduced = msg.effective_gas_price(base_fee) / U256::from(DEFAULT_PRIORITY_REDUCTION);
    if reduced <= U256::from(i64::MAX as u64) {
        reduced.to::<u64>() as i64
    } else {
        i64::MAX
    }
}

/// Validates the fee of a wrapped Ethereum transaction and returns the
/// effective fee coins to deduct.
///
/// Checks the gas limit against the intrinsic gas (CheckTx only) and the fee
/// cap against the base fee, then prices the fee at the effective gas price.
/// A zero fee yields an empty coin set.
pub fn verify_fee(
    msg: &MsgEthereumTx,
    denom: &str,
    base_fee: U256,
    is_check_tx: bool,
) -> AnteResult<Coins> {
    let is_contract_creation = msg.is_contract_creation();
    let gas_limit = msg.gas();

    if is_check_tx {
        let intrinsic = intrinsic_gas(msg.data.input(), msg.data.access_list(), is_contract_creation)?;
        if gas_limit < intrinsic {
            return Err(AnteError::OutOfGas(format!(
                "gas limit too low: {gas_limit} (gas limit) < {intrinsic} (intrinsic gas)"
            )));
        }
    }

    if msg.gas_fee_cap() < base_fee {
        return Err(AnteError::InsufficientFee(format!(
            "the tx gas fee cap is lower than the block base fee: {} (gas fee cap), {} (base fee)",
            msg.gas_fee_cap(),
            base_fee
        )));
    }

    let fee_amount = msg.effective_fee(base_fee);
    if fee_amount.is_zero() {
        // zero fee, nothing to deduct
        return Ok(Coins::new());
    }

    Ok(Coins::one(denom, fee_amount))
}

/// Validates that `balance` covers the declared cost (`fee + value`) of the
/// wrapped Ethereum transaction.
pub fn check_sender_balance(balance: U256, msg: &MsgEthereumTx) -> AnteResult<()> {
    let cost = msg.cost();
    if balance < cost {
        return Err(AnteError::InsufficientFunds(format!(
            "sender balance < tx cost ({balance} < {cost})"
        )));
    }
    Ok(())
}
