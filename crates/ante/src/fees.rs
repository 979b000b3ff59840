//! Ethereum-lane fee floors: the global fee-market minimum and the
//! validator's own mempool minimum.

use std::sync::Arc;

use crate::tx::require_single_ethereum_message;
use crate::{
    AnteDecorator, AnteError, AnteResult, Context, Dec, EvmKeeper, FeeMarketKeeper, Next, Tx,
};

/// Rejects transactions whose effective price falls under the global
/// fee-market minimum. Applies in every mode, unlike the mempool check.
pub struct EthMinGasPriceDecorator {
    fee_market_keeper: Arc<dyn FeeMarketKeeper + Send + Sync>,
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
}

impl EthMinGasPriceDecorator {
    /// Creates the decorator.
    pub fn new(
        fee_market_keeper: Arc<dyn FeeMarketKeeper + Send + Sync>,
        evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
    ) -> Self {
        Self { fee_market_keeper, evm_keeper }
    }
}

impl AnteDecorator for EthMinGasPriceDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let min_gas_price = self.fee_market_keeper.get_params().min_gas_price;
        if min_gas_price.is_zero() {
            return next.run(ctx, tx, simulate);
        }

        let msg = require_single_ethereum_message(tx)?;
        let base_fee = self.evm_keeper.get_base_fee().unwrap_or_default();

        // For dynamic transactions the declared fee is priced at the cap,
        // but the signer only pays the effective price under the current
        // base fee; the minimum applies to what is actually paid. When the
        // base fee lowers the effective price below the minimum, the signer
        // must raise the tip cap.
        let fee = Dec::from_uint(msg.effective_fee(base_fee));
        let required_fee = min_gas_price.mul_int(msg.gas());

        if fee < required_fee {
            return Err(AnteError::InsufficientFee(format!(
                "provided fee < minimum global fee ({} < {}). Please increase the priority tip \
                 (for EIP-1559 txs) or the gas prices (for access list or legacy txs)",
                fee.truncate(),
                required_fee.truncate()
            )));
        }

        next.run(ctx, tx, simulate)
    }
}

/// Rejects transactions whose declared fee falls under the validator's own
/// configured minimum. Mempool-local: CheckTx only, never during simulation.
pub struct EthMempoolFeeDecorator {
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
}

impl EthMempoolFeeDecorator {
    /// Creates the decorator.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper + Send + Sync>) -> Self {
        Self { evm_keeper }
    }
}

impl AnteDecorator for EthMempoolFeeDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if !ctx.is_check_tx() || simulate {
            return next.run(ctx, tx, simulate);
        }

        let evm_denom = self.evm_keeper.get_params().evm_denom;
        let min_gas_price = ctx
            .min_gas_prices()
            .iter()
            .find(|price| price.denom == evm_denom)
            .map(|price| price.amount)
            .unwrap_or_default();

        let msg = require_single_ethereum_message(tx)?;
        let fee = Dec::from_uint(msg.fee());
        let required_fee = min_gas_price.mul_int(msg.gas());

        if fee < required_fee {
            return Err(AnteError::InsufficientFee(format!(
                "insufficient fee; got: {fee} required: {required_fee}"
            )));
        }

        next.run(ctx, tx, simulate)
    }
}
