//! Ethereum-lane bookends and structural guards.
//!
//! These decorators run before (and after) any fee or balance logic: they set
//! up the per-attempt gas meter, pin the envelope shape, and validate that
//! every envelope field the payload signature does not cover is empty.

use std::sync::Arc;

use crate::constants::{
    ATTRIBUTE_KEY_ETHEREUM_TX_HASH, ATTRIBUTE_KEY_TX_INDEX, EVENT_TYPE_ETHEREUM_TX,
};
use crate::tx::require_single_ethereum_message;
use crate::{
    AnteDecorator, AnteError, AnteResult, Coins, Context, Event, EvmKeeper, ExtensionOption,
    GasMeter, Msg, Next, Tx,
};

/// Installs an unlimited gas meter so admission work is not itself metered,
/// and clears transient flags left over from a previous attempt.
pub struct EthSetupContextDecorator {
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
}

impl EthSetupContextDecorator {
    /// Creates the decorator.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper + Send + Sync>) -> Self {
        Self { evm_keeper }
    }
}

impl AnteDecorator for EthSetupContextDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let ctx = ctx.with_gas_meter(GasMeter::infinite());

        // reset previous run
        self.evm_keeper.set_flag_sender_nonce_increased_by_ante_handle(false);

        next.run(ctx, tx, simulate)
    }
}

/// Pins the envelope shape: every message must be the Ethereum variant and
/// there must be exactly one.
pub struct SingleEthTxDecorator;

impl AnteDecorator for SingleEthTxDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        for msg in &tx.body.messages {
            if !matches!(msg, Msg::EthereumTx(_)) {
                return Err(AnteError::InvalidRequest(format!(
                    "invalid message type {}, expected MsgEthereumTx",
                    msg.type_url()
                )));
            }
        }

        if tx.body.messages.len() != 1 {
            return Err(AnteError::InvalidRequest(
                "expected one and only one MsgEthereumTx".to_owned(),
            ));
        }

        next.run(ctx, tx, simulate)
    }
}

/// Validates the envelope around the Ethereum payload.
///
/// The payload signature covers only the inner transaction, so every envelope
/// field that is not derived from the payload must be empty, and the declared
/// fee and gas limit must match the payload exactly so the envelope cannot
/// spoof a different fee than the one signed.
pub struct EthValidateBasicDecorator {
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
}

impl EthValidateBasicDecorator {
    /// Creates the decorator.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper + Send + Sync>) -> Self {
        Self { evm_keeper }
    }
}

impl AnteDecorator for EthValidateBasicDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        // no need to re-validate structure on mempool re-check
        if ctx.is_re_check_tx() {
            return next.run(ctx, tx, simulate);
        }

        let body = &tx.body;
        if !body.memo.is_empty()
            || body.timeout_height != 0
            || !body.non_critical_extension_options.is_empty()
        {
            return Err(AnteError::InvalidRequest(
                "for eth tx body Memo TimeoutHeight NonCriticalExtensionOptions should be empty"
                    .to_owned(),
            ));
        }

        if body.extension_options.len() != 1
            || body.extension_options[0] != ExtensionOption::EthereumTx
        {
            return Err(AnteError::InvalidRequest(
                "for eth tx length of ExtensionOptions should be 1".to_owned(),
            ));
        }

        if !tx.auth_info.signer_infos.is_empty() {
            return Err(AnteError::InvalidRequest(
                "for eth tx AuthInfo SignerInfos should be empty".to_owned(),
            ));
        }

        if tx.auth_info.fee.payer.is_some() || tx.auth_info.fee.granter.is_some() {
            return Err(AnteError::InvalidRequest(
                "for eth tx AuthInfo Fee payer and granter should be empty".to_owned(),
            ));
        }

        if !tx.signatures.is_empty() {
            return Err(AnteError::InvalidRequest(
                "for eth tx Signatures should be empty".to_owned(),
            ));
        }

        let msg = require_single_ethereum_message(tx)?;
        msg.sender()?;

        let params = self.evm_keeper.get_params();
        let is_contract_creation = msg.is_contract_creation();
        if !params.enable_create && is_contract_creation {
            return Err(AnteError::CreateDisabled);
        }
        if !params.enable_call && !is_contract_creation {
            return Err(AnteError::CallDisabled);
        }

        // the declared fee must equal the payload fee in the EVM denom; zero
        // payload fees demand an empty declared fee
        let payload_fee = msg.fee();
        let expected_fee = if payload_fee.is_zero() {
            Coins::new()
        } else {
            Coins::one(params.evm_denom, payload_fee)
        };
        if tx.auth_info.fee.amount != expected_fee {
            return Err(AnteError::InvalidRequest(format!(
                "invalid AuthInfo Fee Amount ({} != {})",
                tx.auth_info.fee.amount, expected_fee
            )));
        }

        if tx.auth_info.fee.gas_limit != msg.gas() {
            return Err(AnteError::InvalidRequest(format!(
                "invalid AuthInfo Fee GasLimit ({} != {})",
                tx.auth_info.fee.gas_limit,
                msg.gas()
            )));
        }

        next.run(ctx, tx, simulate)
    }
}

/// Records the payload's gas limit and type into transient state for the
/// downstream executor.
pub struct EthSetupExecutionDecorator {
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
}

impl EthSetupExecutionDecorator {
    /// Creates the decorator.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper + Send + Sync>) -> Self {
        Self { evm_keeper }
    }
}

impl AnteDecorator for EthSetupExecutionDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let msg = require_single_ethereum_message(tx)?;
        self.evm_keeper.setup_execution_context(msg.gas(), msg.tx_type());
        next.run(ctx, tx, simulate)
    }
}

/// Emits the transaction hash and block index at the very end of the lane.
///
/// By this point the fee is deducted and the nonce incremented, so the
/// transaction must be indexable even when later execution fails (for
/// instance on the block gas limit).
pub struct EthEmitEventDecorator {
    evm_keeper: Arc<dyn EvmKeeper + Send + Sync>,
}

impl EthEmitEventDecorator {
    /// Creates the decorator.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper + Send + Sync>) -> Self {
        Self { evm_keeper }
    }
}

impl AnteDecorator for EthEmitEventDecorator {
    fn ante_handle(
        &self,
        mut ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let msg = require_single_ethereum_message(tx)?;
        let tx_index = self.evm_keeper.get_tx_count_transient().saturating_sub(1);

        ctx.emit_event(
            Event::new(EVENT_TYPE_ETHEREUM_TX)
                .attribute(ATTRIBUTE_KEY_ETHEREUM_TX_HASH, msg.hash.to_string())
                .attribute(ATTRIBUTE_KEY_TX_INDEX, tx_index.to_string()),
        );

        next.run(ctx, tx, simulate)
    }
}
