//! Decorator chain composer.
//!
//! The pipeline is a fixed, ordered sequence of decorators. Each decorator
//! receives the context, the transaction, the simulate flag, and the tail of
//! the chain; it either rejects with an error or forwards to the tail at most
//! once. Lane selection happens once, up front, on the envelope shape.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::constants::{
    MSG_CREATE_PERIODIC_VESTING_ACCOUNT_URL, MSG_CREATE_PERMANENT_LOCKED_ACCOUNT_URL,
    MSG_CREATE_VESTING_ACCOUNT_URL, MSG_ETHEREUM_TX_URL,
};
use crate::{
    has_single_ethereum_message, AccountKeeper, AnteError, AnteResult, AuthzLimiterDecorator,
    BankKeeper, CanTransferDecorator, Context, DeductFeeDecorator, EoaVerificationDecorator,
    EthBasicValidationDecorator, EthEmitEventDecorator, EthGasConsumeDecorator,
    EthIncrementSenderSequenceDecorator, EthMempoolFeeDecorator, EthMinGasPriceDecorator,
    EthSetupContextDecorator, EthSetupExecutionDecorator, EthValidateBasicDecorator, EvmKeeper,
    FeeGrantKeeper, FeeMarketKeeper, RejectEthereumMsgsDecorator, SetUpContextDecorator,
    SingleEthTxDecorator, StakingKeeper, Tx, TxFeeChecker, VAuthKeeper,
    VestingMessagesAuthorizationDecorator,
};

/// A single admission step.
///
/// Implementations must call [`Next::run`] at most once and must not swallow
/// errors from the tail; effects flow forward only through the returned
/// [`Context`].
pub trait AnteDecorator: Send + Sync {
    /// Runs this step and, on success, the rest of the chain.
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context>;
}

/// The remaining tail of a decorator chain. The terminal tail accepts the
/// context unchanged.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Box<dyn AnteDecorator>],
}

impl Next<'_> {
    /// Runs the tail of the chain.
    pub fn run(self, ctx: Context, tx: &Tx, simulate: bool) -> AnteResult<Context> {
        match self.chain.split_first() {
            Some((decorator, tail)) => {
                decorator.ante_handle(ctx, tx, simulate, Next { chain: tail })
            }
            None => Ok(ctx),
        }
    }
}

/// Runs `chain` from its head.
fn run_chain(
    chain: &[Box<dyn AnteDecorator>],
    ctx: Context,
    tx: &Tx,
    simulate: bool,
) -> AnteResult<Context> {
    Next { chain }.run(ctx, tx, simulate)
}

/// Keepers and knobs required to assemble the pipeline.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    /// Auth-module account access.
    pub account_keeper: Option<Arc<dyn AccountKeeper + Send + Sync>>,
    /// Bank balances and module transfers.
    pub bank_keeper: Option<Arc<dyn BankKeeper + Send + Sync>>,
    /// EVM module state and parameters.
    pub evm_keeper: Option<Arc<dyn EvmKeeper + Send + Sync>>,
    /// Fee-market parameters.
    pub fee_market_keeper: Option<Arc<dyn FeeMarketKeeper + Send + Sync>>,
    /// Staking parameters (bond denom for fee routing).
    pub staking_keeper: Option<Arc<dyn StakingKeeper + Send + Sync>>,
    /// Ownership-proof records for vesting-account creation.
    pub vauth_keeper: Option<Arc<dyn VAuthKeeper + Send + Sync>>,
    /// Fee-grant allowances. Optional: without it, granter-paid transactions
    /// are rejected.
    pub fee_grant_keeper: Option<Arc<dyn FeeGrantKeeper + Send + Sync>>,
    /// CheckTx-only cap on the gas an Ethereum transaction may want; zero
    /// disables the cap.
    pub max_tx_gas_wanted: u64,
    /// Fee logic for the native lane.
    pub tx_fee_checker: Option<TxFeeChecker>,
    /// Message type URLs that may not be nested in or granted through authz.
    pub disabled_authz_msgs: BTreeSet<String>,
}

impl HandlerOptions {
    /// Fills [`Self::disabled_authz_msgs`] with the standard disable-set: the
    /// wrapped Ethereum transaction and the three vesting-creation messages.
    pub fn with_default_disabled_authz_msgs(mut self) -> Self {
        self.disabled_authz_msgs = [
            MSG_ETHEREUM_TX_URL,
            MSG_CREATE_VESTING_ACCOUNT_URL,
            MSG_CREATE_PERIODIC_VESTING_ACCOUNT_URL,
            MSG_CREATE_PERMANENT_LOCKED_ACCOUNT_URL,
        ]
        .into_iter()
        .map(str::to_owned)
        .collect();
        self
    }

    /// Checks that every required keeper is wired.
    pub fn validate(&self) -> AnteResult<()> {
        if self.account_keeper.is_none() {
            return Err(AnteError::Logic("account keeper is required for AnteHandler".to_owned()));
        }
        if self.bank_keeper.is_none() {
            return Err(AnteError::Logic("bank keeper is required for AnteHandler".to_owned()));
        }
        if self.evm_keeper.is_none() {
            return Err(AnteError::Logic("evm keeper is required for AnteHandler".to_owned()));
        }
        if self.fee_market_keeper.is_none() {
            return Err(AnteError::Logic(
                "fee market keeper is required for AnteHandler".to_owned(),
            ));
        }
        if self.staking_keeper.is_none() {
            return Err(AnteError::Logic("staking keeper is required for AnteHandler".to_owned()));
        }
        if self.vauth_keeper.is_none() {
            return Err(AnteError::Logic("vauth keeper is required for AnteHandler".to_owned()));
        }
        if self.tx_fee_checker.is_none() {
            return Err(AnteError::Logic("tx fee checker is required for AnteHandler".to_owned()));
        }
        if self.disabled_authz_msgs.is_empty() {
            return Err(AnteError::Logic(
                "disabled authz msgs is required for AnteHandler".to_owned(),
            ));
        }
        Ok(())
    }
}

/// The assembled two-lane admission pipeline.
pub struct AnteHandler {
    eth_lane: Vec<Box<dyn AnteDecorator>>,
    cosmos_lane: Vec<Box<dyn AnteDecorator>>,
}

impl AnteHandler {
    /// Builds both lanes from `options`. Fails when a required keeper is
    /// missing.
    pub fn new(options: HandlerOptions) -> AnteResult<Self> {
        options.validate()?;

        // validate() guarantees presence below
        let account_keeper = options.account_keeper.clone().ok_or_else(required)?;
        let bank_keeper = options.bank_keeper.clone().ok_or_else(required)?;
        let evm_keeper = options.evm_keeper.clone().ok_or_else(required)?;
        let fee_market_keeper = options.fee_market_keeper.clone().ok_or_else(required)?;
        let staking_keeper = options.staking_keeper.clone().ok_or_else(required)?;
        let vauth_keeper = options.vauth_keeper.clone().ok_or_else(required)?;
        let tx_fee_checker = options.tx_fee_checker.clone().ok_or_else(required)?;

        let eth_lane: Vec<Box<dyn AnteDecorator>> = vec![
            // outermost decorator, must run first
            Box::new(EthSetupContextDecorator::new(evm_keeper.clone())),
            // ensure one and only one Ethereum message per envelope
            Box::new(SingleEthTxDecorator),
            Box::new(EthValidateBasicDecorator::new(evm_keeper.clone())),
            Box::new(EoaVerificationDecorator::new(
                account_keeper.clone(),
                bank_keeper.clone(),
                evm_keeper.clone(),
            )),
            Box::new(EthBasicValidationDecorator),
            // effective gas price against the global fee-market minimum
            Box::new(EthMinGasPriceDecorator::new(
                fee_market_keeper.clone(),
                evm_keeper.clone(),
            )),
            // declared fee against the node's own minimal-gas-prices config
            Box::new(EthMempoolFeeDecorator::new(evm_keeper.clone())),
            Box::new(CanTransferDecorator::new(evm_keeper.clone())),
            Box::new(EthGasConsumeDecorator::new(
                evm_keeper.clone(),
                options.max_tx_gas_wanted,
            )),
            Box::new(EthIncrementSenderSequenceDecorator::new(
                account_keeper.clone(),
                evm_keeper.clone(),
            )),
            Box::new(EthSetupExecutionDecorator::new(evm_keeper.clone())),
            // emit tx hash and index at the very last step
            Box::new(EthEmitEventDecorator::new(evm_keeper.clone())),
        ];

        let cosmos_lane: Vec<Box<dyn AnteDecorator>> = vec![
            Box::new(RejectEthereumMsgsDecorator),
            Box::new(AuthzLimiterDecorator::new(options.disabled_authz_msgs.clone())),
            Box::new(SetUpContextDecorator),
            Box::new(VestingMessagesAuthorizationDecorator::new(vauth_keeper)),
            Box::new(DeductFeeDecorator::new(
                account_keeper,
                bank_keeper,
                staking_keeper,
                options.fee_grant_keeper.clone(),
                tx_fee_checker,
            )),
        ];

        Ok(Self { eth_lane, cosmos_lane })
    }

    /// Admits (or rejects) a transaction, routing it to the lane matching its
    /// shape.
    pub fn ante_handle(&self, ctx: Context, tx: &Tx, simulate: bool) -> AnteResult<Context> {
        if has_single_ethereum_message(tx) {
            run_chain(&self.eth_lane, ctx, tx, simulate)
        } else {
            run_chain(&self.cosmos_lane, ctx, tx, simulate)
        }
    }
}

fn required() -> AnteError {
    AnteError::Logic("handler options not validated".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        name: &'static str,
        log: Arc<std::sync::Mutex<Vec<&'static str>>>,
    }

    impl AnteDecorator for Recorder {
        fn ante_handle(
            &self,
            ctx: Context,
            tx: &Tx,
            simulate: bool,
            next: Next<'_>,
        ) -> AnteResult<Context> {
            self.log.lock().unwrap().push(self.name);
            next.run(ctx, tx, simulate)
        }
    }

    struct Reject;

    impl AnteDecorator for Reject {
        fn ante_handle(
            &self,
            _ctx: Context,
            _tx: &Tx,
            _simulate: bool,
            _next: Next<'_>,
        ) -> AnteResult<Context> {
            Err(AnteError::InvalidRequest("rejected".to_owned()))
        }
    }

    fn empty_tx() -> Tx {
        Tx {
            body: crate::TxBody {
                messages: vec![],
                memo: String::new(),
                timeout_height: 0,
                extension_options: vec![],
                non_critical_extension_options: vec![],
            },
            auth_info: crate::AuthInfo::default(),
            signatures: vec![],
        }
    }

    #[test]
    fn chain_runs_in_declared_order() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain: Vec<Box<dyn AnteDecorator>> = vec![
            Box::new(Recorder { name: "a", log: log.clone() }),
            Box::new(Recorder { name: "b", log: log.clone() }),
            Box::new(Recorder { name: "c", log: log.clone() }),
        ];
        run_chain(&chain, Context::new(1), &empty_tx(), false).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn rejection_stops_the_chain() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain: Vec<Box<dyn AnteDecorator>> = vec![
            Box::new(Recorder { name: "a", log: log.clone() }),
            Box::new(Reject),
            Box::new(Recorder { name: "never", log: log.clone() }),
        ];
        let err = run_chain(&chain, Context::new(1), &empty_tx(), false).unwrap_err();
        assert!(matches!(err, AnteError::InvalidRequest(_)));
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn options_validate_requires_keepers() {
        let err = HandlerOptions::default().validate().unwrap_err();
        assert!(matches!(err, AnteError::Logic(_)));
    }

    #[test]
    fn default_disabled_authz_msgs() {
        let options = HandlerOptions::default().with_default_disabled_authz_msgs();
        assert_eq!(options.disabled_authz_msgs.len(), 4);
        assert!(options.disabled_authz_msgs.contains(MSG_ETHEREUM_TX_URL));
    }
}
