//! Native-lane decorators.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::constants::{
    ATTRIBUTE_KEY_FEE, ATTRIBUTE_KEY_FEE_PAYER, DISTRIBUTION_MODULE, EVENT_TYPE_TX,
    FEE_COLLECTOR_MODULE, MAX_AUTHZ_NESTED_LEVELS, VAUTH_MODULE,
};
use crate::{
    AccountKeeper, AnteDecorator, AnteError, AnteResult, BankKeeper, Coin, Coins, Context, Event,
    FeeGrantKeeper, GasMeter, Msg, Next, StakingKeeper, Tx, TxFeeChecker, VAuthKeeper,
};

/// Rejects wrapped Ethereum messages inside a native envelope. They are only
/// valid behind the extension-option wrapping that routes them to the
/// Ethereum lane.
pub struct RejectEthereumMsgsDecorator;

impl AnteDecorator for RejectEthereumMsgsDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        for msg in &tx.body.messages {
            if matches!(msg, Msg::EthereumTx(_)) {
                return Err(AnteError::InvalidType(
                    "MsgEthereumTx needs to be contained within a tx with \
                     'ExtensionOptionsEthereumTx' option"
                        .to_owned(),
                ));
            }
        }
        next.run(ctx, tx, simulate)
    }
}

/// Rejects authz wrappers that nest too deeply or smuggle disabled message
/// kinds (nested or granted).
pub struct AuthzLimiterDecorator {
    disabled_msgs: BTreeSet<String>,
}

impl AuthzLimiterDecorator {
    /// Creates the decorator from the disable-set of message type URLs.
    pub fn new(disabled_msgs: BTreeSet<String>) -> Self {
        Self { disabled_msgs }
    }

    fn is_disabled(&self, type_url: &str) -> bool {
        self.disabled_msgs.contains(type_url)
    }

    fn check_disabled_msgs(&self, msgs: &[Msg], nested_level: usize) -> AnteResult<()> {
        if nested_level > MAX_AUTHZ_NESTED_LEVELS {
            return Err(AnteError::NotSupported(format!(
                "nested level: {nested_level}/{MAX_AUTHZ_NESTED_LEVELS}"
            )));
        }
        for msg in msgs {
            match msg {
                Msg::AuthzExec { msgs } => {
                    self.check_disabled_msgs(msgs, nested_level + 1)?;
                }
                Msg::AuthzGrant { msg_type_url } => {
                    if self.is_disabled(msg_type_url) {
                        return Err(AnteError::NotSupported(format!(
                            "not allowed to grant: {msg_type_url}"
                        )));
                    }
                }
                _ => {
                    // only nested occurrences are restricted
                    if nested_level > 1 && self.is_disabled(msg.type_url()) {
                        return Err(AnteError::NotSupported(format!(
                            "not allowed to be nested message: {}",
                            msg.type_url()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl AnteDecorator for AuthzLimiterDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if let Err(err) = self.check_disabled_msgs(&tx.body.messages, 1) {
            return Err(AnteError::Unauthorized(err.to_string()));
        }
        next.run(ctx, tx, simulate)
    }
}

/// Installs a gas meter limited to the declared gas so native admission work
/// is metered against what the transaction pays for.
pub struct SetUpContextDecorator;

impl AnteDecorator for SetUpContextDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let ctx = ctx.with_gas_meter(GasMeter::metered(tx.fee().gas_limit));
        next.run(ctx, tx, simulate)
    }
}

/// Gates vesting-account creation behind a recorded ownership proof for the
/// target address.
pub struct VestingMessagesAuthorizationDecorator {
    vauth_keeper: Arc<dyn VAuthKeeper + Send + Sync>,
}

impl VestingMessagesAuthorizationDecorator {
    /// Creates the decorator.
    pub fn new(vauth_keeper: Arc<dyn VAuthKeeper + Send + Sync>) -> Self {
        Self { vauth_keeper }
    }
}

impl AnteDecorator for VestingMessagesAuthorizationDecorator {
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        for msg in &tx.body.messages {
            let to_address = match msg {
                Msg::CreateVestingAccount { to_address }
                | Msg::CreatePeriodicVestingAccount { to_address }
                | Msg::CreatePermanentLockedAccount { to_address } => *to_address,
                _ => continue,
            };

            if self.vauth_keeper.has_proved_account_ownership_by_address(to_address) {
                continue;
            }

            return Err(AnteError::Unauthorized(format!(
                "account must be proved account ownership via `x/{VAUTH_MODULE}` module before \
                 able to create vesting account: {to_address}"
            )));
        }
        next.run(ctx, tx, simulate)
    }
}

/// Computes the fee through the configured checker, resolves the payer (or
/// granter), deducts the fee, and stamps the mempool priority on the context.
pub struct DeductFeeDecorator {
    account_keeper: Arc<dyn AccountKeeper + Send + Sync>,
    bank_keeper: Arc<dyn BankKeeper + Send + Sync>,
    staking_keeper: Arc<dyn StakingKeeper + Send + Sync>,
    fee_grant_keeper: Option<Arc<dyn FeeGrantKeeper + Send + Sync>>,
    tx_fee_checker: TxFeeChecker,
}

impl DeductFeeDecorator {
    /// Creates the decorator. Absent a fee-grant keeper, granter-paid
    /// transactions are rejected.
    pub fn new(
        account_keeper: Arc<dyn AccountKeeper + Send + Sync>,
        bank_keeper: Arc<dyn BankKeeper + Send + Sync>,
        staking_keeper: Arc<dyn StakingKeeper + Send + Sync>,
        fee_grant_keeper: Option<Arc<dyn FeeGrantKeeper + Send + Sync>>,
        tx_fee_checker: TxFeeChecker,
    ) -> Self {
        Self { account_keeper, bank_keeper, staking_keeper, fee_grant_keeper, tx_fee_checker }
    }

    /// Moves `fee` out of `payer`: bond-denom coins fund the fee collector,
    /// everything else goes to the distribution module (community pool).
    fn deduct_fees(&self, payer: alloy_primitives::Address, fee: &Coins) -> AnteResult<()> {
        let bond_denom = self.staking_keeper.bond_denom();

        let (to_collector, to_distribution): (Vec<Coin>, Vec<Coin>) =
            fee.iter().cloned().partition(|coin| coin.denom == bond_denom);

        if !to_collector.is_empty() {
            self.bank_keeper.send_coins_from_account_to_module(
                payer,
                FEE_COLLECTOR_MODULE,
                &Coins::from(to_collector),
            )?;
        }
        if !to_distribution.is_empty() {
            self.bank_keeper.send_coins_from_account_to_module(
                payer,
                DISTRIBUTION_MODULE,
                &Coins::from(to_distribution),
            )?;
        }
        Ok(())
    }
}

impl AnteDecorator for DeductFeeDecorator {
    fn ante_handle(
        &self,
        mut ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if !simulate && ctx.is_check_tx() && tx.fee().gas_limit == 0 {
            return Err(AnteError::InvalidRequest("must provide positive gas".to_owned()));
        }

        let (fee, priority) = if simulate {
            (tx.fee().amount.clone(), 0)
        } else {
            (self.tx_fee_checker)(&ctx, tx)?
        };

        let fee_payer = tx
            .fee_payer()
            .ok_or_else(|| AnteError::InvalidAddress("fee payer cannot be resolved".to_owned()))?;
        let fee_granter = tx.fee().granter;

        let deduct_fees_from = match fee_granter {
            Some(granter) if granter != fee_payer => {
                let fee_grant_keeper = self.fee_grant_keeper.as_ref().ok_or_else(|| {
                    AnteError::InvalidRequest("fee grants are not enabled".to_owned())
                })?;
                fee_grant_keeper.use_granted_fees(granter, fee_payer, &fee, &tx.body.messages)?;
                granter
            }
            Some(granter) => granter,
            None => fee_payer,
        };

        if self.account_keeper.get_account(deduct_fees_from).is_none() {
            return Err(AnteError::UnknownAddress(format!(
                "fee payer address {deduct_fees_from} does not exist"
            )));
        }

        if !fee.is_empty() {
            self.deduct_fees(deduct_fees_from, &fee)?;
        }

        ctx.emit_event(
            Event::new(EVENT_TYPE_TX)
                .attribute(ATTRIBUTE_KEY_FEE, fee.to_string())
                .attribute(ATTRIBUTE_KEY_FEE_PAYER, deduct_fees_from.to_string()),
        );

        let ctx = ctx.with_priority(priority);
        next.run(ctx, tx, simulate)
    }
}
