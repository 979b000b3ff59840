//! Keeper interfaces consumed by the pipeline.
//!
//! Keepers are the only mutable shared resources: the pipeline never caches
//! their state across decorators. Every decorator re-reads fresh and every
//! mutation is persisted immediately through the keeper; the host's cached
//! store makes keeper writes atomic per attempt.

use alloy_primitives::{Address, U256};
use auto_impl::auto_impl;

use crate::{
    Account, AnteResult, Coin, Coins, EvmAccount, EvmParams, FeeMarketParams, Msg,
};

/// Access to auth-module accounts (sequence/replay protection).
#[auto_impl(&, Box, Arc)]
pub trait AccountKeeper {
    /// Loads the account stored at `address`.
    fn get_account(&self, address: Address) -> Option<Account>;
    /// Persists `account`.
    fn set_account(&self, account: Account);
    /// Creates (without persisting) a fresh account for `address`.
    fn new_account_with_address(&self, address: Address) -> Account;
}

/// Access to bank balances.
#[auto_impl(&, Box, Arc)]
pub trait BankKeeper {
    /// The spendable (unlocked) balance of `address` in `denom`.
    fn spendable_coin(&self, address: Address, denom: &str) -> Coin;
    /// Moves `amount` from `address` into the named module account.
    fn send_coins_from_account_to_module(
        &self,
        from: Address,
        module: &str,
        amount: &Coins,
    ) -> AnteResult<()>;
}

/// Access to EVM-module state and parameters.
#[auto_impl(&, Box, Arc)]
pub trait EvmKeeper {
    /// Current EVM module parameters.
    fn get_params(&self) -> EvmParams;
    /// Current block base fee; `None` when the fee market is disabled.
    fn get_base_fee(&self) -> Option<U256>;
    /// The EVM-side view of the account at `address`.
    fn get_account(&self, address: Address) -> Option<EvmAccount>;
    /// Deducts `fees` from the sender's balance. Fails when the account does
    /// not exist or the balance is insufficient.
    fn deduct_tx_costs_from_user_balance(&self, fees: &Coins, from: Address) -> AnteResult<()>;
    /// Whether `from` can transfer `value` under the EVM block context's
    /// transfer rule, evaluated against a point-in-time state view.
    fn can_transfer(&self, from: Address, value: U256) -> bool;
    /// Records execution-context bookkeeping (gas, tx type) into transient
    /// state for the downstream executor.
    fn setup_execution_context(&self, tx_gas: u64, tx_type: u8);
    /// Number of transactions processed so far in the current block.
    fn get_tx_count_transient(&self) -> u64;
    /// Sets the transient flag telling the executor that the sender nonce
    /// was already incremented during admission.
    fn set_flag_sender_nonce_increased_by_ante_handle(&self, increased: bool);
}

/// Access to fee-market parameters.
#[auto_impl(&, Box, Arc)]
pub trait FeeMarketKeeper {
    /// Current fee-market parameters.
    fn get_params(&self) -> FeeMarketParams;
    /// Whether the dynamic base fee is enabled for the current block.
    fn get_base_fee_enabled(&self) -> bool;
}

/// Access to fee-grant allowances. Optional at wiring time.
#[auto_impl(&, Box, Arc)]
pub trait FeeGrantKeeper {
    /// Consumes `fee` from the allowance `granter` gave `grantee`, for the
    /// given messages. Fails when no allowance exists or it is exhausted.
    fn use_granted_fees(
        &self,
        granter: Address,
        grantee: Address,
        fee: &Coins,
        msgs: &[Msg],
    ) -> AnteResult<()>;
}

/// Access to recorded externally-owned-account ownership proofs.
#[auto_impl(&, Box, Arc)]
pub trait VAuthKeeper {
    /// Whether `address` has a verified proof of account ownership.
    fn has_proved_account_ownership_by_address(&self, address: Address) -> bool;
}

/// Access to staking parameters.
#[auto_impl(&, Box, Arc)]
pub trait StakingKeeper {
    /// The staking bond denomination, used to route deducted fees.
    fn bond_denom(&self) -> String;
}
