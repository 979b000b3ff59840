//! An in-memory chain state implementing every keeper trait.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, U256};

use crate::{
    new_dynamic_fee_checker, Account, AccountKeeper, AnteError, AnteResult, BankKeeper, Coin,
    Coins, Dec, EvmAccount, EvmKeeper, EvmParams, FeeGrantKeeper, FeeMarketKeeper,
    FeeMarketParams, HandlerOptions, Msg, StakingKeeper, VAuthKeeper,
};

#[derive(Debug, Default)]
struct MockState {
    accounts: BTreeMap<Address, Account>,
    evm_accounts: BTreeMap<Address, EvmAccount>,
    balances: BTreeMap<(Address, String), U256>,
    locked: BTreeMap<(Address, String), U256>,
    module_balances: BTreeMap<(String, String), U256>,
    evm_params: EvmParams,
    fee_market_params: FeeMarketParams,
    base_fee_enabled: bool,
    bond_denom: String,
    proved_ownership: BTreeSet<Address>,
    fee_allowances: BTreeMap<(Address, Address), Coins>,
    tx_count_transient: u64,
    nonce_increased_flag: bool,
    execution_setups: Vec<(u64, u8)>,
    deducted_fees: Vec<Coins>,
}

/// In-memory chain state backing every keeper trait, for tests.
///
/// Builder-style setters configure the state; accessor methods let tests
/// assert on what the pipeline did. Share it as `Arc<MockChain>` and clone
/// the `Arc` into each keeper slot of [`HandlerOptions`].
#[derive(Debug)]
pub struct MockChain {
    state: Mutex<MockState>,
}

impl Default for MockChain {
    fn default() -> Self {
        let state = MockState {
            evm_params: EvmParams::default(),
            base_fee_enabled: true,
            bond_denom: EvmParams::default().evm_denom,
            ..MockState::default()
        };
        Self { state: Mutex::new(state) }
    }
}

impl MockChain {
    /// Creates a fresh chain with default parameters.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sets the bank balance and ensures both account views exist.
    pub fn set_account_balance(&self, address: Address, denom: &str, amount: U256) {
        let mut state = self.state.lock().unwrap();
        state.balances.insert((address, denom.to_owned()), amount);
        state.accounts.entry(address).or_insert_with(|| Account::new(address));
        state.evm_accounts.entry(address).or_insert_with(EvmAccount::empty);
    }

    /// Sets the account sequence (and the EVM-side nonce) for `address`.
    pub fn set_account_sequence(&self, address: Address, sequence: u64) {
        let mut state = self.state.lock().unwrap();
        state
            .accounts
            .entry(address)
            .or_insert_with(|| Account::new(address))
            .sequence = sequence;
        state.evm_accounts.entry(address).or_insert_with(EvmAccount::empty).nonce = sequence;
    }

    /// Marks `address` as a contract account.
    pub fn set_contract(&self, address: Address) {
        let mut state = self.state.lock().unwrap();
        let account = state.evm_accounts.entry(address).or_insert_with(EvmAccount::empty);
        account.code_hash = alloy_primitives::keccak256(address);
    }

    /// Locks part of the bank balance (vesting), reducing what is spendable.
    pub fn set_locked_balance(&self, address: Address, denom: &str, amount: U256) {
        self.state.lock().unwrap().locked.insert((address, denom.to_owned()), amount);
    }

    /// Sets the block base fee.
    pub fn set_base_fee(&self, base_fee: U256) {
        self.state.lock().unwrap().fee_market_params.base_fee = base_fee;
    }

    /// Disables (or re-enables) the dynamic base fee entirely.
    pub fn set_no_base_fee(&self, no_base_fee: bool) {
        self.state.lock().unwrap().fee_market_params.no_base_fee = no_base_fee;
    }

    /// Sets the global fee-market minimum gas price.
    pub fn set_min_gas_price(&self, min_gas_price: Dec) {
        self.state.lock().unwrap().fee_market_params.min_gas_price = min_gas_price;
    }

    /// Toggles the create/call governance gates.
    pub fn set_enable_create(&self, enable: bool) {
        self.state.lock().unwrap().evm_params.enable_create = enable;
    }

    /// Toggles the call governance gate.
    pub fn set_enable_call(&self, enable: bool) {
        self.state.lock().unwrap().evm_params.enable_call = enable;
    }

    /// Sets the staking bond denomination.
    pub fn set_bond_denom(&self, denom: &str) {
        self.state.lock().unwrap().bond_denom = denom.to_owned();
    }

    /// Records an ownership proof for `address`.
    pub fn prove_ownership(&self, address: Address) {
        self.state.lock().unwrap().proved_ownership.insert(address);
    }

    /// Grants a fee allowance from `granter` to `grantee`.
    pub fn set_fee_allowance(&self, granter: Address, grantee: Address, allowance: Coins) {
        self.state.lock().unwrap().fee_allowances.insert((granter, grantee), allowance);
    }

    /// The stored sequence of `address`, zero when the account is unknown.
    pub fn sequence_of(&self, address: Address) -> u64 {
        self.state
            .lock()
            .unwrap()
            .accounts
            .get(&address)
            .map(|account| account.sequence)
            .unwrap_or_default()
    }

    /// Whether an auth account exists for `address`.
    pub fn has_account(&self, address: Address) -> bool {
        self.state.lock().unwrap().accounts.contains_key(&address)
    }

    /// The bank balance of `address` in `denom`.
    pub fn balance_of(&self, address: Address, denom: &str) -> U256 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&(address, denom.to_owned()))
            .copied()
            .unwrap_or_default()
    }

    /// The balance a module account accumulated in `denom`.
    pub fn module_balance(&self, module: &str, denom: &str) -> U256 {
        self.state
            .lock()
            .unwrap()
            .module_balances
            .get(&(module.to_owned(), denom.to_owned()))
            .copied()
            .unwrap_or_default()
    }

    /// Fees deducted through the EVM keeper, in order.
    pub fn deducted_fees(&self) -> Vec<Coins> {
        self.state.lock().unwrap().deducted_fees.clone()
    }

    /// Execution contexts recorded for the downstream executor.
    pub fn execution_setups(&self) -> Vec<(u64, u8)> {
        self.state.lock().unwrap().execution_setups.clone()
    }

    /// The current nonce-increased-by-ante transient flag.
    pub fn nonce_increased_flag(&self) -> bool {
        self.state.lock().unwrap().nonce_increased_flag
    }

    /// Wires this chain into a fully-populated [`HandlerOptions`] with the
    /// dynamic fee checker and the default authz disable-set.
    pub fn handler_options(self: &Arc<Self>) -> HandlerOptions {
        let chain = self.clone();
        HandlerOptions {
            account_keeper: Some(chain.clone()),
            bank_keeper: Some(chain.clone()),
            evm_keeper: Some(chain.clone()),
            fee_market_keeper: Some(chain.clone()),
            staking_keeper: Some(chain.clone()),
            vauth_keeper: Some(chain.clone()),
            fee_grant_keeper: Some(chain.clone()),
            max_tx_gas_wanted: 0,
            tx_fee_checker: Some(new_dynamic_fee_checker(chain)),
            disabled_authz_msgs: Default::default(),
        }
        .with_default_disabled_authz_msgs()
    }
}

impl AccountKeeper for MockChain {
    fn get_account(&self, address: Address) -> Option<Account> {
        self.state.lock().unwrap().accounts.get(&address).cloned()
    }

    fn set_account(&self, account: Account) {
        self.state.lock().unwrap().accounts.insert(account.address, account);
    }

    fn new_account_with_address(&self, address: Address) -> Account {
        Account::new(address)
    }
}

impl BankKeeper for MockChain {
    fn spendable_coin(&self, address: Address, denom: &str) -> Coin {
        let state = self.state.lock().unwrap();
        let key = (address, denom.to_owned());
        let balance = state.balances.get(&key).copied().unwrap_or_default();
        let locked = state.locked.get(&key).copied().unwrap_or_default();
        Coin::new(denom, balance.saturating_sub(locked))
    }

    fn send_coins_from_account_to_module(
        &self,
        from: Address,
        module: &str,
        amount: &Coins,
    ) -> AnteResult<()> {
        let mut state = self.state.lock().unwrap();
        for coin in amount.iter() {
            let key = (from, coin.denom.clone());
            let balance = state.balances.get(&key).copied().unwrap_or_default();
            if balance < coin.amount {
                return Err(AnteError::InsufficientFunds(format!(
                    "spendable balance {balance}{} is smaller than {coin}",
                    coin.denom
                )));
            }
            state.balances.insert(key, balance - coin.amount);
            let module_key = (module.to_owned(), coin.denom.clone());
            let module_balance = state.module_balances.get(&module_key).copied().unwrap_or_default();
            state.module_balances.insert(module_key, module_balance + coin.amount);
        }
        Ok(())
    }
}

impl EvmKeeper for MockChain {
    fn get_params(&self) -> EvmParams {
        self.state.lock().unwrap().evm_params.clone()
    }

    fn get_base_fee(&self) -> Option<U256> {
        let state = self.state.lock().unwrap();
        if state.fee_market_params.no_base_fee || !state.base_fee_enabled {
            return None;
        }
        Some(state.fee_market_params.base_fee)
    }

    fn get_account(&self, address: Address) -> Option<EvmAccount> {
        let state = self.state.lock().unwrap();
        let evm_denom = state.evm_params.evm_denom.clone();
        state.evm_accounts.get(&address).map(|account| EvmAccount {
            balance: state.balances.get(&(address, evm_denom)).copied().unwrap_or_default(),
            ..account.clone()
        })
    }

    fn deduct_tx_costs_from_user_balance(&self, fees: &Coins, from: Address) -> AnteResult<()> {
        let mut state = self.state.lock().unwrap();
        for coin in fees.iter() {
            let key = (from, coin.denom.clone());
            let balance = state.balances.get(&key).copied().unwrap_or_default();
            if balance < coin.amount {
                return Err(AnteError::InsufficientFunds(format!(
                    "failed to deduct transaction costs from user balance: balance {balance}, \
                     fee {coin}"
                )));
            }
            state.balances.insert(key, balance - coin.amount);
        }
        state.deducted_fees.push(fees.clone());
        Ok(())
    }

    fn can_transfer(&self, from: Address, value: U256) -> bool {
        let state = self.state.lock().unwrap();
        let evm_denom = state.evm_params.evm_denom.clone();
        state.balances.get(&(from, evm_denom)).copied().unwrap_or_default() >= value
    }

    fn setup_execution_context(&self, tx_gas: u64, tx_type: u8) {
        let mut state = self.state.lock().unwrap();
        state.tx_count_transient += 1;
        state.execution_setups.push((tx_gas, tx_type));
    }

    fn get_tx_count_transient(&self) -> u64 {
        self.state.lock().unwrap().tx_count_transient
    }

    fn set_flag_sender_nonce_increased_by_ante_handle(&self, increased: bool) {
        self.state.lock().unwrap().nonce_increased_flag = increased;
    }
}

impl FeeMarketKeeper for MockChain {
    fn get_params(&self) -> FeeMarketParams {
        self.state.lock().unwrap().fee_market_params.clone()
    }

    fn get_base_fee_enabled(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.base_fee_enabled && !state.fee_market_params.no_base_fee
    }
}

impl FeeGrantKeeper for MockChain {
    fn use_granted_fees(
        &self,
        granter: Address,
        grantee: Address,
        fee: &Coins,
        _msgs: &[Msg],
    ) -> AnteResult<()> {
        let mut state = self.state.lock().unwrap();
        let allowance = state
            .fee_allowances
            .get_mut(&(granter, grantee))
            .ok_or_else(|| {
                AnteError::Unauthorized(format!(
                    "fee-grant not found: granter {granter}, grantee {grantee}"
                ))
            })?;

        for coin in fee.iter() {
            let granted = allowance
                .iter_mut()
                .find(|allowed| allowed.denom == coin.denom)
                .filter(|allowed| allowed.amount >= coin.amount)
                .ok_or_else(|| {
                    AnteError::InsufficientFunds(format!("fee limit exceeded for {coin}"))
                })?;
            granted.amount -= coin.amount;
        }
        Ok(())
    }
}

impl VAuthKeeper for MockChain {
    fn has_proved_account_ownership_by_address(&self, address: Address) -> bool {
        self.state.lock().unwrap().proved_ownership.contains(&address)
    }
}

impl StakingKeeper for MockChain {
    fn bond_denom(&self) -> String {
        self.state.lock().unwrap().bond_denom.clone()
    }
}
