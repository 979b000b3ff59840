//! End-to-end tests of the Ethereum lane.

use alloy_primitives::{Bytes, U256};

use crate::constants::{EVENT_TYPE_ETHEREUM_TX, EVENT_TYPE_TX};
use crate::test_utils::{
    dynamic_transfer, eth_tx, legacy_create, legacy_transfer, sender, MockChain,
};
use crate::{AnteError, AnteHandler, Context, Dec, DecCoin, Msg};

const DENOM: &str = "aphoton";
const ONE_ETHER: u64 = 1_000_000_000_000_000_000;

fn handler(chain: &std::sync::Arc<MockChain>) -> AnteHandler {
    AnteHandler::new(chain.handler_options()).unwrap()
}

fn deliver_ctx() -> Context {
    Context::new(2).with_block_gas_limit(40_000_000)
}

fn check_ctx() -> Context {
    deliver_ctx().with_check_tx(true)
}

#[test]
fn legacy_transfer_passes_and_settles() {
    let chain = MockChain::new();
    chain.set_base_fee(U256::from(10));
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let msg = legacy_transfer(0, 2_000_000, 21_000, U256::from(100));
    let tx = eth_tx(msg, DENOM);

    let ctx = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap();

    // fee deducted at the effective (declared, for legacy) price
    let fee = U256::from(2_000_000u64 * 21_000);
    assert_eq!(chain.deducted_fees(), vec![crate::Coins::one(DENOM, fee)]);
    assert_eq!(chain.balance_of(sender(), DENOM), U256::from(ONE_ETHER) - fee);

    // sequence advanced by the lane, flagged for the executor
    assert_eq!(chain.sequence_of(sender()), 1);
    assert!(chain.nonce_increased_flag());

    // gas_wanted reported through the meter, priority from the gas price
    assert_eq!(ctx.gas_meter().limit(), 21_000);
    assert_eq!(ctx.priority(), 2);

    // execution context and indexing events
    assert_eq!(chain.execution_setups(), vec![(21_000, 0)]);
    let kinds: Vec<&str> = ctx.events().iter().map(|event| event.kind.as_str()).collect();
    assert_eq!(kinds, vec![EVENT_TYPE_TX, EVENT_TYPE_ETHEREUM_TX]);
}

#[test]
fn nonce_mismatch_is_rejected_without_touching_the_sequence() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));
    chain.set_account_sequence(sender(), 5);

    let tx = eth_tx(legacy_transfer(3, 10, 21_000, U256::ZERO), DENOM);
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();

    assert_eq!(err, AnteError::InvalidSequence { got: 3, expected: 5 });
    assert_eq!(chain.sequence_of(sender()), 5);
}

#[test]
fn matching_nonce_increments_the_sequence() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));
    chain.set_account_sequence(sender(), 5);

    let tx = eth_tx(legacy_transfer(5, 10, 21_000, U256::ZERO), DENOM);
    handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap();

    assert_eq!(chain.sequence_of(sender()), 6);
}

#[test]
fn block_gas_limit_boundary() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    // gas_wanted == block gas limit passes
    let tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    let ctx = Context::new(2).with_block_gas_limit(21_000);
    handler(&chain).ante_handle(ctx, &tx, false).unwrap();

    // one unit over is rejected
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));
    let tx = eth_tx(legacy_transfer(0, 10, 21_001, U256::ZERO), DENOM);
    let ctx = Context::new(2).with_block_gas_limit(21_000);
    let err = handler(&chain).ante_handle(ctx, &tx, false).unwrap_err();
    assert_eq!(
        err,
        AnteError::OutOfGas("tx gas (21001) exceeds block gas limit (21000)".to_owned())
    );
}

#[test]
fn zero_fee_zero_balance_check_tx_succeeds_with_zero_min_prices() {
    let chain = MockChain::new();
    assert!(!chain.has_account(sender()));

    let tx = eth_tx(legacy_transfer(0, 0, 21_000, U256::ZERO), DENOM);
    let ctx = handler(&chain).ante_handle(check_ctx(), &tx, false).unwrap();

    // the missing account was created on the way through
    assert!(chain.has_account(sender()));
    assert_eq!(chain.sequence_of(sender()), 1);
    assert!(chain.deducted_fees().iter().all(|fees| fees.is_empty()));
    assert_eq!(ctx.priority(), 0);
}

#[test]
fn validator_min_gas_prices_gate_the_mempool() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    let ctx = check_ctx()
        .with_min_gas_prices(vec![DecCoin::new(DENOM, Dec::from_int(1_000_000_000))]);
    let err = handler(&chain).ante_handle(ctx, &tx, false).unwrap_err();
    assert!(matches!(err, AnteError::InsufficientFee(_)));

    // the same transaction is accepted at delivery: the floor is local
    handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap();
}

#[test]
fn global_min_gas_price_applies_in_all_modes() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));
    chain.set_min_gas_price(Dec::from_int(100));

    let tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert!(err.to_string().contains("provided fee < minimum global fee"));
}

#[test]
fn contract_sender_is_rejected() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));
    chain.set_contract(sender());

    let tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    let err = handler(&chain).ante_handle(check_ctx(), &tx, false).unwrap_err();
    assert!(matches!(err, AnteError::InvalidType(_)));
}

#[test]
fn cost_above_spendable_balance_is_rejected() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(300_000));

    // cost = 10 * 21_000 + 100_000 = 310_000 > 300_000
    let tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::from(100_000)), DENOM);
    let err = handler(&chain).ante_handle(check_ctx(), &tx, false).unwrap_err();
    assert!(matches!(err, AnteError::InsufficientFunds(_)));
}

#[test]
fn locked_balance_is_not_spendable() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(400_000));
    chain.set_locked_balance(sender(), DENOM, U256::from(200_000));

    // cost 310_000 exceeds the 200_000 spendable remainder
    let tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::from(100_000)), DENOM);
    let err = handler(&chain).ante_handle(check_ctx(), &tx, false).unwrap_err();
    assert!(matches!(err, AnteError::InsufficientFunds(_)));
}

#[test]
fn create_and_call_governance_gates() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));
    chain.set_enable_create(false);

    let tx = eth_tx(legacy_create(0, 10, 60_000, Bytes::from(vec![0x60])), DENOM);
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert_eq!(err, AnteError::CreateDisabled);

    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));
    chain.set_enable_call(false);

    let tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert_eq!(err, AnteError::CallDisabled);
}

#[test]
fn envelope_must_be_empty_around_the_payload() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let mut tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    tx.body.memo = "gm".to_owned();
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert!(matches!(err, AnteError::InvalidRequest(_)));

    let mut tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    tx.signatures = vec![Bytes::from_static(b"sig")];
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert!(matches!(err, AnteError::InvalidRequest(_)));
}

#[test]
fn declared_fee_must_match_the_payload() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let mut tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    tx.auth_info.fee.amount = crate::Coins::one(DENOM, U256::from(1));
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert!(err.to_string().contains("invalid AuthInfo Fee Amount"));

    let mut tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    tx.auth_info.fee.gas_limit = 50_000;
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert!(err.to_string().contains("invalid AuthInfo Fee GasLimit"));
}

#[test]
fn two_ethereum_messages_fall_through_to_the_native_lane() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let msg = legacy_transfer(0, 10, 21_000, U256::ZERO);
    let mut tx = eth_tx(msg.clone(), DENOM);
    tx.body.messages.push(Msg::EthereumTx(msg));

    // the native lane rejects bare Ethereum messages outright
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert!(matches!(err, AnteError::InvalidType(_)));
}

#[test]
fn fee_cap_below_base_fee_is_rejected() {
    let chain = MockChain::new();
    chain.set_base_fee(U256::from(10));
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let tx = eth_tx(dynamic_transfer(0, 5, 1, 21_000, U256::ZERO), DENOM);
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert!(err.to_string().contains("max fee per gas less than block base fee"));
}

#[test]
fn dynamic_transfer_pays_the_effective_fee() {
    let chain = MockChain::new();
    chain.set_base_fee(U256::from(10));
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    // effective price = min(5 + 10, 100) = 15
    let tx = eth_tx(dynamic_transfer(0, 100, 5, 21_000, U256::ZERO), DENOM);
    handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap();

    let effective = U256::from(15u64 * 21_000);
    assert_eq!(chain.deducted_fees(), vec![crate::Coins::one(DENOM, effective)]);
}

#[test]
fn tip_cap_above_fee_cap_is_rejected() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let tx = eth_tx(dynamic_transfer(0, 10, 20, 21_000, U256::ZERO), DENOM);
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert!(err.to_string().contains("max priority fee per gas higher than max fee per gas"));
}

#[test]
fn recheck_reports_zero_gas_wanted_and_deducts_nothing() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let tx = eth_tx(legacy_transfer(0, 10, 21_000, U256::ZERO), DENOM);
    let ctx = deliver_ctx().with_re_check_tx(true);
    let ctx = handler(&chain).ante_handle(ctx, &tx, false).unwrap();

    assert_eq!(ctx.gas_meter().limit(), 0);
    assert!(chain.deducted_fees().is_empty());
    // the sequence check still ran
    assert_eq!(chain.sequence_of(sender()), 1);
}

#[test]
fn max_tx_gas_wanted_caps_check_tx_only() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let mut options = chain.handler_options();
    options.max_tx_gas_wanted = 30_000;
    let handler = AnteHandler::new(options).unwrap();

    let tx = eth_tx(legacy_transfer(0, 10, 100_000, U256::ZERO), DENOM);
    let ctx = handler.ante_handle(check_ctx(), &tx, false).unwrap();
    assert_eq!(ctx.gas_meter().limit(), 30_000);

    let chain2 = MockChain::new();
    chain2.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));
    let mut options = chain2.handler_options();
    options.max_tx_gas_wanted = 30_000;
    let handler = AnteHandler::new(options).unwrap();

    let ctx = handler.ante_handle(deliver_ctx(), &tx, false).unwrap();
    assert_eq!(ctx.gas_meter().limit(), 100_000);
}

#[test]
fn missing_sender_is_rejected() {
    let chain = MockChain::new();
    chain.set_account_balance(sender(), DENOM, U256::from(ONE_ETHER));

    let mut msg = legacy_transfer(0, 10, 21_000, U256::ZERO);
    msg.from = None;
    let tx = eth_tx(msg, DENOM);
    let err = handler(&chain).ante_handle(deliver_ctx(), &tx, false).unwrap_err();
    assert_eq!(err, AnteError::InvalidAddress("from address cannot be empty".to_owned()));
}
