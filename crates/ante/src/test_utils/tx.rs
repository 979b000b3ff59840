//! Transaction and payload builders for tests.

use alloy_consensus::{TxEip1559, TxLegacy, TypedTransaction};
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{keccak256, Address, Bytes, TxKind, I256, U256};

use crate::{
    AuthInfo, Coins, ExtensionOption, Fee, Msg, MsgEthereumTx, SignerInfo, Tx, TxBody,
};

/// The sender address used by the payload builders.
pub fn sender() -> Address {
    Address::repeat_byte(0x11)
}

/// The recipient address used by the payload builders.
pub fn recipient() -> Address {
    Address::repeat_byte(0x22)
}

/// Builds a legacy transfer payload.
pub fn legacy_transfer(nonce: u64, gas_price: u128, gas_limit: u64, value: U256) -> MsgEthereumTx {
    let data = TypedTransaction::Legacy(TxLegacy {
        chain_id: Some(1),
        nonce,
        gas_price,
        gas_limit,
        to: TxKind::Call(recipient()),
        value,
        input: Bytes::new(),
    });
    wrap_payload(data)
}

/// Builds an EIP-1559 transfer payload.
pub fn dynamic_transfer(
    nonce: u64,
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
    gas_limit: u64,
    value: U256,
) -> MsgEthereumTx {
    let data = TypedTransaction::Eip1559(TxEip1559 {
        chain_id: 1,
        nonce,
        gas_limit,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        to: TxKind::Call(recipient()),
        value,
        access_list: AccessList::default(),
        input: Bytes::new(),
    });
    wrap_payload(data)
}

/// Builds a legacy contract-creation payload.
pub fn legacy_create(nonce: u64, gas_price: u128, gas_limit: u64, input: Bytes) -> MsgEthereumTx {
    let data = TypedTransaction::Legacy(TxLegacy {
        chain_id: Some(1),
        nonce,
        gas_price,
        gas_limit,
        to: TxKind::Create,
        value: U256::ZERO,
        input,
    });
    wrap_payload(data)
}

fn wrap_payload(data: TypedTransaction) -> MsgEthereumTx {
    // a deterministic stand-in for the canonical payload hash
    let hash = keccak256(format!("{data:?}"));
    MsgEthereumTx { from: Some(sender()), hash, data }
}

/// Wraps an Ethereum payload into a well-formed envelope: the declared fee
/// and gas limit mirror the payload, everything else is empty.
pub fn eth_tx(msg: MsgEthereumTx, fee_denom: &str) -> Tx {
    let payload_fee = msg.fee();
    let amount =
        if payload_fee.is_zero() { Coins::new() } else { Coins::one(fee_denom, payload_fee) };
    let gas_limit = msg.gas();
    Tx {
        body: TxBody {
            messages: vec![Msg::EthereumTx(msg)],
            memo: String::new(),
            timeout_height: 0,
            extension_options: vec![ExtensionOption::EthereumTx],
            non_critical_extension_options: vec![],
        },
        auth_info: AuthInfo {
            signer_infos: vec![],
            fee: Fee { amount, gas_limit, payer: None, granter: None },
        },
        signatures: vec![],
    }
}

/// Builds a native envelope signed by `signer`.
pub fn cosmos_tx(messages: Vec<Msg>, fee: Coins, gas_limit: u64, signer: Address) -> Tx {
    Tx {
        body: TxBody {
            messages,
            memo: String::new(),
            timeout_height: 0,
            extension_options: vec![],
            non_critical_extension_options: vec![],
        },
        auth_info: AuthInfo {
            signer_infos: vec![SignerInfo { address: signer, sequence: 0 }],
            fee: Fee { amount: fee, gas_limit, payer: None, granter: None },
        },
        signatures: vec![Bytes::from_static(b"sig")],
    }
}

/// Adds the dynamic-fee extension option to a native envelope.
pub fn with_dynamic_fee_ext(mut tx: Tx, max_priority_price: I256) -> Tx {
    tx.body.extension_options.push(ExtensionOption::DynamicFeeTx { max_priority_price });
    tx
}
