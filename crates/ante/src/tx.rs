//! Transaction model: the native multi-message envelope and the embedded
//! Ethereum transaction payload.
//!
//! A transaction is polymorphic over two shapes behind one handler contract:
//! a generic envelope of messages, or an envelope wrapping exactly one
//! Ethereum transaction whose signature covers only the inner payload. The
//! lane router ([`has_single_ethereum_message`]) decides which decorator
//! chain processes it.

use alloy_consensus::{Transaction, TypedTransaction};
use alloy_primitives::{Address, Bytes, B256, I256, U256};

use crate::constants::{
    MSG_CREATE_PERIODIC_VESTING_ACCOUNT_URL, MSG_CREATE_PERMANENT_LOCKED_ACCOUNT_URL,
    MSG_CREATE_VESTING_ACCOUNT_URL, MSG_ETHEREUM_TX_URL,
};
use crate::{AnteError, AnteResult, Coins};

/// A native transaction envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    /// Body carrying the messages and envelope metadata.
    pub body: TxBody,
    /// Fee and signer metadata.
    pub auth_info: AuthInfo,
    /// Raw envelope signatures.
    pub signatures: Vec<Bytes>,
}

/// Body of a transaction envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxBody {
    /// Ordered list of messages.
    pub messages: Vec<Msg>,
    /// Free-form memo.
    pub memo: String,
    /// Block height after which the transaction is invalid; zero disables.
    pub timeout_height: u64,
    /// Extension options; the Ethereum wrapping is carried here.
    pub extension_options: Vec<ExtensionOption>,
    /// Non-critical extension options.
    pub non_critical_extension_options: Vec<ExtensionOption>,
}

/// Fee and signer metadata of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthInfo {
    /// Declared signers of the envelope.
    pub signer_infos: Vec<SignerInfo>,
    /// Declared fee.
    pub fee: Fee,
}

/// A declared envelope signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerInfo {
    /// Signer address.
    pub address: Address,
    /// Declared account sequence.
    pub sequence: u64,
}

/// Declared transaction fee.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fee {
    /// Fee coins offered.
    pub amount: Coins,
    /// Gas limit the fee pays for.
    pub gas_limit: u64,
    /// Explicit fee payer; defaults to the first signer.
    pub payer: Option<Address>,
    /// Fee granter paying on behalf of the payer.
    pub granter: Option<Address>,
}

/// Envelope extension options recognized by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionOption {
    /// Marks the envelope as wrapping a single Ethereum transaction.
    EthereumTx,
    /// Opts a native transaction into EIP-1559-style dynamic fees.
    DynamicFeeTx {
        /// Maximum priority price (tip cap) the signer is willing to pay.
        /// Signed so that a malformed negative value can be rejected rather
        /// than silently reinterpreted.
        max_priority_price: I256,
    },
}

/// The closed set of message kinds the pipeline inspects. Anything else
/// passes through as [`Msg::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A wrapped Ethereum transaction.
    EthereumTx(MsgEthereumTx),
    /// Creates a vesting account for the target address.
    CreateVestingAccount {
        /// Target account address.
        to_address: Address,
    },
    /// Creates a periodic vesting account for the target address.
    CreatePeriodicVestingAccount {
        /// Target account address.
        to_address: Address,
    },
    /// Creates a permanently locked account for the target address.
    CreatePermanentLockedAccount {
        /// Target account address.
        to_address: Address,
    },
    /// An authz exec wrapper around nested messages.
    AuthzExec {
        /// Nested messages to execute.
        msgs: Vec<Msg>,
    },
    /// An authz grant of a message type.
    AuthzGrant {
        /// Type URL of the granted message.
        msg_type_url: String,
    },
    /// Any other message kind, identified only by its type URL.
    Other {
        /// Message type URL.
        type_url: String,
    },
}

impl Msg {
    /// The message's type URL.
    pub fn type_url(&self) -> &str {
        match self {
            Self::EthereumTx(_) => MSG_ETHEREUM_TX_URL,
            Self::CreateVestingAccount { .. } => MSG_CREATE_VESTING_ACCOUNT_URL,
            Self::CreatePeriodicVestingAccount { .. } => {
                MSG_CREATE_PERIODIC_VESTING_ACCOUNT_URL
            }
            Self::CreatePermanentLockedAccount { .. } => {
                MSG_CREATE_PERMANENT_LOCKED_ACCOUNT_URL
            }
            Self::AuthzExec { .. } => "/cosmos.authz.v1beta1.MsgExec",
            Self::AuthzGrant { .. } => "/cosmos.authz.v1beta1.MsgGrant",
            Self::Other { type_url } => type_url,
        }
    }
}

/// A wrapped Ethereum transaction message.
///
/// `from` is derived from the payload signature (or pre-set by the signer
/// recovery step upstream); `hash` is the canonical Ethereum transaction
/// hash computed by the decoding layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgEthereumTx {
    /// Recovered sender address.
    pub from: Option<Address>,
    /// Canonical transaction hash of the inner payload.
    pub hash: B256,
    /// The inner Ethereum transaction.
    pub data: TypedTransaction,
}

impl MsgEthereumTx {
    /// Gas limit of the inner payload.
    pub fn gas(&self) -> u64 {
        self.data.gas_limit()
    }

    /// The gas price the sender is willing to pay: the declared price for
    /// legacy and access-list transactions, the fee cap for dynamic ones.
    pub fn gas_price(&self) -> U256 {
        match self.data.gas_price() {
            Some(price) => U256::from(price),
            None => U256::from(self.data.max_fee_per_gas()),
        }
    }

    /// Maximum fee per gas; equals the gas price for non-dynamic payloads.
    pub fn gas_fee_cap(&self) -> U256 {
        U256::from(self.data.max_fee_per_gas())
    }

    /// Maximum priority fee per gas, when the payload carries one.
    pub fn gas_tip_cap(&self) -> Option<U256> {
        self.data.max_priority_fee_per_gas().map(U256::from)
    }

    /// The fee the sender is willing to pay: `gas_price * gas`.
    pub fn fee(&self) -> U256 {
        self.gas_price().saturating_mul(U256::from(self.gas()))
    }

    /// Effective gas price under the current base fee:
    /// `min(tip_cap + base_fee, fee_cap)` for dynamic payloads, the declared
    /// gas price otherwise.
    pub fn effective_gas_price(&self, base_fee: U256) -> U256 {
        if self.data.is_dynamic_fee() {
            let tip_cap = U256::from(self.data.max_priority_fee_per_gas().unwrap_or_default());
            let fee_cap = U256::from(self.data.max_fee_per_gas());
            tip_cap.saturating_add(base_fee).min(fee_cap)
        } else {
            self.gas_price()
        }
    }

    /// The fee actually paid under the current base fee:
    /// `effective_gas_price * gas`.
    pub fn effective_fee(&self, base_fee: U256) -> U256 {
        self.effective_gas_price(base_fee).saturating_mul(U256::from(self.gas()))
    }

    /// Total declared cost: `fee + value`.
    pub fn cost(&self) -> U256 {
        self.fee().saturating_add(self.data.value())
    }

    /// The payload's EIP-2718 type byte.
    pub fn tx_type(&self) -> u8 {
        self.data.tx_type() as u8
    }

    /// Whether the payload creates a contract (no recipient).
    pub fn is_contract_creation(&self) -> bool {
        self.data.to().is_none()
    }

    /// The recovered sender, or an error when signer recovery has not run.
    pub fn sender(&self) -> AnteResult<Address> {
        self.from
            .ok_or_else(|| AnteError::InvalidAddress("from address cannot be empty".to_owned()))
    }
}

impl Tx {
    /// Shorthand accessor for the declared fee.
    pub fn fee(&self) -> &Fee {
        &self.auth_info.fee
    }

    /// The address paying the fee: the explicitly declared payer, falling
    /// back to the first declared signer.
    pub fn fee_payer(&self) -> Option<Address> {
        self.auth_info
            .fee
            .payer
            .or_else(|| self.auth_info.signer_infos.first().map(|signer| signer.address))
    }

    /// Returns the dynamic-fee extension's tip cap, when present.
    pub fn dynamic_fee_tip_cap(&self) -> Option<I256> {
        self.body.extension_options.iter().find_map(|option| match option {
            ExtensionOption::DynamicFeeTx { max_priority_price } => Some(*max_priority_price),
            ExtensionOption::EthereumTx => None,
        })
    }

    /// Returns the single wrapped Ethereum message, when the envelope has
    /// exactly one message and it is the Ethereum variant.
    pub fn single_ethereum_message(&self) -> Option<&MsgEthereumTx> {
        match self.body.messages.as_slice() {
            [Msg::EthereumTx(msg)] => Some(msg),
            _ => None,
        }
    }
}

/// Lane router predicate: true when the transaction's only content is a
/// wrapped Ethereum transaction.
pub fn has_single_ethereum_message(tx: &Tx) -> bool {
    tx.single_ethereum_message().is_some()
}

/// Ethereum-lane accessor for the wrapped message. Decorators behind the
/// single-message guard still go through this rather than indexing.
pub(crate) fn require_single_ethereum_message(tx: &Tx) -> AnteResult<&MsgEthereumTx> {
    tx.single_ethereum_message().ok_or_else(|| {
        AnteError::InvalidType("expected one and only one MsgEthereumTx".to_owned())
    })
}

#[cfg(test)]
mod tests {
    use alloy_consensus::{TxEip1559, TxLegacy};
    use alloy_primitives::TxKind;

    use super::*;

    fn legacy_msg(gas_price: u128, gas: u64, value: U256) -> MsgEthereumTx {
        MsgEthereumTx {
            from: Some(Address::repeat_byte(1)),
            hash: B256::ZERO,
            data: TypedTransaction::Legacy(TxLegacy {
                chain_id: Some(1),
                nonce: 0,
                gas_price,
                gas_limit: gas,
                to: TxKind::Call(Address::repeat_byte(2)),
                value,
                input: Bytes::new(),
            }),
        }
    }

    fn dynamic_msg(fee_cap: u128, tip_cap: u128, gas: u64) -> MsgEthereumTx {
        MsgEthereumTx {
            from: Some(Address::repeat_byte(1)),
            hash: B256::ZERO,
            data: TypedTransaction::Eip1559(TxEip1559 {
                chain_id: 1,
                nonce: 0,
                gas_limit: gas,
                max_fee_per_gas: fee_cap,
                max_priority_fee_per_gas: tip_cap,
                to: TxKind::Call(Address::repeat_byte(2)),
                value: U256::ZERO,
                access_list: Default::default(),
                input: Bytes::new(),
            }),
        }
    }

    #[test]
    fn legacy_fee_and_cost() {
        let msg = legacy_msg(7, 21_000, U256::from(100));
        assert_eq!(msg.gas_price(), U256::from(7));
        assert_eq!(msg.fee(), U256::from(7u64 * 21_000));
        assert_eq!(msg.cost(), U256::from(7u64 * 21_000 + 100));
        // base fee does not change a legacy tx's effective price
        assert_eq!(msg.effective_gas_price(U256::from(1_000)), U256::from(7));
    }

    #[test]
    fn dynamic_effective_price_is_capped() {
        let msg = dynamic_msg(100, 5, 1);
        // tip + base below the cap
        assert_eq!(msg.effective_gas_price(U256::from(10)), U256::from(15));
        // capped by the fee cap
        assert_eq!(msg.effective_gas_price(U256::from(1_000)), U256::from(100));
        // willing-to-pay fee uses the cap
        assert_eq!(msg.fee(), U256::from(100));
    }

    #[test]
    fn single_ethereum_message_routing() {
        let msg = legacy_msg(1, 21_000, U256::ZERO);
        let tx = Tx {
            body: TxBody {
                messages: vec![Msg::EthereumTx(msg.clone())],
                memo: String::new(),
                timeout_height: 0,
                extension_options: vec![ExtensionOption::EthereumTx],
                non_critical_extension_options: vec![],
            },
            auth_info: AuthInfo::default(),
            signatures: vec![],
        };
        assert!(has_single_ethereum_message(&tx));

        let mut two = tx.clone();
        two.body.messages.push(Msg::EthereumTx(msg));
        assert!(!has_single_ethereum_message(&two));

        let mut other = tx;
        other.body.messages = vec![Msg::Other { type_url: "/cosmos.bank.v1beta1.MsgSend".into() }];
        assert!(!has_single_ethereum_message(&other));
    }
}
