//! Protocol constants shared across the admission pipeline.

use alloy_primitives::{b256, B256};

/// Divisor applied to a per-gas price when deriving the mempool priority of a
/// transaction. Prices below this are all mapped to priority zero.
pub const DEFAULT_PRIORITY_REDUCTION: u64 = 1_000_000;

/// Keccak-256 hash of empty code. An account whose code hash equals this (or
/// is unset) is an externally-owned account.
pub const KECCAK_EMPTY: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

/// Name of the module account collecting transaction fees paid in the staking
/// bond denom.
pub const FEE_COLLECTOR_MODULE: &str = "fee_collector";

/// Name of the distribution module account, receiving the non-bond-denom
/// portion of native transaction fees.
pub const DISTRIBUTION_MODULE: &str = "distribution";

/// Cap for the number of nested message levels inside an authz exec wrapper.
pub const MAX_AUTHZ_NESTED_LEVELS: usize = 3;

/// Event type emitted when a transaction fee is deducted.
pub const EVENT_TYPE_TX: &str = "tx";
/// Attribute key carrying the deducted fee.
pub const ATTRIBUTE_KEY_FEE: &str = "fee";
/// Attribute key carrying the fee payer address.
pub const ATTRIBUTE_KEY_FEE_PAYER: &str = "fee_payer";

/// Event type emitted at the tail of the Ethereum lane so the transaction can
/// be indexed even when later execution fails.
pub const EVENT_TYPE_ETHEREUM_TX: &str = "ethereum_tx";
/// Attribute key carrying the canonical Ethereum transaction hash.
pub const ATTRIBUTE_KEY_ETHEREUM_TX_HASH: &str = "ethereumTxHash";
/// Attribute key carrying the transaction position within the block.
pub const ATTRIBUTE_KEY_TX_INDEX: &str = "txIndex";

/// Message type URL of the wrapped Ethereum transaction.
pub const MSG_ETHEREUM_TX_URL: &str = "/ethermint.evm.v1.MsgEthereumTx";
/// Message type URL of the vesting account creation message.
pub const MSG_CREATE_VESTING_ACCOUNT_URL: &str = "/cosmos.vesting.v1beta1.MsgCreateVestingAccount";
/// Message type URL of the periodic vesting account creation message.
pub const MSG_CREATE_PERIODIC_VESTING_ACCOUNT_URL: &str =
    "/cosmos.vesting.v1beta1.MsgCreatePeriodicVestingAccount";
/// Message type URL of the permanent locked account creation message.
pub const MSG_CREATE_PERMANENT_LOCKED_ACCOUNT_URL: &str =
    "/cosmos.vesting.v1beta1.MsgCreatePermanentLockedAccount";

/// Name of the module recording externally-owned-account ownership proofs,
/// referenced by the vesting authorization error message.
pub const VAUTH_MODULE: &str = "vauth";
