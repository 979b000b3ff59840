//! Core value types: coins, fixed-point decimals, accounts, and the
//! governance parameter sets consumed by the pipeline.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::constants::KECCAK_EMPTY;

/// Scale factor of [`Dec`]: 18 fractional decimal digits.
const DEC_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Fixed-point decimal with 18 fractional digits over a 256-bit integer.
///
/// Used for gas prices configured as decimals (validator min-gas-prices and
/// the fee market's global minimum). Arithmetic saturates at the 256-bit
/// boundary; admission logic only ever compares such values against fees, so
/// saturation turns an overflow into a rejection rather than a wrap-around.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Dec(U256);

impl Dec {
    /// The zero decimal.
    pub const ZERO: Self = Self(U256::ZERO);

    /// Creates a decimal from an integer number of whole units.
    pub fn from_int(value: u64) -> Self {
        Self(U256::from(value).saturating_mul(DEC_SCALE))
    }

    /// Creates a decimal from a 256-bit integer number of whole units.
    pub fn from_uint(value: U256) -> Self {
        Self(value.saturating_mul(DEC_SCALE))
    }

    /// Creates a decimal from raw scaled atomics (`value / 10^18`).
    pub const fn from_atomics(atomics: U256) -> Self {
        Self(atomics)
    }

    /// Whether the decimal equals zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiplies by an integer, keeping full decimal precision.
    pub fn mul_int(self, value: u64) -> Self {
        Self(self.0.saturating_mul(U256::from(value)))
    }

    /// Multiplies by an integer and rounds the result up to the next integer.
    /// This is the `fee = ceil(minGasPrice * gasLimit)` rule of the
    /// validator-local fee check.
    pub fn mul_int_ceil(self, value: u64) -> U256 {
        let scaled = self.0.saturating_mul(U256::from(value));
        scaled.div_ceil(DEC_SCALE)
    }

    /// Truncates to the integer part.
    pub fn truncate(self) -> U256 {
        self.0 / DEC_SCALE
    }
}

impl core::fmt::Display for Dec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let whole = self.0 / DEC_SCALE;
        let frac = self.0 % DEC_SCALE;
        if frac.is_zero() {
            write!(f, "{whole}")
        } else {
            let frac = format!("{frac:078}");
            let frac = &frac[frac.len() - 18..];
            write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
        }
    }
}

/// A non-negative amount of a single denomination.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[display("{amount}{denom}")]
pub struct Coin {
    /// Denomination of the coin.
    pub denom: String,
    /// Amount of the coin.
    pub amount: U256,
}

impl Coin {
    /// Creates a new coin.
    pub fn new(denom: impl Into<String>, amount: U256) -> Self {
        Self { denom: denom.into(), amount }
    }
}

/// An ordered collection of coins, at most one per denomination.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Deref,
    derive_more::DerefMut,
)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Creates an empty coin set.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a coin set holding a single coin.
    pub fn one(denom: impl Into<String>, amount: U256) -> Self {
        Self(vec![Coin::new(denom, amount)])
    }

    /// Returns the amount of the given denomination, zero when absent.
    pub fn amount_of(&self, denom: &str) -> U256 {
        self.0
            .iter()
            .find(|coin| coin.denom == denom)
            .map(|coin| coin.amount)
            .unwrap_or_default()
    }

    /// Returns true when at least one coin in `self` meets or exceeds the
    /// coin of the same denomination in `required`. An empty `self` never
    /// satisfies any requirement.
    pub fn is_any_gte(&self, required: &Self) -> bool {
        self.0.iter().any(|coin| {
            required
                .iter()
                .any(|req| req.denom == coin.denom && coin.amount >= req.amount)
        })
    }
}

impl From<Vec<Coin>> for Coins {
    fn from(coins: Vec<Coin>) -> Self {
        Self(coins)
    }
}

impl core::fmt::Display for Coins {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let joined =
            self.0.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        write!(f, "{joined}")
    }
}

/// A decimal amount of a single denomination, used for configured minimum gas
/// prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecCoin {
    /// Denomination of the price.
    pub denom: String,
    /// Decimal price per unit of gas.
    pub amount: Dec,
}

impl DecCoin {
    /// Creates a new decimal coin.
    pub fn new(denom: impl Into<String>, amount: Dec) -> Self {
        Self { denom: denom.into(), amount }
    }
}

/// Returns true when every configured price is zero (or none is configured).
pub fn dec_coins_are_zero(prices: &[DecCoin]) -> bool {
    prices.iter().all(|price| price.amount.is_zero())
}

/// An auth-module account as seen by the pipeline: the replay-protection
/// sequence is the only state it owns here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address.
    pub address: Address,
    /// Monotonically increasing transaction counter.
    pub sequence: u64,
}

impl Account {
    /// Creates a fresh account with a zero sequence.
    pub fn new(address: Address) -> Self {
        Self { address, sequence: 0 }
    }
}

/// The EVM-side view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmAccount {
    /// Account balance in the EVM denom.
    pub balance: U256,
    /// Account nonce.
    pub nonce: u64,
    /// Hash of the account code; empty for externally-owned accounts.
    pub code_hash: B256,
}

impl EvmAccount {
    /// An empty externally-owned account.
    pub fn empty() -> Self {
        Self { balance: U256::ZERO, nonce: 0, code_hash: KECCAK_EMPTY }
    }

    /// Whether the account has contract code associated.
    pub fn is_contract(&self) -> bool {
        self.code_hash != KECCAK_EMPTY && self.code_hash != B256::ZERO
    }
}

/// Governance-controlled EVM module parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmParams {
    /// Denomination used to pay EVM transaction fees.
    pub evm_denom: String,
    /// Whether contract creation transactions are admitted.
    pub enable_create: bool,
    /// Whether contract call transactions are admitted.
    pub enable_call: bool,
}

impl Default for EvmParams {
    fn default() -> Self {
        Self { evm_denom: "aphoton".to_owned(), enable_create: true, enable_call: true }
    }
}

/// Governance-controlled fee market parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeMarketParams {
    /// When set, the dynamic base fee is disabled entirely.
    pub no_base_fee: bool,
    /// Protocol-computed minimum gas price for the current block.
    pub base_fee: U256,
    /// Global minimum gas price enforced on the effective fee.
    pub min_gas_price: Dec,
}
