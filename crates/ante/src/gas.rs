//! Gas metering and intrinsic-gas accounting.
//!
//! The host's gas meter aborts execution when a limit is crossed; inside the
//! pipeline that condition is surfaced as an [`AnteError::OutOfGas`] result
//! instead, recoverable exactly at the host's invocation boundary.

use alloy_eips::eip2930::AccessList;
use alloy_primitives::Bytes;

use crate::{AnteError, AnteResult};

/// Base gas cost of any transaction.
pub const TX_GAS: u64 = 21_000;
/// Base gas cost of a contract-creation transaction.
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
/// Gas cost per zero byte of calldata.
pub const TX_DATA_ZERO_GAS: u64 = 4;
/// Gas cost per non-zero byte of calldata (EIP-2028).
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;
/// Gas cost per access-list address (EIP-2930).
pub const TX_ACCESS_LIST_ADDRESS_GAS: u64 = 2_400;
/// Gas cost per access-list storage key (EIP-2930).
pub const TX_ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1_900;

/// A per-attempt gas meter carried on the [`Context`](crate::Context).
///
/// Three flavors exist:
/// - `Infinite`: never errors, used while running structural and fee checks
///   that must not themselves be gas-limited.
/// - `InfiniteWithLimit`: never errors but reports a configured limit. The
///   Ethereum lane installs this after fee deduction so the host sees the
///   transaction's `gas_wanted` without metering ante work.
/// - `Metered`: consuming past the limit returns `OutOfGas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GasMeter {
    /// Unlimited meter.
    Infinite {
        /// Gas consumed so far.
        consumed: u64,
    },
    /// Unlimited meter that still reports a limit.
    InfiniteWithLimit {
        /// Reported gas limit.
        limit: u64,
        /// Gas consumed so far.
        consumed: u64,
    },
    /// Limited meter.
    Metered {
        /// Gas limit.
        limit: u64,
        /// Gas consumed so far.
        consumed: u64,
    },
}

impl GasMeter {
    /// Creates an unlimited meter.
    pub const fn infinite() -> Self {
        Self::Infinite { consumed: 0 }
    }

    /// Creates an unlimited meter that reports `limit`.
    pub const fn infinite_with_limit(limit: u64) -> Self {
        Self::InfiniteWithLimit { limit, consumed: 0 }
    }

    /// Creates a metered gas meter with the given limit.
    pub const fn metered(limit: u64) -> Self {
        Self::Metered { limit, consumed: 0 }
    }

    /// The configured limit; `u64::MAX` for the unlimited meter.
    pub const fn limit(&self) -> u64 {
        match self {
            Self::Infinite { .. } => u64::MAX,
            Self::InfiniteWithLimit { limit, .. } | Self::Metered { limit, .. } => *limit,
        }
    }

    /// Gas consumed so far.
    pub const fn consumed(&self) -> u64 {
        match self {
            Self::Infinite { consumed } |
            Self::InfiniteWithLimit { consumed, .. } |
            Self::Metered { consumed, .. } => *consumed,
        }
    }

    /// Consumes `amount` gas attributed to `descriptor`.
    pub fn consume(&mut self, amount: u64, descriptor: &str) -> AnteResult<()> {
        match self {
            Self::Infinite { consumed } | Self::InfiniteWithLimit { consumed, .. } => {
                *consumed = consumed.saturating_add(amount);
                Ok(())
            }
            Self::Metered { limit, consumed } => {
                let total = consumed.checked_add(amount).ok_or_else(|| {
                    AnteError::OutOfGas(format!("gas overflow: {descriptor}"))
                })?;
                if total > *limit {
                    return Err(AnteError::OutOfGas(format!(
                        "consumed {total} gas, limit {limit}: {descriptor}"
                    )));
                }
                *consumed = total;
                Ok(())
            }
        }
    }
}

/// Computes the intrinsic gas of a transaction: the amount consumed before
/// any execution starts, covering the base cost, calldata bytes, and the
/// access list. Homestead and Istanbul rules apply.
pub fn intrinsic_gas(
    input: &Bytes,
    access_list: Option<&AccessList>,
    is_contract_creation: bool,
) -> AnteResult<u64> {
    let mut gas = if is_contract_creation { TX_GAS_CONTRACT_CREATION } else { TX_GAS };

    if !input.is_empty() {
        let non_zero = input.iter().filter(|byte| **byte != 0).count() as u64;
        let zero = input.len() as u64 - non_zero;

        gas = non_zero
            .checked_mul(TX_DATA_NON_ZERO_GAS)
            .and_then(|data_gas| gas.checked_add(data_gas))
            .ok_or_else(|| AnteError::OutOfGas("intrinsic gas overflow".to_owned()))?;
        gas = zero
            .checked_mul(TX_DATA_ZERO_GAS)
            .and_then(|data_gas| gas.checked_add(data_gas))
            .ok_or_else(|| AnteError::OutOfGas("intrinsic gas overflow".to_owned()))?;
    }

    if let Some(access_list) = access_list {
        let addresses = access_list.len() as u64;
        let storage_keys =
            access_list.iter().map(|item| item.storage_keys.len() as u64).sum::<u64>();
        gas = gas
            .checked_add(addresses.saturating_mul(TX_ACCESS_LIST_ADDRESS_GAS))
            .and_then(|gas| {
                gas.checked_add(storage_keys.saturating_mul(TX_ACCESS_LIST_STORAGE_KEY_GAS))
            })
            .ok_or_else(|| AnteError::OutOfGas("intrinsic gas overflow".to_owned()))?;
    }

    Ok(gas)
}

#[cfg(test)]
mod tests {
    use alloy_eips::eip2930::AccessListItem;
    use alloy_primitives::{Address, B256};

    use super::*;

    #[test]
    fn metered_meter_rejects_past_limit() {
        let mut meter = GasMeter::metered(100);
        meter.consume(60, "first").unwrap();
        meter.consume(40, "second").unwrap();
        assert_eq!(meter.consumed(), 100);

        let err = meter.consume(1, "third").unwrap_err();
        assert!(matches!(err, AnteError::OutOfGas(_)));
    }

    #[test]
    fn infinite_meter_never_errors() {
        let mut meter = GasMeter::infinite_with_limit(0);
        meter.consume(u64::MAX, "everything").unwrap();
        assert_eq!(meter.limit(), 0);
    }

    #[test]
    fn intrinsic_gas_plain_transfer() {
        assert_eq!(intrinsic_gas(&Bytes::new(), None, false).unwrap(), TX_GAS);
        assert_eq!(
            intrinsic_gas(&Bytes::new(), None, true).unwrap(),
            TX_GAS_CONTRACT_CREATION
        );
    }

    #[test]
    fn intrinsic_gas_counts_calldata_bytes() {
        // two non-zero bytes, one zero byte
        let input = Bytes::from(vec![1u8, 0, 2]);
        assert_eq!(
            intrinsic_gas(&input, None, false).unwrap(),
            TX_GAS + 2 * TX_DATA_NON_ZERO_GAS + TX_DATA_ZERO_GAS
        );
    }

    #[test]
    fn intrinsic_gas_counts_access_list() {
        let access_list = AccessList(vec![AccessListItem {
            address: Address::ZERO,
            storage_keys: vec![B256::ZERO, B256::ZERO],
        }]);
        assert_eq!(
            intrinsic_gas(&Bytes::new(), Some(&access_list), false).unwrap(),
            TX_GAS + TX_ACCESS_LIST_ADDRESS_GAS + 2 * TX_ACCESS_LIST_STORAGE_KEY_GAS
        );
    }
}
