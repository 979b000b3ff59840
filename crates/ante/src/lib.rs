//! Transaction-admission pipeline (ante handler chain) for an EVM-compatible
//! Cosmos-style chain.
//!
//! Before a transaction is allowed into the mempool, re-checked, or included
//! in a block, it runs through a fixed, ordered sequence of decorators that
//! decide whether it is well-formed, authorized, priced correctly, and
//! affordable, without executing its business logic. Two lanes exist: one for
//! envelopes wrapping a single Ethereum transaction, one for everything else.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod context;
pub use context::*;

mod cosmos;
pub use cosmos::*;

mod eth;
pub use eth::*;

mod fee_checker;
pub use fee_checker::*;

mod fees;
pub use fees::*;

mod gas;
pub use gas::*;

mod handler;
pub use handler::*;

mod interfaces;
pub use interfaces::*;

mod result;
pub use result::*;

mod setup_ctx;
pub use setup_ctx::*;

mod tx;
pub use tx::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

mod types;
pub use types::*;
