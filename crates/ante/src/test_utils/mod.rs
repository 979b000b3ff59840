//! Test utilities for the admission pipeline.

mod keepers;
mod tx;

pub use keepers::*;
pub use tx::*;
