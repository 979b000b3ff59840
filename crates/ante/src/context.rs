//! Per-attempt admission context.
//!
//! A [`Context`] is created once per admission attempt and threaded through
//! the decorator chain. It is logically copy-on-write: decorators that change
//! the gas meter or priority consume the context and return a new value, so
//! earlier decorators never observe later mutations.

use crate::{DecCoin, GasMeter};

/// A single indexable event emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event type.
    pub kind: String,
    /// Ordered key/value attributes.
    pub attributes: Vec<(String, String)>,
}

impl Event {
    /// Creates an event of the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), attributes: Vec::new() }
    }

    /// Appends an attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }
}

/// Mutable per-attempt state threaded through the decorator chain.
#[derive(Debug, Clone)]
pub struct Context {
    block_height: u64,
    chain_id: u64,
    block_gas_limit: u64,
    check_tx: bool,
    re_check_tx: bool,
    min_gas_prices: Vec<DecCoin>,
    gas_meter: GasMeter,
    events: Vec<Event>,
    priority: i64,
}

impl Context {
    /// Creates a DeliverTx-mode context at the given block height.
    pub fn new(block_height: u64) -> Self {
        Self {
            block_height,
            chain_id: 0,
            block_gas_limit: u64::MAX,
            check_tx: false,
            re_check_tx: false,
            min_gas_prices: Vec::new(),
            gas_meter: GasMeter::infinite(),
            events: Vec::new(),
            priority: 0,
        }
    }

    /// Marks the context as CheckTx mode.
    pub fn with_check_tx(mut self, check_tx: bool) -> Self {
        self.check_tx = check_tx;
        self
    }

    /// Marks the context as ReCheckTx mode (implies CheckTx).
    pub fn with_re_check_tx(mut self, re_check_tx: bool) -> Self {
        self.re_check_tx = re_check_tx;
        if re_check_tx {
            self.check_tx = true;
        }
        self
    }

    /// Sets the EVM chain id.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the consensus block gas limit.
    pub fn with_block_gas_limit(mut self, block_gas_limit: u64) -> Self {
        self.block_gas_limit = block_gas_limit;
        self
    }

    /// Sets the validator-local minimum gas prices.
    pub fn with_min_gas_prices(mut self, min_gas_prices: Vec<DecCoin>) -> Self {
        self.min_gas_prices = min_gas_prices;
        self
    }

    /// Replaces the gas meter.
    pub fn with_gas_meter(mut self, gas_meter: GasMeter) -> Self {
        self.gas_meter = gas_meter;
        self
    }

    /// Sets the mempool priority.
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Current block height.
    pub const fn block_height(&self) -> u64 {
        self.block_height
    }

    /// EVM chain id.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Consensus block gas limit.
    pub const fn block_gas_limit(&self) -> u64 {
        self.block_gas_limit
    }

    /// Whether the attempt runs in CheckTx mode (including ReCheckTx).
    pub const fn is_check_tx(&self) -> bool {
        self.check_tx
    }

    /// Whether the attempt is a mempool re-check.
    pub const fn is_re_check_tx(&self) -> bool {
        self.re_check_tx
    }

    /// Validator-local minimum gas prices.
    pub fn min_gas_prices(&self) -> &[DecCoin] {
        &self.min_gas_prices
    }

    /// The gas meter of this attempt.
    pub const fn gas_meter(&self) -> &GasMeter {
        &self.gas_meter
    }

    /// Mutable access to the gas meter.
    pub fn gas_meter_mut(&mut self) -> &mut GasMeter {
        &mut self.gas_meter
    }

    /// Mempool priority assigned to the transaction.
    pub const fn priority(&self) -> i64 {
        self.priority
    }

    /// Emits an event into the sink.
    pub fn emit_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
