//! Error taxonomy produced by the admission pipeline.
//!
//! Every decorator returns its error immediately and the chain composer
//! forwards it unchanged to the caller; there are no retries inside this
//! layer. Messages name the offending values so clients can correct and
//! resubmit.

/// Result alias for fallible admission operations.
pub type AnteResult<T> = Result<T, AnteError>;

/// Errors produced by the transaction-admission pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnteError {
    /// Wrong transaction or message shape for the selected lane.
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// Envelope-shape violation or otherwise malformed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed or empty address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Account not found in state.
    #[error("unknown address: {0}")]
    UnknownAddress(String),

    /// Transaction nonce does not match the account sequence.
    #[error("invalid nonce; got {got}, expected {expected}")]
    InvalidSequence {
        /// Nonce carried by the transaction.
        got: u64,
        /// Current account sequence.
        expected: u64,
    },

    /// Missing authorization (vesting proof, restricted authz message).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Fee-market rejection: fee or gas price below a required threshold.
    #[error("insufficient fee: {0}")]
    InsufficientFee(String),

    /// Balance or transfer-capability failure.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Gas limit exceeded, intrinsic or block-level.
    #[error("out of gas: {0}")]
    OutOfGas(String),

    /// Malformed fee coins.
    #[error("invalid coins: {0}")]
    InvalidCoins(String),

    /// Message kind not supported in the requested position (nested or
    /// granted through authz).
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Contract creation is disabled through governance.
    #[error("failed to create new contract: EVM Create operation is disabled")]
    CreateDisabled,

    /// Contract calls are disabled through governance.
    #[error("failed to call contract: EVM Call operation is disabled")]
    CallDisabled,

    /// Handler configuration error, surfaced at chain-construction time.
    #[error("logic error: {0}")]
    Logic(String),
}
