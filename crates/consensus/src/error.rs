//! Consensus error type.

use authseal_core::{Address, CryptoError};
use thiserror::Error;

/// Errors that can occur during consensus operations.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("unauthorized authority: {0:?}")]
    UnauthorizedAuthority(Address),

    #[error("invalid block signature")]
    InvalidSignature,

    #[error("failed to sign header: {0}")]
    SigningFailure(#[from] CryptoError),

    #[error("not authority's turn (expected {expected:?}, got {got:?})")]
    NotTurn { expected: Address, got: Address },

    #[error("block timestamp is too far in the future")]
    TimestampTooFuture,

    #[error("block timestamp is earlier than parent")]
    TimestampTooEarly,

    #[error("no authorities configured")]
    NoAuthorities,
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
