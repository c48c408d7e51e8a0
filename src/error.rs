//! Error types for the sequencing core

use crate::types::{AccountId, Sequence};
use thiserror::Error;

/// Main error type for nonce sequencing and transaction bookkeeping
#[derive(Error, Debug)]
pub enum TxmError {
    #[error("nonce tracking does not exist for key: {key}")]
    KeyNotRegistered { key: AccountId },

    #[error("nonce does not exist for key: {key} and chain: {chain}")]
    ChainNotRegistered { key: AccountId, chain: String },

    #[error("mismatched nonce for {key}: {expected} (expected) != {got} (got)")]
    NonceMismatch {
        key: AccountId,
        expected: Sequence,
        got: Sequence,
    },

    #[error("nonce too low: {nonce} < {lowest} (lowest)")]
    NonceTooLow { nonce: Sequence, lowest: Sequence },

    #[error("nonce used: tried to use nonce ({nonce}) for tx ({hash}), already used by ({existing})")]
    NonceUsed {
        nonce: Sequence,
        hash: String,
        existing: String,
    },

    #[error("hash used: tried to use tx ({hash}) for nonce ({nonce}), already used nonce ({existing})")]
    HashUsed {
        hash: String,
        nonce: Sequence,
        existing: Sequence,
    },

    #[error("tx hash does not exist - it may already be confirmed: {hash}")]
    HashNotFound { hash: String },

    #[error("from address does not exist: {address}")]
    AddressNotFound { address: AccountId },

    #[error("account nonce query failed for {address}: {message}")]
    ChainQuery { address: AccountId, message: String },

    #[error("nonce manager has not been started")]
    NotStarted,

    #[error("nonce manager has already been started")]
    AlreadyStarted,
}

/// Result type for sequencing operations
pub type TxmResult<T> = Result<T, TxmError>;
