//! Value types shared across the sequencing core.

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an independent nonce space (one chain or network).
///
/// The same signing key may be registered against several chains; each
/// registration tracks its own sequence independently.
pub type ChainId = String;

/// Transaction hash as rendered by the chain client at broadcast time.
pub type TxHash = String;

/// A per-account sequence number (nonce).
///
/// 256 bits wide so chains whose nonce domain is a field element fit without
/// truncation. The sequencing layer only ever compares, orders, and steps
/// these values; it never does machine-word arithmetic on them.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Sequence(U256);

impl Sequence {
    pub const ZERO: Self = Self(U256::ZERO);

    /// The successor value.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(U256::from(1u64)))
    }
}

impl From<u64> for Sequence {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for Sequence {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque identifier for a signing key or a sending account address.
///
/// The key space used for nonce registration and the address space used for
/// ledger bookkeeping are independent; both are 32-byte values and the two
/// may or may not coincide for a given deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(B256);

impl AccountId {
    pub const fn new(raw: B256) -> Self {
        Self(raw)
    }
}

impl From<B256> for AccountId {
    fn from(raw: B256) -> Self {
        Self(raw)
    }
}

impl From<U256> for AccountId {
    fn from(value: U256) -> Self {
        Self(B256::from(value))
    }
}

impl From<u64> for AccountId {
    fn from(value: u64) -> Self {
        Self(B256::from(U256::from(value)))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
