//! Chain-facing capability consumed during account registration.

use crate::types::{AccountId, Sequence};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Error produced by the chain client backing a [`NonceQuerier`].
pub type QueryError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Read capability over a chain's account state.
///
/// Implemented by the embedding process on top of its RPC client. Invoked
/// exactly once per account registration to bootstrap the local sequence;
/// the sequencing layer never polls the chain afterward.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NonceQuerier: Send + Sync {
    /// Current on-chain nonce for `account`.
    async fn account_nonce(&self, account: AccountId) -> Result<Sequence, QueryError>;
}
