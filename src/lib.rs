//! Transaction sequencing core for multi-chain relayers
//!
//! Issues and tracks per-account sequence numbers (nonces) for outbound
//! signed transactions on chains that enforce gapless nonce ordering, and
//! reconciles those transactions from broadcast to confirmed:
//!
//! - [`NonceManager`]: the next sequence number per (signing key, chain)
//!   pair, bootstrapped once from on-chain state via an injected
//!   [`NonceQuerier`]
//! - [`TxLedger`]: outstanding (nonce, tx hash) pairs for one sending
//!   account, with gap-aware tracking of the lowest unused nonce
//! - [`LedgerRegistry`]: per-chain fan-out of ledgers by sending address
//!
//! Pure in-memory bookkeeping: signing, submission, and confirmation
//! watching stay with the embedding relayer process, which re-bootstraps
//! nonces from the chain after a restart.

pub mod chain;
pub mod error;
pub mod metrics;
pub mod tx;
pub mod types;

pub use chain::NonceQuerier;
pub use error::{TxmError, TxmResult};
pub use tx::{LedgerRegistry, NonceManager, TxLedger};
pub use types::{AccountId, ChainId, Sequence, TxHash};
