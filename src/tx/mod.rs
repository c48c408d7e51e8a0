//! Transaction sequencing: nonce issuance and in-flight bookkeeping

mod nonce;
mod store;

pub use nonce::NonceManager;
pub use store::{LedgerRegistry, TxLedger};
