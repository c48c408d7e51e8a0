//! Bookkeeping for broadcast, not-yet-confirmed transactions
//!
//! Tracks which nonces of a sending account have an outstanding transaction
//! and maintains the lowest nonce not yet known to be used, so callers can
//! detect gaps and drive resubmission decisions.

use crate::error::{TxmError, TxmResult};
use crate::metrics;
use crate::types::{AccountId, Sequence, TxHash};

use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Mutable ledger state. All three fields are guarded by one lock and
/// mutated as a unit: the two maps stay inverse of one another, and
/// `current_nonce` is the smallest sequence with no recorded entry.
struct LedgerInner {
    nonce_to_hash: BTreeMap<Sequence, TxHash>,
    hash_to_nonce: HashMap<TxHash, Sequence>,
    current_nonce: Sequence,
}

/// Outstanding (nonce, tx hash) pairs for one sending account.
pub struct TxLedger {
    inner: RwLock<LedgerInner>,
}

impl TxLedger {
    /// Create a ledger with its lower bound seeded at `current`.
    pub fn new(current: Sequence) -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                nonce_to_hash: BTreeMap::new(),
                hash_to_nonce: HashMap::new(),
                current_nonce: current,
            }),
        }
    }

    /// Record a broadcast transaction.
    ///
    /// Rejects nonces below the current lower bound and any reuse of a nonce
    /// or hash already held by a different entry. Out-of-order saves are
    /// accepted; once a save closes the gap at the lower bound,
    /// `current_nonce` fast-forwards through the contiguous run.
    pub async fn save(&self, nonce: Sequence, hash: &str) -> TxmResult<()> {
        let mut inner = self.inner.write().await;

        if nonce < inner.current_nonce {
            return Err(TxmError::NonceTooLow {
                nonce,
                lowest: inner.current_nonce,
            });
        }
        if let Some(existing) = inner.nonce_to_hash.get(&nonce) {
            return Err(TxmError::NonceUsed {
                nonce,
                hash: hash.to_string(),
                existing: existing.clone(),
            });
        }
        if let Some(&existing) = inner.hash_to_nonce.get(hash) {
            return Err(TxmError::HashUsed {
                hash: hash.to_string(),
                nonce,
                existing,
            });
        }

        inner.nonce_to_hash.insert(nonce, hash.to_string());
        inner.hash_to_nonce.insert(hash.to_string(), nonce);

        // advance the lower bound to the first unused nonce
        let mut lowest = inner.current_nonce;
        while inner.nonce_to_hash.contains_key(&lowest) {
            lowest = lowest.next();
        }
        inner.current_nonce = lowest;

        debug!(
            "saved tx {} at nonce {}, lowest unused nonce now {}",
            hash, nonce, inner.current_nonce
        );
        Ok(())
    }

    /// Remove the entry for a confirmed transaction.
    ///
    /// Confirming a hash with no outstanding entry is an error, not a no-op:
    /// it usually means the hash was already confirmed or never saved.
    pub async fn confirm(&self, hash: &str) -> TxmResult<()> {
        let mut inner = self.inner.write().await;

        let Some(nonce) = inner.hash_to_nonce.remove(hash) else {
            return Err(TxmError::HashNotFound {
                hash: hash.to_string(),
            });
        };
        inner.nonce_to_hash.remove(&nonce);

        debug!("confirmed tx {} at nonce {}", hash, nonce);
        Ok(())
    }

    /// Snapshot of all outstanding hashes, in no particular order.
    pub async fn get_unconfirmed(&self) -> Vec<TxHash> {
        self.inner.read().await.nonce_to_hash.values().cloned().collect()
    }

    /// Number of outstanding entries.
    pub async fn inflight_count(&self) -> usize {
        self.inner.read().await.nonce_to_hash.len()
    }

    /// The smallest nonce with no recorded entry.
    pub async fn current_nonce(&self) -> Sequence {
        self.inner.read().await.current_nonce
    }
}

/// Routes ledger operations for one chain by sending address.
///
/// A ledger is created lazily on the first save for an address, seeded with
/// that save's nonce as its baseline. Creation happens at most once per
/// address; later saves never re-seed the baseline.
pub struct LedgerRegistry {
    ledgers: DashMap<AccountId, Arc<TxLedger>>,
}

impl LedgerRegistry {
    pub fn new() -> Self {
        Self {
            ledgers: DashMap::new(),
        }
    }

    /// Record a broadcast transaction for `from`, creating its ledger on
    /// first use. The first save for a fresh address must carry that
    /// address's true starting nonce.
    pub async fn save(&self, from: AccountId, nonce: Sequence, hash: &str) -> TxmResult<()> {
        let ledger = self
            .ledgers
            .entry(from)
            .or_insert_with(|| Arc::new(TxLedger::new(nonce)))
            .clone();

        ledger.save(nonce, hash).await?;

        let account = from.to_string();
        metrics::record_tx_saved(&account);
        metrics::record_inflight(&account, ledger.inflight_count().await);
        Ok(())
    }

    /// Confirm a transaction previously saved for `from`.
    pub async fn confirm(&self, from: AccountId, hash: &str) -> TxmResult<()> {
        let ledger = self
            .ledgers
            .get(&from)
            .map(|entry| entry.value().clone())
            .ok_or(TxmError::AddressNotFound { address: from })?;

        ledger.confirm(hash).await?;

        let account = from.to_string();
        metrics::record_tx_confirmed(&account);
        metrics::record_inflight(&account, ledger.inflight_count().await);
        Ok(())
    }

    /// Outstanding entry counts for every known address.
    pub async fn all_inflight_counts(&self) -> HashMap<AccountId, usize> {
        let ledgers: Vec<(AccountId, Arc<TxLedger>)> = self
            .ledgers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut counts = HashMap::with_capacity(ledgers.len());
        for (address, ledger) in ledgers {
            counts.insert(address, ledger.inflight_count().await);
        }
        counts
    }

    /// Outstanding hashes for every known address.
    pub async fn all_unconfirmed(&self) -> HashMap<AccountId, Vec<TxHash>> {
        let ledgers: Vec<(AccountId, Arc<TxLedger>)> = self
            .ledgers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut unconfirmed = HashMap::with_capacity(ledgers.len());
        for (address, ledger) in ledgers {
            unconfirmed.insert(address, ledger.get_unconfirmed().await);
        }
        unconfirmed
    }
}

impl Default for LedgerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
