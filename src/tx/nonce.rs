//! Nonce issuance for signed transaction submission
//!
//! Tracks the next sequence number to use per (signing key, chain) pair.
//! Each pair is bootstrapped once from on-chain state at registration;
//! afterward sequences are served and validated from memory only.

use crate::chain::NonceQuerier;
use crate::error::{TxmError, TxmResult};
use crate::metrics;
use crate::types::{AccountId, ChainId, Sequence};

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, info};

const CREATED: u8 = 0;
const STARTED: u8 = 1;
const CLOSED: u8 = 2;

/// Authoritative source of the next sequence number per (key, chain) pair.
///
/// Advancing a pair requires the caller to present exactly the value that
/// was last handed out; concurrent increments with the same value resolve
/// so that exactly one succeeds and the rest observe a mismatch. A failing
/// call never changes the stored value.
pub struct NonceManager {
    /// key -> chain -> next sequence to use
    accounts: DashMap<AccountId, HashMap<ChainId, Sequence>>,
    /// Lifecycle state; operations outside start..close fail
    state: AtomicU8,
}

impl NonceManager {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            state: AtomicU8::new(CREATED),
        }
    }

    /// Begin serving operations. Single-use: a closed manager cannot be
    /// restarted.
    pub fn start(&self) -> TxmResult<()> {
        self.state
            .compare_exchange(CREATED, STARTED, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| TxmError::AlreadyStarted)?;
        info!("nonce manager started");
        Ok(())
    }

    /// Stop serving operations.
    pub fn close(&self) -> TxmResult<()> {
        self.state
            .compare_exchange(STARTED, CLOSED, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| TxmError::NotStarted)?;
        info!("nonce manager closed");
        Ok(())
    }

    /// Health probe: `Ok` while the manager is started.
    pub fn ready(&self) -> TxmResult<()> {
        self.ensure_started()
    }

    /// Track `key` on `chain`, bootstrapping the next sequence from the
    /// account's current on-chain nonce.
    ///
    /// The query is performed once, with no internal retry; a failure is
    /// wrapped and returned. Re-registering the same pair overwrites the
    /// stored sequence (last write wins), which deliberately resets local
    /// tracking to chain state.
    pub async fn register(
        &self,
        key: AccountId,
        account: AccountId,
        chain: &str,
        client: &dyn NonceQuerier,
    ) -> TxmResult<()> {
        self.ensure_started()?;

        let nonce = client
            .account_nonce(account)
            .await
            .map_err(|e| TxmError::ChainQuery {
                address: account,
                message: e.to_string(),
            })?;

        self.accounts
            .entry(key)
            .or_default()
            .insert(chain.to_string(), nonce);

        debug!("registered key {} on chain {}: next sequence {}", key, chain, nonce);
        Ok(())
    }

    /// The next sequence number to use for `(key, chain)`. Does not mutate.
    pub fn next_sequence(&self, key: AccountId, chain: &str) -> TxmResult<Sequence> {
        self.ensure_started()?;

        let chains = self
            .accounts
            .get(&key)
            .ok_or(TxmError::KeyNotRegistered { key })?;

        chains
            .get(chain)
            .copied()
            .ok_or_else(|| TxmError::ChainNotRegistered {
                key,
                chain: chain.to_string(),
            })
    }

    /// Advance `(key, chain)` past `used`.
    ///
    /// Succeeds only if `used` equals the stored next sequence; the stored
    /// value then becomes `used + 1`. A mismatch reports expected vs got and
    /// leaves the stored value unchanged — the manager never auto-corrects.
    pub fn increment_next_sequence(
        &self,
        key: AccountId,
        chain: &str,
        used: Sequence,
    ) -> TxmResult<()> {
        self.ensure_started()?;

        let mut chains = self
            .accounts
            .get_mut(&key)
            .ok_or(TxmError::KeyNotRegistered { key })?;

        let Some(seq) = chains.get_mut(chain) else {
            return Err(TxmError::ChainNotRegistered {
                key,
                chain: chain.to_string(),
            });
        };

        if *seq != used {
            return Err(TxmError::NonceMismatch {
                key,
                expected: *seq,
                got: used,
            });
        }

        *seq = used.next();
        let advanced = *seq;
        drop(chains);

        metrics::record_sequence_advanced(chain);
        debug!("advanced key {} on chain {} to next sequence {}", key, chain, advanced);
        Ok(())
    }

    fn ensure_started(&self) -> TxmResult<()> {
        if self.state.load(Ordering::SeqCst) == STARTED {
            Ok(())
        } else {
            Err(TxmError::NotStarted)
        }
    }
}

impl Default for NonceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockNonceQuerier;
    use std::sync::Arc;

    const CHAIN: &str = "testchain";

    fn key() -> AccountId {
        AccountId::from(0u64)
    }

    fn client_returning(nonce: Sequence) -> MockNonceQuerier {
        let mut client = MockNonceQuerier::new();
        client
            .expect_account_nonce()
            .times(1)
            .returning(move |_| Ok(nonce));
        client
    }

    async fn started_manager(init: Sequence) -> NonceManager {
        let nm = NonceManager::new();
        nm.start().unwrap();
        nm.register(key(), key(), CHAIN, &client_returning(init))
            .await
            .unwrap();
        nm
    }

    #[tokio::test]
    async fn next_sequence_serves_the_registered_value() {
        let init = Sequence::from(10);
        let nm = started_manager(init).await;

        // proper inputs
        assert_eq!(init, nm.next_sequence(key(), CHAIN).unwrap());

        // registered key, unknown chain
        let err = nm.next_sequence(key(), "invalid_chain").unwrap_err();
        assert!(err
            .to_string()
            .contains("nonce does not exist for key:"));
        assert!(err.to_string().contains("invalid_chain"));

        // unknown key entirely
        let stranger = AccountId::from(1u64);
        let err = nm.next_sequence(stranger, CHAIN).unwrap_err();
        assert!(err
            .to_string()
            .contains("nonce tracking does not exist for key:"));
    }

    #[tokio::test]
    async fn increment_requires_the_exact_expected_value() {
        let init = Sequence::from(10);
        let nm = started_manager(init).await;

        // a lower value is a mismatch
        let err = nm
            .increment_next_sequence(key(), CHAIN, Sequence::from(9))
            .unwrap_err();
        assert_eq!(
            format!(
                "mismatched nonce for {}: {} (expected) != {} (got)",
                key(),
                init,
                Sequence::from(9)
            ),
            err.to_string()
        );

        // the expected value advances the pair
        nm.increment_next_sequence(key(), CHAIN, init).unwrap();
        assert_eq!(init.next(), nm.next_sequence(key(), CHAIN).unwrap());

        // unknown chain and unknown key do not advance anything
        let err = nm
            .increment_next_sequence(key(), "invalid_chain", init.next())
            .unwrap_err();
        assert!(matches!(err, TxmError::ChainNotRegistered { .. }));

        let stranger = AccountId::from(1u64);
        let err = nm
            .increment_next_sequence(stranger, CHAIN, init.next())
            .unwrap_err();
        assert!(matches!(err, TxmError::KeyNotRegistered { .. }));

        // erroring calls left the stored value untouched
        assert_eq!(init.next(), nm.next_sequence(key(), CHAIN).unwrap());
    }

    #[tokio::test]
    async fn lifecycle_gates_every_operation() {
        let nm = NonceManager::new();

        // nothing works before start
        assert!(matches!(
            nm.next_sequence(key(), CHAIN).unwrap_err(),
            TxmError::NotStarted
        ));
        let untouched = MockNonceQuerier::new();
        assert!(matches!(
            nm.register(key(), key(), CHAIN, &untouched).await.unwrap_err(),
            TxmError::NotStarted
        ));
        assert!(nm.ready().is_err());

        nm.start().unwrap();
        nm.ready().unwrap();

        // single-use lifecycle
        assert!(matches!(nm.start().unwrap_err(), TxmError::AlreadyStarted));

        nm.close().unwrap();
        assert!(matches!(
            nm.next_sequence(key(), CHAIN).unwrap_err(),
            TxmError::NotStarted
        ));
        assert!(matches!(nm.close().unwrap_err(), TxmError::NotStarted));
    }

    #[tokio::test]
    async fn register_propagates_query_failure() {
        let nm = NonceManager::new();
        nm.start().unwrap();

        let mut client = MockNonceQuerier::new();
        client
            .expect_account_nonce()
            .times(1)
            .returning(|_| Err("account unavailable".into()));

        let err = nm.register(key(), key(), CHAIN, &client).await.unwrap_err();
        assert!(matches!(err, TxmError::ChainQuery { .. }));
        assert!(err.to_string().contains("account unavailable"));

        // the failed registration stored nothing
        assert!(matches!(
            nm.next_sequence(key(), CHAIN).unwrap_err(),
            TxmError::KeyNotRegistered { .. }
        ));
    }

    #[tokio::test]
    async fn reregistration_resets_to_chain_state() {
        let nm = started_manager(Sequence::from(10)).await;
        nm.increment_next_sequence(key(), CHAIN, Sequence::from(10))
            .unwrap();
        assert_eq!(Sequence::from(11), nm.next_sequence(key(), CHAIN).unwrap());

        nm.register(key(), key(), CHAIN, &client_returning(Sequence::from(3)))
            .await
            .unwrap();
        assert_eq!(Sequence::from(3), nm.next_sequence(key(), CHAIN).unwrap());
    }

    #[tokio::test]
    async fn chains_are_independent_sequence_spaces() {
        let nm = NonceManager::new();
        nm.start().unwrap();
        nm.register(key(), key(), "c1", &client_returning(Sequence::from(10)))
            .await
            .unwrap();
        nm.register(key(), key(), "c2", &client_returning(Sequence::from(20)))
            .await
            .unwrap();

        nm.increment_next_sequence(key(), "c1", Sequence::from(10))
            .unwrap();

        assert_eq!(Sequence::from(11), nm.next_sequence(key(), "c1").unwrap());
        assert_eq!(Sequence::from(20), nm.next_sequence(key(), "c2").unwrap());
    }

    #[tokio::test]
    async fn issue_and_advance_end_to_end() {
        let nm = started_manager(Sequence::from(10)).await;

        assert_eq!(Sequence::from(10), nm.next_sequence(key(), "testchain").unwrap());
        nm.increment_next_sequence(key(), "testchain", Sequence::from(10))
            .unwrap();
        assert_eq!(Sequence::from(11), nm.next_sequence(key(), "testchain").unwrap());

        let err = nm
            .increment_next_sequence(key(), "testchain", Sequence::from(9))
            .unwrap_err();
        match err {
            TxmError::NonceMismatch { expected, got, .. } => {
                assert_eq!(Sequence::from(11), expected);
                assert_eq!(Sequence::from(9), got);
            }
            other => panic!("expected a mismatch, got: {}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_increments_admit_exactly_one() {
        let init = Sequence::from(10);
        let nm = Arc::new(started_manager(init).await);

        let first = {
            let nm = nm.clone();
            tokio::spawn(async move { nm.increment_next_sequence(key(), CHAIN, init) })
        };
        let second = {
            let nm = nm.clone();
            tokio::spawn(async move { nm.increment_next_sequence(key(), CHAIN, init) })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        assert_eq!(1, results.iter().filter(|r| r.is_ok()).count());
        assert_eq!(init.next(), nm.next_sequence(key(), CHAIN).unwrap());
    }
}
