//! Prometheus metrics for the sequencing core
//!
//! Counters and gauges are registered against the default registry; the
//! embedding process owns gathering and export.

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge_vec, CounterVec, GaugeVec};

lazy_static! {
    // Ledger metrics
    pub static ref TX_SAVED: CounterVec = register_counter_vec!(
        "relayer_txm_saved_total",
        "Broadcast transactions recorded per sending account",
        &["account"]
    ).unwrap();

    pub static ref TX_CONFIRMED: CounterVec = register_counter_vec!(
        "relayer_txm_confirmed_total",
        "Confirmed transactions per sending account",
        &["account"]
    ).unwrap();

    pub static ref TX_INFLIGHT: GaugeVec = register_gauge_vec!(
        "relayer_txm_inflight",
        "Outstanding unconfirmed transactions per sending account",
        &["account"]
    ).unwrap();

    // Nonce manager metrics
    pub static ref SEQUENCES_ADVANCED: CounterVec = register_counter_vec!(
        "relayer_txm_sequences_advanced_total",
        "Sequence numbers consumed per chain",
        &["chain"]
    ).unwrap();
}

// Helper functions to record metrics

pub fn record_tx_saved(account: &str) {
    TX_SAVED.with_label_values(&[account]).inc();
}

pub fn record_tx_confirmed(account: &str) {
    TX_CONFIRMED.with_label_values(&[account]).inc();
}

pub fn record_inflight(account: &str, count: usize) {
    TX_INFLIGHT.with_label_values(&[account]).set(count as f64);
}

pub fn record_sequence_advanced(chain: &str) {
    SEQUENCES_ADVANCED.with_label_values(&[chain]).inc();
}
