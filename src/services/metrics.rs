//! Prometheus counters, exported by `GET /metrics`

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    pub static ref PROVIDER_FETCH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "provider_fetch_total",
        "Provider adapter calls by outcome",
        &["provider", "outcome"]
    )
    .unwrap();

    pub static ref RESOLVE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "resolve_total",
        "Link resolutions by outcome",
        &["outcome"]
    )
    .unwrap();

    pub static ref MIRROR_PROBE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "mirror_probe_total",
        "Mirror probes by outcome",
        &["provider", "outcome"]
    )
    .unwrap();
}

pub fn record_provider(provider: &str, outcome: &str) {
    PROVIDER_FETCH_TOTAL.with_label_values(&[provider, outcome]).inc();
}

pub fn record_resolve(found: bool) {
    let outcome = if found { "found" } else { "not_found" };
    RESOLVE_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_probe(provider: &str, reachable: bool) {
    let outcome = if reachable { "reachable" } else { "unreachable" };
    MIRROR_PROBE_TOTAL.with_label_values(&[provider, outcome]).inc();
}
