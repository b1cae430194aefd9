// Metrics and observability module
// This file handles collection of quoting, retry and split-search metrics
// for the router. Emission is fire-and-forget.
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, register_int_counter,
    register_int_counter_vec, CounterVec, Histogram, HistogramVec, IntCounter, IntCounterVec,
};

pub static REQ_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "router_request_latency_seconds",
        "latency for upstream calls",
        &["service", "method"]
    )
    .unwrap()
});

pub static REQ_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "router_request_errors_total",
        "errors by upstream",
        &["service", "method"]
    )
    .unwrap()
});

/// Chunk failures seen while quoting, by error kind.
pub static QUOTE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "router_quote_chunk_errors_total",
        "quote chunk failures by error kind",
        &["kind"]
    )
    .unwrap()
});

/// First retry of a request caused by a given error kind.
pub static QUOTE_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "router_quote_retries_total",
        "requests that retried because of an error kind",
        &["kind"]
    )
    .unwrap()
});

pub static QUOTE_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "router_quote_latency_seconds",
        "end-to-end latency of a batched quote request"
    )
    .unwrap()
});

pub static QUOTE_APPROX_GAS_PER_CALL: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "router_quote_approx_gas_per_successful_call",
        "approximate gas used per successful quoter call",
        vec![25_000.0, 50_000.0, 100_000.0, 200_000.0, 400_000.0, 800_000.0, 1_600_000.0]
    )
    .unwrap()
});

/// Frontier sizes per split-count layer.
pub static SPLIT_LAYER_SIZE: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "router_split_layer_candidates",
        "partial combinations explored per split count",
        &["splits"],
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1_000.0, 5_000.0]
    )
    .unwrap()
});

pub static SELECTION_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "router_selection_latency_seconds",
        "time spent searching split combinations"
    )
    .unwrap()
});

/// The best combination started from a second-best seed.
pub static SECOND_SEED_WINS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "router_best_swap_from_second_seed_total",
        "best swaps found from a second-best percent seed"
    )
    .unwrap()
});
