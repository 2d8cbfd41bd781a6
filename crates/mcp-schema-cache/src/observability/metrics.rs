//! Prometheus metrics for the schema cache

use std::sync::OnceLock;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::Result;
use crate::error::Error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static START_TIME: OnceLock<Instant> = OnceLock::new();

const METRIC_UPTIME: &str = "schema_cache_uptime_seconds";
const METRIC_INFO: &str = "schema_cache_info";

// Cache metrics
const METRIC_CACHE_HITS: &str = "schema_cache_hits_total";
const METRIC_CACHE_MISSES: &str = "schema_cache_misses_total";
const METRIC_CACHE_EVICTIONS: &str = "schema_cache_evictions_total";
const METRIC_CACHE_EXPIRATIONS: &str = "schema_cache_expirations_total";
const METRIC_CACHE_SIZE: &str = "schema_cache_entries";
const METRIC_STRICT_DENIALS: &str = "schema_cache_strict_denials_total";

// Preload metrics
const METRIC_PRELOAD_TABLES: &str = "schema_cache_preload_tables_total";

/// Initialize Prometheus metrics recorder.
pub fn init_metrics() -> Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Config(format!("Failed to install metrics recorder: {e}")))?;

    PROMETHEUS_HANDLE.set(handle).ok();
    START_TIME.set(Instant::now()).ok();

    register_metrics();
    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

fn register_metrics() {
    describe_gauge!(METRIC_UPTIME, "Process uptime in seconds");
    describe_gauge!(METRIC_INFO, "Build information (always 1)");

    describe_counter!(METRIC_CACHE_HITS, "Total cache hits by tier");
    describe_counter!(METRIC_CACHE_MISSES, "Total cache misses");
    describe_counter!(METRIC_CACHE_EVICTIONS, "Total entries evicted at capacity");
    describe_counter!(METRIC_CACHE_EXPIRATIONS, "Total entries dropped after TTL");
    describe_gauge!(METRIC_CACHE_SIZE, "Current cache size (entries)");
    describe_counter!(
        METRIC_STRICT_DENIALS,
        "Lookups refused because strict mode forbids live queries"
    );

    describe_counter!(METRIC_PRELOAD_TABLES, "Tables preloaded by status");

    gauge!(
        METRIC_INFO,
        "version" => env!("CARGO_PKG_VERSION"),
    )
    .set(1.0);
}

/// Render metrics in Prometheus text format.
#[must_use]
pub fn render_metrics() -> String {
    if let Some(start) = START_TIME.get() {
        gauge!(METRIC_UPTIME).set(start.elapsed().as_secs_f64());
    }

    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record a cache hit on the given tier.
pub fn record_cache_hit(tier: &str) {
    counter!(METRIC_CACHE_HITS, "tier" => tier.to_owned()).increment(1);
}

/// Record a cache miss.
pub fn record_cache_miss() {
    counter!(METRIC_CACHE_MISSES).increment(1);
}

/// Record evicted entries.
pub fn record_cache_eviction(count: u64) {
    counter!(METRIC_CACHE_EVICTIONS).increment(count);
}

pub fn record_cache_expiration() {
    counter!(METRIC_CACHE_EXPIRATIONS).increment(1);
}

/// Update cache size gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_cache_size(size: u64) {
    gauge!(METRIC_CACHE_SIZE).set(size as f64);
}

pub fn record_strict_denial() {
    counter!(METRIC_STRICT_DENIALS).increment(1);
}

/// Record the outcome of one table preload.
pub fn record_preload_table(success: bool) {
    let status = if success { "success" } else { "error" };
    counter!(METRIC_PRELOAD_TABLES, "status" => status.to_owned()).increment(1);
}
