//! Prometheus metrics for the oracle deviation monitor.
//!
//! Covers:
//! - Tick ingestion (accepted, dropped, out-of-order)
//! - Oracle quote availability
//! - CDE value and alert state
//! - Static band edges and adaptive volatility factor
//! - Trigger emission and published oracle selection
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. Registration only fails
//! on duplicate metric names, which is a programming error that should crash
//! on first use rather than silently drop metrics.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge, Encoder, Gauge, GaugeVec, Histogram, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

/// Ticks appended to the buffer.
pub static TICKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("odm_ticks_total", "Total ticks appended to the tick buffer").unwrap()
});

/// Ticks dropped before reaching the buffer.
/// Labels: reason (parse/missing_field/invalid_data/json)
pub static TICKS_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "odm_ticks_dropped_total",
        "Total malformed ticks dropped",
        &["reason"]
    )
    .unwrap()
});

/// Ticks whose timestamp regressed.
pub static TICKS_OUT_OF_ORDER_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "odm_ticks_out_of_order_total",
        "Total ticks stored with a timestamp earlier than the previous tick"
    )
    .unwrap()
});

/// Oracle quote updates.
/// Labels: status (available/unavailable)
pub static QUOTES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "odm_quotes_total",
        "Total oracle quote updates by availability",
        &["status"]
    )
    .unwrap()
});

/// Points currently held by the tick buffer.
pub static BUFFER_LEN: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("odm_buffer_len", "Points currently held in the tick buffer").unwrap()
});

/// Cumulative deviation exposure (price-units x seconds).
pub static CDE_PE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("odm_cde_pe", "Cumulative deviation exposure over the buffer (PE)").unwrap()
});

/// CDE alert state (1 = above cde_threshold).
pub static CDE_ALERT_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "odm_cde_alert_active",
        "Whether CDE is above the configured alert bound (1=above)"
    )
    .unwrap()
});

/// Static band edges.
/// Labels: edge (upper/lower)
pub static STATIC_BAND: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "odm_static_band",
        "Static threshold band around the latest oracle price",
        &["edge"]
    )
    .unwrap()
});

/// Adaptive volatility factor at the latest point.
pub static ADAPTIVE_FACTOR: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "odm_adaptive_factor",
        "Adaptive band half-width at the latest point (fraction)"
    )
    .unwrap()
});

/// Static deviation triggers emitted.
pub static TRIGGERS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("odm_triggers_total", "Total static deviation triggers").unwrap()
});

/// Published oracle value.
pub static PUBLISHED_ORACLE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("odm_published_oracle", "Currently published oracle value").unwrap()
});

/// Source of the published oracle value (1=active).
/// Labels: source (reference/external)
pub static ORACLE_SOURCE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "odm_oracle_source",
        "Source of the published oracle value (1=active, 0=inactive)",
        &["source"]
    )
    .unwrap()
});

/// Changes of the published oracle source.
pub static ORACLE_SOURCE_FLIPS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "odm_oracle_source_flips_total",
        "Total changes of the published oracle source"
    )
    .unwrap()
});

/// Relative quote/tick deviation observed per tick.
pub static TICK_DEVIATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "odm_tick_deviation_ratio",
        "Relative deviation between external quote and tick price",
        vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.02, 0.05, 0.1]
    )
    .unwrap()
});

/// Per-tick recompute time in microseconds.
pub static RECOMPUTE_US: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "odm_recompute_duration_us",
        "Per-tick recompute duration in microseconds",
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a tick appended to the buffer.
    pub fn tick_ingested(buffer_len: usize) {
        TICKS_TOTAL.inc();
        BUFFER_LEN.set(buffer_len as i64);
    }

    /// Record a dropped malformed tick.
    pub fn tick_dropped(reason: &str) {
        TICKS_DROPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a tick stored with a regressing timestamp.
    pub fn tick_out_of_order() {
        TICKS_OUT_OF_ORDER_TOTAL.inc();
    }

    /// Record an oracle quote update.
    pub fn quote_update(available: bool) {
        let status = if available { "available" } else { "unavailable" };
        QUOTES_TOTAL.with_label_values(&[status]).inc();
    }

    /// Record the recomputed CDE.
    pub fn cde(value: f64) {
        CDE_PE.set(value);
    }

    /// Record CDE alert state.
    pub fn cde_alert(active: bool) {
        CDE_ALERT_ACTIVE.set(i64::from(active));
    }

    /// Record static band edges.
    pub fn static_band(upper: f64, lower: f64) {
        STATIC_BAND.with_label_values(&["upper"]).set(upper);
        STATIC_BAND.with_label_values(&["lower"]).set(lower);
    }

    /// Record the adaptive factor at the latest point.
    pub fn adaptive_factor(factor: f64) {
        ADAPTIVE_FACTOR.set(factor);
    }

    /// Record an emitted trigger.
    pub fn trigger() {
        TRIGGERS_TOTAL.inc();
    }

    /// Record the quote/tick deviation of one tick.
    pub fn tick_deviation(ratio: f64) {
        TICK_DEVIATION.observe(ratio);
    }

    /// Record the published oracle value and its source.
    /// Only the active source is set to 1.
    pub fn published_oracle(value: f64, source: &str) {
        PUBLISHED_ORACLE.set(value);
        for s in &["reference", "external"] {
            ORACLE_SOURCE.with_label_values(&[s]).set(0.0);
        }
        ORACLE_SOURCE.with_label_values(&[source]).set(1.0);
    }

    /// Record a change of the published oracle source.
    pub fn oracle_source_flip() {
        ORACLE_SOURCE_FLIPS.inc();
    }

    /// Record recompute duration.
    pub fn recompute_duration_us(us: f64) {
        RECOMPUTE_US.observe(us);
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let families = prometheus::gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_metrics_recorded() {
        let before = TICKS_TOTAL.get();
        Metrics::tick_ingested(3);
        assert_eq!(TICKS_TOTAL.get(), before + 1);
        assert_eq!(BUFFER_LEN.get(), 3);

        Metrics::tick_dropped("json");
        assert!(TICKS_DROPPED_TOTAL.with_label_values(&["json"]).get() >= 1);
    }

    #[test]
    fn test_oracle_source_one_hot() {
        Metrics::published_oracle(101.0, "reference");
        assert_eq!(ORACLE_SOURCE.with_label_values(&["reference"]).get(), 1.0);
        assert_eq!(ORACLE_SOURCE.with_label_values(&["external"]).get(), 0.0);
        assert_eq!(PUBLISHED_ORACLE.get(), 101.0);
    }

    #[test]
    fn test_gather_text_contains_registered_metrics() {
        Metrics::cde(12.5);
        Metrics::static_band(100.5, 99.5);

        let text = Metrics::gather_text().unwrap();
        assert!(text.contains("odm_cde_pe"));
        assert!(text.contains("odm_static_band"));
    }
}
