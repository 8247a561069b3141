//! Per-tick deviation pipeline.
//!
//! Every accepted tick runs, to completion and in this order:
//! 1. append to the tick buffer (oldest evicted past capacity)
//! 2. CDE scalar and series over the buffer
//! 3. static band and adaptive band series
//! 4. static deviation trigger against the live quote
//! 5. adaptive oracle selection at the latest index
//! 6. CDE alert state
//!
//! All derived values are recomputed from the buffer contents on each tick.

use crate::error::AppResult;
use odm_core::{InboundTick, OracleQuote, PricePoint, ThresholdBand, TriggerPoint};
use odm_detector::{
    adaptive_bands, check_static_trigger, compute_cde, compute_cde_series, static_band,
    AdaptiveOracleSelector, DetectorConfig, DetectorError, OracleSource, SelectorDecision,
    TriggerLog,
};
use odm_feed::{QuoteState, TickBuffer};
use odm_telemetry::Metrics;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Serializable view of every computed output.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub points: Vec<PricePoint>,
    /// CDE over the buffer (PE).
    pub cde: f64,
    pub cde_series: Vec<f64>,
    pub static_band: ThresholdBand,
    pub adaptive_bands: Vec<ThresholdBand>,
    pub triggers: Vec<TriggerPoint>,
    pub published_oracle: Option<f64>,
    pub oracle_source: Option<OracleSource>,
    pub live_quote: Option<f64>,
    /// Age of the live quote at the latest tick (ms).
    pub quote_age_ms: Option<i64>,
    pub quote_unavailable_count: u64,
    pub cde_alert_active: bool,
    pub ticks_ingested: u64,
    pub out_of_order_ticks: u64,
}

/// Single-writer deviation monitor.
#[derive(Debug)]
pub struct Monitor {
    config: DetectorConfig,
    buffer: TickBuffer,
    quotes: QuoteState,
    cde: f64,
    cde_series: Vec<f64>,
    static_band: ThresholdBand,
    adaptive_bands: Vec<ThresholdBand>,
    triggers: TriggerLog,
    selector: AdaptiveOracleSelector,
    last_decision: Option<SelectorDecision>,
    cde_alert_active: bool,
}

impl Monitor {
    /// Create a monitor with a buffer of `capacity` points.
    pub fn new(config: DetectorConfig, capacity: usize) -> AppResult<Self> {
        config.validate().map_err(DetectorError::ConfigError)?;

        Ok(Self {
            config,
            buffer: TickBuffer::new(capacity),
            quotes: QuoteState::new(),
            cde: 0.0,
            cde_series: Vec::new(),
            static_band: ThresholdBand::ZERO,
            adaptive_bands: Vec::new(),
            triggers: TriggerLog::new(),
            selector: AdaptiveOracleSelector::new(),
            last_decision: None,
            cde_alert_active: false,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Ingest one tick and recompute every derived output.
    ///
    /// A tick carrying a paired oracle value also counts as a quote received
    /// at the tick time. Returns the trigger fired by this tick, if any.
    pub fn on_tick(&mut self, tick: InboundTick) -> Option<TriggerPoint> {
        let started = Instant::now();

        // Fields are public, so a tick may bypass `InboundTick::new`.
        if let Some(paired) = tick.oracle {
            match OracleQuote::new(paired) {
                Ok(quote) => self.quotes.update(quote, tick.t),
                Err(e) => debug!(t = tick.t, error = %e, "Ignoring unusable paired oracle"),
            }
        }

        let oracle = tick
            .oracle
            .filter(|o| o.is_finite() && *o > 0.0)
            .unwrap_or_else(|| self.quotes.oracle_for_point(tick.reference));
        let point = PricePoint::new(tick.t, tick.reference, oracle);

        let out_of_order_before = self.buffer.out_of_order_count();
        self.buffer.append(point);
        if self.buffer.out_of_order_count() > out_of_order_before {
            Metrics::tick_out_of_order();
        }
        Metrics::tick_ingested(self.buffer.len());

        self.recompute();

        let quote = self.quotes.current();
        if let Some(q) = quote {
            Metrics::tick_deviation((q - tick.reference).abs() / tick.reference);
        }

        let trigger = check_static_trigger(
            tick.t,
            tick.reference,
            quote,
            self.config.static_threshold,
        );
        if let Some(point) = trigger {
            self.triggers.push(point);
            Metrics::trigger();
        }

        self.select_oracle(quote);
        self.update_cde_alert(tick.t);

        Metrics::recompute_duration_us(started.elapsed().as_secs_f64() * 1e6);
        debug!(
            t = tick.t,
            reference = tick.reference,
            oracle,
            cde = self.cde,
            buffer_len = self.buffer.len(),
            "Tick processed"
        );

        trigger
    }

    /// Record a fresh external quote received at `received_at_ms`.
    pub fn on_quote(&mut self, quote: OracleQuote, received_at_ms: i64) {
        self.quotes.update(quote, received_at_ms);
        Metrics::quote_update(true);
    }

    /// The oracle reader failed: the live quote becomes absent.
    ///
    /// Triggers and selection skip until the next quote; the published value
    /// is retained.
    pub fn on_quote_unavailable(&mut self) {
        self.quotes.mark_unavailable();
        Metrics::quote_update(false);
    }

    /// Drop all ticks, quotes and derived state (feed reset).
    ///
    /// The trigger log is kept.
    pub fn reset(&mut self) {
        info!(
            buffer_len = self.buffer.len(),
            triggers = self.triggers.len(),
            "Resetting monitor state"
        );

        self.buffer.clear();
        self.quotes.clear();
        self.selector.reset();
        self.last_decision = None;
        self.cde = 0.0;
        self.cde_series.clear();
        self.static_band = ThresholdBand::ZERO;
        self.adaptive_bands.clear();
        if self.cde_alert_active {
            self.cde_alert_active = false;
            Metrics::cde_alert(false);
        }
        Metrics::cde(0.0);
    }

    fn recompute(&mut self) {
        let series = self.buffer.snapshot();

        self.cde = compute_cde(&series);
        self.cde_series = compute_cde_series(&series);
        self.static_band = static_band(&series, &self.config);
        self.adaptive_bands = adaptive_bands(&series, &self.config);

        Metrics::cde(self.cde);
        Metrics::static_band(self.static_band.upper, self.static_band.lower);
        if let (Some(band), Some(latest)) = (self.adaptive_bands.last(), series.last()) {
            if let Some(factor) = band.half_width_fraction(latest.oracle) {
                Metrics::adaptive_factor(factor);
            }
        }
    }

    fn select_oracle(&mut self, quote: Option<f64>) {
        let (Some(latest), Some(band)) = (self.buffer.latest(), self.adaptive_bands.last()) else {
            return;
        };

        let previous = self.selector.source();
        if let Some(decision) = self.selector.update(latest, band, quote) {
            if previous.is_some_and(|s| s != decision.source) {
                Metrics::oracle_source_flip();
            }
            Metrics::published_oracle(decision.published, decision.source.as_str());
            self.last_decision = Some(decision);
        }
    }

    fn update_cde_alert(&mut self, t: i64) {
        let Some(bound) = self.config.cde_threshold else {
            return;
        };

        let above = self.cde > bound;
        if above == self.cde_alert_active {
            return;
        }

        if above {
            warn!(t, cde = self.cde, bound, "CDE above alert threshold");
        } else {
            info!(t, cde = self.cde, bound, "CDE back below alert threshold");
        }
        self.cde_alert_active = above;
        Metrics::cde_alert(above);
    }

    /// CDE over the buffer (PE).
    pub fn cde(&self) -> f64 {
        self.cde
    }

    pub fn cde_series(&self) -> &[f64] {
        &self.cde_series
    }

    pub fn static_band(&self) -> ThresholdBand {
        self.static_band
    }

    pub fn adaptive_bands(&self) -> &[ThresholdBand] {
        &self.adaptive_bands
    }

    pub fn triggers(&self) -> &[TriggerPoint] {
        self.triggers.as_slice()
    }

    /// Published oracle value; None until a quote has been seen.
    pub fn published_oracle(&self) -> Option<f64> {
        self.selector.published()
    }

    pub fn last_decision(&self) -> Option<&SelectorDecision> {
        self.last_decision.as_ref()
    }

    pub fn cde_alert_active(&self) -> bool {
        self.cde_alert_active
    }

    pub fn buffer(&self) -> &TickBuffer {
        &self.buffer
    }

    pub fn quotes(&self) -> &QuoteState {
        &self.quotes
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            points: self.buffer.snapshot(),
            cde: self.cde,
            cde_series: self.cde_series.clone(),
            static_band: self.static_band,
            adaptive_bands: self.adaptive_bands.clone(),
            triggers: self.triggers.as_slice().to_vec(),
            published_oracle: self.selector.published(),
            oracle_source: self.selector.source(),
            live_quote: self.quotes.current(),
            quote_age_ms: self
                .buffer
                .latest()
                .zip(self.quotes.current())
                .and_then(|(p, _)| self.quotes.age_ms(p.t)),
            quote_unavailable_count: self.quotes.unavailable_count(),
            cde_alert_active: self.cde_alert_active,
            ticks_ingested: self.buffer.total_appended(),
            out_of_order_ticks: self.buffer.out_of_order_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> Monitor {
        Monitor::new(DetectorConfig::default(), 1000).unwrap()
    }

    fn tick(t: i64, reference: f64) -> InboundTick {
        InboundTick::new(t, reference, None).unwrap()
    }

    fn quote(value: f64) -> OracleQuote {
        OracleQuote::new(value).unwrap()
    }

    #[test]
    fn test_trigger_on_large_deviation() {
        let mut m = monitor();
        m.on_quote(quote(103.0), 0);

        let fired = m.on_tick(tick(1_000, 100.0));
        assert_eq!(fired, Some(TriggerPoint::new(1_000, 100.0)));
        assert_eq!(m.triggers(), &[TriggerPoint::new(1_000, 100.0)]);
    }

    #[test]
    fn test_no_trigger_on_small_deviation() {
        let mut m = monitor();
        m.on_quote(quote(101.0), 0);

        assert!(m.on_tick(tick(1_000, 100.0)).is_none());
        assert!(m.triggers().is_empty());
    }

    #[test]
    fn test_no_trigger_without_live_quote() {
        let mut m = monitor();
        m.on_quote(quote(103.0), 0);
        m.on_quote_unavailable();

        assert!(m.on_tick(tick(1_000, 100.0)).is_none());
        // last known quote still stored on the point
        assert_eq!(m.buffer().latest().unwrap().oracle, 103.0);
    }

    #[test]
    fn test_selector_falls_back_when_quote_absent() {
        let mut m = monitor();

        m.on_tick(tick(0, 100.0));
        assert!(m.published_oracle().is_none());

        m.reset();
        m.on_quote(quote(100.0), 500);
        m.on_tick(tick(1_000, 100.2));
        assert_eq!(m.published_oracle(), Some(100.0));
        assert_eq!(m.last_decision().unwrap().source, OracleSource::External);

        m.on_quote_unavailable();
        m.on_tick(tick(2_000, 105.0));
        assert_eq!(m.published_oracle(), Some(100.0));
    }

    #[test]
    fn test_point_oracle_before_any_quote_is_reference() {
        let mut m = monitor();
        m.on_tick(tick(0, 100.0));
        m.on_tick(tick(1_000, 101.0));

        assert_eq!(m.buffer().latest().unwrap().oracle, 101.0);
        assert_eq!(m.cde(), 0.0);
    }

    #[test]
    fn test_paired_oracle_counts_as_quote() {
        let mut m = monitor();
        m.on_tick(InboundTick::new(0, 100.0, Some(103.0)).unwrap());

        assert_eq!(m.quotes().current(), Some(103.0));
        assert_eq!(m.triggers().len(), 1);
        assert_eq!(m.published_oracle(), Some(100.0));
    }

    #[test]
    fn test_unusable_paired_oracle_falls_back_to_last_quote() {
        let mut m = monitor();
        m.on_quote(quote(100.0), 0);
        m.on_tick(tick(0, 100.0));
        m.on_tick(InboundTick {
            t: 1_000,
            reference: 100.0,
            oracle: Some(0.0),
        });

        assert_eq!(m.buffer().latest().unwrap().oracle, 100.0);
        assert_eq!(m.cde(), 0.0);
        assert_eq!(m.quotes().current(), Some(100.0));
    }

    #[test]
    fn test_buffer_bound_and_series_alignment() {
        let mut m = Monitor::new(DetectorConfig::default(), 5).unwrap();
        m.on_quote(quote(100.0), 0);
        for i in 0..12 {
            m.on_tick(tick(i * 1_000, 100.0 + i as f64 * 0.1));
        }

        assert_eq!(m.buffer().len(), 5);
        assert_eq!(m.buffer().snapshot()[0].t, 7_000);
        assert_eq!(m.cde_series().len(), 5);
        assert_eq!(m.adaptive_bands().len(), 5);
        assert_eq!(m.cde_series()[0], 0.0);
        assert_eq!(m.cde_series()[1], 0.0);
    }

    #[test]
    fn test_cde_matches_buffer() {
        let mut m = monitor();
        m.on_quote(quote(100.0), 0);
        m.on_tick(tick(0, 101.0));
        m.on_tick(tick(1_000, 101.0));
        m.on_tick(tick(3_000, 102.0));

        // |101 - 100| * 1s + |102 - 100| * 2s
        assert_eq!(m.cde(), 5.0);
        assert_eq!(m.cde(), compute_cde(&m.buffer().snapshot()));
    }

    #[test]
    fn test_static_band_follows_latest_oracle() {
        let mut m = monitor();
        assert_eq!(m.static_band(), ThresholdBand::ZERO);

        m.on_quote(quote(100.0), 0);
        m.on_tick(tick(0, 100.4));
        assert_eq!(m.static_band(), ThresholdBand::around(100.0, 0.005));
    }

    #[test]
    fn test_cde_alert_state_changes() {
        let config = DetectorConfig {
            cde_threshold: Some(1.0),
            ..Default::default()
        };
        let mut m = Monitor::new(config, 1000).unwrap();
        m.on_quote(quote(100.0), 0);

        m.on_tick(tick(0, 101.5));
        assert!(!m.cde_alert_active());

        m.on_tick(tick(1_000, 101.5));
        assert!(m.cde_alert_active());

        m.reset();
        assert!(!m.cde_alert_active());
    }

    #[test]
    fn test_reset_clears_state_but_keeps_triggers() {
        let mut m = monitor();
        m.on_quote(quote(103.0), 0);
        m.on_tick(tick(0, 100.0));
        m.on_tick(tick(1_000, 100.0));

        m.reset();
        assert!(m.buffer().is_empty());
        assert!(m.published_oracle().is_none());
        assert!(m.quotes().current().is_none());
        assert_eq!(m.cde(), 0.0);
        assert!(m.adaptive_bands().is_empty());
        assert_eq!(m.triggers().len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DetectorConfig {
            adaptive_lookback: 0,
            ..Default::default()
        };
        assert!(Monitor::new(config, 10).is_err());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut m = monitor();
        m.on_quote(quote(100.0), 0);
        m.on_tick(tick(0, 100.0));

        let json = serde_json::to_value(m.snapshot()).unwrap();
        assert_eq!(json["points"][0]["ref"], 100.0);
        assert_eq!(json["published_oracle"], 100.0);
        assert_eq!(json["oracle_source"], "External");
        assert_eq!(json["ticks_ingested"], 1);
    }

    #[test]
    fn test_tick_metrics_exported() {
        let mut m = monitor();
        m.on_quote(quote(100.0), 0);
        m.on_tick(tick(0, 100.0));

        let text = Metrics::gather_text().unwrap();
        assert!(text.contains("odm_ticks_total"));
        assert!(text.contains("odm_cde_pe"));
        assert!(text.contains("odm_published_oracle"));
    }

    #[test]
    fn test_snapshot_quote_age_and_outages() {
        let mut m = monitor();
        m.on_quote(quote(100.0), 1_000);
        m.on_tick(tick(4_000, 100.0));
        assert_eq!(m.snapshot().quote_age_ms, Some(3_000));

        m.on_quote_unavailable();
        m.on_tick(tick(5_000, 100.0));
        let snapshot = m.snapshot();
        assert_eq!(snapshot.quote_age_ms, None);
        assert_eq!(snapshot.quote_unavailable_count, 1);
    }
}
