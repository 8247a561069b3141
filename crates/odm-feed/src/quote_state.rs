//! Latest external oracle quote.
//!
//! The oracle reader delivers quotes at a much slower cadence than ticks and
//! may fail at any time. A failed fetch makes the live quote absent, but the
//! last known value is kept so new price points still carry the most recent
//! oracle observation.

use odm_core::OracleQuote;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct QuoteState {
    /// Live quote; None while the reader reports the quote unavailable.
    current: Option<f64>,
    /// Last quote ever received, retained across unavailability.
    last_known: Option<f64>,
    /// Time (ms) the live quote was received.
    received_at_ms: Option<i64>,
    /// Number of unavailable reports.
    unavailable_count: u64,
}

impl QuoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh quote received at `now_ms`.
    pub fn update(&mut self, quote: OracleQuote, now_ms: i64) {
        if let Some(last) = self.last_known {
            if last != quote.value {
                debug!(last, new = quote.value, "Oracle quote changed");
            }
        }

        self.current = Some(quote.value);
        self.last_known = Some(quote.value);
        self.received_at_ms = Some(now_ms);
    }

    /// The reader failed or timed out: the live quote becomes absent.
    pub fn mark_unavailable(&mut self) {
        if self.current.is_some() {
            debug!("Oracle quote became unavailable");
        }
        self.current = None;
        self.unavailable_count += 1;
    }

    /// Live quote, if available.
    pub fn current(&self) -> Option<f64> {
        self.current
    }

    /// Last quote ever received.
    pub fn last_known(&self) -> Option<f64> {
        self.last_known
    }

    /// Oracle value to store on a new point with reference price `reference`.
    ///
    /// Uses the last known quote; before any quote has arrived the reference
    /// price itself is used (zero deviation).
    pub fn oracle_for_point(&self, reference: f64) -> f64 {
        self.last_known.unwrap_or(reference)
    }

    /// Milliseconds since the live quote was received.
    pub fn age_ms(&self, now_ms: i64) -> Option<i64> {
        self.received_at_ms.map(|t| now_ms - t)
    }

    pub fn unavailable_count(&self) -> u64 {
        self.unavailable_count
    }

    /// Forget everything (feed reset).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(v: f64) -> OracleQuote {
        OracleQuote::new(v).unwrap()
    }

    #[test]
    fn test_initially_absent() {
        let state = QuoteState::new();
        assert!(state.current().is_none());
        assert!(state.last_known().is_none());
        assert_eq!(state.oracle_for_point(101.5), 101.5);
    }

    #[test]
    fn test_update_sets_current_and_last_known() {
        let mut state = QuoteState::new();
        state.update(q(100.0), 1_000);
        assert_eq!(state.current(), Some(100.0));
        assert_eq!(state.last_known(), Some(100.0));
        assert_eq!(state.oracle_for_point(101.5), 100.0);
        assert_eq!(state.age_ms(31_000), Some(30_000));
    }

    #[test]
    fn test_unavailable_keeps_last_known() {
        let mut state = QuoteState::new();
        state.update(q(100.0), 1_000);
        state.mark_unavailable();

        assert!(state.current().is_none());
        assert_eq!(state.last_known(), Some(100.0));
        assert_eq!(state.oracle_for_point(105.0), 100.0);
        assert_eq!(state.unavailable_count(), 1);
    }

    #[test]
    fn test_age_follows_latest_receipt() {
        let mut state = QuoteState::new();
        state.update(q(100.0), 1_000);
        state.update(q(100.0), 31_000);
        assert_eq!(state.age_ms(61_000), Some(30_000));
    }

    #[test]
    fn test_clear() {
        let mut state = QuoteState::new();
        state.update(q(100.0), 1_000);
        state.clear();
        assert!(state.last_known().is_none());
        assert!(state.age_ms(2_000).is_none());
    }
}
