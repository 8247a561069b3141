//! Static deviation trigger.
//!
//! Independent of the static band: compares the live external quote with the
//! live tick price once per ingested tick,
//!
//! ```text
//! deviation = |quote - tick| / tick
//! ```
//!
//! and fires a `TriggerPoint { t, value: tick }` when `deviation` is strictly
//! above `static_threshold`. No quote means no check.

use odm_core::TriggerPoint;
use serde::Serialize;
use tracing::info;

/// Evaluate the static deviation trigger for one tick.
///
/// Returns None when the quote is absent, the tick price is not positive, or
/// either input is non-finite.
pub fn check_static_trigger(
    t: i64,
    tick_price: f64,
    external_quote: Option<f64>,
    static_threshold: f64,
) -> Option<TriggerPoint> {
    let quote = external_quote?;
    if !quote.is_finite() || !tick_price.is_finite() || tick_price <= 0.0 {
        return None;
    }

    let deviation = (quote - tick_price).abs() / tick_price;
    if deviation > static_threshold {
        info!(
            t,
            tick_price,
            quote,
            deviation,
            static_threshold,
            "Static deviation threshold exceeded"
        );
        Some(TriggerPoint::new(t, tick_price))
    } else {
        None
    }
}

/// Append-only list of emitted triggers.
///
/// Never mutated or evicted; callers that need a cap apply it externally.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriggerLog {
    points: Vec<TriggerPoint>,
}

impl TriggerLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: TriggerPoint) {
        self.points.push(point);
    }

    pub fn as_slice(&self) -> &[TriggerPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&TriggerPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
