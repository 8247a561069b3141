//! Common data types for the deviation pipeline.
//!
//! Contains the price observation stored in the tick buffer, the trigger
//! event emitted by the static deviation check, and the threshold band
//! produced by the threshold engine.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// One observation of the reference price and the oracle quote valid at `t`.
///
/// `t` is a millisecond timestamp. Points are immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Observation time (ms).
    pub t: i64,
    /// Fast/reference price.
    #[serde(rename = "ref")]
    pub reference: f64,
    /// Slower external oracle quote valid at `t`.
    pub oracle: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub fn new(t: i64, reference: f64, oracle: f64) -> Self {
        Self {
            t,
            reference,
            oracle,
        }
    }

    /// Absolute gap between reference and oracle.
    pub fn abs_deviation(&self) -> f64 {
        (self.reference - self.oracle).abs()
    }

    /// Gap relative to the oracle price.
    ///
    /// Returns None if the oracle price is zero.
    pub fn relative_deviation(&self) -> Option<f64> {
        if self.oracle == 0.0 {
            return None;
        }
        Some(self.abs_deviation() / self.oracle)
    }
}

/// A moment the static deviation threshold was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerPoint {
    /// Time of the tick that fired the trigger (ms).
    pub t: i64,
    /// Tick price at that time.
    pub value: f64,
}

impl TriggerPoint {
    pub fn new(t: i64, value: f64) -> Self {
        Self { t, value }
    }
}

/// Deviation band around a price at one instant.
///
/// `upper >= lower` always holds for bands built through [`ThresholdBand::around`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub upper: f64,
    pub lower: f64,
}

impl ThresholdBand {
    /// The `{0, 0}` band returned for empty input.
    pub const ZERO: Self = Self {
        upper: 0.0,
        lower: 0.0,
    };

    /// Build a band `center * (1 ± fraction)`.
    ///
    /// Edges are ordered so that a non-positive center still yields `upper >= lower`.
    pub fn around(center: f64, fraction: f64) -> Self {
        let a = center * (1.0 + fraction);
        let b = center * (1.0 - fraction);
        Self {
            upper: a.max(b),
            lower: a.min(b),
        }
    }

    /// Distance between the edges.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Half-width expressed as a fraction of `reference`.
    ///
    /// Returns None if `reference` is zero.
    pub fn half_width_fraction(&self, reference: f64) -> Option<f64> {
        if reference == 0.0 {
            return None;
        }
        Some(self.width() / (2.0 * reference))
    }

    /// Check whether `price` lies inside the band (edges inclusive).
    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }
}

/// Inbound reference-price tick from a live feed or the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InboundTick {
    /// Tick time (ms).
    pub t: i64,
    /// Reference price.
    #[serde(rename = "ref")]
    pub reference: f64,
    /// Oracle quote delivered together with the tick, if any.
    #[serde(default)]
    pub oracle: Option<f64>,
}

impl InboundTick {
    /// Create a validated tick.
    ///
    /// The reference price and the paired oracle quote, when present, must
    /// both be finite and positive.
    pub fn new(t: i64, reference: f64, oracle: Option<f64>) -> Result<Self> {
        if !reference.is_finite() || reference <= 0.0 {
            return Err(CoreError::InvalidPrice(format!(
                "reference price must be finite and positive, got {reference}"
            )));
        }
        if let Some(o) = oracle {
            if !o.is_finite() || o <= 0.0 {
                return Err(CoreError::InvalidPrice(format!(
                    "paired oracle quote must be finite and positive, got {o}"
                )));
            }
        }
        Ok(Self {
            t,
            reference,
            oracle,
        })
    }
}

/// External oracle quote, delivered at a slower cadence than ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OracleQuote {
    pub value: f64,
}

impl OracleQuote {
    /// Create a validated quote (finite and positive).
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CoreError::InvalidPrice(format!(
                "oracle quote must be finite and positive, got {value}"
            )));
        }
        Ok(Self { value })
    }
}
