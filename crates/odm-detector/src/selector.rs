//! Adaptive oracle selection.
//!
//! Each tick decides which value is published as the authoritative oracle:
//! the slow external quote, or the live reference price when the two have
//! drifted further apart than the current adaptive band allows.
//!
//! ```text
//! deviation           = |latest.ref - quote| / quote
//! threshold_deviation = (band.upper - band.lower) / (2 * quote)
//! published           = deviation > threshold_deviation ? latest.ref : quote
//! ```
//!
//! The decision uses only the current inputs (no hysteresis). Without a
//! quote no decision is made and the published value is left unchanged.

use odm_core::{PricePoint, ThresholdBand};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which input the published oracle value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleSource {
    /// Live reference price (deviation exceeded the band).
    Reference,
    /// External oracle quote.
    External,
}

impl OracleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::External => "external",
        }
    }
}

impl std::fmt::Display for OracleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selection result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectorDecision {
    pub published: f64,
    pub source: OracleSource,
    /// `|ref - quote| / quote`.
    pub deviation: f64,
    /// Band half-width as a fraction of the quote.
    pub threshold_deviation: f64,
}

impl SelectorDecision {
    /// Pure selection rule.
    ///
    /// Returns None when the quote is absent, non-finite, or not positive.
    pub fn evaluate(
        latest: &PricePoint,
        band: &ThresholdBand,
        external_quote: Option<f64>,
    ) -> Option<Self> {
        let quote = external_quote.filter(|q| q.is_finite() && *q > 0.0)?;

        let deviation = (latest.reference - quote).abs() / quote;
        let threshold_deviation = (band.upper - band.lower) / (2.0 * quote);

        let (published, source) = if deviation > threshold_deviation {
            (latest.reference, OracleSource::Reference)
        } else {
            (quote, OracleSource::External)
        };

        Some(Self {
            published,
            source,
            deviation,
            threshold_deviation,
        })
    }
}

/// Holds the single published oracle scalar.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveOracleSelector {
    published: Option<f64>,
    last_source: Option<OracleSource>,
    decisions: u64,
    source_flips: u64,
}

impl AdaptiveOracleSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the selection for the latest tick.
    ///
    /// Returns the decision, or None (published value retained) when no
    /// quote is available.
    pub fn update(
        &mut self,
        latest: &PricePoint,
        band: &ThresholdBand,
        external_quote: Option<f64>,
    ) -> Option<SelectorDecision> {
        let decision = SelectorDecision::evaluate(latest, band, external_quote)?;

        if let Some(prev) = self.last_source {
            if prev != decision.source {
                self.source_flips += 1;
                info!(
                    t = latest.t,
                    from = %prev,
                    to = %decision.source,
                    deviation = decision.deviation,
                    threshold_deviation = decision.threshold_deviation,
                    "Published oracle source changed"
                );
            }
        }

        self.published = Some(decision.published);
        self.last_source = Some(decision.source);
        self.decisions += 1;
        Some(decision)
    }

    /// Current published oracle value; None until the first decision.
    pub fn published(&self) -> Option<f64> {
        self.published
    }

    pub fn source(&self) -> Option<OracleSource> {
        self.last_source
    }

    pub fn decision_count(&self) -> u64 {
        self.decisions
    }

    pub fn source_flips(&self) -> u64 {
        self.source_flips
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
