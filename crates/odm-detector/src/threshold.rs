//! Static and volatility-adaptive threshold bands.
//!
//! **Static band**: fixed ±`static_band_half_width` around the latest oracle.
//!
//! **Adaptive band** (one per point): the half-width scales with the realized
//! volatility of the oracle series over a short trailing window:
//!
//! ```text
//! lookback = min(L, i)
//! samples  = oracle[i - lookback ..= i]
//! factor   = clamp(σ / μ, 0, cap)      (population σ)
//! band     = oracle[i] * (1 ± factor)
//! ```
//!
//! Index 0 has no history and uses the static half-width. A zero window mean
//! is degenerate; the factor is then pinned to `cap` rather than producing
//! NaN or infinity.

use crate::config::DetectorConfig;
use crate::error::{DetectorError, DetectorResult};
use odm_core::{PricePoint, ThresholdBand};
use tracing::debug;

/// Static band around the most recent point's oracle price.
///
/// Returns `{0, 0}` for an empty sequence.
pub fn static_band(series: &[PricePoint], config: &DetectorConfig) -> ThresholdBand {
    series
        .last()
        .map(|p| ThresholdBand::around(p.oracle, config.static_band_half_width))
        .unwrap_or(ThresholdBand::ZERO)
}

/// Volatility factor `σ/μ` of `samples`, clamped to `[0, cap]`.
///
/// - empty input → 0
/// - μ == 0 or non-finite ratio → `cap`
pub fn volatility_factor(samples: &[f64], cap: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    if mean == 0.0 {
        debug!(samples = samples.len(), "Zero-mean oracle window, using volatility cap");
        return cap;
    }

    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let ratio = variance.sqrt() / mean;
    if !ratio.is_finite() {
        debug!(mean, variance, "Non-finite volatility ratio, using volatility cap");
        return cap;
    }

    ratio.clamp(0.0, cap)
}

/// Adaptive band for a single index.
///
/// O(lookback); used when only the latest band is needed.
pub fn adaptive_band_at(
    series: &[PricePoint],
    index: usize,
    config: &DetectorConfig,
) -> DetectorResult<ThresholdBand> {
    if index >= series.len() {
        return Err(DetectorError::IndexOutOfRange {
            index,
            len: series.len(),
        });
    }
    Ok(band_at(series, index, config))
}

/// Adaptive band for every point, aligned index-for-index with `series`.
pub fn adaptive_bands(series: &[PricePoint], config: &DetectorConfig) -> Vec<ThresholdBand> {
    (0..series.len())
        .map(|i| band_at(series, i, config))
        .collect()
}

/// Band at `index`; callers guarantee `index < series.len()`.
fn band_at(series: &[PricePoint], index: usize, config: &DetectorConfig) -> ThresholdBand {
    let point = &series[index];
    if index == 0 {
        return ThresholdBand::around(point.oracle, config.static_band_half_width);
    }

    let lookback = config.adaptive_lookback.min(index);
    let samples: Vec<f64> = series[index - lookback..=index]
        .iter()
        .map(|p| p.oracle)
        .collect();
    let factor = volatility_factor(&samples, config.volatility_cap);

    ThresholdBand::around(point.oracle, factor)
}
