//! Cumulative Deviation Exposure (CDE).
//!
//! CDE integrates the absolute reference/oracle gap over elapsed time and is
//! expressed in price-units × seconds ("PE"):
//!
//! ```text
//! CDE = Σ_{i=1}^{n-1} |p[i].ref - p[i].oracle| * (p[i].t - p[i-1].t) / 1000
//! ```
//!
//! Each rectangle uses the deviation at the later point times the seconds
//! elapsed since the previous point. Equal timestamps contribute nothing.
//! A regressing timestamp yields a negative term that reduces the total;
//! it is accepted as-is so output matches the raw feed numerically.
//!
//! All three forms (batch, per-prefix series, incremental accumulator) fold
//! the same terms in the same order starting from `0.0`, so they agree
//! bit-for-bit.

use odm_core::PricePoint;
use serde::{Deserialize, Serialize};

/// Area contributed by `cur` given the preceding point `prev`.
#[inline]
pub fn deviation_term(prev: &PricePoint, cur: &PricePoint) -> f64 {
    let elapsed_ms = (cur.t - prev.t) as f64;
    cur.abs_deviation() * elapsed_ms / 1000.0
}

/// CDE over a whole sequence. Fewer than two points yields 0.
pub fn compute_cde(series: &[PricePoint]) -> f64 {
    series
        .windows(2)
        .fold(0.0, |acc, w| acc + deviation_term(&w[0], &w[1]))
}

/// Per-index CDE series aligned with `series`.
///
/// Element `i` equals `compute_cde(&series[..i])`, so indices 0 and 1 are 0
/// and the value at `i` covers the points strictly before `i`. Computed with
/// a running sum in O(n).
pub fn compute_cde_series(series: &[PricePoint]) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    let mut acc = 0.0;
    for i in 0..series.len() {
        if i >= 2 {
            acc += deviation_term(&series[i - 2], &series[i - 1]);
        }
        out.push(acc);
    }
    out
}

/// Incremental CDE: O(1) per pushed point.
///
/// After pushing `p[0..k]` in order, `value()` is bit-identical to
/// `compute_cde(&p[..k])`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdeAccumulator {
    last: Option<PricePoint>,
    total: f64,
    count: usize,
}

impl CdeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next point and return the updated CDE.
    pub fn push(&mut self, point: PricePoint) -> f64 {
        if let Some(prev) = &self.last {
            self.total += deviation_term(prev, &point);
        }
        self.last = Some(point);
        self.count += 1;
        self.total
    }

    /// Current CDE.
    pub fn value(&self) -> f64 {
        self.total
    }

    /// Number of points pushed since the last reset.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
