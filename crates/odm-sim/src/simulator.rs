//! Reference/oracle price path generator.
//!
//! Reference path:
//! - random walk: `ref[t] = ref[t-1] + U(-0.5, 0.5) * volatility * base`,
//!   starting from `base` (the first step is applied at `t = 0`)
//! - deterministic: `ref[t] = base + 2 * sin(t / 10) + drift * t`
//!
//! Oracle path: `oracle[t] = ref[max(0, t - lag)] + U(-0.5, 0.5) * noise`.
//!
//! Output timestamps are the tick index `0..duration`.

use crate::params::SimulationParams;
use odm_core::PricePoint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Seeded path generator.
pub struct Simulator {
    params: SimulationParams,
    rng: StdRng,
}

impl Simulator {
    /// Create a simulator; seeded from `params.seed` or OS entropy.
    pub fn new(params: SimulationParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { params, rng }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Uniform sample in [-0.5, 0.5).
    fn centered_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>() - 0.5
    }

    fn reference_path(&mut self, n: usize) -> Vec<f64> {
        let base = self.params.base_price;

        if self.params.use_random_walk {
            let step_scale = self.params.volatility * base;
            let mut price = base;
            (0..n)
                .map(|_| {
                    price += self.centered_uniform() * step_scale;
                    price
                })
                .collect()
        } else {
            let drift = self.params.drift;
            (0..n)
                .map(|t| {
                    let t = t as f64;
                    base + 2.0 * (t / 10.0).sin() + drift * t
                })
                .collect()
        }
    }

    /// Generate a full path of `duration` points.
    pub fn generate(&mut self) -> Vec<PricePoint> {
        let n = self.params.point_count();
        let reference = self.reference_path(n);
        let lag = self.params.oracle_lag;
        let noise = self.params.oracle_noise;

        let points: Vec<PricePoint> = (0..n)
            .map(|t| {
                let observed = reference[t.saturating_sub(lag)];
                let oracle = observed + self.centered_uniform() * noise;
                PricePoint::new(t as i64, reference[t], oracle)
            })
            .collect();

        debug!(
            points = points.len(),
            random_walk = self.params.use_random_walk,
            lag,
            "Generated simulated price path"
        );

        points
    }
}

/// Generate one path from `params`.
pub fn simulate(params: &SimulationParams) -> Vec<PricePoint> {
    Simulator::new(params.clone()).generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deterministic(duration: i64, lag: usize, noise: f64) -> SimulationParams {
        SimulationParams {
            duration,
            base_price: 100.0,
            use_random_walk: false,
            volatility: 0.0,
            oracle_lag: lag,
            oracle_noise: noise,
            drift: 0.0,
            seed: Some(1),
        }
    }

    #[test]
    fn test_sinusoid_exact() {
        let points = simulate(&deterministic(5, 0, 0.0));
        assert_eq!(points.len(), 5);
        for (t, p) in points.iter().enumerate() {
            assert_eq!(p.t, t as i64);
            assert_eq!(p.reference, 100.0 + 2.0 * (t as f64 / 10.0).sin());
        }
    }

    #[test]
    fn test_sinusoid_with_drift() {
        let params = SimulationParams {
            drift: 0.5,
            ..deterministic(4, 0, 0.0)
        };
        let points = simulate(&params);
        assert_eq!(points[3].reference, 100.0 + 2.0 * 0.3f64.sin() + 0.5 * 3.0);
    }

    #[test]
    fn test_oracle_lag_without_noise() {
        let points = simulate(&deterministic(10, 3, 0.0));
        assert_eq!(points[5].oracle, points[2].reference);
        // clamped at t = 0 for the first `lag` ticks
        assert_eq!(points[0].oracle, points[0].reference);
        assert_eq!(points[2].oracle, points[0].reference);
    }

    #[test]
    fn test_oracle_noise_bounded() {
        let points = simulate(&deterministic(500, 2, 1.0));
        for t in 0..points.len() {
            let observed = points[t.saturating_sub(2)].reference;
            assert!((points[t].oracle - observed).abs() <= 0.5 + 1e-9);
        }
    }

    #[test]
    fn test_non_positive_duration_empty() {
        assert!(simulate(&deterministic(0, 0, 0.0)).is_empty());
        assert!(simulate(&deterministic(-10, 0, 0.0)).is_empty());
    }

    #[test]
    fn test_random_walk_step_bounded() {
        let params = SimulationParams {
            duration: 300,
            base_price: 100.0,
            use_random_walk: true,
            volatility: 0.01,
            oracle_lag: 0,
            oracle_noise: 0.0,
            drift: 0.0,
            seed: Some(42),
        };
        let points = simulate(&params);
        assert_eq!(points.len(), 300);

        // each step is at most 0.5 * volatility * base = 0.5
        assert!((points[0].reference - 100.0).abs() <= 0.5 + 1e-12);
        for w in points.windows(2) {
            assert!((w[1].reference - w[0].reference).abs() <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn test_same_seed_same_path() {
        let params = SimulationParams {
            seed: Some(99),
            ..Default::default()
        };
        assert_eq!(simulate(&params), simulate(&params));

        let other = SimulationParams {
            seed: Some(100),
            ..Default::default()
        };
        assert_ne!(simulate(&params), simulate(&other));
    }
}
