//! Simulation parameters.

use serde::{Deserialize, Serialize};

/// Configuration for one generated path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Number of points to generate. Values <= 0 produce an empty path.
    #[serde(default = "default_duration")]
    pub duration: i64,
    /// Starting / centre price.
    #[serde(default = "default_base_price")]
    pub base_price: f64,
    /// Random walk when true, sinusoid plus drift when false.
    #[serde(default = "default_use_random_walk")]
    pub use_random_walk: bool,
    /// Random-walk step scale as a fraction of `base_price`.
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    /// Oracle lag in ticks.
    #[serde(default = "default_oracle_lag")]
    pub oracle_lag: usize,
    /// Full width of the uniform oracle noise (half-width is `oracle_noise / 2`).
    #[serde(default = "default_oracle_noise")]
    pub oracle_noise: f64,
    /// Per-tick drift of the sinusoid path.
    #[serde(default)]
    pub drift: f64,
    /// RNG seed; None draws one from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_duration() -> i64 {
    200
}

fn default_base_price() -> f64 {
    100.0
}

fn default_use_random_walk() -> bool {
    true
}

fn default_volatility() -> f64 {
    0.002
}

fn default_oracle_lag() -> usize {
    5
}

fn default_oracle_noise() -> f64 {
    0.1
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            base_price: default_base_price(),
            use_random_walk: default_use_random_walk(),
            volatility: default_volatility(),
            oracle_lag: default_oracle_lag(),
            oracle_noise: default_oracle_noise(),
            drift: 0.0,
            seed: None,
        }
    }
}

impl SimulationParams {
    /// Number of points that will be generated.
    pub fn point_count(&self) -> usize {
        self.duration.max(0) as usize
    }
}
