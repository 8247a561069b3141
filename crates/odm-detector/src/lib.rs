//! Deviation analytics for the oracle deviation monitor.
//!
//! Pure computations over an ordered sequence of price points:
//! - CDE: cumulative deviation exposure (price-units × seconds, "PE")
//! - Static and volatility-adaptive threshold bands
//! - Static deviation trigger between a live quote and the tick price
//! - Adaptive oracle selection between reference price and external quote

pub mod cde;
pub mod config;
pub mod error;
pub mod selector;
pub mod threshold;
pub mod trigger;

pub use cde::{compute_cde, compute_cde_series, deviation_term, CdeAccumulator};
pub use config::DetectorConfig;
pub use error::{DetectorError, DetectorResult};
pub use selector::{AdaptiveOracleSelector, OracleSource, SelectorDecision};
pub use threshold::{adaptive_band_at, adaptive_bands, static_band, volatility_factor};
pub use trigger::{check_static_trigger, TriggerLog};
