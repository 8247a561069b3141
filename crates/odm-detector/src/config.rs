//! Detector configuration.

use serde::{Deserialize, Serialize};

/// Configuration for threshold, trigger and alert computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Relative quote/tick deviation above which a trigger fires (fraction).
    #[serde(default = "default_static_threshold")]
    pub static_threshold: f64,
    /// Half-width of the static band around the oracle (fraction).
    #[serde(default = "default_static_band_half_width")]
    pub static_band_half_width: f64,
    /// Number of previous points in the adaptive volatility window.
    #[serde(default = "default_adaptive_lookback")]
    pub adaptive_lookback: usize,
    /// Upper clamp for the adaptive volatility factor (fraction).
    #[serde(default = "default_volatility_cap")]
    pub volatility_cap: f64,
    /// CDE alert bound in PE. Only compared against, never derived.
    /// None disables the alert.
    #[serde(default)]
    pub cde_threshold: Option<f64>,
}

fn default_static_threshold() -> f64 {
    0.02 // 2%
}

fn default_static_band_half_width() -> f64 {
    0.005 // ±0.5%
}

fn default_adaptive_lookback() -> usize {
    10
}

fn default_volatility_cap() -> f64 {
    0.01 // 1%
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            static_threshold: default_static_threshold(),
            static_band_half_width: default_static_band_half_width(),
            adaptive_lookback: default_adaptive_lookback(),
            volatility_cap: default_volatility_cap(),
            cde_threshold: None,
        }
    }
}

impl DetectorConfig {
    /// Validate configuration values.
    ///
    /// Returns Err if values are invalid:
    /// - static_threshold negative or non-finite
    /// - static_band_half_width / volatility_cap outside [0, 1)
    /// - adaptive_lookback == 0
    /// - cde_threshold negative or non-finite
    pub fn validate(&self) -> Result<(), String> {
        if !self.static_threshold.is_finite() || self.static_threshold < 0.0 {
            return Err(format!(
                "static_threshold ({}) must be a non-negative number",
                self.static_threshold
            ));
        }

        if !(0.0..1.0).contains(&self.static_band_half_width) {
            return Err(format!(
                "static_band_half_width ({}) must be in [0, 1)",
                self.static_band_half_width
            ));
        }

        if !(0.0..1.0).contains(&self.volatility_cap) {
            return Err(format!(
                "volatility_cap ({}) must be in [0, 1)",
                self.volatility_cap
            ));
        }

        if self.adaptive_lookback == 0 {
            return Err("adaptive_lookback must be at least 1".to_string());
        }

        if let Some(bound) = self.cde_threshold {
            if !bound.is_finite() || bound < 0.0 {
                return Err(format!(
                    "cde_threshold ({bound}) must be a non-negative number"
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.static_threshold, 0.02);
        assert_eq!(config.static_band_half_width, 0.005);
        assert_eq!(config.adaptive_lookback, 10);
        assert_eq!(config.volatility_cap, 0.01);
        assert!(config.cde_threshold.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DetectorConfig = toml::from_str("static_threshold = 0.05").unwrap();
        assert_eq!(config.static_threshold, 0.05);
        assert_eq!(config.adaptive_lookback, 10);
        assert_eq!(config.volatility_cap, 0.01);
    }

    #[test]
    fn test_validate_negative_threshold() {
        let config = DetectorConfig {
            static_threshold: -0.01,
            ..Default::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("static_threshold"));
    }

    #[test]
    fn test_validate_cap_out_of_range() {
        let config = DetectorConfig {
            volatility_cap: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_lookback() {
        let config = DetectorConfig {
            adaptive_lookback: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("adaptive_lookback"));
    }

    #[test]
    fn test_validate_cde_threshold() {
        let ok = DetectorConfig {
            cde_threshold: Some(25.0),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = DetectorConfig {
            cde_threshold: Some(f64::NAN),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
