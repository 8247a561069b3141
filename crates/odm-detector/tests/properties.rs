//! Property tests for the deviation analytics.

use odm_core::PricePoint;
use odm_detector::{
    adaptive_bands, compute_cde, compute_cde_series, static_band, volatility_factor,
    CdeAccumulator, DetectorConfig,
};
use proptest::prelude::*;

/// Non-decreasing timestamps with exact (dyadic) reference/oracle gaps.
///
/// Each element is (dt_ms, oracle, gap_quarters) where gap = quarters / 4.
fn well_formed_series() -> impl Strategy<Value = Vec<PricePoint>> {
    prop::collection::vec((0i64..5_000, 1i64..10_000, -400i64..400), 0..120).prop_map(|raw| {
        let mut t = 0i64;
        raw.into_iter()
            .map(|(dt, oracle, quarters)| {
                t += dt;
                let oracle = oracle as f64;
                PricePoint::new(t, oracle + quarters as f64 / 4.0, oracle)
            })
            .collect()
    })
}

fn positive_oracles() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..1.0e6, 1..80)
}

proptest! {
    #[test]
    fn cde_is_non_negative(series in well_formed_series()) {
        prop_assert!(compute_cde(&series) >= 0.0);
    }

    #[test]
    fn cde_doubles_when_gaps_double(series in well_formed_series()) {
        let doubled: Vec<PricePoint> = series
            .iter()
            .map(|p| {
                let gap = p.reference - p.oracle;
                PricePoint::new(p.t, p.oracle + 2.0 * gap, p.oracle)
            })
            .collect();

        prop_assert_eq!(compute_cde(&doubled), 2.0 * compute_cde(&series));
    }

    #[test]
    fn series_and_accumulator_match_batch(series in well_formed_series()) {
        let out = compute_cde_series(&series);
        prop_assert_eq!(out.len(), series.len());

        let mut acc = CdeAccumulator::new();
        for i in 0..series.len() {
            prop_assert_eq!(out[i].to_bits(), compute_cde(&series[..i]).to_bits());
            let running = acc.push(series[i]);
            prop_assert_eq!(running.to_bits(), compute_cde(&series[..=i]).to_bits());
        }
    }

    #[test]
    fn static_band_brackets_positive_oracle(oracle in 0.01f64..1.0e6) {
        let series = [PricePoint::new(0, oracle, oracle)];
        let band = static_band(&series, &DetectorConfig::default());

        prop_assert!(band.upper > oracle);
        prop_assert!(oracle > band.lower);
        let above = band.upper - oracle;
        let below = oracle - band.lower;
        prop_assert!((above - below).abs() <= 1e-12 * oracle);
    }

    #[test]
    fn volatility_factor_stays_in_range(samples in positive_oracles()) {
        let factor = volatility_factor(&samples, 0.01);
        prop_assert!((0.0..=0.01).contains(&factor));
    }

    #[test]
    fn adaptive_bands_are_ordered_and_capped(
        oracles in positive_oracles(),
        lookback in 1usize..20,
    ) {
        let config = DetectorConfig {
            adaptive_lookback: lookback,
            ..Default::default()
        };
        let series: Vec<PricePoint> = oracles
            .iter()
            .enumerate()
            .map(|(i, &o)| PricePoint::new(i as i64, o, o))
            .collect();

        let bands = adaptive_bands(&series, &config);
        prop_assert_eq!(bands.len(), series.len());
        for (band, p) in bands.iter().zip(&series) {
            prop_assert!(band.upper >= band.lower);
            let half = band.half_width_fraction(p.oracle).unwrap();
            prop_assert!(half <= 0.01 * (1.0 + 1e-9));
        }
    }
}
