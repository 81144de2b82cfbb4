//! Secondary dataset producers.
//!
//! Neither producer has a live path, so neither can fail over or warn:
//! - the generic synthetic series reuses the path generator with its own
//!   start price, volatility and seed;
//! - the mock alternate-provider export samples its last price uniformly and
//!   is only reproducible when given a fixed seed.

use std::path::Path;

use chrono::NaiveDate;
use hedgedata_core::{
    emit, emit_provider_export, synthetic_series, EmitError, EmitReport, GenerationError,
    ProviderExportRow, SeedSource,
};
use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::config::{MockExportConfig, SyntheticProfile};

#[derive(Debug, Error)]
pub enum ProduceError {
    #[error("profile '{name}' is invalid: {source}")]
    Generation {
        name: String,
        #[source]
        source: GenerationError,
    },

    #[error("date range starting {start} overflows after {periods} periods")]
    DateOverflow { start: NaiveDate, periods: usize },

    #[error("mock export price range [{low}, {high}) is empty or not finite")]
    InvalidPriceRange { low: f64, high: f64 },

    #[error("mock export needs at least one period")]
    NoPeriods,

    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Generate and emit a seeded synthetic dataset.
pub fn produce_synthetic(profile: &SyntheticProfile, path: &Path) -> Result<EmitReport, ProduceError> {
    let series = synthetic_series(&profile.params, profile.start_date).map_err(|source| {
        ProduceError::Generation {
            name: profile.name.clone(),
            source,
        }
    })?;
    let report = emit(&series, profile.scenario, path)?;
    info!(name = %profile.name, path = %report.path.display(), rows = report.rows, "synthetic dataset written");
    Ok(report)
}

/// Build the mock alternate-provider rows.
///
/// Daily calendar dates from `start_date`; `PX_LAST` uniform in
/// `[price_low, price_high)`; rate and volatility index constant.
pub fn mock_export_rows(
    cfg: &MockExportConfig,
    seed: SeedSource,
) -> Result<Vec<ProviderExportRow>, ProduceError> {
    if cfg.periods == 0 {
        return Err(ProduceError::NoPeriods);
    }
    if !cfg.price_range_is_valid() {
        return Err(ProduceError::InvalidPriceRange {
            low: cfg.price_low,
            high: cfg.price_high,
        });
    }
    let mut rng = seed.rng();
    (0..cfg.periods)
        .map(|i| -> Result<ProviderExportRow, ProduceError> {
            let date = cfg
                .start_date
                .checked_add_days(chrono::Days::new(i as u64))
                .ok_or(ProduceError::DateOverflow {
                    start: cfg.start_date,
                    periods: cfg.periods,
                })?;
            Ok(ProviderExportRow {
                date,
                px_last: rng.gen_range(cfg.price_low..cfg.price_high),
                treasury_3m: cfg.treasury_3m,
                volatility_30d: cfg.volatility_30d,
            })
        })
        .collect()
}

/// Generate and emit the mock alternate-provider export.
pub fn produce_mock_export(
    cfg: &MockExportConfig,
    seed: SeedSource,
    path: &Path,
) -> Result<EmitReport, ProduceError> {
    let rows = mock_export_rows(cfg, seed)?;
    let report = emit_provider_export(&rows, path)?;
    info!(
        path = %report.path.display(),
        rows = report.rows,
        reproducible = seed.is_reproducible(),
        "mock provider export written"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[test]
    fn mock_rows_follow_config() {
        let cfg = MockExportConfig::default();
        let rows = mock_export_rows(&cfg, SeedSource::Entropy).unwrap();

        assert_eq!(rows.len(), 100);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(rows[99].date, NaiveDate::from_ymd_opt(2023, 9, 8).unwrap());
        for row in &rows {
            assert!((150.0..160.0).contains(&row.px_last));
            assert_eq!(row.treasury_3m, 5.0);
            assert_eq!(row.volatility_30d, 20.0);
        }
    }

    #[test]
    fn fixed_seed_makes_mock_rows_reproducible() {
        let cfg = MockExportConfig::default();
        let a = mock_export_rows(&cfg, SeedSource::Fixed(3)).unwrap();
        let b = mock_export_rows(&cfg, SeedSource::Fixed(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_price_ranges_are_errors() {
        let base = MockExportConfig::default();
        for (low, high) in [(150.0, 150.0), (160.0, 150.0), (f64::NAN, 160.0), (150.0, f64::INFINITY)] {
            let cfg = MockExportConfig {
                price_low: low,
                price_high: high,
                ..base.clone()
            };
            let err = mock_export_rows(&cfg, SeedSource::Fixed(1)).unwrap_err();
            assert!(matches!(err, ProduceError::InvalidPriceRange { .. }), "[{low}, {high})");
        }
    }

    #[test]
    fn zero_periods_is_an_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let cfg = MockExportConfig {
            periods: 0,
            ..MockExportConfig::default()
        };

        let err = produce_mock_export(&cfg, SeedSource::Fixed(1), &path).unwrap_err();
        assert!(matches!(err, ProduceError::NoPeriods));
        assert!(!path.exists());
    }

    #[test]
    fn synthetic_profile_is_independent_of_fallback_profile() {
        let cfg = PipelineConfig::default();
        let dir = tempfile::tempdir().unwrap();

        let synthetic = produce_synthetic(&cfg.synthetic, &dir.path().join("s.csv")).unwrap();
        let backup = produce_synthetic(&cfg.fallback, &dir.path().join("b.csv")).unwrap();
        assert_eq!(synthetic.rows, 252);
        assert_eq!(backup.rows, 252);
        assert_ne!(synthetic.digest, backup.digest);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn mock_prices_stay_in_configured_range(
                seed in any::<u64>(),
                low in 1.0f64..500.0,
                width in 0.01f64..100.0,
                periods in 1usize..200,
            ) {
                let cfg = MockExportConfig {
                    price_low: low,
                    price_high: low + width,
                    periods,
                    ..MockExportConfig::default()
                };
                let rows = mock_export_rows(&cfg, SeedSource::Fixed(seed)).unwrap();
                prop_assert_eq!(rows.len(), periods);
                for pair in rows.windows(2) {
                    prop_assert_eq!(pair[1].date, pair[0].date.succ_opt().unwrap());
                }
                for row in &rows {
                    prop_assert!(row.px_last >= cfg.price_low && row.px_last < cfg.price_high);
                }
            }
        }
    }
}
