//! Acquisition orchestrator: one live attempt, synthetic fallback on any failure.
//!
//! ```text
//! Start ──fetch──▶ raw frame ──normalize──▶ Live
//!   │                 │                       │
//!   │ error/offline   │ empty / unusable      │
//!   ▼                 ▼                       ▼
//! Fallback ◀──────────┘                    emit
//!   │ generate(backup profile)
//!   ▼
//! emit
//! ```
//!
//! Both terminal states write the same schema; which path produced the file
//! is visible only in the log and in the returned outcome. There is no retry,
//! no backoff and no partial success.

use std::path::Path;

use hedgedata_core::data::{normalize, DataError, DataProvider, NormalizationError};
use hedgedata_core::{emit, synthetic_series, CanonicalSeries, EmitReport, GenerationError};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{LiveSourceConfig, SyntheticProfile};

/// Why the live path was abandoned.
#[derive(Debug, Error)]
pub enum FallbackReason {
    #[error("offline mode, no live attempt made")]
    Offline,

    #[error("fetch failed: {0}")]
    Fetch(#[from] DataError),

    #[error("normalization failed: {0}")]
    Normalization(#[from] NormalizationError),
}

/// Terminal state of one acquisition.
#[derive(Debug)]
pub enum AcquisitionOutcome {
    /// Real data, normalized and non-empty.
    Live { provider: String },
    /// Synthetic substitute generated from the backup profile.
    Fallback { reason: FallbackReason },
}

impl AcquisitionOutcome {
    pub fn is_live(&self) -> bool {
        matches!(self, AcquisitionOutcome::Live { .. })
    }

    pub fn origin(&self) -> DatasetOrigin {
        match self {
            AcquisitionOutcome::Live { .. } => DatasetOrigin::Live,
            AcquisitionOutcome::Fallback { .. } => DatasetOrigin::Fallback,
        }
    }
}

/// How an emitted dataset was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatasetOrigin {
    Live,
    Fallback,
    Synthetic,
    MockProvider,
}

/// A series ready for emission plus how it was obtained.
#[derive(Debug)]
pub struct Acquisition {
    pub series: CanonicalSeries,
    pub outcome: AcquisitionOutcome,
}

/// Errors that escape acquisition. The live path never produces one; only an
/// invalid backup profile or an unwritable destination does.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("backup profile '{name}' is invalid: {source}")]
    Backup {
        name: String,
        #[source]
        source: GenerationError,
    },

    #[error(transparent)]
    Emit(#[from] hedgedata_core::EmitError),
}

/// Attempt the live path once. Any failure is returned as a `FallbackReason`.
fn try_live(
    provider: Option<&dyn DataProvider>,
    live: &LiveSourceConfig,
) -> Result<(CanonicalSeries, String), FallbackReason> {
    let provider = match provider {
        Some(p) if !live.offline => p,
        _ => return Err(FallbackReason::Offline),
    };

    let raw = provider.fetch(&live.symbol, live.start, live.end)?;
    let series = normalize(&raw)?;
    Ok((series, provider.name().to_string()))
}

/// Run the acquisition state machine and return the series to emit.
///
/// Never fails because of the live source: fetch errors, empty results and
/// normalization failures all route to the backup profile.
pub fn acquire(
    provider: Option<&dyn DataProvider>,
    live: &LiveSourceConfig,
    backup: &SyntheticProfile,
) -> Result<Acquisition, AcquireError> {
    match try_live(provider, live) {
        Ok((series, provider)) => {
            info!(
                symbol = %live.symbol,
                provider = %provider,
                rows = series.len(),
                "live data fetched"
            );
            Ok(Acquisition {
                series,
                outcome: AcquisitionOutcome::Live { provider },
            })
        }
        Err(reason) => {
            warn!(
                symbol = %live.symbol,
                %reason,
                fallback = %backup.name,
                "live acquisition failed, switching to backup data"
            );
            let series = synthetic_series(&backup.params, backup.start_date).map_err(|source| {
                AcquireError::Backup {
                    name: backup.name.clone(),
                    source,
                }
            })?;
            Ok(Acquisition {
                series,
                outcome: AcquisitionOutcome::Fallback { reason },
            })
        }
    }
}

/// Acquire and emit the primary dataset to `path`.
///
/// Live and fallback series are written with the backup profile's scenario
/// parameters, so downstream readers see one schema either way.
pub fn acquire_and_emit(
    provider: Option<&dyn DataProvider>,
    live: &LiveSourceConfig,
    backup: &SyntheticProfile,
    path: &Path,
) -> Result<(AcquisitionOutcome, EmitReport), AcquireError> {
    let acquisition = acquire(provider, live, backup)?;
    let report = emit(&acquisition.series, backup.scenario, path)?;
    info!(path = %report.path.display(), rows = report.rows, "primary dataset written");
    Ok((acquisition.outcome, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use chrono::NaiveDate;
    use hedgedata_core::data::{ColumnKey, DataSource, RawFrame};

    struct StaticProvider(RawFrame);

    impl DataProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }
        fn source(&self) -> DataSource {
            DataSource::CsvImport
        }
        fn fetch(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<RawFrame, DataError> {
            Ok(self.0.clone())
        }
    }

    fn one_row_frame() -> RawFrame {
        RawFrame::flat(vec![NaiveDate::from_ymd_opt(2023, 1, 3).unwrap()])
            .with_column(ColumnKey::flat("Adj Close"), vec![Some(380.0)])
            .unwrap()
    }

    #[test]
    fn offline_goes_straight_to_fallback() {
        let cfg = PipelineConfig::default();
        let acq = acquire(None, &cfg.live, &cfg.fallback).unwrap();
        assert!(matches!(
            acq.outcome,
            AcquisitionOutcome::Fallback { reason: FallbackReason::Offline }
        ));
        assert_eq!(acq.series.len(), 252);
    }

    #[test]
    fn offline_flag_skips_available_provider() {
        let mut cfg = PipelineConfig::default();
        cfg.live.offline = true;
        let provider = StaticProvider(one_row_frame());
        let acq = acquire(Some(&provider), &cfg.live, &cfg.fallback).unwrap();
        assert!(!acq.outcome.is_live());
    }

    #[test]
    fn usable_frame_is_live() {
        let cfg = PipelineConfig::default();
        let provider = StaticProvider(one_row_frame());
        let acq = acquire(Some(&provider), &cfg.live, &cfg.fallback).unwrap();
        assert!(acq.outcome.is_live());
        assert_eq!(acq.outcome.origin(), DatasetOrigin::Live);
        assert_eq!(acq.series.len(), 1);
    }

    #[test]
    fn empty_frame_falls_back_with_normalization_reason() {
        let cfg = PipelineConfig::default();
        let provider = StaticProvider(RawFrame::empty());
        let acq = acquire(Some(&provider), &cfg.live, &cfg.fallback).unwrap();
        assert!(matches!(
            acq.outcome,
            AcquisitionOutcome::Fallback {
                reason: FallbackReason::Normalization(NormalizationError::EmptySource)
            }
        ));
    }

    #[test]
    fn invalid_backup_profile_is_an_error() {
        let mut cfg = PipelineConfig::default();
        cfg.fallback.params.start_price = -1.0;
        let err = acquire(None, &cfg.live, &cfg.fallback).unwrap_err();
        assert!(matches!(err, AcquireError::Backup { .. }));
    }
}
