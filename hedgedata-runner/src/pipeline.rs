//! End-to-end preparation run: primary dataset, synthetic dataset, mock export.

use std::path::PathBuf;

use hedgedata_core::data::DataProvider;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::acquire::{acquire_and_emit, AcquireError, AcquisitionOutcome, DatasetOrigin};
use crate::config::{ConfigError, PipelineConfig};
use crate::producers::{produce_mock_export, produce_synthetic, ProduceError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("primary dataset: {0}")]
    Acquire(#[from] AcquireError),

    #[error("secondary dataset: {0}")]
    Produce(#[from] ProduceError),
}

/// One emitted dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
    pub digest: String,
    pub origin: DatasetOrigin,
}

/// Every dataset written by one run, in write order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub datasets: Vec<DatasetSummary>,
}

impl PipelineSummary {
    /// True when the primary dataset came from the live source.
    pub fn primary_is_live(&self) -> bool {
        self.datasets
            .first()
            .is_some_and(|d| d.origin == DatasetOrigin::Live)
    }
}

/// Run all three producers in order. `provider` is the live source for the
/// primary dataset; `None` means offline.
///
/// The config is validated before anything is written. After that the first
/// error aborts the run and files already written stay on disk.
pub fn run_pipeline(
    cfg: &PipelineConfig,
    provider: Option<&dyn DataProvider>,
) -> Result<PipelineSummary, PipelineError> {
    cfg.validate()?;
    std::fs::create_dir_all(&cfg.data_dir).map_err(|source| PipelineError::DataDir {
        path: cfg.data_dir.clone(),
        source,
    })?;

    let mut datasets = Vec::with_capacity(3);

    info!(symbol = %cfg.live.symbol, "[1/3] acquiring primary dataset");
    let (outcome, report) = acquire_and_emit(provider, &cfg.live, &cfg.fallback, &cfg.primary_path())?;
    let primary_name = match &outcome {
        AcquisitionOutcome::Live { provider } => provider.clone(),
        AcquisitionOutcome::Fallback { .. } => cfg.fallback.name.clone(),
    };
    datasets.push(DatasetSummary {
        name: primary_name,
        path: report.path,
        rows: report.rows,
        digest: report.digest,
        origin: outcome.origin(),
    });

    info!(name = %cfg.synthetic.name, "[2/3] generating synthetic dataset");
    let report = produce_synthetic(&cfg.synthetic, &cfg.synthetic_path())?;
    datasets.push(DatasetSummary {
        name: cfg.synthetic.name.clone(),
        path: report.path,
        rows: report.rows,
        digest: report.digest,
        origin: DatasetOrigin::Synthetic,
    });

    info!("[3/3] generating mock provider export");
    let report = produce_mock_export(
        &cfg.mock_export,
        cfg.mock_export.seed_source(),
        &cfg.mock_export_path(),
    )?;
    datasets.push(DatasetSummary {
        name: "Mock Provider".into(),
        path: report.path,
        rows: report.rows,
        digest: report.digest,
        origin: DatasetOrigin::MockProvider,
    });

    info!(datasets = datasets.len(), dir = %cfg.data_dir.display(), "data preparation complete");
    Ok(PipelineSummary { datasets })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            data_dir: dir.join("data"),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn offline_run_writes_three_datasets() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config_in(tmp.path());

        let summary = run_pipeline(&cfg, None).unwrap();
        let origins: Vec<_> = summary.datasets.iter().map(|d| d.origin).collect();
        assert_eq!(
            origins,
            vec![DatasetOrigin::Fallback, DatasetOrigin::Synthetic, DatasetOrigin::MockProvider]
        );
        assert!(!summary.primary_is_live());
        assert_eq!(summary.datasets[0].name, "Yahoo Backup");
        for d in &summary.datasets {
            assert!(d.path.exists(), "{} missing", d.path.display());
        }
        assert_eq!(summary.datasets[2].rows, 100);
    }

    #[test]
    fn invalid_config_fails_before_writing_anything() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config_in(tmp.path());
        cfg.mock_export.price_high = cfg.mock_export.price_low;

        let err = run_pipeline(&cfg, None).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(!cfg.data_dir.exists());

        let mut cfg = config_in(tmp.path());
        cfg.mock_export.price_low = f64::NAN;
        assert!(matches!(run_pipeline(&cfg, None), Err(PipelineError::Config(_))));
    }

    #[test]
    fn zero_mock_periods_is_rejected_not_written_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config_in(tmp.path());
        cfg.mock_export.periods = 0;

        let err = run_pipeline(&cfg, None).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(!cfg.mock_export_path().exists());
    }

    #[test]
    fn unusable_data_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let cfg = PipelineConfig {
            data_dir: blocker.join("data"),
            ..PipelineConfig::default()
        };
        let err = run_pipeline(&cfg, None).unwrap_err();
        assert!(matches!(err, PipelineError::DataDir { .. }));
    }
}
