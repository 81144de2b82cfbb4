//! Hedging log summary: per-model error statistics from `result_*.csv` logs.
//!
//! The hedging backtest ([`crate::hedge`]) writes one log per (dataset, model)
//! run with a `HedgingError` column. Each log is reduced to mean, sample standard
//! deviation and max absolute deviation. Logs that cannot be read or lack the
//! column are skipped with a warning rather than failing the whole summary.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Column read from every log.
pub const HEDGING_ERROR_COLUMN: &str = "HedgingError";
const LOG_PREFIX: &str = "result_";
const LOG_EXTENSION: &str = "csv";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no {HEDGING_ERROR_COLUMN} column")]
    MissingColumn { path: PathBuf },

    #[error("{path} row {row}: '{value}' is not a number")]
    NotNumeric {
        path: PathBuf,
        row: usize,
        value: String,
    },
}

/// Error statistics for one model log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HedgingSummary {
    /// File stem without the `result_` prefix.
    pub model: String,
    pub samples: usize,
    pub mean_error: f64,
    /// Sample standard deviation (n - 1); NaN below two samples.
    pub std_error: f64,
    pub max_abs_error: f64,
}

impl HedgingSummary {
    pub fn from_errors(model: impl Into<String>, errors: &[f64]) -> Self {
        Self {
            model: model.into(),
            samples: errors.len(),
            mean_error: mean_f64(errors),
            std_error: std_dev(errors),
            max_abs_error: errors
                .iter()
                .map(|e| e.abs())
                .fold(f64::NAN, f64::max),
        }
    }
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Model name for a log path, or `None` if the file is not a result log.
pub fn model_name(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(LOG_PREFIX).map(str::to_string)
}

/// Read the `HedgingError` column. Blank cells are skipped.
pub fn read_hedging_errors(path: &Path) -> Result<Vec<f64>, LogError> {
    let csv_err = |source| LogError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let col = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .position(|h| h.trim() == HEDGING_ERROR_COLUMN)
        .ok_or_else(|| LogError::MissingColumn {
            path: path.to_path_buf(),
        })?;

    let mut errors = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let cell = record.get(col).unwrap_or("").trim();
        if cell.is_empty() {
            continue;
        }
        let value = cell.parse::<f64>().map_err(|_| LogError::NotNumeric {
            path: path.to_path_buf(),
            row: row + 1,
            value: cell.to_string(),
        })?;
        errors.push(value);
    }
    Ok(errors)
}

/// Summarize every `result_*.csv` in `dir`, sorted by file name.
pub fn summarize_logs(dir: &Path) -> Result<Vec<HedgingSummary>, LogError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut logs: Vec<(String, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter_map(|p| model_name(&p).map(|name| (name, p)))
        .collect();
    logs.sort_by(|a, b| a.1.cmp(&b.1));

    let mut summaries = Vec::with_capacity(logs.len());
    for (model, path) in logs {
        match read_hedging_errors(&path) {
            Ok(errors) => summaries.push(HedgingSummary::from_errors(model, &errors)),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable hedging log"),
        }
    }
    Ok(summaries)
}

/// Render the fixed-width summary table.
pub fn format_summary_table(summaries: &[HedgingSummary]) -> String {
    let mut out = String::with_capacity(128 * (summaries.len() + 2));
    out.push_str(&format!(
        "{:<30} | {:<15} | {:<15} | {:<15}\n",
        "Model", "Mean Error ($)", "Error StdDev", "Max Deviation ($)"
    ));
    out.push_str(&"-".repeat(85));
    out.push('\n');
    for s in summaries {
        out.push_str(&format!(
            "{:<30} | {:>14.4} | {:>14.4} | {:>14.4}\n",
            s.model, s.mean_error, s.std_error, s.max_abs_error
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn summary_statistics() {
        let s = HedgingSummary::from_errors("BlackScholes", &[1.0, -3.0, 2.0]);
        assert_eq!(s.samples, 3);
        assert_approx(s.mean_error, 0.0);
        assert_approx(s.std_error, (7.0_f64).sqrt());
        assert_eq!(s.max_abs_error, 3.0);
    }

    #[test]
    fn single_sample_has_undefined_std() {
        let s = HedgingSummary::from_errors("m", &[2.5]);
        assert_eq!(s.mean_error, 2.5);
        assert!(s.std_error.is_nan());
        assert_eq!(s.max_abs_error, 2.5);
    }

    #[test]
    fn empty_log_is_all_nan() {
        let s = HedgingSummary::from_errors("m", &[]);
        assert!(s.mean_error.is_nan());
        assert!(s.max_abs_error.is_nan());
    }

    #[test]
    fn model_name_requires_prefix_and_extension() {
        assert_eq!(
            model_name(Path::new("logs/result_MonteCarlo_yfinance.csv")),
            Some("MonteCarlo_yfinance".into())
        );
        assert_eq!(model_name(Path::new("logs/system.log")), None);
        assert_eq!(model_name(Path::new("logs/summary.csv")), None);
        assert_eq!(model_name(Path::new("logs/result_x.txt")), None);
    }

    #[test]
    fn table_has_header_rule_and_rows() {
        let table = format_summary_table(&[HedgingSummary::from_errors("Binomial", &[1.0, 2.0])]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Model"));
        assert_eq!(lines[1], "-".repeat(85));
        assert!(lines[2].starts_with("Binomial"));
        assert!(lines[2].contains("1.5000"));
    }
}
