//! Dataset emitter: the single point where a series becomes a durable file.
//!
//! Output is comma-separated with a header row, present even when there are no
//! data rows, and is always written from
//! scratch: an existing file at the destination is truncated, never appended
//! to. Any write failure is returned to the caller and is not recovered.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{CanonicalSeries, MarketRecord, ProviderExportRow, ScenarioParams};

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode CSV for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// What was written, for logging and summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitReport {
    pub path: PathBuf,
    pub rows: usize,
    /// BLAKE3 hex digest of the bytes written.
    pub digest: String,
}

/// Broadcast the scenario parameters onto every point of the series.
pub fn to_records(series: &CanonicalSeries, scenario: ScenarioParams) -> Vec<MarketRecord> {
    series
        .points()
        .iter()
        .map(|p| MarketRecord {
            date: p.date,
            spot: p.price,
            rate: scenario.rate,
            vol: scenario.vol,
        })
        .collect()
}

/// Write `Date,Spot,Rate,Vol` rows for `series` to `path`.
pub fn emit(
    series: &CanonicalSeries,
    scenario: ScenarioParams,
    path: &Path,
) -> Result<EmitReport, EmitError> {
    emit_table(&to_records(series, scenario), &MarketRecord::HEADERS, path)
}

/// Write the alternate-provider export schema to `path`.
pub fn emit_provider_export(rows: &[ProviderExportRow], path: &Path) -> Result<EmitReport, EmitError> {
    emit_table(rows, &ProviderExportRow::HEADERS, path)
}

/// Serialize rows to CSV in memory under an explicit header, then replace the
/// destination in one write.
///
/// `headers` must list the serialized field names of `T` in order.
pub fn emit_table<T: Serialize>(
    rows: &[T],
    headers: &[&str],
    path: &Path,
) -> Result<EmitReport, EmitError> {
    let encode_err = |source: csv::Error| EmitError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(headers).map_err(encode_err)?;
    for row in rows {
        wtr.serialize(row).map_err(encode_err)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| EmitError::Write {
            path: path.to_path_buf(),
            source: e.into_error(),
        })?;

    std::fs::write(path, &bytes).map_err(|source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    let digest = blake3::hash(&bytes).to_hex().to_string();
    debug!(path = %path.display(), rows = rows.len(), %digest, "dataset written");

    Ok(EmitReport {
        path: path.to_path_buf(),
        rows: rows.len(),
        digest,
    })
}
