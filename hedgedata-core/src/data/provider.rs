//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over live sources (Yahoo Finance, a CSV
//! export) so the orchestrator can swap implementations and tests can mock
//! them. A provider makes exactly one attempt per call.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::frame::{FrameError, RawFrame};

/// Structured error types for a live fetch.
///
/// Every variant is recoverable by the orchestrator's fallback path.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Where a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
    MockProvider,
}

/// Trait for live data providers.
///
/// `start` is inclusive and `end` exclusive. Implementations return the
/// provider's table as-is; schema repair is the normalizer's job.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Single fetch attempt for `symbol` over `[start, end)`.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame, DataError>;
}
