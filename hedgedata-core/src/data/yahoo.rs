//! Yahoo Finance data provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API and returns them as a
//! hierarchical `RawFrame` keyed by (field, symbol), the same shape recent
//! Yahoo client libraries hand back. One request per fetch, bounded by the
//! client timeout; there is no retry loop.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. Anything unexpected surfaces as `DataError` and the orchestrator
//! falls back to synthetic data.

use super::frame::{ColumnKey, RawFrame};
use super::provider::{DataError, DataProvider, DataSource};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

fn cell(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    timeout: Duration,
}

impl YahooProvider {
    /// Build a provider whose single request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        })
    }

    /// Point the provider at a different host (proxies, local mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the chart API URL for a symbol over `[start, end)`.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        format!(
            "{}/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true",
            self.base_url
        )
    }

    /// Parse the chart API response into a hierarchical frame.
    ///
    /// Columns follow the provider's alphabetical field order: `Adj Close`
    /// (only when the payload carries it), `Close`, `High`, `Low`, `Open`,
    /// `Volume`. Rows where every field is missing (holidays) are skipped.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<RawFrame, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let Some(data) = result.into_iter().next() else {
            return Ok(RawFrame::empty());
        };

        // No timestamps means Yahoo had nothing for the range.
        let Some(timestamps) = data.timestamp else {
            return Ok(RawFrame::empty());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut index = Vec::with_capacity(timestamps.len());
        let mut adj = Vec::new();
        let mut close = Vec::new();
        let mut high = Vec::new();
        let mut low = Vec::new();
        let mut open = Vec::new();
        let mut volume = Vec::new();

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let row = [
                cell(&quote.close, i),
                cell(&quote.high, i),
                cell(&quote.low, i),
                cell(&quote.open, i),
                cell(&quote.volume, i),
            ];
            if row.iter().all(Option::is_none) {
                continue;
            }

            index.push(date);
            if let Some(adj_closes) = &adj_closes {
                adj.push(cell(adj_closes, i));
            }
            close.push(row[0]);
            high.push(row[1]);
            low.push(row[2]);
            open.push(row[3]);
            volume.push(row[4]);
        }

        let mut frame = RawFrame::hierarchical(index);
        if adj_closes.is_some() {
            frame.push_column(ColumnKey::nested("Adj Close", symbol), adj)?;
        }
        frame.push_column(ColumnKey::nested("Close", symbol), close)?;
        frame.push_column(ColumnKey::nested("High", symbol), high)?;
        frame.push_column(ColumnKey::nested("Low", symbol), low)?;
        frame.push_column(ColumnKey::nested("Open", symbol), open)?;
        frame.push_column(ColumnKey::nested("Volume", symbol), volume)?;
        Ok(frame)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame, DataError> {
        let url = self.chart_url(symbol, start, end);
        debug!(%url, "requesting chart");

        let resp = self.client.get(&url).send().map_err(|e| {
            if e.is_timeout() {
                DataError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                DataError::NetworkUnreachable(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            if e.is_timeout() {
                DataError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            }
        })?;

        Self::parse_response(symbol, chart)
    }
}
