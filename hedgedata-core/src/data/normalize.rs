//! Source normalizer: RawFrame → CanonicalSeries.
//!
//! Price column selection is an explicit ordered list of strategies. The first
//! strategy that finds a column wins. The default list prefers the adjusted
//! close and falls back to the first positional column, so a missing preferred
//! field never fails normalization on its own; only empty or fully invalid
//! input does.

use thiserror::Error;
use tracing::debug;

use super::frame::{ColumnLayout, RawColumn, RawFrame};
use crate::domain::{CanonicalSeries, PricePoint};

/// Field preferred as the price column.
pub const ADJ_CLOSE: &str = "Adj Close";

#[derive(Debug, Error, PartialEq)]
pub enum NormalizationError {
    #[error("source returned no rows")]
    EmptySource,

    #[error("no extraction strategy found a price column")]
    NoPriceColumn,

    #[error("all {rows} rows have a missing or invalid price")]
    AllRowsInvalid { rows: usize },
}

/// One way of picking the price column out of a raw frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Select a field by name. Hierarchical frames take the field's
    /// cross-section over all instruments and use its first column when more
    /// than one instrument is present.
    PreferredField(String),
    /// The first column of the frame, whatever its name.
    FirstPositional,
}

impl ExtractionStrategy {
    pub fn extract<'a>(&self, frame: &'a RawFrame) -> Option<&'a RawColumn> {
        match self {
            ExtractionStrategy::PreferredField(field) => match frame.layout() {
                ColumnLayout::Flat => frame.column(field),
                ColumnLayout::Hierarchical => frame.cross_section(field).into_iter().next(),
            },
            ExtractionStrategy::FirstPositional => frame.columns().first(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            ExtractionStrategy::PreferredField(field) => format!("field '{field}'"),
            ExtractionStrategy::FirstPositional => "first positional column".into(),
        }
    }
}

/// Best-effort normalizer driven by an ordered strategy list.
#[derive(Debug, Clone)]
pub struct Normalizer {
    strategies: Vec<ExtractionStrategy>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(vec![
            ExtractionStrategy::PreferredField(ADJ_CLOSE.into()),
            ExtractionStrategy::FirstPositional,
        ])
    }
}

impl Normalizer {
    pub fn new(strategies: Vec<ExtractionStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[ExtractionStrategy] {
        &self.strategies
    }

    /// Pick the price column with the first matching strategy.
    pub fn select<'a>(
        &self,
        frame: &'a RawFrame,
    ) -> Option<(&ExtractionStrategy, &'a RawColumn)> {
        self.strategies
            .iter()
            .find_map(|s| s.extract(frame).map(|col| (s, col)))
    }

    /// Select a price column and keep the rows that carry a usable price.
    ///
    /// Missing, non-finite and non-positive prices are all dropped.
    pub fn normalize(&self, raw: &RawFrame) -> Result<CanonicalSeries, NormalizationError> {
        if raw.is_empty() {
            return Err(NormalizationError::EmptySource);
        }

        let (strategy, column) = self.select(raw).ok_or(NormalizationError::NoPriceColumn)?;
        debug!(strategy = %strategy.name(), column = %column.key, "selected price column");

        let mut points: Vec<PricePoint> = raw
            .index()
            .iter()
            .zip(&column.values)
            .filter_map(|(&date, value)| match value {
                Some(price) if price.is_finite() && *price > 0.0 => Some(PricePoint {
                    date,
                    price: *price,
                }),
                _ => None,
            })
            .collect();

        if points.is_empty() {
            return Err(NormalizationError::AllRowsInvalid { rows: raw.height() });
        }

        // Stable sort keeps the first occurrence of a repeated date in front.
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);

        let dropped = raw.height() - points.len();
        if dropped > 0 {
            debug!(dropped, kept = points.len(), "dropped rows without a usable price");
        }

        CanonicalSeries::new(points).map_err(|_| NormalizationError::AllRowsInvalid {
            rows: raw.height(),
        })
    }
}

/// Normalize with the default strategy list.
///
/// Rows whose price is missing, non-finite or non-positive are dropped.
pub fn normalize(raw: &RawFrame) -> Result<CanonicalSeries, NormalizationError> {
    Normalizer::default().normalize(raw)
}
