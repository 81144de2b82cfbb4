//! Raw provider result, before normalization.
//!
//! Providers hand back tables in more than one shape: flat single-level
//! columns (`"Adj Close"`, `"Close"`, ...) or a two-level hierarchical index
//! keyed first by field and then by instrument (`("Adj Close", "SPY")`).
//! `RawFrame` models both so the normalizer can sniff the layout.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Column layout of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    Flat,
    Hierarchical,
}

/// Column key. `instrument` is set exactly when the frame is hierarchical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub field: String,
    pub instrument: Option<String>,
}

impl ColumnKey {
    pub fn flat(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            instrument: None,
        }
    }

    pub fn nested(field: impl Into<String>, instrument: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            instrument: Some(instrument.into()),
        }
    }

    pub fn layout(&self) -> ColumnLayout {
        if self.instrument.is_some() {
            ColumnLayout::Hierarchical
        } else {
            ColumnLayout::Flat
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instrument {
            Some(inst) => write!(f, "({}, {})", self.field, inst),
            None => write!(f, "{}", self.field),
        }
    }
}

/// A single numeric column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub key: ColumnKey,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("column {key} has {actual} values but the index has {expected} rows")]
    LengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("column {key} does not match the frame's {layout:?} layout")]
    LayoutMismatch { key: String, layout: ColumnLayout },
}

/// Tabular provider response: a date index plus numeric columns in one layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    layout: ColumnLayout,
    index: Vec<NaiveDate>,
    columns: Vec<RawColumn>,
}

impl RawFrame {
    pub fn new(layout: ColumnLayout, index: Vec<NaiveDate>) -> Self {
        Self {
            layout,
            index,
            columns: Vec::new(),
        }
    }

    pub fn flat(index: Vec<NaiveDate>) -> Self {
        Self::new(ColumnLayout::Flat, index)
    }

    pub fn hierarchical(index: Vec<NaiveDate>) -> Self {
        Self::new(ColumnLayout::Hierarchical, index)
    }

    /// An empty response (no rows, no columns).
    pub fn empty() -> Self {
        Self::flat(Vec::new())
    }

    /// Append a column, checking its key layout and length.
    pub fn push_column(&mut self, key: ColumnKey, values: Vec<Option<f64>>) -> Result<(), FrameError> {
        if key.layout() != self.layout {
            return Err(FrameError::LayoutMismatch {
                key: key.to_string(),
                layout: self.layout,
            });
        }
        if values.len() != self.index.len() {
            return Err(FrameError::LengthMismatch {
                key: key.to_string(),
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        self.columns.push(RawColumn { key, values });
        Ok(())
    }

    /// Builder form of [`push_column`](Self::push_column).
    pub fn with_column(mut self, key: ColumnKey, values: Vec<Option<f64>>) -> Result<Self, FrameError> {
        self.push_column(key, values)?;
        Ok(self)
    }

    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Flat layout: the column with this exact name.
    pub fn column(&self, field: &str) -> Option<&RawColumn> {
        self.columns
            .iter()
            .find(|c| c.key.instrument.is_none() && c.key.field == field)
    }

    /// Hierarchical layout: every instrument column under `field`, in frame order.
    pub fn cross_section(&self, field: &str) -> Vec<&RawColumn> {
        self.columns
            .iter()
            .filter(|c| c.key.instrument.is_some() && c.key.field == field)
            .collect()
    }
}
