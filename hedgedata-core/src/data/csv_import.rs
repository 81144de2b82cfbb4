//! CSV import provider.
//!
//! Reads a flat provider export from disk: the first column is a date,
//! every other column is numeric. Blank or unparseable cells become missing
//! values; column selection is left to the normalizer.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::frame::{ColumnKey, RawFrame};
use super::provider::{DataError, DataProvider, DataSource};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Provider backed by a CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse a date cell, accepting a trailing time component (`2023-01-03 00:00:00`).
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let date_part = cell.trim().split([' ', 'T']).next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn parse_value(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a flat frame from any CSV source, keeping rows in `[start, end)`.
///
/// Rows whose date cell cannot be parsed are skipped.
pub fn read_flat_frame<R: std::io::Read>(
    reader: R,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RawFrame, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let fields: Vec<String> = rdr
        .headers()?
        .iter()
        .skip(1)
        .map(|h| h.trim().to_string())
        .collect();

    let mut index = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); fields.len()];

    for record in rdr.records() {
        let record = record?;
        let Some(date) = record.get(0).and_then(parse_date) else {
            continue;
        };
        if date < start || date >= end {
            continue;
        }
        index.push(date);
        for (j, column) in columns.iter_mut().enumerate() {
            column.push(record.get(j + 1).and_then(parse_value));
        }
    }

    let mut frame = RawFrame::flat(index);
    for (field, values) in fields.into_iter().zip(columns) {
        frame.push_column(ColumnKey::flat(field), values)?;
    }
    Ok(frame)
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    /// `symbol` is informational; the file holds a single instrument.
    fn fetch(&self, _symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame, DataError> {
        let file = std::fs::File::open(&self.path)?;
        read_flat_frame(file, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::ColumnLayout;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reads_flat_columns_and_filters_range() {
        let csv = "Date,Open,Adj Close\n\
                   2022-12-30,1.0,1.5\n\
                   2023-01-03,2.0,2.5\n\
                   2023-01-04 00:00:00,3.0,\n\
                   2024-01-01,4.0,4.5\n";

        let frame = read_flat_frame(csv.as_bytes(), d(2023, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(frame.layout(), ColumnLayout::Flat);
        assert_eq!(frame.index(), &[d(2023, 1, 3), d(2023, 1, 4)]);
        assert_eq!(frame.column("Open").unwrap().values, vec![Some(2.0), Some(3.0)]);
        assert_eq!(frame.column("Adj Close").unwrap().values, vec![Some(2.5), None]);
    }

    #[test]
    fn unparseable_dates_are_skipped() {
        let csv = "Date,Close\nnot-a-date,1.0\n01/05/2023,2.0\n";
        let frame = read_flat_frame(csv.as_bytes(), d(2023, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(frame.index(), &[d(2023, 1, 5)]);
    }

    #[test]
    fn header_only_file_is_empty() {
        let frame = read_flat_frame("Date,Close\n".as_bytes(), d(2023, 1, 1), d(2024, 1, 1)).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let provider = CsvProvider::new("/nonexistent/hedgedata/export.csv");
        let err = provider.fetch("SPY", d(2023, 1, 1), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
