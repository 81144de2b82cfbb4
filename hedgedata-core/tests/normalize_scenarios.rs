//! Normalization scenarios across provider layouts.

use chrono::NaiveDate;
use hedgedata_core::data::{
    normalize, ColumnKey, ColumnLayout, CsvProvider, DataProvider, NormalizationError, RawFrame,
};

fn trading_days(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
    (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
}

#[test]
fn hierarchical_adj_close_and_close_for_spy() {
    let n = 20;
    let index = trading_days(n);
    let adj: Vec<Option<f64>> = (0..n).map(|i| Some(380.0 + i as f64)).collect();
    let close: Vec<Option<f64>> = (0..n).map(|i| Some(390.0 + i as f64)).collect();

    let frame = RawFrame::hierarchical(index.clone())
        .with_column(ColumnKey::nested("Adj Close", "SPY"), adj.clone())
        .unwrap()
        .with_column(ColumnKey::nested("Close", "SPY"), close)
        .unwrap();

    let series = normalize(&frame).unwrap();
    assert_eq!(series.len(), frame.height());
    assert_eq!(series.dates().collect::<Vec<_>>(), index);
    assert_eq!(
        series.prices().map(Some).collect::<Vec<_>>(),
        adj,
        "prices must come from the Adj Close cross-section"
    );
}

#[test]
fn csv_export_normalizes_through_flat_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spy.csv");
    std::fs::write(
        &path,
        "Date,Close,Adj Close,Volume\n\
         2023-01-03,380.8,372.1,74850700\n\
         2023-01-04,383.8,,85934100\n\
         2023-01-05,379.4,370.8,76970500\n",
    )
    .unwrap();

    let frame = CsvProvider::new(&path)
        .fetch(
            "SPY",
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
    assert_eq!(frame.layout(), ColumnLayout::Flat);

    let series = normalize(&frame).unwrap();
    assert_eq!(series.prices().collect::<Vec<_>>(), vec![372.1, 370.8]);
}

#[test]
fn degenerate_inputs_are_the_only_failures() {
    assert_eq!(normalize(&RawFrame::empty()), Err(NormalizationError::EmptySource));

    let all_missing = RawFrame::hierarchical(trading_days(3))
        .with_column(ColumnKey::nested("Adj Close", "SPY"), vec![None; 3])
        .unwrap();
    assert_eq!(
        normalize(&all_missing),
        Err(NormalizationError::AllRowsInvalid { rows: 3 })
    );
}
