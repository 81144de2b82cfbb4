//! Delta-hedging backtest over the prepared datasets.
//!
//! A short position in one European option is hedged daily: on the first
//! usable row the premium is received as cash and the model delta is bought,
//! and on every later row the stock position is rebalanced to the new delta
//! out of cash. The hedging error of a row is the self-financing portfolio
//! value minus the model's option value. Cash earns no interest.
//!
//! Each (dataset, model) pair writes `result_<model>_<dataset>.csv`, the input
//! of [`crate::metrics::summarize_logs`].

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use hedgedata_core::{
    emit_table, EmitError, MarketInputs, MarketRecord, PricingError, PricingModel,
    ProviderExportRow, VanillaOption,
};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PipelineConfig};
use crate::metrics::HEDGING_ERROR_COLUMN;

/// Calendar days per year for time to expiry.
pub const DAYS_PER_YEAR: f64 = 365.25;

pub const HEDGE_LOG_HEADERS: [&str; 9] = [
    "Date",
    "Spot",
    "T",
    "OptionPrice",
    "Delta",
    "StockPos",
    "Cash",
    "PortfolioValue",
    HEDGING_ERROR_COLUMN,
];

/// Stripped from dataset file stems when naming logs.
const DATASET_STEM_PREFIX: &str = "market_data_";

#[derive(Debug, Error)]
pub enum HedgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("failed to create logs directory {path}: {source}")]
    LogsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("dataset {path} has an unrecognized header: {header}")]
    UnknownSchema { path: PathBuf, header: String },

    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Which of the two emitted layouts a dataset uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatasetSchema {
    /// `Date,Spot,Rate,Vol` with decimal rate and vol.
    Canonical,
    /// `DATE,PX_LAST,US_TREASURY_3M,VOLATILITY_30D` with percentages.
    ProviderExport,
}

impl DatasetSchema {
    pub fn detect(headers: &csv::StringRecord) -> Option<Self> {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        if names == MarketRecord::HEADERS {
            Some(Self::Canonical)
        } else if names == ProviderExportRow::HEADERS {
            Some(Self::ProviderExport)
        } else {
            None
        }
    }
}

/// Market inputs for one hedge date, in decimal units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HedgeInput {
    pub date: NaiveDate,
    pub spot: f64,
    pub rate: f64,
    pub vol: f64,
}

impl From<MarketRecord> for HedgeInput {
    fn from(r: MarketRecord) -> Self {
        Self {
            date: r.date,
            spot: r.spot,
            rate: r.rate,
            vol: r.vol,
        }
    }
}

impl From<ProviderExportRow> for HedgeInput {
    fn from(r: ProviderExportRow) -> Self {
        Self {
            date: r.date,
            spot: r.px_last,
            rate: r.treasury_3m / 100.0,
            vol: r.volatility_30d / 100.0,
        }
    }
}

/// One row of a hedge log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HedgeLogRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Spot")]
    pub spot: f64,
    /// Years to expiry.
    #[serde(rename = "T")]
    pub expiry: f64,
    #[serde(rename = "OptionPrice")]
    pub option_price: f64,
    #[serde(rename = "Delta")]
    pub delta: f64,
    #[serde(rename = "StockPos")]
    pub stock_pos: f64,
    #[serde(rename = "Cash")]
    pub cash: f64,
    #[serde(rename = "PortfolioValue")]
    pub portfolio_value: f64,
    #[serde(rename = "HedgingError")]
    pub hedging_error: f64,
}

/// What one (dataset, model) backtest wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HedgeRun {
    pub model: String,
    pub dataset: String,
    pub log_path: PathBuf,
    pub rows: usize,
    pub digest: String,
    /// Hedging error on the last logged date.
    pub final_error: Option<f64>,
}

/// Read a dataset in either emitted layout.
///
/// Rows that fail to parse are skipped and counted in a warning.
pub fn read_hedge_inputs(path: &Path) -> Result<(DatasetSchema, Vec<HedgeInput>), HedgeError> {
    let read_err = |source: csv::Error| HedgeError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::Reader::from_path(path).map_err(read_err)?;
    let headers = rdr.headers().map_err(read_err)?.clone();
    let schema = DatasetSchema::detect(&headers).ok_or_else(|| HedgeError::UnknownSchema {
        path: path.to_path_buf(),
        header: headers.iter().collect::<Vec<_>>().join(","),
    })?;

    let mut skipped = 0usize;
    let inputs: Vec<HedgeInput> = match schema {
        DatasetSchema::Canonical => rdr
            .deserialize::<MarketRecord>()
            .filter_map(|row| row.map_err(|_| skipped += 1).ok())
            .map(HedgeInput::from)
            .collect(),
        DatasetSchema::ProviderExport => rdr
            .deserialize::<ProviderExportRow>()
            .filter_map(|row| row.map_err(|_| skipped += 1).ok())
            .map(HedgeInput::from)
            .collect(),
    };
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped unparseable dataset rows");
    }
    Ok((schema, inputs))
}

/// Years from `date` to `expiry`; negative once expiry has passed.
pub fn years_to_expiry(date: NaiveDate, expiry: NaiveDate) -> f64 {
    (expiry - date).num_days() as f64 / DAYS_PER_YEAR
}

/// Run the self-financing hedge over `inputs` in order.
///
/// Stops at the first date past `expiry`. Rows the model cannot price
/// (non-positive spot or vol, non-finite values) are skipped.
pub fn simulate_hedge(
    model: &dyn PricingModel,
    option: &VanillaOption,
    expiry: NaiveDate,
    inputs: &[HedgeInput],
) -> Vec<HedgeLogRow> {
    let mut rows = Vec::with_capacity(inputs.len());
    let mut position: Option<(f64, f64)> = None;

    for input in inputs {
        let t = years_to_expiry(input.date, expiry);
        if t < 0.0 {
            break;
        }
        let market = MarketInputs {
            spot: input.spot,
            rate: input.rate,
            vol: input.vol,
            expiry: t,
        };
        if !market.is_priceable() {
            debug!(date = %input.date, "skipping unpriceable row");
            continue;
        }

        let price = model.price(option, &market);
        let delta = model.delta(option, &market);
        // Short the option: the premium opens the cash account.
        let (stock_pos, cash) = position.unwrap_or((0.0, price));
        let cash = cash - (delta - stock_pos) * input.spot;
        position = Some((delta, cash));

        let portfolio_value = cash + delta * input.spot;
        rows.push(HedgeLogRow {
            date: input.date,
            spot: input.spot,
            expiry: t,
            option_price: price,
            delta,
            stock_pos: delta,
            cash,
            portfolio_value,
            hedging_error: portfolio_value - price,
        });
    }
    rows
}

/// Log file name for one (model, dataset) pair.
pub fn hedge_log_name(model: &str, dataset: &str) -> String {
    format!("result_{model}_{dataset}.csv")
}

/// Short dataset label: the file stem without the `market_data_` prefix.
pub fn dataset_label(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_prefix(DATASET_STEM_PREFIX)
        .map(str::to_string)
        .unwrap_or(stem)
}

fn write_hedge_log(
    model: &dyn PricingModel,
    dataset: &str,
    rows: &[HedgeLogRow],
    logs_dir: &Path,
) -> Result<HedgeRun, HedgeError> {
    let log_path = logs_dir.join(hedge_log_name(model.name(), dataset));
    let report = emit_table(rows, &HEDGE_LOG_HEADERS, &log_path)?;
    let run = HedgeRun {
        model: model.name().to_string(),
        dataset: dataset.to_string(),
        log_path: report.path,
        rows: report.rows,
        digest: report.digest,
        final_error: rows.last().map(|r| r.hedging_error),
    };
    info!(model = %run.model, dataset = %run.dataset, rows = run.rows, "hedge log written");
    Ok(run)
}

/// Backtest one model over one dataset file and write its log into `logs_dir`.
pub fn run_hedge(
    model: &dyn PricingModel,
    option: &VanillaOption,
    expiry: NaiveDate,
    dataset: &Path,
    logs_dir: &Path,
) -> Result<HedgeRun, HedgeError> {
    let (_, inputs) = read_hedge_inputs(dataset)?;
    let rows = simulate_hedge(model, option, expiry, &inputs);
    write_hedge_log(model, &dataset_label(dataset), &rows, logs_dir)
}

/// Backtest every configured model over every prepared dataset.
///
/// Datasets that do not exist are skipped with a warning. The (dataset,
/// model) grid runs in parallel; results come back in dataset-major order.
pub fn run_hedging(cfg: &PipelineConfig) -> Result<Vec<HedgeRun>, HedgeError> {
    cfg.validate()?;
    let hedge = &cfg.hedge;
    let models = hedge.models()?;
    let option = hedge.contract();

    std::fs::create_dir_all(&hedge.logs_dir).map_err(|source| HedgeError::LogsDir {
        path: hedge.logs_dir.clone(),
        source,
    })?;

    let mut datasets = Vec::new();
    for path in cfg.dataset_paths() {
        if !path.is_file() {
            warn!(path = %path.display(), "dataset missing, not hedged");
            continue;
        }
        let (schema, inputs) = read_hedge_inputs(&path)?;
        debug!(path = %path.display(), ?schema, rows = inputs.len(), "dataset loaded");
        datasets.push((dataset_label(&path), inputs));
    }

    let jobs: Vec<(&str, &[HedgeInput], &dyn PricingModel)> = datasets
        .iter()
        .flat_map(|(label, inputs)| {
            models
                .iter()
                .map(move |m| (label.as_str(), inputs.as_slice(), m.as_ref()))
        })
        .collect();

    info!(jobs = jobs.len(), strike = hedge.strike, expiry = %hedge.expiry, "running hedging backtests");
    jobs.par_iter()
        .map(|(label, inputs, model)| {
            let rows = simulate_hedge(*model, &option, hedge.expiry, inputs);
            write_hedge_log(*model, label, &rows, &hedge.logs_dir)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedgedata_core::{BlackScholes, OptionKind};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn input(date: NaiveDate, spot: f64) -> HedgeInput {
        HedgeInput {
            date,
            spot,
            rate: 0.045,
            vol: 0.2,
        }
    }

    #[test]
    fn first_row_is_fully_hedged() {
        let option = VanillaOption::call(100.0);
        let rows = simulate_hedge(&BlackScholes, &option, d(2024, 12, 30), &[input(d(2023, 1, 1), 100.0)]);

        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert!((r.cash - (r.option_price - r.delta * 100.0)).abs() < 1e-9);
        assert!(r.hedging_error.abs() < 1e-9);
        assert_eq!(r.stock_pos, r.delta);
    }

    #[test]
    fn rebalancing_is_self_financing() {
        let option = VanillaOption::call(100.0);
        let inputs = [
            input(d(2023, 1, 1), 100.0),
            input(d(2023, 1, 2), 103.0),
            input(d(2023, 1, 3), 98.0),
        ];
        let rows = simulate_hedge(&BlackScholes, &option, d(2024, 12, 30), &inputs);

        for pair in rows.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let expected_cash = prev.cash - (next.delta - prev.stock_pos) * next.spot;
            assert!((next.cash - expected_cash).abs() < 1e-9);
            assert!((next.portfolio_value - (next.cash + next.stock_pos * next.spot)).abs() < 1e-9);
            assert!((next.hedging_error - (next.portfolio_value - next.option_price)).abs() < 1e-12);
        }
    }

    #[test]
    fn stops_after_expiry_and_skips_unpriceable_rows() {
        let option = VanillaOption::put(100.0);
        let expiry = d(2023, 1, 3);
        let inputs = [
            input(d(2023, 1, 1), 100.0),
            HedgeInput { vol: 0.0, ..input(d(2023, 1, 2), 101.0) },
            input(d(2023, 1, 3), 99.0),
            input(d(2023, 1, 4), 98.0),
        ];
        let rows = simulate_hedge(&BlackScholes, &option, expiry, &inputs);

        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2023, 1, 1), d(2023, 1, 3)]);
        // Expiry day: intrinsic value, hedge unwound.
        assert_eq!(rows[1].option_price, 1.0);
        assert_eq!(rows[1].delta, 0.0);
        assert_eq!(rows[1].expiry, 0.0);
    }

    #[test]
    fn provider_export_percentages_become_decimals() {
        let row = ProviderExportRow {
            date: d(2023, 6, 1),
            px_last: 155.0,
            treasury_3m: 5.0,
            volatility_30d: 20.0,
        };
        let input = HedgeInput::from(row);
        assert_eq!(input.spot, 155.0);
        assert!((input.rate - 0.05).abs() < 1e-15);
        assert!((input.vol - 0.2).abs() < 1e-15);
    }

    #[test]
    fn detects_both_schemas() {
        let canonical = csv::StringRecord::from(vec!["Date", "Spot", "Rate", "Vol"]);
        let export = csv::StringRecord::from(vec!["DATE", "PX_LAST", "US_TREASURY_3M", "VOLATILITY_30D"]);
        let other = csv::StringRecord::from(vec!["Date", "Close"]);
        assert_eq!(DatasetSchema::detect(&canonical), Some(DatasetSchema::Canonical));
        assert_eq!(DatasetSchema::detect(&export), Some(DatasetSchema::ProviderExport));
        assert_eq!(DatasetSchema::detect(&other), None);
    }

    #[test]
    fn log_names_use_short_dataset_labels() {
        assert_eq!(dataset_label(Path::new("data/market_data_yfinance.csv")), "yfinance");
        assert_eq!(dataset_label(Path::new("data/bloomberg_export.csv")), "bloomberg_export");
        assert_eq!(hedge_log_name("Binomial", "synthetic"), "result_Binomial_synthetic.csv");
    }

    #[test]
    fn year_fraction_uses_calendar_days() {
        assert!((years_to_expiry(d(2023, 12, 30), d(2024, 12, 30)) - 366.0 / 365.25).abs() < 1e-15);
        assert!(years_to_expiry(d(2025, 1, 1), d(2024, 12, 30)) < 0.0);
    }

    #[test]
    fn unknown_dataset_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.csv");
        std::fs::write(&path, "Date,Close\n2023-01-01,1.0\n").unwrap();
        let err = read_hedge_inputs(&path).unwrap_err();
        assert!(matches!(err, HedgeError::UnknownSchema { .. }));
    }

    #[test]
    fn bad_rows_are_skipped_when_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market_data_mixed.csv");
        std::fs::write(
            &path,
            "Date,Spot,Rate,Vol\n2023-01-01,100.0,0.045,0.2\nnot-a-date,1,2,3\n2023-01-03,101.0,0.045,0.2\n",
        )
        .unwrap();
        let (schema, inputs) = read_hedge_inputs(&path).unwrap();
        assert_eq!(schema, DatasetSchema::Canonical);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[1].spot, 101.0);
    }

    #[test]
    fn hedge_log_has_fixed_header() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("market_data_tiny.csv");
        std::fs::write(&dataset, "Date,Spot,Rate,Vol\n2023-01-01,100.0,0.045,0.2\n").unwrap();
        let option = VanillaOption {
            strike: 100.0,
            kind: OptionKind::Call,
        };

        let run = run_hedge(&BlackScholes, &option, d(2024, 12, 30), &dataset, dir.path()).unwrap();
        assert_eq!(run.log_path, dir.path().join("result_BlackScholes_tiny.csv"));
        assert_eq!(run.rows, 1);
        let content = std::fs::read_to_string(&run.log_path).unwrap();
        assert!(content.starts_with(
            "Date,Spot,T,OptionPrice,Delta,StockPos,Cash,PortfolioValue,HedgingError\n2023-01-01,100.0,"
        ));
    }
}
