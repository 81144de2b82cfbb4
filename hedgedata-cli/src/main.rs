//! hedgedata CLI: prepare datasets, generate synthetic paths, run the hedging
//! backtest, summarize logs.
//!
//! Commands:
//! - `prepare`: acquire the primary dataset (live or fallback), then write the
//!   synthetic dataset and the mock provider export
//! - `generate`: write one seeded synthetic dataset
//! - `hedge`: delta-hedge an option over every prepared dataset with each
//!   pricing model, writing `result_<model>_<dataset>.csv` logs
//! - `metrics`: summarize `result_*.csv` hedging logs

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hedgedata_core::data::{CsvProvider, DataProvider, YahooProvider};
use hedgedata_core::{emit, synthetic_series, GenerationParams, ScenarioParams};
use hedgedata_core::OptionKind;
use hedgedata_runner::{
    format_summary_table, run_hedging, run_pipeline, summarize_logs, PipelineConfig,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "hedgedata",
    about = "hedgedata: market data preparation for hedging simulations"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the primary, synthetic, and mock provider datasets.
    Prepare {
        /// TOML config overriding the compiled-in defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory. Overrides the config's data_dir.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Skip the live source and write the fallback dataset.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Live source: `yahoo` or `csv:<path>`.
        #[arg(long, default_value = "yahoo", value_parser = parse_source)]
        source: SourceArg,

        /// Symbol to fetch. Overrides the config.
        #[arg(long)]
        symbol: Option<String>,

        /// Seed for the mock provider export. Unseeded by default.
        #[arg(long)]
        mock_seed: Option<u64>,

        /// Print the run summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate a single synthetic dataset.
    Generate {
        #[arg(long, default_value_t = 100.0)]
        start_price: f64,

        /// Annualized volatility.
        #[arg(long, default_value_t = 0.2)]
        vol: f64,

        #[arg(long, default_value_t = 252)]
        days: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// First date (YYYY-MM-DD).
        #[arg(long, default_value = "2023-01-01")]
        start_date: String,

        /// Risk-free rate written to every row.
        #[arg(long, default_value_t = 0.045)]
        rate: f64,

        #[arg(long, default_value = "data/market_data_synthetic.csv")]
        output: PathBuf,
    },
    /// Delta-hedge an option over the prepared datasets.
    Hedge {
        /// TOML config overriding the compiled-in defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding the prepared datasets. Overrides the config.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Directory the hedge logs are written into. Overrides the config.
        #[arg(long)]
        logs_dir: Option<PathBuf>,

        #[arg(long)]
        strike: Option<f64>,

        /// Option expiry (YYYY-MM-DD).
        #[arg(long)]
        expiry: Option<String>,

        /// Hedge a put instead of a call.
        #[arg(long, default_value_t = false)]
        put: bool,

        /// Print the written logs as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Summarize hedging error logs.
    Metrics {
        #[arg(long, default_value = "logs")]
        logs_dir: PathBuf,

        /// Print summaries as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum SourceArg {
    Yahoo,
    Csv(PathBuf),
}

fn parse_source(s: &str) -> std::result::Result<SourceArg, String> {
    match s.split_once(':') {
        None if s.eq_ignore_ascii_case("yahoo") => Ok(SourceArg::Yahoo),
        Some((kind, path)) if kind.eq_ignore_ascii_case("csv") && !path.is_empty() => {
            Ok(SourceArg::Csv(PathBuf::from(path)))
        }
        _ => Err(format!("unknown source '{s}'. Valid: yahoo, csv:<path>")),
    }
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Prepare {
            config,
            data_dir,
            offline,
            source,
            symbol,
            mock_seed,
            json,
        } => run_prepare(config, data_dir, offline, source, symbol, mock_seed, json),
        Commands::Generate {
            start_price,
            vol,
            days,
            seed,
            start_date,
            rate,
            output,
        } => run_generate(start_price, vol, days, seed, &start_date, rate, output),
        Commands::Hedge {
            config,
            data_dir,
            logs_dir,
            strike,
            expiry,
            put,
            json,
        } => run_hedge(config, data_dir, logs_dir, strike, expiry.as_deref(), put, json),
        Commands::Metrics { logs_dir, json } => run_metrics(logs_dir, json),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    Ok(match path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    })
}

fn run_prepare(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    offline: bool,
    source: SourceArg,
    symbol: Option<String>,
    mock_seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut cfg = load_config(config_path.as_deref())?;
    if let Some(dir) = data_dir {
        cfg.data_dir = dir;
    }
    if let Some(symbol) = symbol {
        cfg.live.symbol = symbol;
    }
    if mock_seed.is_some() {
        cfg.mock_export.seed = mock_seed;
    }
    cfg.live.offline |= offline;
    cfg.validate()?;

    let provider: Option<Box<dyn DataProvider>> = if cfg.live.offline {
        None
    } else {
        match source {
            SourceArg::Yahoo => match YahooProvider::new(Duration::from_secs(cfg.live.timeout_secs)) {
                Ok(p) => Some(Box::new(p)),
                Err(e) => {
                    warn!(error = %e, "live provider unavailable, continuing offline");
                    None
                }
            },
            SourceArg::Csv(path) => Some(Box::new(CsvProvider::new(path))),
        }
    };

    let summary = run_pipeline(&cfg, provider.as_deref())
        .with_context(|| format!("data preparation into {} failed", cfg.data_dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{:<16} {:<14} {:>6}  {}", "Dataset", "Origin", "Rows", "Path");
        for d in &summary.datasets {
            println!(
                "{:<16} {:<14} {:>6}  {}",
                d.name,
                format!("{:?}", d.origin),
                d.rows,
                d.path.display()
            );
        }
    }
    Ok(())
}

fn run_generate(
    start_price: f64,
    vol: f64,
    days: usize,
    seed: u64,
    start_date: &str,
    rate: f64,
    output: PathBuf,
) -> Result<()> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .with_context(|| format!("invalid --start-date '{start_date}'"))?;
    if !rate.is_finite() {
        bail!("--rate must be finite, got {rate}");
    }

    let params = GenerationParams {
        start_price,
        annual_vol: vol,
        days,
        seed,
    };
    let series = synthetic_series(&params, start)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let report = emit(&series, ScenarioParams::new(rate, vol), &output)?;
    info!(path = %report.path.display(), rows = report.rows, digest = %report.digest, "synthetic dataset written");
    println!("{} rows written to {}", report.rows, report.path.display());
    Ok(())
}

fn run_hedge(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    logs_dir: Option<PathBuf>,
    strike: Option<f64>,
    expiry: Option<&str>,
    put: bool,
    json: bool,
) -> Result<()> {
    let mut cfg = load_config(config_path.as_deref())?;
    if let Some(dir) = data_dir {
        cfg.data_dir = dir;
    }
    if let Some(dir) = logs_dir {
        cfg.hedge.logs_dir = dir;
    }
    if let Some(strike) = strike {
        cfg.hedge.strike = strike;
    }
    if let Some(expiry) = expiry {
        cfg.hedge.expiry = NaiveDate::parse_from_str(expiry, "%Y-%m-%d")
            .with_context(|| format!("invalid --expiry '{expiry}'"))?;
    }
    if put {
        cfg.hedge.option = OptionKind::Put;
    }

    let runs = run_hedging(&cfg)
        .with_context(|| format!("hedging over {} failed", cfg.data_dir.display()))?;
    if runs.is_empty() {
        bail!("no datasets found in {}; run `hedgedata prepare` first", cfg.data_dir.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
    } else {
        println!("{:<14} {:<18} {:>6} {:>12}  {}", "Model", "Dataset", "Rows", "Final Error", "Log");
        for run in &runs {
            let final_error = run
                .final_error
                .map_or_else(|| "-".to_string(), |e| format!("{e:.4}"));
            println!(
                "{:<14} {:<18} {:>6} {:>12}  {}",
                run.model,
                run.dataset,
                run.rows,
                final_error,
                run.log_path.display()
            );
        }
    }
    Ok(())
}

fn run_metrics(logs_dir: PathBuf, json: bool) -> Result<()> {
    if !logs_dir.is_dir() {
        bail!("logs directory does not exist: {}", logs_dir.display());
    }
    let summaries = summarize_logs(&logs_dir)?;
    if summaries.is_empty() {
        println!("No result_*.csv logs found in {}", logs_dir.display());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print!("{}", format_summary_table(&summaries));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sources() {
        assert_eq!(parse_source("yahoo").unwrap(), SourceArg::Yahoo);
        assert_eq!(
            parse_source("csv:exports/spy.csv").unwrap(),
            SourceArg::Csv(PathBuf::from("exports/spy.csv"))
        );
        assert!(parse_source("csv:").is_err());
        assert!(parse_source("bloomberg").is_err());
    }

    #[test]
    fn hedge_flags_parse() {
        let cli = Cli::try_parse_from([
            "hedgedata", "hedge", "--strike", "95", "--expiry", "2024-06-28", "--put", "--log-file",
            "logs/system.log",
        ])
        .unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("logs/system.log")));
        match cli.command {
            Commands::Hedge { strike, expiry, put, .. } => {
                assert_eq!(strike, Some(95.0));
                assert_eq!(expiry.as_deref(), Some("2024-06-28"));
                assert!(put);
            }
            _ => panic!("expected hedge"),
        }
    }

    #[test]
    fn generate_rejects_oversized_day_count() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_generate(
            100.0,
            0.2,
            usize::MAX,
            42,
            "2023-01-01",
            0.045,
            dir.path().join("out.csv"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("exceeds the maximum"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
