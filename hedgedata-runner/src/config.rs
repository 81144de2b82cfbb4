//! Serializable pipeline configuration.
//!
//! `PipelineConfig::default()` carries the compiled-in constants: symbol,
//! date ranges, seeds, start prices, volatilities and output file names. A
//! TOML file may override any subset of them, down to a single key inside a
//! section; omitted keys keep their defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use hedgedata_core::{
    BinomialTree, BlackScholes, GenerationParams, MonteCarlo, OptionKind, PricingError,
    PricingModel, ScenarioParams, SeedSource, VanillaOption,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PipelineConfigFile")]
pub struct PipelineConfig {
    /// Directory every dataset is written into (created if missing).
    pub data_dir: PathBuf,
    pub live: LiveSourceConfig,
    pub fallback: SyntheticProfile,
    pub synthetic: SyntheticProfile,
    pub mock_export: MockExportConfig,
    pub hedge: HedgeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            live: LiveSourceConfig::default(),
            fallback: SyntheticProfile {
                name: "Yahoo Backup".into(),
                file_name: "market_data_yfinance.csv".into(),
                params: GenerationParams::yearly(400.0, 0.15, 42),
                start_date: ymd(2023, 1, 1),
                scenario: ScenarioParams::new(0.045, 0.15),
            },
            synthetic: SyntheticProfile {
                name: "Synthetic".into(),
                file_name: "market_data_synthetic.csv".into(),
                params: GenerationParams::yearly(100.0, 0.2, 42),
                start_date: ymd(2023, 1, 1),
                scenario: ScenarioParams::new(0.045, 0.2),
            },
            mock_export: MockExportConfig::default(),
            hedge: HedgeConfig::default(),
        }
    }
}

/// On-disk shape of [`PipelineConfig`]: every key optional.
///
/// Profile sections merge key by key onto their own compiled-in profile, so
/// `[fallback]` with only `start_price` keeps the fallback's name, seed and
/// file name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PipelineConfigFile {
    data_dir: Option<PathBuf>,
    live: Option<LiveSourceConfig>,
    fallback: ProfileOverrides,
    synthetic: ProfileOverrides,
    mock_export: Option<MockExportConfig>,
    hedge: Option<HedgeConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileOverrides {
    name: Option<String>,
    file_name: Option<String>,
    start_price: Option<f64>,
    annual_vol: Option<f64>,
    days: Option<usize>,
    seed: Option<u64>,
    start_date: Option<NaiveDate>,
    scenario: ScenarioOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScenarioOverrides {
    rate: Option<f64>,
    vol: Option<f64>,
}

impl ProfileOverrides {
    fn apply(self, base: SyntheticProfile) -> SyntheticProfile {
        SyntheticProfile {
            name: self.name.unwrap_or(base.name),
            file_name: self.file_name.unwrap_or(base.file_name),
            params: GenerationParams {
                start_price: self.start_price.unwrap_or(base.params.start_price),
                annual_vol: self.annual_vol.unwrap_or(base.params.annual_vol),
                days: self.days.unwrap_or(base.params.days),
                seed: self.seed.unwrap_or(base.params.seed),
            },
            start_date: self.start_date.unwrap_or(base.start_date),
            scenario: ScenarioParams::new(
                self.scenario.rate.unwrap_or(base.scenario.rate),
                self.scenario.vol.unwrap_or(base.scenario.vol),
            ),
        }
    }
}

impl From<PipelineConfigFile> for PipelineConfig {
    fn from(file: PipelineConfigFile) -> Self {
        let base = PipelineConfig::default();
        Self {
            data_dir: file.data_dir.unwrap_or(base.data_dir),
            live: file.live.unwrap_or(base.live),
            fallback: file.fallback.apply(base.fallback),
            synthetic: file.synthetic.apply(base.synthetic),
            mock_export: file.mock_export.unwrap_or(base.mock_export),
            hedge: file.hedge.unwrap_or(base.hedge),
        }
    }
}

/// The single live source attempted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSourceConfig {
    pub symbol: String,
    /// Inclusive.
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    /// Upper bound on the blocking fetch.
    pub timeout_secs: u64,
    /// Skip the live attempt entirely and go straight to the fallback.
    pub offline: bool,
}

impl Default for LiveSourceConfig {
    fn default() -> Self {
        Self {
            symbol: "SPY".into(),
            start: ymd(2023, 1, 1),
            end: ymd(2024, 1, 1),
            timeout_secs: 30,
            offline: false,
        }
    }
}

/// A seeded synthetic dataset: generation parameters plus where and how it
/// is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticProfile {
    /// Label used in log messages.
    pub name: String,
    pub file_name: String,
    #[serde(flatten)]
    pub params: GenerationParams,
    pub start_date: NaiveDate,
    pub scenario: ScenarioParams,
}

/// Mock alternate-provider export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockExportConfig {
    pub file_name: String,
    pub start_date: NaiveDate,
    pub periods: usize,
    /// Half-open `[low, high)` range for the uniformly sampled last price.
    pub price_low: f64,
    pub price_high: f64,
    pub treasury_3m: f64,
    pub volatility_30d: f64,
    /// Unset by default: the export differs run to run.
    pub seed: Option<u64>,
}

impl Default for MockExportConfig {
    fn default() -> Self {
        Self {
            file_name: "bloomberg_export.csv".into(),
            start_date: ymd(2023, 6, 1),
            periods: 100,
            price_low: 150.0,
            price_high: 160.0,
            treasury_3m: 5.0,
            volatility_30d: 20.0,
            seed: None,
        }
    }
}

impl MockExportConfig {
    pub fn seed_source(&self) -> SeedSource {
        SeedSource::from(self.seed)
    }

    /// True when `[price_low, price_high)` is a finite, non-empty interval.
    pub fn price_range_is_valid(&self) -> bool {
        self.price_low.is_finite()
            && self.price_high.is_finite()
            && self.price_low < self.price_high
            && (self.price_high - self.price_low).is_finite()
    }
}

/// Delta-hedging backtest over the prepared datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HedgeConfig {
    /// Directory the `result_<model>_<dataset>.csv` logs are written into.
    pub logs_dir: PathBuf,
    pub strike: f64,
    pub expiry: NaiveDate,
    pub option: OptionKind,
    pub binomial_steps: usize,
    pub mc_paths: usize,
    pub mc_steps: usize,
    pub mc_seed: u64,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            strike: 100.0,
            expiry: ymd(2024, 12, 30),
            option: OptionKind::Call,
            binomial_steps: 100,
            mc_paths: 5000,
            mc_steps: 252,
            mc_seed: 42,
        }
    }
}

impl HedgeConfig {
    pub fn contract(&self) -> VanillaOption {
        VanillaOption {
            strike: self.strike,
            kind: self.option,
        }
    }

    /// The three pricing models the backtest runs, in log order.
    pub fn models(&self) -> Result<Vec<Box<dyn PricingModel>>, PricingError> {
        let models: Vec<Box<dyn PricingModel>> = vec![
            Box::new(BlackScholes),
            Box::new(BinomialTree::new(self.binomial_steps)?),
            Box::new(MonteCarlo::new(self.mc_paths, self.mc_steps, self.mc_seed)?),
        ];
        Ok(models)
    }
}

impl PipelineConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.live.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("live.symbol is empty".into()));
        }
        if self.live.start >= self.live.end {
            return Err(ConfigError::Invalid(format!(
                "live range is empty: start {} is not before end {}",
                self.live.start, self.live.end
            )));
        }
        if self.live.timeout_secs == 0 {
            return Err(ConfigError::Invalid("live.timeout_secs must be positive".into()));
        }
        for (section, profile) in [("fallback", &self.fallback), ("synthetic", &self.synthetic)] {
            profile
                .params
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("{section}: {e}")))?;
        }
        let mock = &self.mock_export;
        if mock.periods == 0 {
            return Err(ConfigError::Invalid("mock_export.periods must be positive".into()));
        }
        if !mock.price_range_is_valid() {
            return Err(ConfigError::Invalid(format!(
                "mock_export price range [{}, {}) is empty or not finite",
                mock.price_low, mock.price_high
            )));
        }
        let hedge = &self.hedge;
        if !(hedge.strike.is_finite() && hedge.strike > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "hedge.strike must be positive and finite, got {}",
                hedge.strike
            )));
        }
        hedge
            .models()
            .map_err(|e| ConfigError::Invalid(format!("hedge: {e}")))?;
        Ok(())
    }

    pub fn primary_path(&self) -> PathBuf {
        self.data_dir.join(&self.fallback.file_name)
    }

    pub fn synthetic_path(&self) -> PathBuf {
        self.data_dir.join(&self.synthetic.file_name)
    }

    pub fn mock_export_path(&self) -> PathBuf {
        self.data_dir.join(&self.mock_export.file_name)
    }

    /// Every prepared dataset, in the order the pipeline writes them.
    pub fn dataset_paths(&self) -> [PathBuf; 3] {
        [self.primary_path(), self.synthetic_path(), self.mock_export_path()]
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}
