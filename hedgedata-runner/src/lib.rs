//! hedgedata runner: acquisition orchestration, dataset producers, pipeline
//! config, the delta-hedging backtest and hedging log summaries.
//!
//! This crate builds on `hedgedata-core` to provide:
//! - One-shot live acquisition with a seeded synthetic fallback
//! - The generic synthetic dataset and the mock alternate-provider export
//! - A TOML-overridable pipeline configuration
//! - A daily delta-hedging backtest per (dataset, pricing model) pair
//! - Per-model error statistics over downstream hedging logs

pub mod acquire;
pub mod config;
pub mod hedge;
pub mod metrics;
pub mod pipeline;
pub mod producers;

pub use acquire::{
    acquire, acquire_and_emit, AcquireError, Acquisition, AcquisitionOutcome, DatasetOrigin,
    FallbackReason,
};
pub use config::{
    ConfigError, HedgeConfig, LiveSourceConfig, MockExportConfig, PipelineConfig, SyntheticProfile,
};
pub use hedge::{
    read_hedge_inputs, run_hedge, run_hedging, simulate_hedge, DatasetSchema, HedgeError,
    HedgeInput, HedgeLogRow, HedgeRun,
};
pub use metrics::{format_summary_table, summarize_logs, HedgingSummary, LogError};
pub use pipeline::{run_pipeline, DatasetSummary, PipelineError, PipelineSummary};
pub use producers::{mock_export_rows, produce_mock_export, produce_synthetic, ProduceError};
