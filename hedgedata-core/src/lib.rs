//! hedgedata core: market data frames, normalization, providers, synthetic
//! paths and CSV emission.
//!
//! This crate contains the building blocks of the dataset pipeline:
//! - Raw provider results in flat or hierarchical column layouts
//! - Best-effort normalization into a canonical (date, price) series
//! - Live providers (Yahoo Finance, CSV export) behind one trait
//! - A seeded synthetic price path generator
//! - The CSV emitter that turns series into durable datasets
//! - European option pricing models for the hedging backtest

pub mod data;
pub mod domain;
pub mod emit;
pub mod generator;
pub mod pricing;
pub mod rng;

pub use data::{DataError, DataProvider, DataSource, NormalizationError, RawFrame};
pub use domain::{CanonicalSeries, MarketRecord, PricePoint, ProviderExportRow, ScenarioParams};
pub use emit::{emit, emit_provider_export, emit_table, EmitError, EmitReport};
pub use generator::{generate, synthetic_series, GenerationError, GenerationParams, MAX_DAYS};
pub use pricing::{
    BinomialTree, BlackScholes, MarketInputs, MonteCarlo, OptionKind, PricingError, PricingModel,
    VanillaOption,
};
pub use rng::SeedSource;
