//! Domain types for hedgedata

pub mod record;
pub mod series;

pub use record::{MarketRecord, ProviderExportRow, ScenarioParams};
pub use series::{CanonicalSeries, PricePoint, SeriesError};
