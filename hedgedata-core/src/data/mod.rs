//! Raw provider results, live providers, and normalization

pub mod csv_import;
pub mod frame;
pub mod normalize;
pub mod provider;
pub mod yahoo;

pub use csv_import::CsvProvider;
pub use frame::{ColumnKey, ColumnLayout, FrameError, RawColumn, RawFrame};
pub use normalize::{normalize, ExtractionStrategy, NormalizationError, Normalizer, ADJ_CLOSE};
pub use provider::{DataError, DataProvider, DataSource};
pub use yahoo::YahooProvider;
