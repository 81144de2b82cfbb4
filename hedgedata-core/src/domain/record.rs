//! Output row types written by the emitter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Scenario parameters broadcast to every row of a dataset.
///
/// Rate and volatility are modelling assumptions for the downstream pricer,
/// not observed data, so they are constant within a file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub rate: f64,
    pub vol: f64,
}

impl ScenarioParams {
    pub fn new(rate: f64, vol: f64) -> Self {
        Self { rate, vol }
    }
}

/// Canonical output row: `Date,Spot,Rate,Vol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Spot")]
    pub spot: f64,
    #[serde(rename = "Rate")]
    pub rate: f64,
    #[serde(rename = "Vol")]
    pub vol: f64,
}

impl MarketRecord {
    pub const HEADERS: [&'static str; 4] = ["Date", "Spot", "Rate", "Vol"];
}

/// Alternate-provider export row: `DATE,PX_LAST,US_TREASURY_3M,VOLATILITY_30D`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderExportRow {
    #[serde(rename = "DATE")]
    pub date: NaiveDate,
    #[serde(rename = "PX_LAST")]
    pub px_last: f64,
    #[serde(rename = "US_TREASURY_3M")]
    pub treasury_3m: f64,
    #[serde(rename = "VOLATILITY_30D")]
    pub volatility_30d: f64,
}

impl ProviderExportRow {
    pub const HEADERS: [&'static str; 4] = ["DATE", "PX_LAST", "US_TREASURY_3M", "VOLATILITY_30D"];
}
