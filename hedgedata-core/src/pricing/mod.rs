//! European option pricing models used by the delta-hedging backtest.
//!
//! Every model answers two questions for one contract under one market
//! snapshot: what is it worth, and how many shares hedge it. Models assume
//! the snapshot passed [`MarketInputs::is_priceable`]; the backtest skips rows
//! that do not.

mod binomial;
mod black_scholes;
mod distributions;
mod monte_carlo;

pub use binomial::{BinomialTree, MAX_TREE_STEPS};
pub use black_scholes::BlackScholes;
pub use distributions::norm_cdf;
pub use monte_carlo::{MonteCarlo, MAX_PATHS, MAX_PATH_STEPS};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Below this time to expiry (in years) a contract is worth its intrinsic
/// value and carries no hedge.
pub const EXPIRY_FLOOR: f64 = 0.001;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("{model} needs between 1 and {max} {what}, got {got}")]
    InvalidResolution {
        model: &'static str,
        what: &'static str,
        got: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Call,
    Put,
}

/// A European vanilla contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VanillaOption {
    pub strike: f64,
    pub kind: OptionKind,
}

impl VanillaOption {
    pub fn call(strike: f64) -> Self {
        Self { strike, kind: OptionKind::Call }
    }

    pub fn put(strike: f64) -> Self {
        Self { strike, kind: OptionKind::Put }
    }

    pub fn intrinsic(&self, spot: f64) -> f64 {
        match self.kind {
            OptionKind::Call => (spot - self.strike).max(0.0),
            OptionKind::Put => (self.strike - spot).max(0.0),
        }
    }
}

/// Market snapshot on one hedge date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketInputs {
    pub spot: f64,
    /// Continuously compounded risk-free rate (decimal).
    pub rate: f64,
    /// Annualized volatility (decimal).
    pub vol: f64,
    /// Time to expiry in years.
    pub expiry: f64,
}

impl MarketInputs {
    pub fn is_priceable(&self) -> bool {
        self.spot.is_finite()
            && self.spot > 0.0
            && self.rate.is_finite()
            && self.vol.is_finite()
            && self.vol > 0.0
            && self.expiry.is_finite()
    }

    pub fn at_expiry(&self) -> bool {
        self.expiry <= EXPIRY_FLOOR
    }

    pub fn with_spot(self, spot: f64) -> Self {
        Self { spot, ..self }
    }

    pub fn with_expiry(self, expiry: f64) -> Self {
        Self { expiry, ..self }
    }
}

/// A pricing engine.
pub trait PricingModel: Send + Sync {
    /// Short identifier, safe to embed in file names.
    fn name(&self) -> &str;

    fn price(&self, option: &VanillaOption, market: &MarketInputs) -> f64;

    /// Shares of the underlying held against one short contract.
    fn delta(&self, option: &VanillaOption, market: &MarketInputs) -> f64;
}
