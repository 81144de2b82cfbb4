//! Synthetic price path generator.
//!
//! Produces a seeded daily price path from a discrete multiplicative random
//! walk. Used as the guaranteed-success substitute when live data is
//! unavailable, and directly by the always-synthetic producers.

use chrono::NaiveDate;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CanonicalSeries, SeriesError};
use crate::rng::SeedSource;

/// Trading days per year used to scale annualized volatility to a daily shock.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Longest path a parameter set may request (about 400 trading years).
pub const MAX_DAYS: usize = 100_000;

#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("start price must be positive and finite, got {0}")]
    InvalidStartPrice(f64),

    #[error("annual volatility must be non-negative and finite, got {0}")]
    InvalidVolatility(f64),

    #[error("day count must be at least 1")]
    ZeroDays,

    #[error("day count {days} exceeds the maximum of {max}")]
    TooManyDays { days: usize, max: usize },

    #[error("generated path is not a valid series: {0}")]
    Series(#[from] SeriesError),
}

/// Parameters of one synthetic path.
///
/// Identical parameters always produce a byte-identical path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub start_price: f64,
    pub annual_vol: f64,
    #[serde(default = "default_days")]
    pub days: usize,
    pub seed: u64,
}

fn default_days() -> usize {
    TRADING_DAYS_PER_YEAR
}

impl GenerationParams {
    /// Parameters for a one-year (252-day) path.
    pub fn yearly(start_price: f64, annual_vol: f64, seed: u64) -> Self {
        Self {
            start_price,
            annual_vol,
            days: TRADING_DAYS_PER_YEAR,
            seed,
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            return Err(GenerationError::InvalidStartPrice(self.start_price));
        }
        if !(self.annual_vol.is_finite() && self.annual_vol >= 0.0) {
            return Err(GenerationError::InvalidVolatility(self.annual_vol));
        }
        if self.days == 0 {
            return Err(GenerationError::ZeroDays);
        }
        if self.days > MAX_DAYS {
            return Err(GenerationError::TooManyDays {
                days: self.days,
                max: MAX_DAYS,
            });
        }
        Ok(())
    }

    /// Validate, then generate the path with a freshly seeded RNG owned by
    /// this call.
    pub fn generate(&self) -> Result<Vec<f64>, GenerationError> {
        self.validate()?;
        let mut rng = SeedSource::Fixed(self.seed).rng();
        Ok(generate(self.start_price, self.annual_vol, self.days, &mut rng))
    }
}

/// Generate a daily price path of length `days`.
///
/// `path[0] = start_price`, and each following step is
/// `path[i] = path[i-1] * (1 + annual_vol / sqrt(252) * z)` with `z ~ N(0, 1)`.
///
/// This is a discrete multiplicative random walk, not a log-normal GBM
/// discretisation: there is no drift and no `-σ²/2` correction, so it will not
/// match log-return models bit-for-bit. With extreme volatility a single shock
/// below -1 can push the path negative; callers use realistic volatilities.
///
/// Parameter validity is the caller's responsibility (see
/// [`GenerationParams::validate`]). `days == 0` yields an empty path.
pub fn generate<R: Rng + ?Sized>(
    start_price: f64,
    annual_vol: f64,
    days: usize,
    rng: &mut R,
) -> Vec<f64> {
    let mut path = Vec::with_capacity(days.min(MAX_DAYS));
    if days == 0 {
        return path;
    }
    let daily_vol = annual_vol / (TRADING_DAYS_PER_YEAR as f64).sqrt();

    path.push(start_price);
    for i in 1..days {
        let z: f64 = StandardNormal.sample(rng);
        path.push(path[i - 1] * (1.0 + daily_vol * z));
    }
    path
}

/// Generate a path and date it on consecutive calendar days from `start`.
pub fn synthetic_series(
    params: &GenerationParams,
    start: NaiveDate,
) -> Result<CanonicalSeries, GenerationError> {
    let path = params.generate()?;
    Ok(CanonicalSeries::from_daily_path(start, &path)?)
}
