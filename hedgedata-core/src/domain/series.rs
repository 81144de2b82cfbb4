//! CanonicalSeries: the normalized (date, price) sequence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single dated price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("series must contain at least one point")]
    Empty,

    #[error("dates must be strictly ascending: {previous} is followed by {next}")]
    NotAscending { previous: NaiveDate, next: NaiveDate },

    #[error("price on {date} is not finite: {price}")]
    NonFinitePrice { date: NaiveDate, price: f64 },

    #[error("date index overflowed after {start} (+{offset} days)")]
    DateOverflow { start: NaiveDate, offset: usize },
}

/// Ordered, non-empty sequence of dated prices.
///
/// Dates are strictly ascending and every price is finite. The only way to
/// build one is through the validating constructors, so downstream code never
/// has to handle an empty or unordered series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalSeries {
    points: Vec<PricePoint>,
}

impl CanonicalSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        if points.is_empty() {
            return Err(SeriesError::Empty);
        }
        for p in &points {
            if !p.price.is_finite() {
                return Err(SeriesError::NonFinitePrice {
                    date: p.date,
                    price: p.price,
                });
            }
        }
        for w in points.windows(2) {
            if w[1].date <= w[0].date {
                return Err(SeriesError::NotAscending {
                    previous: w[0].date,
                    next: w[1].date,
                });
            }
        }
        Ok(Self { points })
    }

    /// Date a price path on consecutive calendar days starting at `start`.
    pub fn from_daily_path(start: NaiveDate, prices: &[f64]) -> Result<Self, SeriesError> {
        let mut points = Vec::with_capacity(prices.len());
        for (offset, &price) in prices.iter().enumerate() {
            let date = start
                .checked_add_days(chrono::Days::new(offset as u64))
                .ok_or(SeriesError::DateOverflow { start, offset })?;
            points.push(PricePoint { date, price });
        }
        Self::new(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }
}
