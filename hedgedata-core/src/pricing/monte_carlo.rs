//! Monte Carlo pricing under geometric Brownian motion.

use rand_distr::{Distribution, StandardNormal};

use super::{MarketInputs, PricingError, PricingModel, VanillaOption};
use crate::rng::SeedSource;

pub const MAX_PATHS: usize = 10_000_000;
pub const MAX_PATH_STEPS: usize = 10_000;

/// Relative spot bump for the finite-difference delta.
const DELTA_BUMP: f64 = 0.01;

/// Seeded Monte Carlo engine.
///
/// Each valuation replays the same random stream, so repeated calls agree
/// exactly and the bumped valuation behind [`PricingModel::delta`] uses
/// common random numbers.
#[derive(Debug, Clone, Copy)]
pub struct MonteCarlo {
    paths: usize,
    steps: usize,
    seed: u64,
}

impl MonteCarlo {
    pub fn new(paths: usize, steps: usize, seed: u64) -> Result<Self, PricingError> {
        if paths == 0 || paths > MAX_PATHS {
            return Err(PricingError::InvalidResolution {
                model: "monte carlo",
                what: "paths",
                got: paths,
                max: MAX_PATHS,
            });
        }
        if steps == 0 || steps > MAX_PATH_STEPS {
            return Err(PricingError::InvalidResolution {
                model: "monte carlo",
                what: "steps per path",
                got: steps,
                max: MAX_PATH_STEPS,
            });
        }
        Ok(Self { paths, steps, seed })
    }
}

impl PricingModel for MonteCarlo {
    fn name(&self) -> &str {
        "MonteCarlo"
    }

    fn price(&self, option: &VanillaOption, m: &MarketInputs) -> f64 {
        if m.at_expiry() {
            return option.intrinsic(m.spot);
        }
        let dt = m.expiry / self.steps as f64;
        let drift = (m.rate - 0.5 * m.vol * m.vol) * dt;
        let diffusion = m.vol * dt.sqrt();

        let mut rng = SeedSource::Fixed(self.seed).rng();
        let mut payoff_sum = 0.0;
        for _ in 0..self.paths {
            let mut log_spot = m.spot.ln();
            for _ in 0..self.steps {
                let z: f64 = StandardNormal.sample(&mut rng);
                log_spot += drift + diffusion * z;
            }
            payoff_sum += option.intrinsic(log_spot.exp());
        }
        (-m.rate * m.expiry).exp() * payoff_sum / self.paths as f64
    }

    /// Forward difference over a 1% spot bump.
    fn delta(&self, option: &VanillaOption, m: &MarketInputs) -> f64 {
        if m.at_expiry() {
            return 0.0;
        }
        let h = m.spot * DELTA_BUMP;
        (self.price(option, &m.with_spot(m.spot + h)) - self.price(option, m)) / h
    }
}
