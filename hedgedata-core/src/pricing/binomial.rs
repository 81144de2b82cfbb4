//! Cox-Ross-Rubinstein binomial tree for European exercise.

use super::{MarketInputs, PricingError, PricingModel, VanillaOption};

/// Largest tree the model accepts.
pub const MAX_TREE_STEPS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct BinomialTree {
    steps: usize,
}

impl BinomialTree {
    pub fn new(steps: usize) -> Result<Self, PricingError> {
        if steps == 0 || steps > MAX_TREE_STEPS {
            return Err(PricingError::InvalidResolution {
                model: "binomial tree",
                what: "steps",
                got: steps,
                max: MAX_TREE_STEPS,
            });
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn dt(&self, m: &MarketInputs) -> f64 {
        m.expiry / self.steps as f64
    }
}

impl PricingModel for BinomialTree {
    fn name(&self) -> &str {
        "Binomial"
    }

    fn price(&self, option: &VanillaOption, m: &MarketInputs) -> f64 {
        if m.at_expiry() {
            return option.intrinsic(m.spot);
        }
        let n = self.steps;
        let dt = self.dt(m);
        let up = (m.vol * dt.sqrt()).exp();
        let down = 1.0 / up;
        let p = ((m.rate * dt).exp() - down) / (up - down);
        let discount = (-m.rate * dt).exp();

        // Terminal payoffs, highest node first.
        let mut values: Vec<f64> = (0..=n)
            .map(|i| option.intrinsic(m.spot * up.powi((n - i) as i32) * down.powi(i as i32)))
            .collect();

        for level in (0..n).rev() {
            for i in 0..=level {
                values[i] = discount * (p * values[i] + (1.0 - p) * values[i + 1]);
            }
        }
        values[0]
    }

    /// Price difference across the first up and down move, one step closer
    /// to expiry.
    fn delta(&self, option: &VanillaOption, m: &MarketInputs) -> f64 {
        if m.at_expiry() {
            return 0.0;
        }
        let dt = self.dt(m);
        let up = (m.vol * dt.sqrt()).exp();
        let s_up = m.spot * up;
        let s_down = m.spot / up;
        let next = m.with_expiry(m.expiry - dt);
        (self.price(option, &next.with_spot(s_up)) - self.price(option, &next.with_spot(s_down)))
            / (s_up - s_down)
    }
}
