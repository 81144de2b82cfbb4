//! Closed-form Black-Scholes pricing.

use super::{norm_cdf, MarketInputs, OptionKind, PricingModel, VanillaOption};

#[derive(Debug, Clone, Copy, Default)]
pub struct BlackScholes;

impl BlackScholes {
    fn d1(option: &VanillaOption, m: &MarketInputs) -> f64 {
        ((m.spot / option.strike).ln() + (m.rate + 0.5 * m.vol * m.vol) * m.expiry)
            / (m.vol * m.expiry.sqrt())
    }
}

impl PricingModel for BlackScholes {
    fn name(&self) -> &str {
        "BlackScholes"
    }

    fn price(&self, option: &VanillaOption, m: &MarketInputs) -> f64 {
        if m.at_expiry() {
            return option.intrinsic(m.spot);
        }
        let d1 = Self::d1(option, m);
        let d2 = d1 - m.vol * m.expiry.sqrt();
        let discounted_strike = option.strike * (-m.rate * m.expiry).exp();
        match option.kind {
            OptionKind::Call => m.spot * norm_cdf(d1) - discounted_strike * norm_cdf(d2),
            OptionKind::Put => discounted_strike * norm_cdf(-d2) - m.spot * norm_cdf(-d1),
        }
    }

    fn delta(&self, option: &VanillaOption, m: &MarketInputs) -> f64 {
        if m.at_expiry() {
            return 0.0;
        }
        let n_d1 = norm_cdf(Self::d1(option, m));
        match option.kind {
            OptionKind::Call => n_d1,
            OptionKind::Put => n_d1 - 1.0,
        }
    }
}
