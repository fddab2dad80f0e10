//! # engine::yield_projection
//!
//! **Yield Projector** — projected return for a band, scaled across a fixed
//! ladder of horizons.
//!
//! ```text
//! width     = max(upper − lower, epsilon)
//! base_rate = capital × leverage × fee × (price × concentration / width)
//! amount(h) = base_rate × hours(h) / hours(basis)
//! ```
//!
//! Narrower bands concentrate liquidity, so the rate is inversely
//! proportional to width.

use serde::{Deserialize, Serialize};

use crate::models::{HorizonYield, YieldBasis, YieldProjection};

/// Horizon ladder: label and length in hours.
pub const HORIZONS: [(&str, f64); 5] = [
    ("1 Hour",  1.0),
    ("1 Day",   24.0),
    ("1 Week",  168.0),
    ("1 Month", 720.0),
    ("1 Year",  8_760.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldParams {
    pub fee_constant:           f64,
    pub concentration_constant: f64,
    pub basis:                  YieldBasis,
    /// Lower limit for band width before it is used as a divisor.
    pub band_epsilon:           f64,
}

impl Default for YieldParams {
    fn default() -> Self {
        Self {
            fee_constant:           0.0017,
            concentration_constant: 0.35,
            basis:                  YieldBasis::Daily,
            band_epsilon:           1e-6,
        }
    }
}

#[inline]
pub fn floored_width(lower: f64, upper: f64, epsilon: f64) -> f64 {
    (upper - lower).max(epsilon)
}

/// Base rate per `params.basis` period for an already floored `width`.
#[inline]
pub fn base_rate(capital: f64, leverage: f64, price: f64, width: f64, params: &YieldParams) -> f64 {
    capital * leverage * params.fee_constant * (price * params.concentration_constant / width)
}

pub fn project_yield(
    capital: f64,
    leverage: f64,
    price: f64,
    lower: f64,
    upper: f64,
    params: &YieldParams,
) -> YieldProjection {
    let band_width = floored_width(lower, upper, params.band_epsilon);
    let base       = base_rate(capital, leverage, price, band_width, params);
    let basis_h    = params.basis.hours();

    let horizons = HORIZONS
        .iter()
        .map(|&(label, hours)| HorizonYield {
            label:  label.to_string(),
            hours,
            amount: base * hours / basis_h,
        })
        .collect();

    YieldProjection {
        basis: params.basis,
        band_width,
        base_rate: base,
        horizons,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
