//! # engine::forecast
//!
//! **Range Forecaster** — auto-range band around the current price.
//!
//! ```text
//! half  = volatility × multiplier(bias)
//! shift = ± volatility × shift_factor      (bullish +, bearish −, neutral 0)
//! band  = [price − half + shift, price + half + shift]
//! ```
//!
//! Nothing is normalized: an extreme shift may push `lower` below zero or
//! above `price`, and the numbers are returned as computed.

use serde::{Deserialize, Serialize};

use crate::models::{Bias, RangeParameters};

/// Volatility multiplier per bias: tight when bullish, wide when bearish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTable {
    pub bullish: f64,
    pub neutral: f64,
    pub bearish: f64,
}

impl MultiplierTable {
    #[inline]
    pub fn for_bias(&self, bias: Bias) -> f64 {
        match bias {
            Bias::Bullish => self.bullish,
            Bias::Neutral => self.neutral,
            Bias::Bearish => self.bearish,
        }
    }
}

impl Default for MultiplierTable {
    fn default() -> Self {
        Self { bullish: 2.2, neutral: 2.7, bearish: 3.2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastParams {
    pub multipliers:  MultiplierTable,
    /// `None` disables the directional shift.
    pub shift_factor: Option<f64>,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self { multipliers: MultiplierTable::default(), shift_factor: Some(0.7) }
    }
}

/// Signed shift for `bias`.
#[inline]
pub fn directional_shift(volatility: f64, bias: Bias, shift_factor: Option<f64>) -> f64 {
    let Some(factor) = shift_factor else { return 0.0 };
    match bias {
        Bias::Bullish => volatility * factor,
        Bias::Neutral => 0.0,
        Bias::Bearish => -(volatility * factor),
    }
}

pub fn forecast_range(
    price: f64,
    volatility: f64,
    bias: Bias,
    params: &ForecastParams,
) -> RangeParameters {
    let multiplier = params.multipliers.for_bias(bias);
    let shift      = directional_shift(volatility, bias, params.shift_factor);
    let half       = volatility * multiplier;

    RangeParameters {
        bias,
        multiplier,
        shift,
        lower_bound: price - half + shift,
        upper_bound: price + half + shift,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
