//! # engine::bias
//!
//! Automatic directional bias from trend (close vs SMA) and momentum (RSI).

use serde::Serialize;
use tracing::debug;

use crate::models::Bias;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BiasThresholds {
    /// RSI at or above this (with close above SMA) reads bullish.
    pub rsi_bullish: f64,
    /// RSI at or below this (with close below SMA) reads bearish.
    pub rsi_bearish: f64,
}

impl Default for BiasThresholds {
    fn default() -> Self {
        Self { rsi_bullish: 55.0, rsi_bearish: 45.0 }
    }
}

/// Missing indicators always read neutral.
pub fn auto_bias(
    close: f64,
    sma: Option<f64>,
    rsi: Option<f64>,
    thresholds: &BiasThresholds,
) -> Bias {
    let (Some(sma), Some(rsi)) = (sma, rsi) else {
        debug!("indicators unavailable, auto bias is NEUTRAL");
        return Bias::Neutral;
    };

    let bias = if close > sma && rsi >= thresholds.rsi_bullish {
        Bias::Bullish
    } else if close < sma && rsi <= thresholds.rsi_bearish {
        Bias::Bearish
    } else {
        Bias::Neutral
    };

    debug!(close, sma, rsi, bias = ?bias, "auto bias resolved");
    bias
}
