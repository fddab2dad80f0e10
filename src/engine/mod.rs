//! # engine
//!
//! The Range & Yield formula set. Every function here is pure; the service
//! re-runs the whole set on each refresh.
//!
//! | Module             | Produces                                      |
//! |--------------------|-----------------------------------------------|
//! | `volatility`       | ATR, SMA, RSI                                 |
//! | `bias`             | automatic directional bias                    |
//! | `forecast`         | auto-range band                               |
//! | `liquidation`      | liquidation floor                             |
//! | `yield_projection` | yield ladder                                  |
//! | `compliance`       | band vs floor verdict                         |
//! | `report`           | all of the above for one set of inputs        |

pub mod bias;
pub mod compliance;
pub mod forecast;
pub mod liquidation;
pub mod report;
pub mod volatility;
pub mod yield_projection;

use std::str::FromStr;

use serde::Serialize;

use bias::BiasThresholds;
use forecast::{ForecastParams, MultiplierTable};
use liquidation::LiquidationModel;
use yield_projection::YieldParams;

use crate::models::YieldBasis;

// ─── Preset ───────────────────────────────────────────────────────────────────

/// Named constant sets. Individual constants can still be overridden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalcPreset {
    /// Three-tier multipliers with shift, leverage-scaled floor, daily yield.
    #[default]
    Standard,
    /// One 2.5× multiplier for every bias, no shift.
    Flat,
    /// Leverage-independent floor at 84 % of price, hourly yield.
    FixedFloor,
}

impl FromStr for CalcPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard"    => Ok(CalcPreset::Standard),
            "flat"        => Ok(CalcPreset::Flat),
            "fixed-floor" => Ok(CalcPreset::FixedFloor),
            other => Err(format!(
                "unknown preset '{other}'. Use 'standard', 'flat' or 'fixed-floor'"
            )),
        }
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcConfig {
    pub preset:      CalcPreset,
    pub atr_period:  usize,
    pub forecast:    ForecastParams,
    pub liquidation: LiquidationModel,
    pub yields:      YieldParams,
    pub bias:        BiasThresholds,
}

impl CalcConfig {
    pub fn preset(preset: CalcPreset) -> Self {
        let standard = Self {
            preset,
            atr_period:  volatility::DEFAULT_ATR_PERIOD,
            forecast:    ForecastParams::default(),
            liquidation: LiquidationModel::default(),
            yields:      YieldParams::default(),
            bias:        BiasThresholds::default(),
        };

        match preset {
            CalcPreset::Standard => standard,
            CalcPreset::Flat => Self {
                forecast: ForecastParams {
                    multipliers:  MultiplierTable { bullish: 2.5, neutral: 2.5, bearish: 2.5 },
                    shift_factor: None,
                },
                ..standard
            },
            CalcPreset::FixedFloor => Self {
                liquidation: LiquidationModel::FixedRatio { ratio: 0.84 },
                yields: YieldParams {
                    fee_constant:           0.0001,
                    concentration_constant: 0.45,
                    basis:                  YieldBasis::Hourly,
                    ..YieldParams::default()
                },
                ..standard
            },
        }
    }
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self::preset(CalcPreset::Standard)
    }
}
