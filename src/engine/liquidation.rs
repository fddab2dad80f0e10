//! # engine::liquidation
//!
//! **Liquidation Floor Calculator** — the heuristic price below which a
//! leveraged position is treated as unsafe.
//!
//! Two models are in circulation and neither is authoritative, so both are
//! selectable:
//!
//! | Model            | Floor                                   |
//! |------------------|-----------------------------------------|
//! | `LeverageScaled` | `price × (1 − safety_constant / lev)`   |
//! | `FixedRatio`     | `price × ratio` (leverage ignored)      |

use serde::{Deserialize, Serialize};

use crate::models::RiskParameters;

pub const DEFAULT_SAFETY_CONSTANT: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum LiquidationModel {
    LeverageScaled { safety_constant: f64 },
    FixedRatio { ratio: f64 },
}

impl Default for LiquidationModel {
    fn default() -> Self {
        LiquidationModel::LeverageScaled { safety_constant: DEFAULT_SAFETY_CONSTANT }
    }
}

/// `leverage` is expected to be ≥ 1; callers validate user input first.
#[inline]
pub fn liquidation_floor(price: f64, leverage: f64, model: &LiquidationModel) -> f64 {
    match *model {
        LiquidationModel::LeverageScaled { safety_constant } => {
            price * (1.0 - (1.0 / leverage) * safety_constant)
        }
        LiquidationModel::FixedRatio { ratio } => price * ratio,
    }
}

pub fn risk_parameters(
    capital: f64,
    leverage: f64,
    price: f64,
    model: &LiquidationModel,
) -> RiskParameters {
    RiskParameters {
        capital,
        leverage_factor:   leverage,
        liquidation_floor: liquidation_floor(price, leverage, model),
    }
}
