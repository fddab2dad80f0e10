//! # engine::report
//!
//! Runs the whole formula set for one refresh:
//!
//! ```text
//! inputs ─▶ resolve bias ─▶ forecast band (auto-range)
//!                │
//!                ├─▶ selected band = manual range ?? auto-range
//!                ├─▶ liquidation floor (price, leverage)
//!                ├─▶ yield ladder (selected band)
//!                └─▶ compliance (selected lower vs floor)
//! ```
//!
//! Pure: the same inputs always give a bit-identical report.

use serde::{Deserialize, Serialize};

use super::{
    compliance::check_compliance,
    forecast::forecast_range,
    liquidation::risk_parameters,
    yield_projection::project_yield,
    CalcConfig,
};
use crate::models::{
    Bias, BiasSelection, ComplianceStatus, RangeParameters, RangeSelection, RiskParameters,
    YieldProjection,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalcInputs {
    pub price:          f64,
    pub volatility:     f64,
    /// Bias used when `bias` is `Auto`.
    #[serde(default = "neutral")]
    pub auto_bias:      Bias,
    pub capital:        f64,
    pub leverage:       f64,
    #[serde(default)]
    pub bias:           BiasSelection,
    #[serde(default)]
    pub selected_range: Option<RangeSelection>,
}

fn neutral() -> Bias {
    Bias::Neutral
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcReport {
    /// Forecast band for the resolved bias.
    pub auto_range: RangeParameters,
    /// Band the yield and compliance figures are computed on.
    pub selected:   RangeSelection,
    pub risk:       RiskParameters,
    pub yields:     YieldProjection,
    pub compliance: ComplianceStatus,
}

pub fn evaluate(inputs: &CalcInputs, config: &CalcConfig) -> CalcReport {
    let bias       = inputs.bias.resolve(inputs.auto_bias);
    let auto_range = forecast_range(inputs.price, inputs.volatility, bias, &config.forecast);

    let selected = inputs.selected_range.unwrap_or(RangeSelection {
        lower: auto_range.lower_bound,
        upper: auto_range.upper_bound,
    });

    let risk = risk_parameters(inputs.capital, inputs.leverage, inputs.price, &config.liquidation);

    let yields = project_yield(
        inputs.capital,
        inputs.leverage,
        inputs.price,
        selected.lower,
        selected.upper,
        &config.yields,
    );

    let compliance = check_compliance(selected.lower, risk.liquidation_floor);

    CalcReport { auto_range, selected, risk, yields, compliance }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
