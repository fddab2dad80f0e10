//! # models::range
//!
//! Value types produced by the calculator engine: the forecast band, the
//! risk parameters with their liquidation floor, the yield ladder and the
//! compliance verdict.

use serde::{Deserialize, Serialize};

// ─── Bias ─────────────────────────────────────────────────────────────────────

/// Directional bias used to pick the band multiplier and shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bias {
    Bullish,
    Neutral,
    Bearish,
}

/// The user's bias control. `Auto` defers to the snapshot's indicators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasSelection {
    #[default]
    Auto,
    Bullish,
    Neutral,
    Bearish,
}

impl BiasSelection {
    pub fn resolve(self, auto_bias: Bias) -> Bias {
        match self {
            BiasSelection::Auto    => auto_bias,
            BiasSelection::Bullish => Bias::Bullish,
            BiasSelection::Neutral => Bias::Neutral,
            BiasSelection::Bearish => Bias::Bearish,
        }
    }
}

// ─── Band ─────────────────────────────────────────────────────────────────────

/// Auto-range forecast around the current price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeParameters {
    pub bias:        Bias,
    pub multiplier:  f64,
    /// Signed offset applied to both bounds (0 for neutral).
    pub shift:       f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

// ─── Risk ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    pub capital:           f64,
    pub leverage_factor:   f64,
    pub liquidation_floor: f64,
}

// ─── Yield ────────────────────────────────────────────────────────────────────

/// Period the yield base rate is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YieldBasis {
    Hourly,
    Daily,
}

impl YieldBasis {
    #[inline]
    pub fn hours(self) -> f64 {
        match self {
            YieldBasis::Hourly => 1.0,
            YieldBasis::Daily  => 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonYield {
    pub label:  String,
    pub hours:  f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldProjection {
    pub basis:      YieldBasis,
    /// Band width after flooring at epsilon.
    pub band_width: f64,
    pub base_rate:  f64,
    pub horizons:   Vec<HorizonYield>,
}

impl YieldProjection {
    /// Amount projected for the horizon with the given label, if present.
    pub fn amount_for(&self, label: &str) -> Option<f64> {
        self.horizons.iter().find(|h| h.label == label).map(|h| h.amount)
    }
}

// ─── Compliance ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceStatus {
    pub compliant:         bool,
    pub selected_lower:    f64,
    pub liquidation_floor: f64,
    /// `selected_lower − liquidation_floor`; negative means the band dips
    /// below the floor.
    pub margin:            f64,
}
