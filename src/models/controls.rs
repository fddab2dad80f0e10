//! # models::controls
//!
//! The user-facing dashboard controls and the partial update payload the
//! browser sends when one of them changes.

use serde::{Deserialize, Serialize};

use super::range::BiasSelection;

// ─── Theme ────────────────────────────────────────────────────────────────────

/// Cosmetic only; the calculator never reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub text:       &'static str,
    pub accent:     &'static str,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark  => Palette { background: "#000000", text: "#FFFFFF", accent: "#D4AF37" },
            Theme::Light => Palette { background: "#FFFFFF", text: "#000000", accent: "#D4AF37" },
        }
    }
}

// ─── Range Selection ──────────────────────────────────────────────────────────

/// A manually chosen `[lower, upper]` band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub lower: f64,
    pub upper: f64,
}

impl RangeSelection {
    /// Clamp both ends into `[min, max]`. `None` when nothing of the band
    /// survives (it lies outside the span) or the span itself is not usable.
    pub fn clamped(self, min: f64, max: f64) -> Option<Self> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return None;
        }
        let clamped = Self {
            lower: self.lower.max(min).min(max),
            upper: self.upper.max(min).min(max),
        };
        (clamped.lower < clamped.upper).then_some(clamped)
    }

    /// Both ends inside `limits`, inclusive.
    pub fn is_within(&self, limits: &RangeSelection) -> bool {
        self.lower >= limits.lower && self.upper <= limits.upper
    }
}

// ─── Controls ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    pub capital:        f64,
    pub leverage:       f64,
    pub bias:           BiasSelection,
    /// `None` = follow the auto-range.
    pub selected_range: Option<RangeSelection>,
    /// Candle interval the market snapshot is requested with, e.g. `"1d"`.
    pub interval:       String,
    pub theme:          Theme,
}

/// Partial update; absent fields keep their remembered value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlsUpdate {
    pub capital:        Option<f64>,
    pub leverage:       Option<f64>,
    pub bias:           Option<BiasSelection>,
    pub selected_range: Option<RangeSelection>,
    /// `true` drops the manual range and snaps back to the auto-range.
    #[serde(default)]
    pub reset_range:    bool,
    pub interval:       Option<String>,
    pub theme:          Option<Theme>,
}
