//! # dashboard — one full refresh of the page
//!
//! `render` is the "re-run top to bottom" step: snapshot + remembered
//! controls in, complete view out. The session state is passed in explicitly
//! and is the only thing render may write (it stores the clamped manual
//! range back so the slider stays where the user left it).

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::{
    report::{evaluate, CalcInputs, CalcReport},
    CalcPreset,
};
use crate::models::{
    controls::Palette, Bias, Controls, Freshness, MarketSnapshot, RangeSelection,
};
use crate::session::SessionState;

pub const LIQUIDATION_WARNING: &str = "⚠️ CRITICAL RISK: Range Low is below Liquidation Floor!";

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub session_id:   Uuid,
    pub market:       MarketSnapshot,
    pub controls:     Controls,
    /// Allowed slider span for the manual range.
    pub range_limits: RangeSelection,
    pub report:       CalcReport,
    pub preset:       CalcPreset,
    pub palette:      Palette,
    /// Liquidation warning, shown when the band is not compliant.
    pub risk_warning: Option<String>,
    /// Stale-data banner, shown when the snapshot is not live.
    pub data_warning: Option<String>,
}

/// Broadcast form of a render: the band and its verdict, without the
/// session's capital or leverage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub session_id:        Uuid,
    pub symbol:            String,
    pub interval:          String,
    pub bias:              Bias,
    pub lower:             f64,
    pub upper:             f64,
    pub liquidation_floor: f64,
    pub compliant:         bool,
    pub live:              bool,
}

impl DashboardView {
    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            session_id:        self.session_id,
            symbol:            self.market.symbol.clone(),
            interval:          self.controls.interval.clone(),
            bias:              self.report.auto_range.bias,
            lower:             self.report.selected.lower,
            upper:             self.report.selected.upper,
            liquidation_floor: self.report.risk.liquidation_floor,
            compliant:         self.report.compliance.compliant,
            live:              self.market.freshness.is_live(),
        }
    }
}

/// Slider span `[price × min_factor, price × max_factor]`.
pub fn range_limits(price: f64, config: &Config) -> RangeSelection {
    RangeSelection {
        lower: price * config.dashboard.range_min_factor,
        upper: price * config.dashboard.range_max_factor,
    }
}

pub fn render(
    session_id: Uuid,
    snapshot: &MarketSnapshot,
    session: &mut SessionState,
    config: &Config,
) -> DashboardView {
    let limits = range_limits(snapshot.current_price, config);

    let span_usable = limits.lower.is_finite() && limits.upper.is_finite() && limits.lower < limits.upper;

    if let (true, Some(range)) = (span_usable, session.controls.selected_range) {
        session.controls.selected_range = range.clamped(limits.lower, limits.upper);
        if session.controls.selected_range.is_none() {
            warn!(
                %session_id,
                lower = range.lower,
                upper = range.upper,
                "manual range fell outside the slider span, back to auto-range"
            );
        }
    }

    let controls = &session.controls;
    let inputs = CalcInputs {
        price:          snapshot.current_price,
        volatility:     snapshot.volatility_measure,
        auto_bias:      snapshot.auto_bias,
        capital:        controls.capital,
        leverage:       controls.leverage,
        bias:           controls.bias,
        selected_range: controls.selected_range,
    };

    let mut report = evaluate(&inputs, &config.calc);

    // The default range follows the auto-range, but the slider cannot show
    // values outside its span.
    if controls.selected_range.is_none() {
        if let Some(clamped) = report.selected.clamped(limits.lower, limits.upper) {
            if clamped != report.selected {
                report = evaluate(&CalcInputs { selected_range: Some(clamped), ..inputs }, &config.calc);
            }
        }
    }

    let risk_warning = (!report.compliance.compliant).then(|| LIQUIDATION_WARNING.to_string());
    let data_warning = match &snapshot.freshness {
        Freshness::Live => None,
        Freshness::Stale { reason } => Some(format!("Showing last-known market data ({reason})")),
    };

    DashboardView {
        session_id,
        market:       snapshot.clone(),
        controls:     controls.clone(),
        range_limits: limits,
        report,
        preset:       config.calc.preset,
        palette:      controls.theme.palette(),
        risk_warning,
        data_warning,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::{Bias, BiasSelection, Theme};

    fn make_config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    fn make_snapshot(freshness: Freshness) -> MarketSnapshot {
        MarketSnapshot {
            symbol:             "SOL".into(),
            reference_symbol:   "BTC".into(),
            current_price:      135.84,
            reference_price:    Some(97_000.0),
            volatility_measure: 8.45,
            rsi_14:             Some(50.0),
            sma_20:             Some(135.0),
            auto_bias:          Bias::Neutral,
            interval:           "1d".into(),
            fetched_at:         Utc::now(),
            freshness,
        }
    }

    #[test]
    fn default_controls_follow_auto_range() {
        let config = make_config();
        let mut session = SessionState::new(&config);
        let view = render(Uuid::new_v4(), &make_snapshot(Freshness::Live), &mut session, &config);

        assert!((view.report.selected.lower - 113.025).abs() < 1e-9);
        assert!((view.report.selected.upper - 158.655).abs() < 1e-9);
        assert!(view.report.compliance.compliant);
        assert!(view.risk_warning.is_none());
        assert!(view.data_warning.is_none());
        assert!(session.controls.selected_range.is_none());
    }

    #[test]
    fn manual_range_is_clamped_and_remembered() {
        let config = make_config();
        let mut session = SessionState::new(&config);
        session.controls.selected_range = Some(RangeSelection { lower: 1.0, upper: 1_000.0 });

        let view = render(Uuid::new_v4(), &make_snapshot(Freshness::Live), &mut session, &config);
        let remembered = session.controls.selected_range.unwrap();

        assert!((remembered.lower - 13.584).abs() < 1e-9);
        assert!((remembered.upper - 258.096).abs() < 1e-9);
        assert_eq!(view.report.selected, remembered);
        // 13.58 sits well below the 95.09 floor
        assert_eq!(view.risk_warning.as_deref(), Some(LIQUIDATION_WARNING));
    }

    #[test]
    fn manual_range_outside_span_falls_back_to_auto_range() {
        let config = make_config();
        let mut session = SessionState::new(&config);
        // Chosen when the price was higher; the span now ends at 258.096.
        session.controls.selected_range = Some(RangeSelection { lower: 300.0, upper: 400.0 });

        let view = render(Uuid::new_v4(), &make_snapshot(Freshness::Live), &mut session, &config);

        assert!(session.controls.selected_range.is_none());
        assert!(view.controls.selected_range.is_none());
        assert!((view.report.selected.lower - 113.025).abs() < 1e-9);
        assert!((view.report.yields.band_width - 45.63).abs() < 1e-9);
        assert!(view.report.yields.amount_for("1 Day").unwrap() < 100.0);
    }

    #[test]
    fn unusable_price_does_not_panic() {
        let config = make_config();
        let mut session = SessionState::new(&config);
        session.controls.selected_range = Some(RangeSelection { lower: 100.0, upper: 150.0 });

        for price in [f64::NAN, -5.0] {
            let mut snapshot = make_snapshot(Freshness::Live);
            snapshot.current_price = price;
            render(Uuid::new_v4(), &snapshot, &mut session, &config);
        }
        assert_eq!(session.controls.selected_range, Some(RangeSelection { lower: 100.0, upper: 150.0 }));
    }

    #[test]
    fn out_of_span_auto_range_is_clamped_without_being_remembered() {
        let config = make_config();
        let mut session = SessionState::new(&config);
        session.controls.bias = BiasSelection::Bearish;
        let mut snapshot = make_snapshot(Freshness::Live);
        snapshot.volatility_measure = 60.0;

        let view = render(Uuid::new_v4(), &snapshot, &mut session, &config);
        assert!(view.report.auto_range.lower_bound < 0.0);
        assert!((view.report.selected.lower - 13.584).abs() < 1e-9);
        assert!(session.controls.selected_range.is_none());
    }

    #[test]
    fn summary_leaves_out_position_size() {
        let config = make_config();
        let mut session = SessionState::new(&config);
        let view = render(Uuid::new_v4(), &make_snapshot(Freshness::Live), &mut session, &config);

        let summary = serde_json::to_value(view.summary()).unwrap();
        assert_eq!(summary["session_id"], view.session_id.to_string());
        assert_eq!(summary["compliant"], true);
        assert!(summary.get("capital").is_none());
        assert!(summary.get("leverage").is_none());
        assert!(summary.get("controls").is_none());
    }

    #[test]
    fn stale_snapshot_raises_data_warning() {
        let config = make_config();
        let mut session = SessionState::new(&config);
        let snapshot = make_snapshot(Freshness::Stale { reason: "fallback data: timeout".into() });

        let view = render(Uuid::new_v4(), &snapshot, &mut session, &config);
        assert!(view.data_warning.unwrap().contains("timeout"));
    }

    #[test]
    fn theme_only_changes_palette() {
        let config = make_config();
        let snapshot = make_snapshot(Freshness::Live);

        let mut dark = SessionState::new(&config);
        let mut light = SessionState::new(&config);
        light.controls.theme = Theme::Light;

        let a = render(Uuid::nil(), &snapshot, &mut dark, &config);
        let b = render(Uuid::nil(), &snapshot, &mut light, &config);
        assert_eq!(a.report, b.report);
        assert_ne!(a.palette, b.palette);
    }
}
