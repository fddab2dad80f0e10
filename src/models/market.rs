//! # models::market
//!
//! Defines [`Candle`] (one upstream OHLCV observation) and [`MarketSnapshot`],
//! the latest view of the market that every dashboard refresh is computed from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::range::Bias;

// ─── Candle ───────────────────────────────────────────────────────────────────

/// A single OHLCV observation from the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open:      f64,
    pub high:      f64,
    pub low:       f64,
    pub close:     f64,
    pub volume:    f64,
}

// ─── Freshness ────────────────────────────────────────────────────────────────

/// Whether the snapshot came from upstream or was (partly) substituted from
/// the static fallback values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Freshness {
    Live,
    Stale { reason: String },
}

impl Freshness {
    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self, Freshness::Live)
    }

    /// Downgrade to `Stale`, appending `reason` if it is already stale.
    pub fn mark_stale(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        *self = match std::mem::replace(self, Freshness::Live) {
            Freshness::Live => Freshness::Stale { reason },
            Freshness::Stale { reason: prev } => Freshness::Stale {
                reason: format!("{prev}; {reason}"),
            },
        };
    }
}

// ─── MarketSnapshot ───────────────────────────────────────────────────────────

/// Everything the calculator needs from the market for one refresh.
///
/// The snapshot is immutable once built; the cache hands out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Primary asset, e.g. `"SOL"`.
    pub symbol:             String,
    /// Reference asset shown in the price banner, e.g. `"BTC"`.
    pub reference_symbol:   String,
    pub current_price:      f64,
    /// `None` when the reference asset could not be fetched and no fallback
    /// reference price is configured.
    pub reference_price:    Option<f64>,
    /// Average true range over the configured lookback.
    pub volatility_measure: f64,
    pub rsi_14:             Option<f64>,
    pub sma_20:             Option<f64>,
    /// Bias derived from the indicators; used when the user picks "auto".
    pub auto_bias:          Bias,
    /// Candle interval the snapshot was requested with, e.g. `"1d"`.
    pub interval:           String,
    pub fetched_at:         DateTime<Utc>,
    pub freshness:          Freshness,
}
