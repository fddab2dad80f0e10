//! # market — Market Data Accessor
//!
//! Fetches the primary asset's OHLCV history and the reference asset's
//! latest price, then reduces them to a [`MarketSnapshot`].
//!
//! ## Data Sources (selected with `MARKET_SOURCE`)
//! 1. `binance`     — exchange REST klines
//! 2. `yahoo`       — aggregator chart API
//! 3. `placeholder` — no I/O, static fallback values (dev/offline)
//!
//! Any upstream failure degrades to the fallback snapshot. The snapshot says
//! so through `freshness`, so the dashboard can show a stale-data banner
//! instead of passing old numbers off as live.

pub mod binance;
pub mod cache;
pub mod yahoo;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{MarketConfig, MarketSource};
use crate::engine::{
    bias::auto_bias,
    volatility::{
        average_true_range, relative_strength_index, simple_moving_average, DEFAULT_RSI_PERIOD,
        DEFAULT_SMA_PERIOD,
    },
    CalcConfig,
};
use crate::models::{Bias, Candle, Freshness, MarketSnapshot};

use cache::SnapshotCache;

/// Candle intervals accepted from callers.
pub const SUPPORTED_INTERVALS: [&str; 8] = ["1m", "5m", "15m", "30m", "1h", "4h", "1d", "1w"];

// ─── Error ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("market API unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("market API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to parse market response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed market data: {0}")]
    Malformed(String),

    #[error("no price data for '{0}'")]
    EmptySeries(String),

    #[error("interval '{0}' is not offered by this source")]
    UnsupportedInterval(String),
}

/// Raw provider output, oldest candle first.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    pub candles:      Vec<Candle>,
    pub latest_price: Option<f64>,
}

pub fn interval_hours(interval: &str) -> Option<f64> {
    let minutes = match interval {
        "1m"  => 1.0,
        "5m"  => 5.0,
        "15m" => 15.0,
        "30m" => 30.0,
        "1h"  => 60.0,
        "4h"  => 240.0,
        "1d"  => 1_440.0,
        "1w"  => 10_080.0,
        _ => return None,
    };
    Some(minutes / 60.0)
}

pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, MarketError> {
    let resp = client
        .get(url)
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(MarketError::Status { status: status.as_u16(), url: url.to_string() });
    }
    Ok(resp.text().await?)
}

// ─── Accessor ─────────────────────────────────────────────────────────────────

pub struct MarketDataAccessor {
    client: reqwest::Client,
    market: MarketConfig,
    calc:   CalcConfig,
    cache:  SnapshotCache,
}

impl MarketDataAccessor {
    pub fn new(client: reqwest::Client, market: MarketConfig, calc: CalcConfig) -> Self {
        let cache = SnapshotCache::new(market.cache_ttl);
        Self { client, market, calc, cache }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.market
    }

    pub fn cached_intervals(&self) -> usize {
        self.cache.len()
    }

    /// Memoized snapshot for `interval`. Never fails.
    pub async fn snapshot(&self, interval: &str) -> MarketSnapshot {
        self.cache
            .get_or_fetch(interval, || fetch_snapshot(&self.client, &self.market, &self.calc, interval))
            .await
    }
}

/// Un-memoized fetch. Never fails: upstream problems yield the fallback.
pub async fn fetch_snapshot(
    client: &reqwest::Client,
    market: &MarketConfig,
    calc: &CalcConfig,
    interval: &str,
) -> MarketSnapshot {
    if market.source == MarketSource::Placeholder {
        warn!("MARKET_SOURCE=placeholder — using FALLBACK market data");
        return fallback_snapshot(market, interval, "placeholder market source");
    }

    let history = match fetch_history(client, market, interval).await {
        Ok(history) => history,
        Err(e) => {
            warn!(error = %e, source = %market.source, symbol = %market.symbol, "⚠️ Market fetch failed — using fallback snapshot");
            return fallback_snapshot(market, interval, &e.to_string());
        }
    };

    let reference = fetch_reference(client, market).await;
    if let Err(e) = &reference {
        warn!(error = %e, symbol = %market.reference_symbol, "reference price unavailable");
    }

    let snapshot = build_snapshot(market, calc, interval, &history, reference);
    info!(
        symbol    = %snapshot.symbol,
        price     = snapshot.current_price,
        atr       = snapshot.volatility_measure,
        bias      = ?snapshot.auto_bias,
        live      = snapshot.freshness.is_live(),
        "Market snapshot fetched"
    );
    snapshot
}

async fn fetch_history(
    client: &reqwest::Client,
    market: &MarketConfig,
    interval: &str,
) -> Result<PriceHistory, MarketError> {
    let history = match market.source {
        MarketSource::Binance => {
            binance::fetch_history(client, &market.base_url, &market.symbol, interval, market.lookback).await?
        }
        MarketSource::Yahoo => {
            yahoo::fetch_history(client, &market.base_url, &market.symbol, interval, market.lookback).await?
        }
        MarketSource::Placeholder => return Err(MarketError::EmptySeries(market.symbol.clone())),
    };

    if history.candles.is_empty() {
        return Err(MarketError::EmptySeries(market.symbol.clone()));
    }
    Ok(history)
}

async fn fetch_reference(client: &reqwest::Client, market: &MarketConfig) -> Result<f64, MarketError> {
    match market.source {
        MarketSource::Binance => binance::fetch_latest_price(client, &market.base_url, &market.reference_symbol).await,
        MarketSource::Yahoo   => yahoo::fetch_latest_price(client, &market.base_url, &market.reference_symbol).await,
        MarketSource::Placeholder => Err(MarketError::EmptySeries(market.reference_symbol.clone())),
    }
}

// ─── Snapshot Assembly ────────────────────────────────────────────────────────

/// Reduce provider output to a snapshot. `history.candles` must be non-empty.
pub fn build_snapshot(
    market: &MarketConfig,
    calc: &CalcConfig,
    interval: &str,
    history: &PriceHistory,
    reference: Result<f64, MarketError>,
) -> MarketSnapshot {
    let mut freshness = Freshness::Live;

    let closes: Vec<f64> = history.candles.iter().map(|c| c.close).collect();
    let current_price = match history.latest_price.or_else(|| closes.last().copied()) {
        Some(price) if price.is_finite() && price > 0.0 => price,
        other => {
            freshness.mark_stale(format!("unusable price {other:?} for {}", market.symbol));
            market.fallback_price
        }
    };

    let volatility_measure = match average_true_range(&history.candles, calc.atr_period) {
        Some(atr) => atr,
        None => {
            freshness.mark_stale(format!(
                "insufficient history for ATR({}): {} candles",
                calc.atr_period,
                history.candles.len()
            ));
            market.fallback_atr
        }
    };

    let rsi_14 = relative_strength_index(&closes, DEFAULT_RSI_PERIOD);
    let sma_20 = simple_moving_average(&closes, DEFAULT_SMA_PERIOD);

    let reference_price = match reference {
        Ok(price) => Some(price),
        Err(e) => {
            freshness.mark_stale(format!("reference {} unavailable: {e}", market.reference_symbol));
            market.fallback_reference_price
        }
    };

    MarketSnapshot {
        symbol:           market.symbol.clone(),
        reference_symbol: market.reference_symbol.clone(),
        current_price,
        reference_price,
        volatility_measure,
        rsi_14,
        sma_20,
        auto_bias:        auto_bias(current_price, sma_20, rsi_14, &calc.bias),
        interval:         interval.to_string(),
        fetched_at:       Utc::now(),
        freshness,
    }
}

/// Static last-known values, flagged stale.
pub fn fallback_snapshot(market: &MarketConfig, interval: &str, reason: &str) -> MarketSnapshot {
    MarketSnapshot {
        symbol:             market.symbol.clone(),
        reference_symbol:   market.reference_symbol.clone(),
        current_price:      market.fallback_price,
        reference_price:    market.fallback_reference_price,
        volatility_measure: market.fallback_atr,
        rsi_14:             None,
        sma_20:             None,
        auto_bias:          Bias::Neutral,
        interval:           interval.to_string(),
        fetched_at:         Utc::now(),
        freshness:          Freshness::Stale { reason: format!("fallback data: {reason}") },
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
