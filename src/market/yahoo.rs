//! # market::yahoo — aggregator chart API
//!
//! `GET /v8/finance/chart/SOL-USD?range=60d&interval=1d`. Quote arrays are
//! column-oriented and any entry may be `null`; rows with a gap are dropped.
//!
//! The chart API names weeks `1wk` and has no 4-hour bars; `4h` is built
//! from hourly candles.

use chrono::{TimeZone, Utc};
use serde::Deserialize;

use super::{get_text, interval_hours, MarketError, PriceHistory};
use crate::models::Candle;

pub fn ticker(symbol: &str) -> String {
    format!("{symbol}-USD")
}

/// Smallest whole-day `range` that covers `lookback` candles of `interval`.
pub fn range_for(interval: &str, lookback: usize) -> String {
    let hours = interval_hours(interval).unwrap_or(24.0);
    let days = ((lookback as f64 * hours) / 24.0).ceil().max(1.0) as u64;
    format!("{days}d")
}

/// Chart `interval` parameter for one of our intervals, plus how many of
/// those bars make one of ours.
pub fn interval_param(interval: &str) -> Result<(&'static str, i64), MarketError> {
    let param = match interval {
        "1m"  => ("1m", 1),
        "5m"  => ("5m", 1),
        "15m" => ("15m", 1),
        "30m" => ("30m", 1),
        "1h"  => ("1h", 1),
        "4h"  => ("1h", 4),
        "1d"  => ("1d", 1),
        "1w"  => ("1wk", 1),
        other => return Err(MarketError::UnsupportedInterval(other.to_string())),
    };
    Ok(param)
}

pub fn history_url(base_url: &str, symbol: &str, interval: &str, lookback: usize) -> Result<String, MarketError> {
    let (param, _) = interval_param(interval)?;
    Ok(format!(
        "{base_url}/v8/finance/chart/{}?range={}&interval={param}",
        ticker(symbol),
        range_for(interval, lookback)
    ))
}

/// Merge hourly candles into `hours`-long bars aligned to UTC midnight.
pub fn resample(candles: Vec<Candle>, hours: i64) -> Vec<Candle> {
    let span = hours * 3_600;
    let mut merged: Vec<Candle> = Vec::with_capacity(candles.len() / hours.max(1) as usize + 1);
    let mut current_bucket = None;

    for candle in candles {
        let bucket = candle.open_time.timestamp().div_euclid(span);
        match merged.last_mut() {
            Some(bar) if current_bucket == Some(bucket) => {
                bar.high   = bar.high.max(candle.high);
                bar.low    = bar.low.min(candle.low);
                bar.close  = candle.close;
                bar.volume += candle.volume;
            }
            _ => {
                let Some(open_time) = Utc.timestamp_opt(bucket * span, 0).single() else {
                    continue;
                };
                current_bucket = Some(bucket);
                merged.push(Candle { open_time, ..candle });
            }
        }
    }
    merged
}

pub async fn fetch_history(
    client: &reqwest::Client,
    base_url: &str,
    symbol: &str,
    interval: &str,
    lookback: usize,
) -> Result<PriceHistory, MarketError> {
    let url = history_url(base_url, symbol, interval, lookback)?;
    let (_, bars_per_candle) = interval_param(interval)?;

    let body = get_text(client, &url).await?;
    let mut history = parse_chart(&body)?;

    if bars_per_candle > 1 {
        history.candles = resample(history.candles, bars_per_candle);
    }
    if history.candles.len() > lookback {
        history.candles.drain(..history.candles.len() - lookback);
    }
    Ok(history)
}

pub async fn fetch_latest_price(
    client: &reqwest::Client,
    base_url: &str,
    symbol: &str,
) -> Result<f64, MarketError> {
    let url = format!("{base_url}/v8/finance/chart/{}?range=1d&interval=1d", ticker(symbol));
    let body = get_text(client, &url).await?;
    parse_chart(&body)?
        .latest_price
        .ok_or_else(|| MarketError::EmptySeries(ticker(symbol)))
}

// ─── Wire Types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error:  Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code:        String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta:       ChartMeta,
    #[serde(default)]
    timestamp:  Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol:               Option<String>,
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open:   Vec<Option<f64>>,
    #[serde(default)]
    high:   Vec<Option<f64>>,
    #[serde(default)]
    low:    Vec<Option<f64>>,
    #[serde(default)]
    close:  Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// ─── Parsing ──────────────────────────────────────────────────────────────────

pub fn parse_chart(body: &str) -> Result<PriceHistory, MarketError> {
    let resp: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = resp.chart.error {
        return Err(MarketError::Malformed(format!("{}: {}", err.code, err.description)));
    }

    let result = resp
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| MarketError::Malformed("chart has no result".to_string()))?;

    let symbol = result.meta.symbol.clone().unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let candles: Vec<Candle> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let at = |col: &Vec<Option<f64>>| col.get(i).copied().flatten().filter(|v| *v > 0.0);
            Some(Candle {
                open_time: Utc.timestamp_opt(ts, 0).single()?,
                open:      at(&quote.open)?,
                high:      at(&quote.high)?,
                low:       at(&quote.low)?,
                close:     at(&quote.close)?,
                volume:    at(&quote.volume).unwrap_or(0.0),
            })
        })
        .collect();

    let regular_price = result.meta.regular_market_price.filter(|p| p.is_finite() && *p > 0.0);
    if candles.is_empty() && regular_price.is_none() {
        return Err(MarketError::EmptySeries(symbol));
    }

    let latest_price = regular_price.or_else(|| candles.last().map(|c| c.close));

    Ok(PriceHistory { candles, latest_price })
}
