//! # market::binance — exchange REST klines
//!
//! `GET /api/v3/klines?symbol=SOLUSDT&interval=1d&limit=60` returns an array
//! of arrays; prices and volume arrive as decimal strings:
//!
//! ```text
//! [ [openTime, "open", "high", "low", "close", "volume", closeTime, ...], ... ]
//! ```

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{get_text, MarketError, PriceHistory};
use crate::models::Candle;

pub fn pair(symbol: &str) -> String {
    format!("{symbol}USDT")
}

pub async fn fetch_history(
    client: &reqwest::Client,
    base_url: &str,
    symbol: &str,
    interval: &str,
    limit: usize,
) -> Result<PriceHistory, MarketError> {
    let url = format!(
        "{base_url}/api/v3/klines?symbol={}&interval={interval}&limit={limit}",
        pair(symbol)
    );
    let body = get_text(client, &url).await?;
    let candles = parse_klines(&body)?;
    let latest_price = candles.last().map(|c| c.close);
    Ok(PriceHistory { candles, latest_price })
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

pub async fn fetch_latest_price(
    client: &reqwest::Client,
    base_url: &str,
    symbol: &str,
) -> Result<f64, MarketError> {
    let url = format!("{base_url}/api/v3/ticker/price?symbol={}", pair(symbol));
    let body = get_text(client, &url).await?;
    parse_ticker(&body)
}

// ─── Parsing ──────────────────────────────────────────────────────────────────

pub fn parse_klines(body: &str) -> Result<Vec<Candle>, MarketError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    rows.iter().enumerate().map(|(i, row)| parse_row(i, row)).collect()
}

fn parse_row(index: usize, row: &[Value]) -> Result<Candle, MarketError> {
    if row.len() < 6 {
        return Err(MarketError::Malformed(format!(
            "kline {index} has {} fields, expected at least 6",
            row.len()
        )));
    }

    let open_ms = row[0]
        .as_i64()
        .ok_or_else(|| MarketError::Malformed(format!("kline {index}: open time is not an integer")))?;
    let open_time = Utc
        .timestamp_millis_opt(open_ms)
        .single()
        .ok_or_else(|| MarketError::Malformed(format!("kline {index}: open time out of range")))?;

    Ok(Candle {
        open_time,
        open:   decimal(index, "open", &row[1])?,
        high:   decimal(index, "high", &row[2])?,
        low:    decimal(index, "low", &row[3])?,
        close:  decimal(index, "close", &row[4])?,
        volume: decimal(index, "volume", &row[5])?,
    })
}

/// Binance sends decimals as strings; accept bare numbers too. `"NaN"`,
/// `"inf"` and negatives parse as f64 but are never valid market data.
fn decimal(index: usize, field: &str, value: &Value) -> Result<f64, MarketError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| MarketError::Malformed(format!("kline {index}: {field} is not a non-negative decimal")))
}

pub fn parse_ticker(body: &str) -> Result<f64, MarketError> {
    let ticker: TickerPrice = serde_json::from_str(body)?;
    ticker
        .price
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| MarketError::Malformed(format!("ticker price '{}' is not a positive decimal", ticker.price)))
}
