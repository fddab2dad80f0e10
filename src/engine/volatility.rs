//! # engine::volatility
//!
//! **Volatility Estimator** — Average True Range plus the two indicators the
//! automatic bias reads (SMA, RSI).
//!
//! ```text
//! TR_i  = max(high_i − low_i, |high_i − close_{i−1}|, |low_i − close_{i−1}|)
//! TR_0  = high_0 − low_0                      (no previous close)
//! ATR_n = mean(TR over the last n observations)
//! ```
//!
//! Every estimator returns `None` when the history is shorter than its
//! window; callers decide what to substitute.

use crate::models::Candle;

pub const DEFAULT_ATR_PERIOD: usize = 14;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_SMA_PERIOD: usize = 20;

// ─── True Range ───────────────────────────────────────────────────────────────

#[inline]
pub fn true_range(high: f64, low: f64, prev_close: Option<f64>) -> f64 {
    let span = high - low;
    match prev_close {
        Some(pc) => span.max((high - pc).abs()).max((low - pc).abs()),
        None => span,
    }
}

/// One true range per candle, oldest first.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    let mut prev_close = None;
    candles
        .iter()
        .map(|c| {
            let tr = true_range(c.high, c.low, prev_close);
            prev_close = Some(c.close);
            tr
        })
        .collect()
}

/// Most recent value of the rolling mean of true range.
pub fn average_true_range(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }
    simple_moving_average(&true_ranges(candles), period)
}

// ─── Moving Average ───────────────────────────────────────────────────────────

/// Arithmetic mean of the last `period` values.
pub fn simple_moving_average(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

// ─── RSI ──────────────────────────────────────────────────────────────────────

/// RSI from simple means of gains and losses over the last `period` changes.
///
/// A window with no losses reads 100; a completely flat window reads 50.
pub fn relative_strength_index(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - (period + 1)..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0_f64, 0.0_f64), |(g, l), change| {
            if change >= 0.0 { (g + change, l) } else { (g, l - change) }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_candles(rows: &[(f64, f64, f64)]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Candle {
                open_time: start + Duration::days(i as i64),
                open:      close,
                high,
                low,
                close,
                volume:    1_000.0,
            })
            .collect()
    }

    #[test]
    fn true_range_uses_gap_from_previous_close() {
        // Gap up: prev close 100, bar trades 110–105 → |110 − 100| = 10
        assert_eq!(true_range(110.0, 105.0, Some(100.0)), 10.0);
        // Gap down: prev close 120, bar trades 110–105 → |105 − 120| = 15
        assert_eq!(true_range(110.0, 105.0, Some(120.0)), 15.0);
        // Inside bar: plain high − low
        assert_eq!(true_range(110.0, 100.0, Some(105.0)), 10.0);
        assert_eq!(true_range(110.0, 100.0, None), 10.0);
    }

    #[test]
    fn atr_is_mean_of_last_period_true_ranges() {
        let candles = make_candles(&[
            (12.0, 10.0, 11.0), // TR 2
            (13.0, 11.0, 12.0), // TR 2
            (16.0, 12.0, 15.0), // TR 4
            (15.0, 13.0, 14.0), // TR 2
        ]);
        assert_eq!(average_true_range(&candles, 3), Some((2.0 + 4.0 + 2.0) / 3.0));
        assert_eq!(average_true_range(&candles, 4), Some(10.0 / 4.0));
    }

    #[test]
    fn atr_needs_a_full_window() {
        let candles = make_candles(&[(12.0, 10.0, 11.0); 13]);
        assert_eq!(average_true_range(&candles, DEFAULT_ATR_PERIOD), None);
        assert_eq!(average_true_range(&candles, 0), None);

        let candles = make_candles(&[(12.0, 10.0, 11.0); 14]);
        assert_eq!(average_true_range(&candles, DEFAULT_ATR_PERIOD), Some(2.0));
    }

    #[test]
    fn sma_reads_trailing_window() {
        assert_eq!(simple_moving_average(&[1.0, 2.0, 3.0, 4.0], 2), Some(3.5));
        assert_eq!(simple_moving_average(&[1.0], 2), None);
    }

    #[test]
    fn rsi_extremes() {
        let rising: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert_eq!(relative_strength_index(&rising, 14), Some(100.0));

        let falling: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        assert_eq!(relative_strength_index(&falling, 14), Some(0.0));

        let flat = vec![100.0; 15];
        assert_eq!(relative_strength_index(&flat, 14), Some(50.0));

        assert_eq!(relative_strength_index(&rising[..14], 14), None);
    }

    #[test]
    fn rsi_balanced_moves_read_fifty() {
        let closes = [100.0, 102.0, 100.0, 102.0, 100.0];
        let rsi = relative_strength_index(&closes, 4).unwrap();
        assert!((rsi - 50.0).abs() < 1e-12);
    }
}
