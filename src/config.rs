//! # config — read Config from environment variables
//!
//! `.env` is loaded by `main` through `dotenvy` before this runs. Every
//! variable has a default; a value that is set but cannot be parsed is a
//! startup error.

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{bail, Context};

use crate::engine::{
    liquidation::LiquidationModel, CalcConfig, CalcPreset,
};
use crate::market::SUPPORTED_INTERVALS;
use crate::models::YieldBasis;

// ─── Market Source ────────────────────────────────────────────────────────────

/// Upstream market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSource {
    /// No I/O, always the fallback snapshot.
    Placeholder,
    /// Exchange REST klines.
    Binance,
    /// Aggregator chart API.
    Yahoo,
}

impl MarketSource {
    pub fn default_base_url(self) -> &'static str {
        match self {
            MarketSource::Placeholder => "",
            MarketSource::Binance     => "https://api.binance.com",
            MarketSource::Yahoo       => "https://query1.finance.yahoo.com",
        }
    }
}

impl std::fmt::Display for MarketSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketSource::Placeholder => write!(f, "placeholder"),
            MarketSource::Binance     => write!(f, "binance"),
            MarketSource::Yahoo       => write!(f, "yahoo"),
        }
    }
}

// ─── Sections ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub source:                   MarketSource,
    pub base_url:                 String,
    /// Primary asset, e.g. "SOL"
    pub symbol:                   String,
    /// Banner asset, e.g. "BTC"
    pub reference_symbol:         String,
    /// Number of candles requested
    pub lookback:                 usize,
    pub default_interval:         String,
    pub cache_ttl:                Duration,
    pub fallback_price:           f64,
    pub fallback_atr:             f64,
    pub fallback_reference_price: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub default_capital:  f64,
    pub default_leverage: f64,
    pub min_leverage:     f64,
    pub max_leverage:     f64,
    /// Manual range is clamped to [price × min_factor, price × max_factor]
    pub range_min_factor: f64,
    pub range_max_factor: f64,
    /// Sessions untouched for this long are dropped.
    pub session_idle_ttl: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_capital:  10_000.0,
            default_leverage: 1.5,
            min_leverage:     1.0,
            max_leverage:     10.0,
            range_min_factor: 0.1,
            range_max_factor: 1.9,
            session_idle_ttl: Duration::from_secs(86_400),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsConfig {
    /// `None` disables the feed.
    pub url:   Option<String>,
    pub count: usize,
}

/// Everything the service needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr:      SocketAddr,
    pub market:         MarketConfig,
    pub calc:           CalcConfig,
    pub dashboard:      DashboardConfig,
    pub news:           NewsConfig,
    pub range_log_path: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let bind_addr: SocketAddr = env.parse_or("BIND_ADDR", "0.0.0.0:3000".parse()?)?;

        // ── Market ────────────────────────────────────────────────────────────
        let source = match env.get("MARKET_SOURCE").unwrap_or_else(|| "yahoo".into()).to_lowercase().as_str() {
            "placeholder" => MarketSource::Placeholder,
            "binance"     => MarketSource::Binance,
            "yahoo"       => MarketSource::Yahoo,
            other => bail!("Unknown MARKET_SOURCE: '{other}'. Use 'placeholder', 'binance' or 'yahoo'"),
        };

        let lookback: usize = env.parse_or("MARKET_LOOKBACK", 60)?;
        let market = MarketConfig {
            source,
            base_url:                 env.get("MARKET_BASE_URL").unwrap_or_else(|| source.default_base_url().to_string()),
            symbol:                   env.get("SYMBOL").unwrap_or_else(|| "SOL".to_string()).to_uppercase(),
            reference_symbol:         env.get("REFERENCE_SYMBOL").unwrap_or_else(|| "BTC".to_string()).to_uppercase(),
            lookback,
            default_interval:         env.get("MARKET_INTERVAL").unwrap_or_else(|| "1d".to_string()),
            cache_ttl:                Duration::from_secs(env.parse_or("MARKET_CACHE_TTL_SECS", 60)?),
            fallback_price:           env.parse_or("FALLBACK_PRICE", 135.84)?,
            fallback_atr:             env.parse_or("FALLBACK_ATR", 8.45)?,
            fallback_reference_price: env.parse_opt("FALLBACK_REFERENCE_PRICE")?,
        };

        if !SUPPORTED_INTERVALS.iter().any(|i| *i == market.default_interval) {
            bail!(
                "Unknown MARKET_INTERVAL: '{}'. Use one of {SUPPORTED_INTERVALS:?}",
                market.default_interval
            );
        }
        if !(market.fallback_price.is_finite() && market.fallback_price > 0.0) {
            bail!("FALLBACK_PRICE must be a positive number, got {}", market.fallback_price);
        }
        if !(market.fallback_atr.is_finite() && market.fallback_atr >= 0.0) {
            bail!("FALLBACK_ATR must be a non-negative number, got {}", market.fallback_atr);
        }
        if let Some(price) = market.fallback_reference_price {
            if !(price.is_finite() && price > 0.0) {
                bail!("FALLBACK_REFERENCE_PRICE must be a positive number, got {price}");
            }
        }

        // ── Calculator ────────────────────────────────────────────────────────
        let preset: CalcPreset = match env.get("CALC_PRESET") {
            Some(raw) => raw.parse().map_err(anyhow::Error::msg).context("CALC_PRESET")?,
            None => CalcPreset::default(),
        };
        let mut calc = CalcConfig::preset(preset);

        calc.atr_period = env.parse_or("ATR_PERIOD", calc.atr_period)?;
        if calc.atr_period == 0 {
            bail!("ATR_PERIOD must be at least 1");
        }
        if calc.atr_period > lookback {
            bail!("ATR_PERIOD ({}) cannot exceed MARKET_LOOKBACK ({lookback})", calc.atr_period);
        }

        let m = &mut calc.forecast.multipliers;
        m.bullish = env.parse_or("MULT_BULLISH", m.bullish)?;
        m.neutral = env.parse_or("MULT_NEUTRAL", m.neutral)?;
        m.bearish = env.parse_or("MULT_BEARISH", m.bearish)?;

        let shift_enabled = env.parse_or("DIRECTIONAL_SHIFT", calc.forecast.shift_factor.is_some())?;
        calc.forecast.shift_factor = if shift_enabled {
            Some(env.parse_or("SHIFT_FACTOR", calc.forecast.shift_factor.unwrap_or(0.7))?)
        } else {
            None
        };

        if let Some(ratio) = env.parse_opt::<f64>("LIQ_FIXED_RATIO")? {
            calc.liquidation = LiquidationModel::FixedRatio { ratio };
        } else if let Some(safety_constant) = env.parse_opt::<f64>("SAFETY_CONSTANT")? {
            calc.liquidation = LiquidationModel::LeverageScaled { safety_constant };
        }

        calc.yields.fee_constant           = env.parse_or("FEE_CONSTANT", calc.yields.fee_constant)?;
        calc.yields.concentration_constant = env.parse_or("CONCENTRATION_CONSTANT", calc.yields.concentration_constant)?;
        calc.yields.band_epsilon           = env.parse_or("BAND_EPSILON", calc.yields.band_epsilon)?;
        if calc.yields.band_epsilon <= 0.0 {
            bail!("BAND_EPSILON must be positive");
        }
        calc.yields.basis = match env.get("YIELD_BASIS").map(|v| v.to_lowercase()).as_deref() {
            None            => calc.yields.basis,
            Some("daily")   => YieldBasis::Daily,
            Some("hourly")  => YieldBasis::Hourly,
            Some(other)     => bail!("Unknown YIELD_BASIS: '{other}'. Use 'daily' or 'hourly'"),
        };

        calc.bias.rsi_bullish = env.parse_or("BIAS_RSI_BULLISH", calc.bias.rsi_bullish)?;
        calc.bias.rsi_bearish = env.parse_or("BIAS_RSI_BEARISH", calc.bias.rsi_bearish)?;

        // ── Dashboard ─────────────────────────────────────────────────────────
        let d = DashboardConfig::default();
        let dashboard = DashboardConfig {
            default_capital:  env.parse_or("DEFAULT_CAPITAL", d.default_capital)?,
            default_leverage: env.parse_or("DEFAULT_LEVERAGE", d.default_leverage)?,
            min_leverage:     d.min_leverage,
            max_leverage:     env.parse_or("MAX_LEVERAGE", d.max_leverage)?,
            range_min_factor: env.parse_or("RANGE_MIN_FACTOR", d.range_min_factor)?,
            range_max_factor: env.parse_or("RANGE_MAX_FACTOR", d.range_max_factor)?,
            session_idle_ttl: match env.parse_opt::<u64>("SESSION_IDLE_TTL_SECS")? {
                Some(secs) => Duration::from_secs(secs),
                None => d.session_idle_ttl,
            },
        };
        if dashboard.max_leverage < dashboard.min_leverage {
            bail!("MAX_LEVERAGE must be at least {}", dashboard.min_leverage);
        }
        if !(dashboard.min_leverage..=dashboard.max_leverage).contains(&dashboard.default_leverage) {
            bail!("DEFAULT_LEVERAGE must lie within {}..={}", dashboard.min_leverage, dashboard.max_leverage);
        }
        if !(dashboard.range_min_factor > 0.0 && dashboard.range_min_factor < dashboard.range_max_factor) {
            bail!("RANGE_MIN_FACTOR must be positive and below RANGE_MAX_FACTOR");
        }
        if dashboard.session_idle_ttl.is_zero() {
            bail!("SESSION_IDLE_TTL_SECS must be at least 1");
        }

        Ok(Self {
            bind_addr,
            market,
            calc,
            dashboard,
            news: NewsConfig {
                url:   env.get("NEWS_URL").filter(|u| !u.is_empty()),
                count: env.parse_or("NEWS_COUNT", 5)?,
            },
            range_log_path: env.get("RANGE_LOG_PATH").unwrap_or_else(|| "range_log.jsonl".to_string()).into(),
        })
    }
}

// ─── Lookup Helpers ───────────────────────────────────────────────────────────

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn parse_opt<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
            None => Ok(None),
        }
    }

    fn parse_or<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse_opt(key)?.unwrap_or(default))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
