//! # Range Yield — Concentrated-Liquidity Range Dashboard Backend
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐   klines / chart   ┌──────────────────────┐
//!  │  Binance /   │ ──────────────────▶│  MarketDataAccessor  │
//!  │  Yahoo       │                    │  (TTL snapshot cache)│
//!  └──────────────┘                    └──────────┬───────────┘
//!                                                 │ MarketSnapshot
//!  ┌──────────────┐   POST /api/sessions/…        ▼
//!  │  Dashboard   │ ─────────────────────▶ [render] ─▶ engine: band · floor ·
//!  │  (browser)   │ ◀───────────────────── DashboardView     yield · compliance
//!  └──────────────┘        │
//!         ▲                ├──▶ range_log.jsonl (append-only)
//!         └── /ws/dashboard ◀── broadcast events
//! ```
//!
//! ## Environment Variables
//!
//! | Variable         | Default           | Description                          |
//! |------------------|-------------------|--------------------------------------|
//! | `BIND_ADDR`      | `0.0.0.0:3000`    | Address Axum listens on              |
//! | `MARKET_SOURCE`  | `yahoo`           | `placeholder`, `binance` or `yahoo`  |
//! | `SYMBOL`         | `SOL`             | Primary asset                        |
//! | `CALC_PRESET`    | `standard`        | `standard`, `flat` or `fixed-floor`  |
//! | `RANGE_LOG_PATH` | `range_log.jsonl` | Where range selections are appended  |
//! | `SESSION_IDLE_TTL_SECS` | `86400`    | Idle sessions are dropped after this |
//! | `RUST_LOG`       | `range_yield=debug` | Tracing filter                     |
//!
//! The full list lives in `config.rs`.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod dashboard;
mod engine;
mod error;
mod events;
mod market;
mod models;
mod news;
mod range_log;
mod routes;
mod session;
mod state;

use config::Config;
use routes::build_router;
use state::build_state;

const SESSION_SWEEP_EVERY: std::time::Duration = std::time::Duration::from_secs(300);

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional, CI/prod can use real env vars) ──────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("range_yield=debug".parse()?)
            .add_directive("tower_http=info".parse()?))
        .init();

    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║        RANGE YIELD — Liquidity Dashboard      ║
  ║        Rust + Axum  ·  Band · Floor · Yield   ║
  ╚═══════════════════════════════════════════════╝"#
    );

    // ── 3. Load config ───────────────────────────────────────────────────────
    let config = Config::from_env().context("Failed to load configuration")?;
    let addr = config.bind_addr;

    info!(
        source   = %config.market.source,
        symbol   = %config.market.symbol,
        interval = %config.market.default_interval,
        preset   = ?config.calc.preset,
        "⚙️ configuration loaded"
    );

    // ── 4. Build shared state + router ───────────────────────────────────────
    let state = build_state(config);
    info!(path = %state.range_log.path().display(), "📝 range log");

    // ── 5. Idle session sweeper ──────────────────────────────────────────────
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_EVERY);
        loop {
            ticker.tick().await;
            sweeper.sweep_sessions().await;
        }
    });

    let app = build_router(state);

    // ── 6. Start the server ──────────────────────────────────────────────────
    info!(?addr, "🚀 Range Yield server starting");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
