//! # state
//!
//! AppState — config, market accessor (with its snapshot cache), session
//! store, range log, WebSocket broadcast channel and the shared HTTP client.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::broadcast;

use crate::config::Config;
use crate::events::DashboardEvent;
use crate::market::MarketDataAccessor;
use crate::range_log::RangeLog;
use crate::session::SessionStore;

// ─── AppState ─────────────────────────────────────────────────────────────────

/// Top-level shared state injected into every Axum handler.
pub struct AppState {
    pub config: Arc<Config>,

    // ── Market Data ───────────────────────────────────────────────────────────
    /// Provider client plus the TTL snapshot cache.
    pub market: MarketDataAccessor,

    // ── Sessions ──────────────────────────────────────────────────────────────
    /// Remembered controls per browser session.
    pub sessions: SessionStore,

    // ── Range Log ─────────────────────────────────────────────────────────────
    pub range_log: Arc<RangeLog>,

    // ── Monitor / WebSocket ───────────────────────────────────────────────────
    /// Pre-serialized JSON events for `/ws/dashboard` clients.
    pub broadcast_tx: broadcast::Sender<String>,

    // ── HTTP Client ───────────────────────────────────────────────────────────
    /// Shared reqwest client (connection pooling); also used by the news feed.
    pub http_client: reqwest::Client,

    // ── Metrics ───────────────────────────────────────────────────────────────
    pub render_count: AtomicU64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);
        let http_client = reqwest::Client::new();

        Self {
            market:       MarketDataAccessor::new(http_client.clone(), config.market.clone(), config.calc.clone()),
            sessions:     SessionStore::new(config.dashboard.session_idle_ttl),
            range_log:    Arc::new(RangeLog::new(config.range_log_path.clone())),
            broadcast_tx,
            http_client,
            render_count: AtomicU64::new(0),
            config:       Arc::new(config),
        }
    }

    /// Broadcast to every WebSocket client. No listener is not an error.
    pub fn broadcast(&self, event: &DashboardEvent) {
        let _ = self.broadcast_tx.send(event.to_json());
    }

    /// Expire idle sessions and tell dashboard clients which ones went away.
    pub async fn sweep_sessions(&self) -> usize {
        let expired = self.sessions.sweep_idle().await;
        for session_id in &expired {
            self.broadcast(&DashboardEvent::SessionClosed { session_id: *session_id });
        }
        expired.len()
    }

    pub fn count_render(&self) -> u64 {
        self.render_count.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state(config: Config) -> SharedState {
    Arc::new(AppState::new(config))
}
