//! # routes::market
//!
//! | Method | Path          | Description                                  |
//! |--------|---------------|----------------------------------------------|
//! | GET    | `/api/market` | memoized snapshot (`?interval=1d` optional)  |
//! | GET    | `/api/news`   | headlines, empty when the feed is down       |
//! | GET    | `/api/health` | liveness + counters                          |

use std::sync::atomic::Ordering;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, news::fetch_headlines, session::validate_interval, state::SharedState};

#[derive(Debug, Deserialize)]
pub struct IntervalQuery {
    pub interval: Option<String>,
}

/// GET /api/market
pub async fn get_market(
    State(state): State<SharedState>,
    Query(query): Query<IntervalQuery>,
) -> Result<impl IntoResponse, AppError> {
    let interval = query
        .interval
        .unwrap_or_else(|| state.config.market.default_interval.clone());
    validate_interval(&interval)?;

    let snapshot = state.market.snapshot(&interval).await;
    Ok(Json(json!({ "ok": true, "market": snapshot })))
}

/// GET /api/news
pub async fn get_news(State(state): State<SharedState>) -> impl IntoResponse {
    let items = fetch_headlines(&state.http_client, &state.config.news).await;
    Json(json!({
        "ok":    true,
        "count": items.len(),
        "items": items,
    }))
}

/// GET /api/health
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "ok":               true,
        "source":           state.market.config().source.to_string(),
        "symbol":           state.market.config().symbol,
        "preset":           state.config.calc.preset,
        "sessions":         state.sessions.len().await,
        "cached_intervals": state.market.cached_intervals(),
        "render_count":     state.render_count.load(Ordering::Relaxed),
    }))
}
