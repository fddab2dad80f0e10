//! # routes
//!
//! HTTP + WebSocket surface. Handlers stay thin: validate, call into
//! `engine` / `dashboard`, wrap the result in `{"ok": true, ...}`.

pub mod calc;
pub mod market;
pub mod monitor;
pub mod session;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Market ───────────────────────────────────────────────────────────
        .route("/api/health",                   get(market::health_check))
        .route("/api/market",                   get(market::get_market))
        .route("/api/news",                     get(market::get_news))
        // ── Calculator ───────────────────────────────────────────────────────
        .route("/api/calculate",                post(calc::calculate))
        // ── Sessions ─────────────────────────────────────────────────────────
        .route("/api/sessions",                 post(session::create_session))
        .route("/api/sessions/:id",             delete(session::delete_session))
        .route("/api/sessions/:id/dashboard",   get(session::get_dashboard))
        .route("/api/sessions/:id/controls",    post(session::update_controls))
        // ── Monitor ──────────────────────────────────────────────────────────
        .route("/ws/dashboard",                 get(monitor::ws_dashboard))
        // ── Middleware ───────────────────────────────────────────────────────
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{config::Config, state::build_state};

    fn make_state() -> SharedState {
        let log_path = std::env::temp_dir()
            .join(format!("range-yield-routes-{}.jsonl", uuid::Uuid::new_v4()));
        let log_path = log_path.to_string_lossy().into_owned();

        let config = Config::from_lookup(|key| match key {
            "MARKET_SOURCE"  => Some("placeholder".into()),
            "RANGE_LOG_PATH" => Some(log_path.clone()),
            _ => None,
        })
        .unwrap();
        build_state(config)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_source_and_counters() {
        let app = build_router(make_state());
        let (status, body) = send(&app, Method::GET, "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["source"], "placeholder");
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn market_uses_fallback_and_rejects_unknown_interval() {
        let app = build_router(make_state());

        let (status, body) = send(&app, Method::GET, "/api/market", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["market"]["current_price"], 135.84);
        assert_eq!(body["market"]["freshness"]["status"], "STALE");

        let (status, body) = send(&app, Method::GET, "/api/market?interval=7m", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn calculate_returns_full_report() {
        let app = build_router(make_state());
        let inputs = json!({
            "price": 135.84, "volatility": 8.45, "capital": 10000.0, "leverage": 1.5,
        });

        let (status, body) = send(&app, Method::POST, "/api/calculate", Some(inputs)).await;
        assert_eq!(status, StatusCode::OK);

        let report = &body["report"];
        assert_eq!(report["auto_range"]["bias"], "NEUTRAL");
        assert_eq!(report["compliance"]["compliant"], true);
        assert_eq!(report["yields"]["horizons"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn calculate_rejects_bad_leverage() {
        let app = build_router(make_state());
        let inputs = json!({
            "price": 135.84, "volatility": 8.45, "capital": 10000.0, "leverage": 0.5,
        });

        let (status, body) = send(&app, Method::POST, "/api/calculate", Some(inputs)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let state = make_state();
        let app = build_router(state.clone());
        let id = create(&app).await;

        let (status, body) = send(&app, Method::GET, &format!("/api/sessions/{id}/dashboard"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dashboard"]["controls"]["leverage"], 1.5);
        assert!(body["dashboard"]["data_warning"].is_string());

        let update = json!({ "leverage": 3.0, "theme": "light" });
        let (status, body) =
            send(&app, Method::POST, &format!("/api/sessions/{id}/controls"), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["range_logged"], false);
        assert_eq!(body["dashboard"]["controls"]["leverage"], 3.0);
        assert_eq!(body["dashboard"]["controls"]["theme"], "light");

        // Remembered across renders.
        let (_, body) = send(&app, Method::GET, &format!("/api/sessions/{id}/dashboard"), None).await;
        assert_eq!(body["dashboard"]["controls"]["leverage"], 3.0);
        assert!(state.render_count.load(std::sync::atomic::Ordering::Relaxed) >= 3);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, &format!("/api/sessions/{id}/dashboard"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn manual_range_is_logged_and_flagged() {
        let state = make_state();
        let app = build_router(state.clone());
        let mut events = state.broadcast_tx.subscribe();
        let id = create(&app).await;

        // Lower bound under the 1.5x floor (~95.09).
        let update = json!({ "selected_range": { "lower": 90.0, "upper": 160.0 } });
        let (status, body) =
            send(&app, Method::POST, &format!("/api/sessions/{id}/controls"), Some(update)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["range_logged"], true);
        assert_eq!(body["dashboard"]["report"]["compliance"]["compliant"], false);
        assert!(body["dashboard"]["risk_warning"].is_string());

        let mut seen = Vec::new();
        while let Ok(raw) = events.try_recv() {
            let event: Value = serde_json::from_str(&raw).unwrap();
            seen.push(event["event"].as_str().unwrap().to_string());
        }
        assert!(seen.contains(&"SESSION_CREATED".to_string()));
        assert!(seen.contains(&"COMPLIANCE_WARNING".to_string()));
        assert!(seen.contains(&"RANGE_LOGGED".to_string()));
        assert!(seen.contains(&"CONTROLS_UPDATED".to_string()));
    }

    #[tokio::test]
    async fn invalid_controls_leave_session_untouched() {
        let app = build_router(make_state());
        let id = create(&app).await;

        let update = json!({ "leverage": 2.0, "selected_range": { "lower": 150.0, "upper": 100.0 } });
        let (status, _) =
            send(&app, Method::POST, &format!("/api/sessions/{id}/controls"), Some(update)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, Method::GET, &format!("/api/sessions/{id}/dashboard"), None).await;
        assert_eq!(body["dashboard"]["controls"]["leverage"], 1.5);
    }

    #[tokio::test]
    async fn range_outside_slider_span_is_rejected() {
        let app = build_router(make_state());
        let id = create(&app).await;

        // Span at 135.84 is 13.584..258.096.
        let update = json!({ "selected_range": { "lower": 300.0, "upper": 400.0 } });
        let (status, body) =
            send(&app, Method::POST, &format!("/api/sessions/{id}/controls"), Some(update)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);

        let (_, body) = send(&app, Method::GET, &format!("/api/sessions/{id}/dashboard"), None).await;
        assert!(body["dashboard"]["controls"]["selected_range"].is_null());
        assert!(body["dashboard"]["report"]["yields"]["band_width"].as_f64().unwrap() > 1.0);
    }

    #[tokio::test]
    async fn broadcasts_omit_position_size() {
        let state = make_state();
        let app = build_router(state.clone());
        let id = create(&app).await;
        let mut events = state.broadcast_tx.subscribe();

        let update = json!({ "capital": 250000.0, "leverage": 4.0 });
        let (status, _) =
            send(&app, Method::POST, &format!("/api/sessions/{id}/controls"), Some(update)).await;
        assert_eq!(status, StatusCode::OK);

        let mut updated = None;
        while let Ok(raw) = events.try_recv() {
            assert!(!raw.contains("250000"));
            let event: Value = serde_json::from_str(&raw).unwrap();
            if event["event"] == "CONTROLS_UPDATED" {
                updated = Some(event);
            }
        }
        let event = updated.unwrap();
        assert_eq!(event["summary"]["session_id"], id);
        assert!(event["summary"].get("leverage").is_none());
        assert!(event["summary"].get("capital").is_none());
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let app = build_router(make_state());
        let uri = format!("/api/sessions/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn news_is_empty_without_feed() {
        let app = build_router(make_state());
        let (status, body) = send(&app, Method::GET, "/api/news", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }
}
