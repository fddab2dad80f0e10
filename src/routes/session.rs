//! # routes::session
//!
//! Session-scoped dashboard. The browser keeps the session id and sends every
//! control change here; the response is the fully re-rendered page.
//!
//! | Method | Path                            | Description                     |
//! |--------|---------------------------------|---------------------------------|
//! | POST   | `/api/sessions`                 | new session + first render      |
//! | GET    | `/api/sessions/:id/dashboard`   | re-render with remembered state |
//! | POST   | `/api/sessions/:id/controls`    | apply controls, re-render, log  |
//! | DELETE | `/api/sessions/:id`             | forget the session              |

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dashboard::{range_limits, render, DashboardView},
    error::AppError,
    events::DashboardEvent,
    models::ControlsUpdate,
    range_log::RangeLogEntry,
    session::validate_interval,
    state::SharedState,
};

// ─── Render Helper ────────────────────────────────────────────────────────────

/// Fetch (memoized) market data for the session's interval and render.
///
/// The session lock is not held while the snapshot is fetched.
async fn render_session(state: &SharedState, id: Uuid) -> Result<DashboardView, AppError> {
    let interval = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?
        .controls
        .interval;

    let snapshot = state.market.snapshot(&interval).await;
    let view = state
        .sessions
        .with_session(id, |session| render(id, &snapshot, session, &state.config))
        .await?;

    state.count_render();
    Ok(view)
}

// ─── POST /api/sessions ───────────────────────────────────────────────────────

pub async fn create_session(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    state.sweep_sessions().await;

    let (id, _) = state.sessions.create(&state.config).await;
    state.broadcast(&DashboardEvent::SessionCreated { session_id: id });

    let view = render_session(&state, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok":         true,
            "session_id": id,
            "dashboard":  view,
        })),
    ))
}

// ─── GET /api/sessions/:id/dashboard ──────────────────────────────────────────

pub async fn get_dashboard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = render_session(&state, id).await?;
    Ok(Json(json!({ "ok": true, "dashboard": view })))
}

// ─── POST /api/sessions/:id/controls ──────────────────────────────────────────

pub async fn update_controls(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ControlsUpdate>,
) -> Result<impl IntoResponse, AppError> {
    // A manual range is checked against the slider span at the price the
    // page will be rendered with.
    let interval = match &update.interval {
        Some(interval) => {
            validate_interval(interval)?;
            interval.clone()
        }
        None => {
            state
                .sessions
                .get(id)
                .await
                .ok_or_else(|| AppError::NotFound(format!("session {id}")))?
                .controls
                .interval
        }
    };
    let limits = range_limits(state.market.snapshot(&interval).await.current_price, &state.config);

    let outcome = state
        .sessions
        .with_session(id, |session| session.apply(update, &state.config, &limits))
        .await??;

    let view = render_session(&state, id).await?;
    let report = &view.report;

    if !report.compliance.compliant {
        warn!(
            session_id = %id,
            lower      = report.compliance.selected_lower,
            floor      = report.compliance.liquidation_floor,
            "⚠️ selected range below liquidation floor"
        );
        state.broadcast(&DashboardEvent::ComplianceWarning {
            session_id:        id,
            selected_lower:    report.compliance.selected_lower,
            liquidation_floor: report.compliance.liquidation_floor,
        });
    }

    let mut logged = false;
    if outcome.range_changed && view.controls.selected_range.is_some() {
        let entry = RangeLogEntry {
            timestamp:         Utc::now(),
            session_id:        id,
            symbol:            view.market.symbol.clone(),
            lower:             report.selected.lower,
            upper:             report.selected.upper,
            bias:              report.auto_range.bias,
            leverage:          report.risk.leverage_factor,
            liquidation_floor: report.risk.liquidation_floor,
            daily_yield:       report.yields.amount_for("1 Day").unwrap_or_default(),
            compliant:         report.compliance.compliant,
        };
        info!(session_id = %id, lower = entry.lower, upper = entry.upper, "📝 range selected");
        state.broadcast(&DashboardEvent::RangeLogged {
            session_id: id,
            lower:      entry.lower,
            upper:      entry.upper,
            compliant:  entry.compliant,
        });
        state.range_log.append_detached(entry);
        logged = true;
    }

    state.broadcast(&DashboardEvent::ControlsUpdated { summary: view.summary() });

    Ok(Json(json!({
        "ok":           true,
        "range_logged": logged,
        "dashboard":    view,
    })))
}

// ─── DELETE /api/sessions/:id ─────────────────────────────────────────────────

pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("session {id}")));
    }
    state.broadcast(&DashboardEvent::SessionClosed { session_id: id });
    Ok(Json(json!({ "ok": true, "session_id": id })))
}
