//! # routes::calc
//!
//! Stateless calculator: explicit inputs in, full report out. Nothing is
//! remembered or logged.
//!
//! | Method | Path             | Description                      |
//! |--------|------------------|----------------------------------|
//! | POST   | `/api/calculate` | band, floor, yield, compliance   |

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{
    engine::report::{evaluate, CalcInputs},
    error::AppError,
    session::{validate_leverage, validate_range},
    state::SharedState,
};

/// POST /api/calculate
pub async fn calculate(
    State(state): State<SharedState>,
    Json(inputs): Json<CalcInputs>,
) -> Result<impl IntoResponse, AppError> {
    let dash = &state.config.dashboard;

    if !(inputs.price.is_finite() && inputs.price > 0.0) {
        return Err(AppError::BadRequest(format!("price must be positive, got {}", inputs.price)));
    }
    if !(inputs.volatility.is_finite() && inputs.volatility >= 0.0) {
        return Err(AppError::BadRequest(format!(
            "volatility must be non-negative, got {}",
            inputs.volatility
        )));
    }
    if !(inputs.capital.is_finite() && inputs.capital > 0.0) {
        return Err(AppError::BadRequest(format!("capital must be positive, got {}", inputs.capital)));
    }
    validate_leverage(inputs.leverage, dash.min_leverage, dash.max_leverage)?;
    if let Some(range) = &inputs.selected_range {
        validate_range(range)?;
    }

    let report = evaluate(&inputs, &state.config.calc);
    Ok(Json(json!({ "ok": true, "report": report })))
}
