//! # events
//!
//! Defines [`DashboardEvent`], everything the service broadcasts to browsers
//! over `/ws/dashboard`.
//!
//! Uses `tokio::sync::broadcast::Sender<String>` and converts each event to a
//! JSON string before sending, which avoids Clone constraints on the payload.

use serde::Serialize;
use uuid::Uuid;

use crate::dashboard::DashboardSummary;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DashboardEvent {
    SessionCreated {
        session_id: Uuid,
    },

    /// A session changed a control and the page was re-rendered. Carries
    /// the band and verdict only, never capital or leverage.
    ControlsUpdated {
        summary: DashboardSummary,
    },

    /// A manual range selection was written to the range log.
    RangeLogged {
        session_id: Uuid,
        lower:      f64,
        upper:      f64,
        compliant:  bool,
    },

    /// The re-rendered band dips below the liquidation floor.
    ComplianceWarning {
        session_id:        Uuid,
        selected_lower:    f64,
        liquidation_floor: f64,
    },

    SessionClosed {
        session_id: Uuid,
    },
}

impl DashboardEvent {
    /// Serialize for a WebSocket text frame.
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}
