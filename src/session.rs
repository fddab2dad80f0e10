//! # session — per-user remembered controls
//!
//! Each browser session owns one [`SessionState`]. It is read on every render
//! and written on every interaction, so a manually dragged range survives the
//! next refresh instead of snapping back to the auto-range. Sessions nobody
//! has touched for `SESSION_IDLE_TTL_SECS` are swept.

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::market::SUPPORTED_INTERVALS;
use crate::models::{BiasSelection, Controls, ControlsUpdate, RangeSelection, Theme};

// ─── Session State ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub controls:   Controls,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last render or update; drives idle expiry.
    pub last_seen:  DateTime<Utc>,
}

/// What an update changed, for logging decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub range_changed: bool,
}

impl SessionState {
    pub fn new(config: &Config) -> Self {
        let now = Utc::now();
        Self {
            controls: Controls {
                capital:        config.dashboard.default_capital,
                leverage:       config.dashboard.default_leverage,
                bias:           BiasSelection::Auto,
                selected_range: None,
                interval:       config.market.default_interval.clone(),
                theme:          Theme::default(),
            },
            created_at: now,
            updated_at: now,
            last_seen:  now,
        }
    }

    /// Validate and apply a partial update. Nothing is applied on error.
    ///
    /// `limits` is the slider span at the current price; a manual range must
    /// lie inside it.
    pub fn apply(
        &mut self,
        update: ControlsUpdate,
        config: &Config,
        limits: &RangeSelection,
    ) -> Result<UpdateOutcome, AppError> {
        let dash = &config.dashboard;

        if let Some(capital) = update.capital {
            if !(capital.is_finite() && capital > 0.0) {
                return Err(AppError::BadRequest(format!("capital must be positive, got {capital}")));
            }
        }
        if let Some(leverage) = update.leverage {
            validate_leverage(leverage, dash.min_leverage, dash.max_leverage)?;
        }
        if let Some(range) = &update.selected_range {
            validate_range(range)?;
            if !range.is_within(limits) {
                return Err(AppError::BadRequest(format!(
                    "range {}..{} lies outside the allowed span {}..{}",
                    range.lower, range.upper, limits.lower, limits.upper
                )));
            }
        }
        if let Some(interval) = &update.interval {
            validate_interval(interval)?;
        }

        let before = self.controls.selected_range;
        let c = &mut self.controls;

        if let Some(v) = update.capital  { c.capital = v; }
        if let Some(v) = update.leverage { c.leverage = v; }
        if let Some(v) = update.bias     { c.bias = v; }
        if let Some(v) = update.theme    { c.theme = v; }
        if let Some(v) = update.interval { c.interval = v; }
        if update.reset_range {
            c.selected_range = None;
        } else if let Some(v) = update.selected_range {
            c.selected_range = Some(v);
        }

        self.updated_at = Utc::now();
        Ok(UpdateOutcome { range_changed: self.controls.selected_range != before })
    }
}

pub fn validate_leverage(leverage: f64, min: f64, max: f64) -> Result<(), AppError> {
    if leverage.is_finite() && (min..=max).contains(&leverage) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("leverage must lie within {min}..={max}, got {leverage}")))
    }
}

pub fn validate_range(range: &RangeSelection) -> Result<(), AppError> {
    if !(range.lower.is_finite() && range.upper.is_finite()) {
        return Err(AppError::BadRequest("range bounds must be finite".into()));
    }
    if range.lower >= range.upper {
        return Err(AppError::BadRequest(format!(
            "range lower ({}) must be below upper ({})",
            range.lower, range.upper
        )));
    }
    Ok(())
}

pub fn validate_interval(interval: &str) -> Result<(), AppError> {
    if SUPPORTED_INTERVALS.iter().any(|i| *i == interval) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "unsupported interval '{interval}', use one of {SUPPORTED_INTERVALS:?}"
        )))
    }
}

// ─── Store ────────────────────────────────────────────────────────────────────

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionState>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), idle_ttl }
    }

    pub async fn create(&self, config: &Config) -> (Uuid, SessionState) {
        let id = Uuid::new_v4();
        let state = SessionState::new(config);
        self.sessions.write().await.insert(id, state.clone());
        info!(session_id = %id, "🆕 session created");
        (id, state)
    }

    /// Drop sessions idle for longer than the TTL and return their ids.
    pub async fn sweep_idle(&self) -> Vec<Uuid> {
        let now = Utc::now();
        let ttl = self.idle_ttl;
        let is_idle = |s: &SessionState| {
            now.signed_duration_since(s.last_seen)
                .to_std()
                .map_or(false, |idle| idle > ttl)
        };

        let mut sessions = self.sessions.write().await;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, s)| is_idle(s))
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }

        if !expired.is_empty() {
            info!(count = expired.len(), remaining = sessions.len(), "🧹 idle sessions expired");
        }
        expired
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionState> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Run `f` against the stored session under the write lock. Counts as
    /// activity for idle expiry.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Result<R, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
        session.last_seen = Utc::now();
        Ok(f(session))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Slider span at the 135.84 fallback price.
    const LIMITS: RangeSelection = RangeSelection { lower: 13.584, upper: 258.096 };

    fn make_config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    #[test]
    fn new_session_uses_configured_defaults() {
        let s = SessionState::new(&make_config());
        assert_eq!(s.controls.capital, 10_000.0);
        assert_eq!(s.controls.leverage, 1.5);
        assert_eq!(s.controls.bias, BiasSelection::Auto);
        assert_eq!(s.controls.interval, "1d");
        assert!(s.controls.selected_range.is_none());
    }

    #[test]
    fn range_update_is_remembered_and_reported() {
        let config = make_config();
        let mut s = SessionState::new(&config);

        let outcome = s
            .apply(
                ControlsUpdate {
                    selected_range: Some(RangeSelection { lower: 112.0, upper: 159.0 }),
                    ..Default::default()
                },
                &config,
                &LIMITS,
            )
            .unwrap();
        assert!(outcome.range_changed);

        let outcome = s
            .apply(ControlsUpdate { leverage: Some(3.0), ..Default::default() }, &config, &LIMITS)
            .unwrap();
        assert!(!outcome.range_changed);
        assert_eq!(s.controls.selected_range, Some(RangeSelection { lower: 112.0, upper: 159.0 }));
        assert_eq!(s.controls.leverage, 3.0);
    }

    #[test]
    fn reset_drops_manual_range() {
        let config = make_config();
        let mut s = SessionState::new(&config);
        s.controls.selected_range = Some(RangeSelection { lower: 100.0, upper: 150.0 });

        let outcome = s
            .apply(ControlsUpdate { reset_range: true, ..Default::default() }, &config, &LIMITS)
            .unwrap();
        assert!(outcome.range_changed);
        assert!(s.controls.selected_range.is_none());
    }

    #[test]
    fn invalid_update_changes_nothing() {
        let config = make_config();
        let mut s = SessionState::new(&config);
        let before = s.clone();

        let err = s.apply(
            ControlsUpdate { capital: Some(5_000.0), leverage: Some(25.0), ..Default::default() },
            &config,
            &LIMITS,
        );
        assert!(matches!(err, Err(AppError::BadRequest(_))));
        assert_eq!(s, before);

        assert!(s
            .apply(
                ControlsUpdate {
                    selected_range: Some(RangeSelection { lower: 150.0, upper: 120.0 }),
                    ..Default::default()
                },
                &config,
                &LIMITS,
            )
            .is_err());
        assert!(s.apply(ControlsUpdate { capital: Some(0.0), ..Default::default() }, &config, &LIMITS).is_err());
        assert!(s.apply(ControlsUpdate { interval: Some("2d".into()), ..Default::default() }, &config, &LIMITS).is_err());
    }

    #[tokio::test]
    async fn store_round_trip() {
        let config = make_config();
        let store = SessionStore::new(Duration::from_secs(3_600));
        let (id, _) = store.create(&config).await;
        assert_eq!(store.len().await, 1);

        store
            .with_session(id, |s| s.controls.theme = Theme::Light)
            .await
            .unwrap();
        assert_eq!(store.get(id).await.unwrap().controls.theme, Theme::Light);

        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(matches!(
            store.with_session(id, |_| ()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn range_outside_span_is_rejected() {
        let config = make_config();
        let mut s = SessionState::new(&config);
        let before = s.clone();

        let err = s.apply(
            ControlsUpdate {
                selected_range: Some(RangeSelection { lower: 300.0, upper: 400.0 }),
                ..Default::default()
            },
            &config,
            &LIMITS,
        );
        assert!(matches!(err, Err(AppError::BadRequest(_))));
        assert_eq!(s, before);
    }

    #[tokio::test]
    async fn idle_sessions_are_swept() {
        let config = make_config();
        let store = SessionStore::new(Duration::from_secs(3_600));
        let (idle, _) = store.create(&config).await;
        let (active, _) = store.create(&config).await;

        store
            .with_session(idle, |s| s.last_seen = Utc::now() - chrono::Duration::hours(2))
            .await
            .unwrap();

        assert_eq!(store.sweep_idle().await, vec![idle]);
        assert!(store.get(idle).await.is_none());
        assert!(store.get(active).await.is_some());
        assert!(store.sweep_idle().await.is_empty());
    }

    #[tokio::test]
    async fn access_keeps_session_alive() {
        let config = make_config();
        let store = SessionStore::new(Duration::from_secs(3_600));
        let (id, _) = store.create(&config).await;

        store
            .with_session(id, |s| s.last_seen = Utc::now() - chrono::Duration::hours(2))
            .await
            .unwrap();
        // Next access refreshes last_seen before the sweep.
        store.with_session(id, |_| ()).await.unwrap();

        assert!(store.sweep_idle().await.is_empty());
        assert_eq!(store.len().await, 1);
    }
}
