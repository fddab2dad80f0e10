//! # range_log — append-only record of user range selections
//!
//! One JSON object per line. The service only ever appends; nothing reads
//! the file back. Writes run detached from the request that caused them, and
//! a failed write is logged and dropped.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Bias;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeLogEntry {
    pub timestamp:         DateTime<Utc>,
    pub session_id:        Uuid,
    pub symbol:            String,
    pub lower:             f64,
    pub upper:             f64,
    pub bias:              Bias,
    pub leverage:          f64,
    pub liquidation_floor: f64,
    pub daily_yield:       f64,
    pub compliant:         bool,
}

pub struct RangeLog {
    path: PathBuf,
}

impl RangeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one line, creating the file if needed.
    pub async fn append(&self, entry: &RangeLogEntry) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(entry).context("Failed to serialize range log entry")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;

        debug!(path = %self.path.display(), lower = entry.lower, upper = entry.upper, "range logged");
        Ok(())
    }

    /// Fire-and-forget append.
    pub fn append_detached(self: &Arc<Self>, entry: RangeLogEntry) {
        let log = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = log.append(&entry).await {
                warn!(error = %e, "⚠️ range log write failed");
            }
        });
    }
}
