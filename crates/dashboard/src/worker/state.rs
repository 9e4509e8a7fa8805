use crate::{Error, dashboard::DashboardSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardStatus {
    /// No snapshot has been produced yet
    Loading,
    /// Latest refresh succeeded
    Live,
    /// Latest refresh failed, previous snapshot retained
    Stale,
}

/// What the presentation layer sees: the last good snapshot plus the outcome
/// of the most recent refresh.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub snapshot: Option<Arc<DashboardSnapshot>>,
    /// Error of the most recent refresh, cleared on success
    pub last_error: Option<String>,
    pub last_success_time: Option<DateTime<Utc>>,
    pub refreshes: u64,
    pub failures: u64,
    pub consecutive_failures: u32,
}

impl DashboardState {
    pub fn status(&self) -> DashboardStatus {
        match (&self.snapshot, &self.last_error) {
            (None, _) => DashboardStatus::Loading,
            (Some(_), None) => DashboardStatus::Live,
            (Some(_), Some(_)) => DashboardStatus::Stale,
        }
    }

    pub fn mark_success(&mut self, snapshot: DashboardSnapshot) {
        if self.consecutive_failures > 0 {
            info!(
                failures = self.consecutive_failures,
                "dashboard refresh recovered"
            );
        }
        self.last_success_time = Some(snapshot.captured_at);
        self.snapshot = Some(Arc::new(snapshot));
        self.last_error = None;
        self.refreshes += 1;
        self.consecutive_failures = 0;
    }

    /// Record a failed refresh; the previous snapshot stays in place.
    pub fn mark_failure(&mut self, err: &Error) {
        self.last_error = Some(err.to_string());
        self.failures += 1;
        self.consecutive_failures += 1;
        warn!(
            consecutive_failures = self.consecutive_failures,
            status = ?self.status(),
            "dashboard refresh failed"
        );
    }
}
