use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::{Lifecycle, Stage};
use crate::supervisor::ShutdownOutcome;

/// Why a launch came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEnd {
    /// The server process exited on its own.
    ServerExited,
    /// The user pressed Ctrl-C.
    Interrupted,
    /// The run returned an error.
    Failed,
}

/// Summary of a launch, printed as JSON in verbose mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchReport {
    pub server_url: String,
    pub stages: Vec<Stage>,
    pub readiness_attempts: u32,
    pub end: RunEnd,
    /// `None` when stopping the server failed and it was left to kill-on-drop.
    pub shutdown: Option<ShutdownOutcome>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl LaunchReport {
    pub fn new(
        lifecycle: &Lifecycle,
        server_url: String,
        readiness_attempts: u32,
        end: RunEnd,
        shutdown: Option<ShutdownOutcome>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            server_url,
            stages: lifecycle.history().to_vec(),
            readiness_attempts,
            end,
            shutdown,
            started_at,
            completed_at: now,
            duration_ms: (now - started_at).num_milliseconds(),
        }
    }
}
