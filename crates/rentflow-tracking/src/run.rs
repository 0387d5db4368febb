use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Handle to one execution of a pipeline step. All artifact operations are
/// scoped to a run; the run must be closed through
/// [`TrackingStore::close_run`](crate::TrackingStore::close_run) on every
/// exit path so the service flushes its telemetry.
#[derive(Debug, Clone)]
pub struct TrackedRun {
    pub id: String,
    pub job_type: String,
    pub started_at: DateTime<Utc>,
    staging: PathBuf,
}

impl TrackedRun {
    pub fn new(id: impl Into<String>, job_type: impl Into<String>, staging: PathBuf) -> Self {
        TrackedRun {
            id: id.into(),
            job_type: job_type.into(),
            started_at: Utc::now(),
            staging,
        }
    }

    /// Scratch directory owned by this run. Downloaded artifacts and files
    /// awaiting upload live here.
    pub fn staging(&self) -> &Path {
        &self.staging
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Finished => "finished",
            RunOutcome::Failed => "failed",
        }
    }
}
