//! Client for the experiment-tracking service that owns artifact storage and
//! run lineage. Everything here talks to the service over its REST surface;
//! the rest of the workspace only sees the [`TrackingStore`] trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod run;
mod store;

pub use run::{RunOutcome, TrackedRun};
pub use store::HttpTrackingStore;

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub project: String,
    /// Directory under which per-run staging directories are created.
    pub staging_root: PathBuf,
}

impl TrackingConfig {
    /// Reads the service endpoint and credentials from the process
    /// environment. `RENTFLOW_API_KEY` may be unset; requests are then
    /// sent unauthenticated.
    pub fn from_env() -> Result<Self, TrackingError> {
        let base_url = std::env::var("RENTFLOW_TRACKING_URL").map_err(|_| {
            TrackingError::Configuration("RENTFLOW_TRACKING_URL must be set".into())
        })?;
        let project = std::env::var("RENTFLOW_PROJECT")
            .map_err(|_| TrackingError::Configuration("RENTFLOW_PROJECT must be set".into()))?;
        let api_key = std::env::var("RENTFLOW_API_KEY").ok();

        Ok(TrackingConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            project,
            staging_root: std::env::temp_dir(),
        })
    }
}

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("authorization rejected: {0}")]
    Auth(String),
    #[error("tracking service error: {0}")]
    Service(String),
    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata attached to a newly published artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

/// Artifact record as the service reports it when resolving a
/// fully-qualified name.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub primary_file: Option<String>,
}

impl ArtifactRecord {
    /// Filename the backing file is materialized under. Falls back to the
    /// artifact name with any `:version` suffix stripped.
    pub fn local_filename(&self) -> &str {
        match &self.primary_file {
            Some(file) => file,
            None => self.name.split(':').next().unwrap_or(&self.name),
        }
    }
}

#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Opens a run against the service, recording `config` as run telemetry.
    async fn open_run(
        &self,
        job_type: &str,
        config: &serde_json::Value,
    ) -> Result<TrackedRun, TrackingError>;

    /// Resolves `name` and materializes its primary backing file into the
    /// run's staging directory, returning the local path.
    async fn fetch(&self, run: &TrackedRun, name: &str) -> Result<PathBuf, TrackingError>;

    /// Uploads `file` as a new artifact registered against `run`.
    async fn publish(
        &self,
        run: &TrackedRun,
        spec: &ArtifactSpec,
        file: &Path,
    ) -> Result<(), TrackingError>;

    /// Reports the run outcome and flushes pending telemetry.
    async fn close_run(&self, run: &TrackedRun, outcome: RunOutcome)
        -> Result<(), TrackingError>;
}
