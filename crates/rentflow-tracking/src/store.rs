use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    ArtifactRecord, ArtifactSpec, RunOutcome, TrackedRun, TrackingConfig, TrackingError,
    TrackingStore,
};

/// REST client for the tracking service.
#[derive(Debug, Clone)]
pub struct HttpTrackingStore {
    http: Client,
    base_url: String,
    project: String,
    staging_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RunRecord {
    id: String,
}

impl HttpTrackingStore {
    pub fn new(config: TrackingConfig) -> Result<Self, TrackingError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| TrackingError::Configuration("API key is not valid ASCII".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(TrackingError::from_transport)?;

        Ok(HttpTrackingStore {
            http,
            base_url: config.base_url,
            project: config.project,
            staging_root: config.staging_root,
        })
    }

    async fn resolve_artifact(&self, name: &str) -> Result<ArtifactRecord, TrackingError> {
        let response = self
            .http
            .get(format!("{}/api/artifacts", self.base_url))
            .query(&[("name", name)])
            .send()
            .await
            .map_err(TrackingError::from_transport)?;
        let response = check_status(response, name)?;
        response
            .json::<ArtifactRecord>()
            .await
            .map_err(TrackingError::from_transport)
    }
}

#[async_trait]
impl TrackingStore for HttpTrackingStore {
    async fn open_run(
        &self,
        job_type: &str,
        config: &serde_json::Value,
    ) -> Result<TrackedRun, TrackingError> {
        let response = self
            .http
            .post(format!(
                "{}/api/projects/{}/runs",
                self.base_url, self.project
            ))
            .json(&json!({ "job_type": job_type, "config": config }))
            .send()
            .await
            .map_err(TrackingError::from_transport)?;
        let record: RunRecord = check_status(response, job_type)?
            .json()
            .await
            .map_err(TrackingError::from_transport)?;

        let staging = self.staging_root.join(format!("rentflow-run-{}", record.id));
        std::fs::create_dir_all(&staging)?;

        debug!(run_id = %record.id, "opened tracking run");
        Ok(TrackedRun::new(record.id, job_type, staging))
    }

    async fn fetch(&self, run: &TrackedRun, name: &str) -> Result<PathBuf, TrackingError> {
        let record = self.resolve_artifact(name).await?;

        let response = self
            .http
            .get(format!(
                "{}/api/artifacts/{}/file",
                self.base_url, record.id
            ))
            .send()
            .await
            .map_err(TrackingError::from_transport)?;
        let payload: Bytes = check_status(response, name)?
            .bytes()
            .await
            .map_err(TrackingError::from_transport)?;

        let local = run.staging().join(record.local_filename());
        std::fs::write(&local, &payload)?;
        debug!(artifact = name, path = %local.display(), size = payload.len(), "fetched artifact");
        Ok(local)
    }

    async fn publish(
        &self,
        run: &TrackedRun,
        spec: &ArtifactSpec,
        file: &Path,
    ) -> Result<(), TrackingError> {
        // Read before any network call; a bad local path must not register
        // an artifact record.
        let contents = std::fs::read(file)?;
        let digest = blake3::hash(&contents).to_hex().to_string();

        let filename = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| spec.name.clone());

        let part = Part::bytes(contents)
            .file_name(filename)
            .mime_str("text/csv")
            .map_err(TrackingError::from_transport)?;
        let form = Form::new()
            .text("name", spec.name.clone())
            .text("type", spec.kind.clone())
            .text("description", spec.description.clone())
            .text("digest", digest)
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/api/runs/{}/artifacts", self.base_url, run.id))
            .multipart(form)
            .send()
            .await
            .map_err(TrackingError::from_transport)?;
        check_status(response, &spec.name)?;

        debug!(artifact = %spec.name, "published artifact");
        Ok(())
    }

    async fn close_run(
        &self,
        run: &TrackedRun,
        outcome: RunOutcome,
    ) -> Result<(), TrackingError> {
        let duration = (Utc::now() - run.started_at).num_seconds();
        let response = self
            .http
            .post(format!("{}/api/runs/{}/finish", self.base_url, run.id))
            .json(&json!({
                "outcome": outcome.as_str(),
                "duration_seconds": duration,
            }))
            .send()
            .await
            .map_err(TrackingError::from_transport)?;
        check_status(response, &run.id)?;
        Ok(())
    }
}

impl TrackingError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        TrackingError::Service(err.to_string())
    }
}

fn check_status(response: Response, subject: &str) -> Result<Response, TrackingError> {
    match classify_status(response.status(), subject) {
        None => Ok(response),
        Some(err) => Err(err),
    }
}

fn classify_status(status: StatusCode, subject: &str) -> Option<TrackingError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::NOT_FOUND => TrackingError::NotFound(subject.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TrackingError::Auth(format!("{subject}: {status}"))
        }
        other => TrackingError::Service(format!("{subject}: unexpected status {other}")),
    })
}
