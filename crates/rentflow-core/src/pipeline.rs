//! Orchestration of the basic cleaning step: fetch the raw listings
//! artifact, clean it, publish the result, clean up the staging file.

use serde_json::json;
use tracing::{info, warn};

use rentflow_tracking::{ArtifactSpec, TrackedRun, TrackingStore};

use crate::cleaning;
use crate::dataset;
use crate::error::Result;

/// Fixed name of the transient local file holding the cleaned dataset
/// between the write and publish steps.
pub const STAGING_FILE: &str = "clean_sample.csv";

#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub input_artifact: String,
    pub output_artifact: String,
    pub output_type: String,
    pub output_description: String,
    pub min_price: f64,
    pub max_price: f64,
}

impl CleanOptions {
    /// The full option set, recorded as run config telemetry.
    pub fn as_run_config(&self) -> serde_json::Value {
        json!({
            "input_artifact": self.input_artifact,
            "output_artifact": self.output_artifact,
            "output_type": self.output_type,
            "output_description": self.output_description,
            "min_price": self.min_price,
            "max_price": self.max_price,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_out: usize,
}

impl CleanReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_in - self.rows_out
    }
}

/// Runs the step end to end. Strictly linear: any failing step aborts the
/// run with its error unchanged. The one exception is removal of the
/// staging file, which is attempted whether or not publish succeeded and
/// only logged on failure.
pub async fn run_basic_clean(
    store: &dyn TrackingStore,
    run: &TrackedRun,
    opts: &CleanOptions,
) -> Result<CleanReport> {
    info!(artifact = %opts.input_artifact, "downloading input artifact");
    let raw_path = store.fetch(run, &opts.input_artifact).await?;
    let df = dataset::read_csv(&raw_path)?;
    let rows_in = df.height();

    info!(min_price = opts.min_price, max_price = opts.max_price, "cleaning dataset");
    let mut cleaned = cleaning::clean(&df, opts.min_price, opts.max_price)?;
    let rows_out = cleaned.height();

    let staging = run.staging().join(STAGING_FILE);
    info!(path = %staging.display(), "saving cleaned dataset");
    dataset::write_csv(&mut cleaned, &staging)?;

    info!(artifact = %opts.output_artifact, "publishing output artifact");
    let spec = ArtifactSpec {
        name: opts.output_artifact.clone(),
        kind: opts.output_type.clone(),
        description: opts.output_description.clone(),
    };
    let published = store.publish(run, &spec, &staging).await;

    if let Err(err) = std::fs::remove_file(&staging) {
        warn!(path = %staging.display(), error = %err, "could not remove staging file");
    }
    published?;

    Ok(CleanReport { rows_in, rows_out })
}
