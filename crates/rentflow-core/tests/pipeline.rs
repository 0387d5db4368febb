use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rentflow_core::error::PipelineError;
use rentflow_core::pipeline::{run_basic_clean, CleanOptions, STAGING_FILE};
use rentflow_tracking::{ArtifactSpec, RunOutcome, TrackedRun, TrackingError, TrackingStore};

const RAW_CSV: &str = "\
price,last_review
5,2019-01-01
50,2019-02-02
500,2019-03-03
5000,2019-04-04
";

/// In-memory stand-in for the tracking service.
#[derive(Default)]
struct MemoryStore {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
    published: Mutex<Vec<(ArtifactSpec, Vec<u8>)>>,
    closed: Mutex<Vec<RunOutcome>>,
    staging_dirs: Mutex<Vec<tempfile::TempDir>>,
    fail_publish: bool,
}

impl MemoryStore {
    fn with_artifact(name: &str, contents: &str) -> Self {
        let store = MemoryStore::default();
        store
            .artifacts
            .lock()
            .unwrap()
            .insert(name.to_string(), contents.as_bytes().to_vec());
        store
    }

    fn published(&self) -> Vec<(ArtifactSpec, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackingStore for MemoryStore {
    async fn open_run(
        &self,
        job_type: &str,
        _config: &serde_json::Value,
    ) -> Result<TrackedRun, TrackingError> {
        let dir = tempfile::tempdir()?;
        let staging = dir.path().to_path_buf();
        self.staging_dirs.lock().unwrap().push(dir);
        Ok(TrackedRun::new("run-1", job_type, staging))
    }

    async fn fetch(&self, run: &TrackedRun, name: &str) -> Result<PathBuf, TrackingError> {
        let artifacts = self.artifacts.lock().unwrap();
        let Some(bytes) = artifacts.get(name) else {
            return Err(TrackingError::NotFound(name.to_string()));
        };
        let local = run.staging().join("sample.csv");
        std::fs::write(&local, bytes)?;
        Ok(local)
    }

    async fn publish(
        &self,
        _run: &TrackedRun,
        spec: &ArtifactSpec,
        file: &Path,
    ) -> Result<(), TrackingError> {
        if self.fail_publish {
            return Err(TrackingError::Service("publish rejected".into()));
        }
        let contents = std::fs::read(file)?;
        self.published
            .lock()
            .unwrap()
            .push((spec.clone(), contents));
        Ok(())
    }

    async fn close_run(
        &self,
        _run: &TrackedRun,
        outcome: RunOutcome,
    ) -> Result<(), TrackingError> {
        self.closed.lock().unwrap().push(outcome);
        Ok(())
    }
}

fn options() -> CleanOptions {
    CleanOptions {
        input_artifact: "sample.csv:latest".into(),
        output_artifact: "clean_sample.csv".into(),
        output_type: "clean_sample".into(),
        output_description: "Listings with price outliers removed".into(),
        min_price: 10.0,
        max_price: 1000.0,
    }
}

#[tokio::test]
async fn fetch_clean_publish_roundtrip() {
    let store = MemoryStore::with_artifact("sample.csv:latest", RAW_CSV);
    let opts = options();
    let run = store.open_run("basic_cleaning", &opts.as_run_config()).await.unwrap();

    let report = run_basic_clean(&store, &run, &opts).await.unwrap();
    assert_eq!(report.rows_in, 4);
    assert_eq!(report.rows_out, 2);
    assert_eq!(report.rows_dropped(), 2);

    let published = store.published();
    assert_eq!(published.len(), 1);
    let (spec, contents) = &published[0];
    assert_eq!(spec.name, "clean_sample.csv");
    assert_eq!(spec.kind, "clean_sample");
    assert_eq!(
        String::from_utf8(contents.clone()).unwrap(),
        "price,last_review\n50,2019-02-02\n500,2019-03-03\n"
    );

    // Staging file is gone after a successful publish.
    assert!(!run.staging().join(STAGING_FILE).exists());

    store.close_run(&run, RunOutcome::Finished).await.unwrap();
    assert_eq!(*store.closed.lock().unwrap(), vec![RunOutcome::Finished]);
}

#[tokio::test]
async fn unknown_input_artifact_aborts_before_cleaning() {
    let store = MemoryStore::default();
    let opts = options();
    let run = store.open_run("basic_cleaning", &opts.as_run_config()).await.unwrap();

    let err = run_basic_clean(&store, &run, &opts).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Tracking(TrackingError::NotFound(name)) if name == "sample.csv:latest"
    ));

    assert!(store.published().is_empty());
    assert!(!run.staging().join(STAGING_FILE).exists());
}

#[tokio::test]
async fn staging_file_is_removed_even_when_publish_fails() {
    let mut store = MemoryStore::with_artifact("sample.csv:latest", RAW_CSV);
    store.fail_publish = true;
    let opts = options();
    let run = store.open_run("basic_cleaning", &opts.as_run_config()).await.unwrap();

    let err = run_basic_clean(&store, &run, &opts).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Tracking(TrackingError::Service(_))
    ));
    assert!(!run.staging().join(STAGING_FILE).exists());
}

#[tokio::test]
async fn unparsable_dates_fail_the_run_and_publish_nothing() {
    let store = MemoryStore::with_artifact(
        "sample.csv:latest",
        "price,last_review\n50,never\n",
    );
    let opts = options();
    let run = store.open_run("basic_cleaning", &opts.as_run_config()).await.unwrap();

    let err = run_basic_clean(&store, &run, &opts).await.unwrap_err();
    assert!(matches!(err, PipelineError::DataFormat(_)));
    assert!(store.published().is_empty());
}
