use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rentflow_core::pipeline::{run_basic_clean, CleanOptions};
use rentflow_tracking::{HttpTrackingStore, RunOutcome, TrackingConfig, TrackingStore};

const JOB_TYPE: &str = "basic_cleaning";

/// Download the raw listings artifact, drop price outliers, normalize review
/// dates, and publish the result as a new artifact.
#[derive(Parser, Debug)]
#[command(author, version, about = "Basic cleaning step for the rental listings pipeline", long_about = None)]
struct Cli {
    /// Fully-qualified name of the input artifact
    #[arg(long = "input_artifact")]
    input_artifact: String,

    /// Name for the output artifact
    #[arg(long = "output_artifact")]
    output_artifact: String,

    /// Type of the output artifact
    #[arg(long = "output_type")]
    output_type: String,

    /// Description for the output artifact
    #[arg(long = "output_description")]
    output_description: String,

    /// Minimum price kept when dropping outliers
    #[arg(long = "min_price")]
    min_price: f64,

    /// Maximum price kept when dropping outliers
    #[arg(long = "max_price")]
    max_price: f64,
}

impl Cli {
    fn into_options(self) -> CleanOptions {
        CleanOptions {
            input_artifact: self.input_artifact,
            output_artifact: self.output_artifact,
            output_type: self.output_type,
            output_description: self.output_description,
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let mut config = TrackingConfig::from_env().context("tracking service is not configured")?;
    if let Ok(dir) = std::env::var("RENTFLOW_STAGING_DIR") {
        config.staging_root = rentflow_core::paths::sanitize(&dir);
    }
    let store = HttpTrackingStore::new(config)?;

    let opts = cli.into_options();
    let run = store
        .open_run(JOB_TYPE, &opts.as_run_config())
        .await
        .context("could not open tracking run")?;

    match run_basic_clean(&store, &run, &opts).await {
        Ok(report) => {
            store.close_run(&run, RunOutcome::Finished).await?;
            info!(
                rows_in = report.rows_in,
                rows_out = report.rows_out,
                dropped = report.rows_dropped(),
                "basic cleaning complete"
            );
            Ok(())
        }
        Err(err) => {
            // Close the run so the failure is recorded, then surface the
            // pipeline error itself.
            if let Err(close_err) = store.close_run(&run, RunOutcome::Failed).await {
                warn!(error = %close_err, "could not report run failure to tracking service");
            }
            Err(err.into())
        }
    }
}
