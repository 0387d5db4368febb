use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("tracking service operation failed: {0}")]
    Tracking(#[from] rentflow_tracking::TrackingError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Data format error: {0}")]
    DataFormat(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
