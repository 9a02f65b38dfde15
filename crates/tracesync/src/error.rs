use std::path::PathBuf;

use thiserror::Error;

/// Trace verification errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("IO error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed trace file {path}: {source}")]
    MalformedTrace {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed commit log {path} at line {line}: {reason}")]
    MalformedLog {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no golden traces found in {0}")]
    NoGoldenTraces(PathBuf),
    #[error("golden simulator not found in PATH")]
    SimulatorNotFound,
    #[error("golden simulator failed with exit code {0:?}")]
    SimulatorFailed(Option<i32>),
    #[error("golden simulator timed out after {0}s")]
    SimulatorTimeout(u64),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Attach a path to an IO error.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
