use std::path::PathBuf;

use hwa_core::CoreError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {status:?}: {stderr}")]
    Failure {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Malformed engine output: {message}")]
    Malformed { message: String },

    #[error("Invalid run time index: {message}")]
    TimeIndex { message: String },

    #[error("No snapshot file for {id}")]
    SnapshotNotFound { id: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl EngineError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}
