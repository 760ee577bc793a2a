use std::path::PathBuf;

use hwa_core::CoreError;
use thiserror::Error;

pub type OutputResult<T> = Result<T, OutputError>;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Result has no column for {symbol}")]
    MissingResultColumn { symbol: String },

    #[error("Result has {result} rows but the input has {input}")]
    RowMismatch { result: usize, input: usize },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {status:?}: {stderr}")]
    Compiler {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}
