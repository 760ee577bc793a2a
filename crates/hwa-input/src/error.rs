use std::path::PathBuf;

use hwa_core::CoreError;
use thiserror::Error;

pub type InputResult<T> = Result<T, InputError>;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input format: {message}")]
    Format { message: String },

    #[error("Input is missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid plane: {message}")]
    InvalidPlane { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl InputError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }
}
