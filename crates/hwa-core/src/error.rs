use std::path::PathBuf;

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Row width mismatch: expected {expected} values, found {found}")]
    RowWidth { expected: usize, found: usize },

    #[error("Unknown unit '{unit}' for {what}")]
    UnknownUnit { what: &'static str, unit: String },

    #[error("Scratch I/O error at {path}: {source}")]
    ScratchIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
