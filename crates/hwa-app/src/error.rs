//! Error types for the hwa-app service layer.

use std::path::PathBuf;

use hwa_catalog::CatalogError;
use hwa_core::CoreError;
use hwa_engine::EngineError;
use hwa_input::InputError;
use hwa_output::OutputError;
use serde::Serialize;

/// Application error wrapping every backend crate's error, so callers
/// deal with a single type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Unknown simulation resource: {0}")]
    UnknownResource(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid simulation metadata: {0}")]
    Metadata(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for hwa-app operations.
pub type AppResult<T> = Result<T, AppError>;

/// Who is to blame for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultCategory {
    Client,
    Server,
}

/// What a remote caller sees when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fault {
    pub category: FaultCategory,
    pub message: String,
}

impl AppError {
    pub fn category(&self) -> FaultCategory {
        match self {
            AppError::UnknownResource(_)
            | AppError::InvalidRequest(_)
            | AppError::Catalog(CatalogError::UnknownVariable { .. })
            | AppError::Input(
                InputError::Format { .. }
                | InputError::MissingField { .. }
                | InputError::InvalidPlane { .. }
                | InputError::Core(CoreError::NonFinite { .. }),
            ) => FaultCategory::Client,
            AppError::FileRead { .. }
            | AppError::Config { .. }
            | AppError::Metadata(_)
            | AppError::Catalog(_)
            | AppError::Input(_)
            | AppError::Engine(_)
            | AppError::Output(_)
            | AppError::Core(_) => FaultCategory::Server,
        }
    }

    pub fn fault(&self) -> Fault {
        Fault {
            category: self.category(),
            message: self.to_string(),
        }
    }
}
