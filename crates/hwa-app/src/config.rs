//! Service configuration, loaded from YAML.

use std::path::{Path, PathBuf};

use hwa_engine::InterpolationMethod;
use hwa_output::OutputFormat;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Name written into output headers.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Interpolation engine binary.
    #[serde(default = "default_engine")]
    pub engine: PathBuf,
    /// Field-line tracer binary.
    #[serde(default = "default_tracer")]
    pub tracer: PathBuf,
    /// CDL compiler used for netCDF output.
    #[serde(default = "default_ncgen")]
    pub ncgen: String,
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Simulation metadata registry (YAML).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PathBuf>,
    #[serde(default)]
    pub default_method: InterpolationMethod,
    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_service_name() -> String {
    "hwa".to_string()
}

fn default_engine() -> PathBuf {
    PathBuf::from("interpol")
}

fn default_tracer() -> PathBuf {
    PathBuf::from("fieldline")
}

fn default_ncgen() -> String {
    "ncgen".to_string()
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("hwa")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("hwa-output")
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            engine: default_engine(),
            tracer: default_tracer(),
            ncgen: default_ncgen(),
            scratch_dir: default_scratch_dir(),
            output_dir: default_output_dir(),
            metadata: None,
            default_method: InterpolationMethod::default(),
            default_format: OutputFormat::default(),
        }
    }
}

/// Load configuration from a YAML file. Relative paths in the file are
/// taken relative to the file's directory.
pub fn load_config(path: &Path) -> AppResult<ServiceConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: ServiceConfig =
        serde_yaml::from_str(&content).map_err(|e| AppError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if let Some(base) = path.parent() {
        config.scratch_dir = base.join(&config.scratch_dir);
        config.output_dir = base.join(&config.output_dir);
        config.metadata = config.metadata.map(|m| base.join(m));
    }
    tracing::debug!(path = %path.display(), ?config, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hwa.yaml");
        std::fs::write(
            &path,
            "engine: /opt/hwa/interpol\nmetadata: runs.yaml\ndefault_method: NearestGridPoint\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.engine, PathBuf::from("/opt/hwa/interpol"));
        assert_eq!(config.ncgen, "ncgen");
        assert_eq!(config.default_method, InterpolationMethod::NearestGridPoint);
        assert_eq!(config.default_format, OutputFormat::VoTable);
        assert_eq!(config.metadata, Some(dir.path().join("runs.yaml")));
        assert_eq!(config.output_dir, dir.path().join("hwa-output"));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hwa.yaml");
        std::fs::write(&path, "engine: [unterminated\n").unwrap();
        assert!(matches!(load_config(&path), Err(AppError::Config { .. })));
        assert!(matches!(
            load_config(&dir.path().join("absent.yaml")),
            Err(AppError::FileRead { .. })
        ));
    }
}
