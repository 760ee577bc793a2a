//! Simulation metadata: which runs exist, what they contain and where their
//! snapshots live.

use std::path::{Path, PathBuf};

use hwa_core::units::{Length, length};
use hwa_engine::{DirectorySnapshots, RunTimeIndex};
use hwa_input::{BoundingBox, GridStructure, basic_cell_size};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Lookup of simulation runs by resource id.
pub trait MetadataSource {
    fn lookup(&self, resource_id: &str) -> AppResult<&SimulationRun>;
    fn runs(&self) -> &[SimulationRun];
}

/// Comparable form of a resource id: trimmed, without trailing `/`, scheme
/// lowercased (`SPASE://A/B` and `spase://A/B/` are the same resource).
pub fn normalize_resource_id(id: &str) -> String {
    let id = id.trim().trim_end_matches('/');
    match id.split_once("://") {
        Some((scheme, rest)) => format!("{}://{rest}", scheme.to_ascii_lowercase()),
        None => id.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Planet {
    pub name: String,
    pub radius: f64,
    #[serde(default = "default_unit")]
    pub radius_unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Radius {
    pub value: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "m".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GridDef {
    Constant { finest_cell: f64 },
    Adaptive { finest_cell: f64, levels: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableDecl {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One energy channel of a spectral product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyBin {
    pub name: String,
    pub low: f64,
    pub high: f64,
}

/// Energy channels of a run whose snapshot holds particle spectra.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergySpectra {
    #[serde(default = "default_energy_unit")]
    pub unit: String,
    pub low: f64,
    pub high: f64,
    pub bins: Vec<EnergyBin>,
}

fn default_energy_unit() -> String {
    "eV".to_string()
}

impl EnergySpectra {
    /// Position of the channel called `name`; names match exactly.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.bins.iter().position(|bin| bin.name == name.trim())
    }

    /// Lower edge of every channel, then the top of the whole range.
    pub fn range_edges(&self) -> Vec<f64> {
        self.bins
            .iter()
            .map(|bin| bin.low)
            .chain(std::iter::once(self.high))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RunData {
    Static {
        snapshot: PathBuf,
    },
    Dynamic {
        /// Unix-second timestamps, one per snapshot.
        time_index: PathBuf,
        snapshot_dir: PathBuf,
    },
}

/// One simulation run and its numerical output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationRun {
    pub resource_id: String,
    pub model_id: String,
    pub model_title: String,
    pub run_id: String,
    /// Directory name of the run; with the planet name, names output tables.
    pub run_directory: String,
    #[serde(default)]
    pub content_description: String,
    pub planet: Planet,
    pub coordinate_system: String,
    pub grid: GridDef,
    pub bbox_min: [f64; 3],
    pub bbox_max: [f64; 3],
    #[serde(default)]
    pub variables: Vec<VariableDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_boundary: Option<Radius>,
    /// Present only for spectral products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectra: Option<EnergySpectra>,
    pub data: RunData,
}

impl SimulationRun {
    pub fn is_dynamic(&self) -> bool {
        matches!(self.data, RunData::Dynamic { .. })
    }

    pub fn planet_radius(&self) -> AppResult<Length> {
        Ok(length(self.planet.radius, &self.planet.radius_unit)?)
    }

    pub fn inner_radius(&self) -> AppResult<Option<Length>> {
        self.inner_boundary
            .as_ref()
            .map(|r| length(r.value, &r.unit).map_err(AppError::from))
            .transpose()
    }

    pub fn finest_cell(&self) -> f64 {
        match self.grid {
            GridDef::Constant { finest_cell } | GridDef::Adaptive { finest_cell, .. } => {
                finest_cell
            }
        }
    }

    pub fn grid_structure(&self) -> GridStructure {
        match self.grid {
            GridDef::Constant { .. } => GridStructure::Constant,
            GridDef::Adaptive { levels, .. } => GridStructure::Adaptive { levels },
        }
    }

    pub fn basic_cell_size(&self) -> f64 {
        basic_cell_size(self.finest_cell(), self.grid_structure())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            min: self.bbox_min,
            max: self.bbox_max,
        }
    }

    pub fn table_name(&self) -> String {
        format!("{}_{}", self.planet.name, self.run_directory)
    }

    /// Declared variable matching `key`, case-insensitively.
    pub fn variable(&self, key: &str) -> Option<&VariableDecl> {
        self.variables
            .iter()
            .find(|v| v.key.eq_ignore_ascii_case(key.trim()))
    }

    pub fn static_snapshot(&self) -> Option<&Path> {
        match &self.data {
            RunData::Static { snapshot } => Some(snapshot),
            RunData::Dynamic { .. } => None,
        }
    }

    /// Time index and snapshot layout of a dynamic run.
    pub fn dynamic_layout(&self) -> AppResult<Option<(RunTimeIndex, DirectorySnapshots)>> {
        match &self.data {
            RunData::Static { .. } => Ok(None),
            RunData::Dynamic {
                time_index,
                snapshot_dir,
            } => Ok(Some((
                RunTimeIndex::load(time_index)?,
                DirectorySnapshots::new(snapshot_dir),
            ))),
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        match &mut self.data {
            RunData::Static { snapshot } => *snapshot = base.join(&*snapshot),
            RunData::Dynamic {
                time_index,
                snapshot_dir,
            } => {
                *time_index = base.join(&*time_index);
                *snapshot_dir = base.join(&*snapshot_dir);
            }
        }
    }
}

/// Registry file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataRegistry {
    #[serde(default)]
    pub runs: Vec<SimulationRun>,
}

impl MetadataRegistry {
    pub fn new(runs: Vec<SimulationRun>) -> Self {
        Self { runs }
    }

    /// Load a registry from YAML; relative data paths resolve against the
    /// file's directory.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut registry: MetadataRegistry =
            serde_yaml::from_str(&content).map_err(|e| AppError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if let Some(base) = path.parent() {
            for run in &mut registry.runs {
                run.resolve_paths(base);
            }
        }
        registry.validate()?;
        tracing::info!(path = %path.display(), runs = registry.runs.len(), "metadata registry loaded");
        Ok(registry)
    }

    fn validate(&self) -> AppResult<()> {
        for run in &self.runs {
            if run.variables.is_empty() && run.spectra.is_none() {
                return Err(AppError::Metadata(format!(
                    "{} declares no variables",
                    run.resource_id
                )));
            }
            if let Some(spectra) = &run.spectra {
                let bad_bin = spectra.bins.iter().find(|bin| !(bin.low < bin.high));
                if spectra.bins.is_empty() || bad_bin.is_some() || !(spectra.low < spectra.high) {
                    return Err(AppError::Metadata(format!(
                        "{} has an invalid energy channel table",
                        run.resource_id
                    )));
                }
            }
            if !(run.finest_cell() > 0.0) {
                return Err(AppError::Metadata(format!(
                    "{} has a non-positive grid cell size",
                    run.resource_id
                )));
            }
            run.planet_radius()?;
            run.inner_radius()?;
        }
        Ok(())
    }
}

impl MetadataSource for MetadataRegistry {
    fn lookup(&self, resource_id: &str) -> AppResult<&SimulationRun> {
        let wanted = normalize_resource_id(resource_id);
        self.runs
            .iter()
            .find(|run| normalize_resource_id(&run.resource_id) == wanted)
            .ok_or_else(|| AppError::UnknownResource(resource_id.to_string()))
    }

    fn runs(&self) -> &[SimulationRun] {
        &self.runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwa_core::units::meters;

    const REGISTRY: &str = r#"
runs:
  - resource_id: spase://IMPEX/NumericalOutput/FMI/GUMICS/earth_run1/tetra
    model_id: spase://IMPEX/SimulationModel/FMI/GUMICS
    model_title: GUMICS-4
    run_id: spase://IMPEX/SimulationRun/FMI/GUMICS/earth_run1
    run_directory: earth_run1
    planet: { name: Earth, radius: 6371, radius_unit: km }
    coordinate_system: GSE
    grid: { type: Adaptive, finest_cell: 1000.0, levels: 2 }
    bbox_min: [-1.0e8, -5.0e7, -5.0e7]
    bbox_max: [2.0e7, 5.0e7, 5.0e7]
    variables:
      - key: Bx
      - key: Btot
        description: Magnetic field magnitude
    inner_boundary: { value: 3.5, unit: km }
    data: { type: Static, snapshot: snapshots/earth.hc }
"#;

    fn registry(dir: &Path) -> MetadataRegistry {
        let path = dir.join("runs.yaml");
        std::fs::write(&path, REGISTRY).unwrap();
        MetadataRegistry::load(&path).unwrap()
    }

    #[test]
    fn resource_ids_compare_normalized() {
        assert_eq!(
            normalize_resource_id(" SPASE://IMPEX/Run/ "),
            "spase://IMPEX/Run"
        );
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let run = reg
            .lookup("SPASE://IMPEX/NumericalOutput/FMI/GUMICS/earth_run1/tetra/")
            .unwrap();
        assert_eq!(run.table_name(), "Earth_earth_run1");
        assert!(matches!(
            reg.lookup("spase://IMPEX/other"),
            Err(AppError::UnknownResource(_))
        ));
    }

    #[test]
    fn run_properties_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let run = &reg.runs()[0];
        assert_eq!(meters(run.planet_radius().unwrap()), 6.371e6);
        assert_eq!(meters(run.inner_radius().unwrap().unwrap()), 3500.0);
        assert_eq!(run.basic_cell_size(), 4000.0);
        assert_eq!(
            run.static_snapshot(),
            Some(dir.path().join("snapshots/earth.hc").as_path())
        );
        assert_eq!(
            run.variable("BTOT").and_then(|v| v.description.as_deref()),
            Some("Magnetic field magnitude")
        );
        assert!(!run.is_dynamic());
        assert!(run.dynamic_layout().unwrap().is_none());
    }

    const SPECTRA: &str = r#"
    spectra:
      unit: eV
      low: 10
      high: 10000
      bins:
        - { name: Low, low: 10, high: 100 }
        - { name: Mid, low: 100, high: 1000 }
        - { name: High, low: 1000, high: 10000 }
"#;

    #[test]
    fn spectral_runs_list_their_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.yaml");
        let text = REGISTRY.replace("    variables:\n", &format!("{}    variables:\n", &SPECTRA[1..]));
        std::fs::write(&path, text).unwrap();
        let reg = MetadataRegistry::load(&path).unwrap();
        let spectra = reg.runs()[0].spectra.as_ref().unwrap();
        assert_eq!(spectra.channel_index("Mid"), Some(1));
        assert_eq!(spectra.bins[1].low, 100.0);
        assert!(spectra.channel_index("mid").is_none());
        assert_eq!(spectra.range_edges(), vec![10.0, 100.0, 1000.0, 10000.0]);
    }

    #[test]
    fn inverted_energy_channels_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.yaml");
        let spectra = SPECTRA[1..].replace("{ name: Mid, low: 100, high: 1000 }", "{ name: Mid, low: 1000, high: 100 }");
        let text = REGISTRY.replace("    variables:\n", &format!("{spectra}    variables:\n"));
        std::fs::write(&path, text).unwrap();
        assert!(matches!(
            MetadataRegistry::load(&path),
            Err(AppError::Metadata(_))
        ));
    }

    #[test]
    fn registries_without_variables_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.yaml");
        let text = REGISTRY.replace(
            "    variables:\n      - key: Bx\n      - key: Btot\n        description: Magnetic field magnitude\n",
            "    variables: []\n",
        );
        std::fs::write(&path, text).unwrap();
        assert!(matches!(
            MetadataRegistry::load(&path),
            Err(AppError::Metadata(_))
        ));
    }
}
