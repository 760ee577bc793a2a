//! Service layer for hwa.
//!
//! Ties the pipeline crates together behind typed requests: read the
//! caller's points, interpolate (one call or one per sample for
//! time-varying runs), mask the inner boundary, assemble the output file.
//! Field lines and particle spectra ride on the same pieces.
//! Used by the CLI; an RPC front end would call the same [`Service`].

pub mod config;
pub mod error;
pub mod metadata;
pub mod request;
pub mod service;

pub use config::{ServiceConfig, load_config};
pub use error::{AppError, AppResult, Fault, FaultCategory};
pub use metadata::{
    EnergyBin, EnergySpectra, GridDef, MetadataRegistry, MetadataSource, Planet, Radius, RunData,
    SimulationRun, VariableDecl, normalize_resource_id,
};
pub use request::{
    CoordinateUnit, FieldLineRequest, InterpolateRequest, SpectraRequest, SurfaceRequest, Validated,
};
pub use service::Service;
