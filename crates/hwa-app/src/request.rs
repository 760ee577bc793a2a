//! Typed requests, one per service operation. Each is validated once by
//! `validate()` at the boundary; the service only accepts the resulting
//! [`Validated`] wrapper.

use std::ops::Deref;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use hwa_core::units::{km, meters};
use hwa_engine::{InterpolationMethod, TraceDirection, TracedField};
use hwa_input::Plane;
use hwa_output::{OutputFormat, ParamValue};

use crate::error::{AppError, AppResult};

/// Unit of caller-supplied coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoordinateUnit {
    #[default]
    Meters,
    Kilometers,
    /// Planetary radii of the simulated object.
    PlanetRadius,
}

impl CoordinateUnit {
    /// Multiplier taking coordinates in this unit to meters.
    pub fn coefficient(self, planet_radius_m: f64) -> f64 {
        match self {
            CoordinateUnit::Meters => 1.0,
            CoordinateUnit::Kilometers => meters(km(1.0)),
            CoordinateUnit::PlanetRadius => planet_radius_m,
        }
    }
}

/// A request whose parameters passed `validate()`.
#[derive(Debug, Clone)]
pub struct Validated<R>(R);

impl<R> Validated<R> {
    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R> Deref for Validated<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.0
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::InvalidRequest(message.into())
}

fn check_common(resource_id: &str, variables: &[String]) -> AppResult<()> {
    if resource_id.trim().is_empty() {
        return Err(invalid("resource id is empty"));
    }
    if variables.iter().any(|v| v.trim().is_empty()) {
        return Err(invalid("variable list contains an empty name"));
    }
    Ok(())
}

fn scalar(value: impl ToString) -> ParamValue {
    ParamValue::Scalar(value.to_string())
}

fn iso(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Interpolate a caller-supplied sample file.
#[derive(Debug, Clone)]
pub struct InterpolateRequest {
    pub resource_id: String,
    pub input: PathBuf,
    /// Empty means every variable the run declares.
    pub variables: Vec<String>,
    pub coordinate_unit: CoordinateUnit,
    pub method: Option<InterpolationMethod>,
    pub format: Option<OutputFormat>,
}

impl InterpolateRequest {
    pub fn validate(self) -> AppResult<Validated<Self>> {
        self.check()?;
        Ok(Validated(self))
    }

    fn check(&self) -> AppResult<()> {
        check_common(&self.resource_id, &self.variables)?;
        if self.input.as_os_str().is_empty() {
            return Err(invalid("no input file given"));
        }
        Ok(())
    }

    pub fn parameters(&self) -> Vec<(String, ParamValue)> {
        let mut params = vec![
            ("ResourceID".to_string(), scalar(&self.resource_id)),
            ("url_XYZ".to_string(), scalar(self.input.display())),
            ("Variable".to_string(), ParamValue::List(self.variables.clone())),
        ];
        let mut extra = vec![(
            "CoordinateUnit".to_string(),
            scalar(format!("{:?}", self.coordinate_unit)),
        )];
        if let Some(method) = self.method {
            extra.push(("InterpolationMethod".to_string(), scalar(format!("{method:?}"))));
        }
        if let Some(format) = self.format {
            extra.push(("OutputFileType".to_string(), scalar(format!("{format:?}"))));
        }
        params.push(("extraParams".to_string(), ParamValue::Group(extra)));
        params
    }
}

/// Interpolate on an axis-aligned plane through the simulation box.
#[derive(Debug, Clone)]
pub struct SurfaceRequest {
    pub resource_id: String,
    pub variables: Vec<String>,
    pub plane_normal: [f64; 3],
    /// Any point on the plane, in meters.
    pub plane_point: [f64; 3],
    /// Mesh spacing in meters; defaults to the run's basic cell size.
    pub resolution: Option<f64>,
    /// Required for time-varying runs.
    pub time: Option<DateTime<Utc>>,
    pub method: Option<InterpolationMethod>,
    pub format: Option<OutputFormat>,
}

impl SurfaceRequest {
    pub fn validate(self) -> AppResult<Validated<Self>> {
        self.check()?;
        Ok(Validated(self))
    }

    fn check(&self) -> AppResult<()> {
        check_common(&self.resource_id, &self.variables)?;
        Plane::from_normal(self.plane_normal)?;
        if let Some(r) = self.resolution {
            if !(r > 0.0 && r.is_finite()) {
                return Err(invalid(format!("resolution must be positive, got {r}")));
            }
        }
        if self.plane_point.iter().any(|v| !v.is_finite()) {
            return Err(invalid("plane point is not finite"));
        }
        Ok(())
    }

    pub fn plane(&self) -> AppResult<Plane> {
        Ok(Plane::from_normal(self.plane_normal)?)
    }

    pub fn parameters(&self) -> Vec<(String, ParamValue)> {
        let vec3 = |v: [f64; 3]| ParamValue::List(v.iter().map(|c| c.to_string()).collect());
        let mut params = vec![
            ("ResourceID".to_string(), scalar(&self.resource_id)),
            ("Variable".to_string(), ParamValue::List(self.variables.clone())),
            ("PlaneNormalVector".to_string(), vec3(self.plane_normal)),
            ("PlanePoint".to_string(), vec3(self.plane_point)),
        ];
        if let Some(r) = self.resolution {
            params.push(("Resolution".to_string(), scalar(r)));
        }
        if let Some(t) = &self.time {
            params.push(("Time".to_string(), scalar(iso(t))));
        }
        params
    }
}

/// Trace magnetic field or velocity lines from caller-supplied start points.
#[derive(Debug, Clone)]
pub struct FieldLineRequest {
    pub resource_id: String,
    pub start_points: PathBuf,
    /// Must name a magnetic field (`B…`) or velocity (`U…`) variable.
    pub variables: Vec<String>,
    pub coordinate_unit: CoordinateUnit,
    pub direction: TraceDirection,
    pub max_steps: Option<u32>,
    /// Meters; defaults to a quarter of the finest grid cell.
    pub step_size: Option<f64>,
    /// Meters; defaults to the run's inner boundary.
    pub stop_radius: Option<f64>,
    /// `[xmin, xmax, ymin, ymax, zmin, zmax]` in meters.
    pub stop_region: Option<[f64; 6]>,
    pub time: Option<DateTime<Utc>>,
}

pub const DEFAULT_MAX_STEPS: u32 = 100;

impl FieldLineRequest {
    pub fn validate(self) -> AppResult<Validated<Self>> {
        self.check()?;
        Ok(Validated(self))
    }

    fn check(&self) -> AppResult<()> {
        check_common(&self.resource_id, &self.variables)?;
        if self.start_points.as_os_str().is_empty() {
            return Err(invalid("no start point file given"));
        }
        self.traced_field()?;
        if self.max_steps == Some(0) {
            return Err(invalid("max_steps must be at least 1"));
        }
        if let Some(step) = self.step_size {
            if !(step > 0.0 && step.is_finite()) {
                return Err(invalid(format!("step size must be positive, got {step}")));
            }
        }
        if let Some(region) = &self.stop_region {
            if region.chunks(2).any(|pair| !(pair[0] < pair[1])) {
                return Err(invalid("stop region bounds must be increasing"));
            }
        }
        Ok(())
    }

    /// Magnetic field if any `B…` variable is requested, otherwise velocity
    /// if any `U…` variable is.
    pub fn traced_field(&self) -> AppResult<TracedField> {
        let starts = |c: char| {
            self.variables
                .iter()
                .any(|v| v.trim().starts_with([c, c.to_ascii_lowercase()]))
        };
        if starts('B') {
            Ok(TracedField::MagneticField)
        } else if starts('U') {
            Ok(TracedField::Velocity)
        } else {
            Err(invalid(
                "field lines need a magnetic field (B) or velocity (U) variable",
            ))
        }
    }

    pub fn parameters(&self) -> Vec<(String, ParamValue)> {
        let mut params = vec![
            ("ResourceID".to_string(), scalar(&self.resource_id)),
            ("url_XYZ".to_string(), scalar(self.start_points.display())),
            ("Variable".to_string(), ParamValue::List(self.variables.clone())),
            ("Direction".to_string(), scalar(format!("{:?}", self.direction))),
        ];
        let mut extra = Vec::new();
        if let Some(steps) = self.max_steps {
            extra.push(("MaxSteps".to_string(), scalar(steps)));
        }
        if let Some(step) = self.step_size {
            extra.push(("StepSize".to_string(), scalar(step)));
        }
        if let Some(r) = self.stop_radius {
            extra.push(("StopCondition_Radius".to_string(), scalar(r)));
        }
        if let Some(region) = &self.stop_region {
            extra.push((
                "StopCondition_Region".to_string(),
                ParamValue::List(region.iter().map(|v| v.to_string()).collect()),
            ));
        }
        if let Some(t) = &self.time {
            extra.push(("Time".to_string(), scalar(iso(t))));
        }
        if !extra.is_empty() {
            params.push(("extraParams".to_string(), ParamValue::Group(extra)));
        }
        params
    }
}

/// Particle energy spectra at caller-supplied points of a spectral run.
#[derive(Debug, Clone)]
pub struct SpectraRequest {
    pub resource_id: String,
    pub input: PathBuf,
    /// Energy channel names; empty means every channel the run declares.
    pub channels: Vec<String>,
    pub coordinate_unit: CoordinateUnit,
    pub method: Option<InterpolationMethod>,
}

impl SpectraRequest {
    pub fn validate(self) -> AppResult<Validated<Self>> {
        self.check()?;
        Ok(Validated(self))
    }

    fn check(&self) -> AppResult<()> {
        check_common(&self.resource_id, &self.channels)?;
        if self.input.as_os_str().is_empty() {
            return Err(invalid("no input file given"));
        }
        Ok(())
    }

    pub fn parameters(&self) -> Vec<(String, ParamValue)> {
        let mut extra = vec![
            (
                "CoordinateUnit".to_string(),
                scalar(format!("{:?}", self.coordinate_unit)),
            ),
            ("OutputFileType".to_string(), scalar("VOTable")),
        ];
        if let Some(method) = self.method {
            extra.push(("InterpolationMethod".to_string(), scalar(format!("{method:?}"))));
        }
        if !self.channels.is_empty() {
            extra.push((
                "EnergyChannel".to_string(),
                ParamValue::List(self.channels.clone()),
            ));
        }
        vec![
            ("ResourceID".to_string(), scalar(&self.resource_id)),
            ("url_XYZ".to_string(), scalar(self.input.display())),
            ("extraParams".to_string(), ParamValue::Group(extra)),
        ]
    }
}
