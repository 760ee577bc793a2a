//! Field-line tracer adapter.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use hwa_core::{Real, Table};
use serde::{Deserialize, Serialize};

use crate::invoker::run_command;
use crate::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TracedField {
    MagneticField,
    Velocity,
}

impl TracedField {
    fn letter(self) -> &'static str {
        match self {
            TracedField::MagneticField => "B",
            TracedField::Velocity => "v",
        }
    }

    /// Output names of the three components and the magnitude.
    pub fn component_names(self) -> [&'static str; 4] {
        match self {
            TracedField::MagneticField => ["Bx", "By", "Bz", "Btot"],
            TracedField::Velocity => ["Ux", "Uy", "Uz", "Utot"],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceDirection {
    #[default]
    Forward,
    Backward,
    Both,
}

#[derive(Debug, Clone)]
pub struct TraceRequest<'a> {
    pub snapshot: &'a Path,
    /// Start points, one `x y z` line each, meters.
    pub start_file: &'a Path,
    pub field: TracedField,
    pub direction: TraceDirection,
    pub max_steps: u32,
    pub step_size: Real,
    pub stop_radius: Option<Real>,
    /// xmin, xmax, ymin, ymax, zmin, zmax
    pub stop_region: Option<[Real; 6]>,
}

#[derive(Debug, Clone)]
pub struct FieldLineTracer {
    program: PathBuf,
}

impl FieldLineTracer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn args(request: &TraceRequest<'_>, backward: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if backward {
            args.push("-b".into());
        }
        if let Some(radius) = request.stop_radius {
            args.push("-r".into());
            args.push(radius.to_string().into());
        }
        if let Some(region) = request.stop_region {
            let joined: Vec<String> = region.iter().map(|v| v.to_string()).collect();
            args.push("-l".into());
            args.push(joined.join(",").into());
        }
        args.push("-ms".into());
        args.push(request.max_steps.to_string().into());
        args.push("-ss".into());
        args.push(request.step_size.to_string().into());
        args.push(request.field.letter().into());
        args.push(request.snapshot.as_os_str().to_owned());
        args.push("-i".into());
        args.push(request.start_file.as_os_str().to_owned());
        args
    }

    /// Trace field lines; `Both` concatenates the forward and backward runs.
    pub fn trace(&self, request: &TraceRequest<'_>) -> EngineResult<Table> {
        let passes: &[bool] = match request.direction {
            TraceDirection::Forward => &[false],
            TraceDirection::Backward => &[true],
            TraceDirection::Both => &[false, true],
        };
        let mut text = String::new();
        for &backward in passes {
            let mut cmd = Command::new(&self.program);
            cmd.args(Self::args(request, backward));
            tracing::debug!(command = ?cmd, "running field-line tracer");
            text.push_str(&run_command(&mut cmd, &self.program)?);
            text.push('\n');
        }
        let table = parse_tracer_output(&text, request.field)?;
        tracing::info!(points = table.data_len(), direction = ?request.direction, "field lines traced");
        Ok(table)
    }
}

/// Rows of `line x y z fx fy fz`; lines starting with `#`, `>` or `%` are
/// tracer chatter. The field magnitude is appended as the last column.
pub fn parse_tracer_output(text: &str, field: TracedField) -> EngineResult<Table> {
    let [cx, cy, cz, ctot] = field.component_names();
    let mut table = Table::new(
        ["line", "x", "y", "z", cx, cy, cz, ctot]
            .into_iter()
            .map(str::to_string)
            .collect(),
    );
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with(['#', '>', '%']) {
            continue;
        }
        let values = line
            .split_whitespace()
            .take(7)
            .map(|token| {
                token.parse::<Real>().map_err(|_| EngineError::Malformed {
                    message: format!("non-numeric value '{token}' in tracer output"),
                })
            })
            .collect::<EngineResult<Vec<Real>>>()?;
        if values.len() < 7 {
            return Err(EngineError::Malformed {
                message: format!("tracer row has {} values, expected 7: '{line}'", values.len()),
            });
        }
        let magnitude = (values[4] * values[4] + values[5] * values[5] + values[6] * values[6]).sqrt();
        let mut row = values;
        row.push(magnitude);
        table.push_row(row)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(snapshot: &'a Path, start: &'a Path) -> TraceRequest<'a> {
        TraceRequest {
            snapshot,
            start_file: start,
            field: TracedField::MagneticField,
            direction: TraceDirection::Forward,
            max_steps: 100,
            step_size: 250.0,
            stop_radius: None,
            stop_region: None,
        }
    }

    #[test]
    fn forward_arguments() {
        let req = request(Path::new("run.hc"), Path::new("start.txt"));
        let args = FieldLineTracer::args(&req, false);
        assert_eq!(args, vec!["-ms", "100", "-ss", "250", "B", "run.hc", "-i", "start.txt"]);
    }

    #[test]
    fn backward_with_stop_conditions() {
        let mut req = request(Path::new("run.hc"), Path::new("start.txt"));
        req.field = TracedField::Velocity;
        req.stop_radius = Some(2.5e7);
        req.stop_region = Some([-1.0, 1.0, -2.0, 2.0, -3.0, 3.0]);
        let args = FieldLineTracer::args(&req, true);
        assert_eq!(
            args,
            vec![
                "-b", "-r", "25000000", "-l", "-1,1,-2,2,-3,3", "-ms", "100", "-ss", "250", "v",
                "run.hc", "-i", "start.txt"
            ]
        );
    }

    #[test]
    fn parses_rows_and_appends_magnitude() {
        let text = "# header\n> progress\n% stats\n0 1 2 3 3e-9 4e-9 0\n1 4 5 6 0 0 -2e-9\n";
        let t = parse_tracer_output(text, TracedField::MagneticField).unwrap();
        assert_eq!(t.columns()[7], "Btot");
        assert_eq!(t.data_len(), 2);
        let btot = t.column(7);
        assert!((btot[0] - 5e-9).abs() < 1e-21);
        assert!((btot[1] - 2e-9).abs() < 1e-21);
    }

    #[test]
    fn short_rows_fail() {
        assert!(parse_tracer_output("0 1 2 3\n", TracedField::Velocity).is_err());
    }
}
