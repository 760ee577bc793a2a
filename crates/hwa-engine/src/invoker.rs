//! Interpolation engine adapter.
//!
//! The engine reads `x y z` lines on standard input and writes a header line
//! naming its output columns followed by one row per sample. The header is
//! authoritative: the engine may reorder the requested symbols.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use hwa_core::timing::Timer;
use hwa_core::{Real, Table};
use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMethod {
    #[default]
    Linear,
    NearestGridPoint,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    /// Canonical sample file, one `x y z` line per sample, meters.
    pub sample_file: &'a Path,
    pub snapshot: &'a Path,
    pub symbols: &'a [String],
    pub method: InterpolationMethod,
}

/// Anything that can interpolate a snapshot at sample points.
pub trait Interpolator {
    fn interpolate(&self, request: &EngineRequest<'_>) -> EngineResult<Table>;
}

#[derive(Debug, Clone)]
pub struct InterpolationInvoker {
    program: PathBuf,
}

impl InterpolationInvoker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(request: &EngineRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-v".into(), request.symbols.join(",").into()];
        if request.method == InterpolationMethod::NearestGridPoint {
            args.push("-z".into());
        }
        args.push(request.snapshot.as_os_str().to_owned());
        args
    }

    pub fn invoke(
        &self,
        sample_file: &Path,
        snapshot: &Path,
        symbols: &[String],
        method: InterpolationMethod,
    ) -> EngineResult<Table> {
        self.interpolate(&EngineRequest {
            sample_file,
            snapshot,
            symbols,
            method,
        })
    }
}

impl Interpolator for InterpolationInvoker {
    fn interpolate(&self, request: &EngineRequest<'_>) -> EngineResult<Table> {
        let stdin = File::open(request.sample_file).map_err(|source| EngineError::Io {
            path: request.sample_file.to_path_buf(),
            source,
        })?;
        let mut cmd = Command::new(&self.program);
        cmd.args(Self::args(request)).stdin(Stdio::from(stdin));

        tracing::debug!(command = ?cmd, "running interpolation engine");
        let timer = Timer::start("interpolation engine");
        let stdout = run_command(&mut cmd, &self.program)?;
        timer.stop_and_log();

        parse_engine_output(&stdout)
    }
}

/// Run to completion and return stdout; non-zero exit is a failure.
pub(crate) fn run_command(cmd: &mut Command, program: &Path) -> EngineResult<String> {
    let output = cmd.output().map_err(|source| EngineError::Spawn {
        program: program.display().to_string(),
        source,
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::warn!(program = %program.display(), status = ?output.status.code(), %stderr, "external tool failed");
        return Err(EngineError::Failure {
            program: program.display().to_string(),
            status: output.status.code(),
            stderr,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// First non-blank line is the column header (leading `#` optional); later
/// `#` lines are kept as comments, everything else must be numeric rows.
pub fn parse_engine_output(text: &str) -> EngineResult<Table> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines
        .next()
        .ok_or_else(|| EngineError::malformed("engine produced no header line"))?;
    let columns: Vec<String> = header
        .trim_start_matches('#')
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        return Err(EngineError::malformed("engine header names no columns"));
    }

    let mut table = Table::new(columns);
    for line in lines {
        if let Some(comment) = line.strip_prefix('#') {
            table.push_comment(comment.trim());
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|token| {
                token.parse::<Real>().map_err(|_| {
                    EngineError::malformed(format!("non-numeric value '{token}' in engine output"))
                })
            })
            .collect::<EngineResult<Vec<Real>>>()?;
        table.push_row(values)?;
    }
    Ok(table)
}
