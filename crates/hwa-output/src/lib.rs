//! hwa-output: result assembly.
//!
//! Joins the engine result with the caller's original input and writes one
//! of three formats:
//! - plain columns (caller's own time/position tokens + requested variables)
//! - VOTable 1.2 with unit, UCD and description per field
//! - netCDF, staged as CDL text and compiled by `ncgen`
//!
//! All formats carry the same rows in the same order, and all of them mark
//! missing values the same way (`-999` in text, `NaN` in VOTable, the
//! `missing_value` attribute in netCDF).

pub mod ascii;
pub mod columns;
pub mod error;
pub mod netcdf;
pub mod provenance;
pub mod votable;

use std::path::{Path, PathBuf};

use hwa_catalog::{Catalog, Variable};
use hwa_core::{ScratchSpace, Table};
use hwa_input::PointSet;
use serde::{Deserialize, Serialize};

pub use error::{OutputError, OutputResult};
pub use netcdf::NcgenCompiler;
pub use provenance::{ParamValue, Provenance, SpacecraftWindow};
pub use votable::{CellValues, VoField, VoParam};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Ascii,
    #[default]
    VoTable,
    NetCdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ascii => "txt",
            OutputFormat::VoTable => "vot",
            OutputFormat::NetCdf => "nc",
        }
    }
}

/// A variable the caller asked for, with the description the simulation
/// metadata gives it (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedVariable {
    pub variable: Variable,
    pub description: Option<String>,
}

impl RequestedVariable {
    pub fn new(variable: Variable) -> Self {
        Self {
            variable,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub struct OutputContext<'a> {
    pub catalog: &'a Catalog,
    pub provenance: &'a Provenance,
    pub variables: &'a [RequestedVariable],
    /// `<planet>_<run directory>`, used as the table name.
    pub table_name: &'a str,
    pub service_name: &'a str,
    pub output_dir: &'a Path,
    pub ncgen: &'a NcgenCompiler,
}

pub struct OutputAssembler<'a> {
    ctx: OutputContext<'a>,
}

impl<'a> OutputAssembler<'a> {
    pub fn new(ctx: OutputContext<'a>) -> Self {
        Self { ctx }
    }

    /// Write `result` joined with `input` in `format`; returns the file path.
    pub fn assemble(
        &self,
        result: &Table,
        input: &PointSet,
        format: OutputFormat,
    ) -> OutputResult<PathBuf> {
        let joined = columns::join(result, input, self.ctx.variables)?;
        let out = ScratchSpace::new(self.ctx.output_dir)?;
        let file = out.file("result", format.extension());

        match format {
            OutputFormat::Ascii => file.write(&ascii::render(&joined))?,
            OutputFormat::VoTable => {
                let fields = votable::fields_for(&joined, self.ctx.catalog);
                file.write(&self.votable_text(&[], &fields))?;
            }
            OutputFormat::NetCdf => {
                let cdl = netcdf::render_cdl(&joined, self.ctx.provenance);
                let cdl_file = out.file("result", "cdl");
                cdl_file.write(&cdl)?;
                self.ctx.ncgen.compile(cdl_file.path(), file.path())?;
            }
        }

        let path = file.persist();
        tracing::info!(?format, rows = joined.rows(), path = %path.display(), "output assembled");
        Ok(path)
    }

    /// Write an arbitrary set of params and fields as a VOTable (traced
    /// field lines, particle spectra).
    pub fn write_votable(&self, params: &[VoParam], fields: &[VoField]) -> OutputResult<PathBuf> {
        let out = ScratchSpace::new(self.ctx.output_dir)?;
        let file = out.file("result", OutputFormat::VoTable.extension());
        file.write(&self.votable_text(params, fields))?;
        Ok(file.persist())
    }

    fn votable_text(&self, params: &[VoParam], fields: &[VoField]) -> String {
        votable::render(
            self.ctx.service_name,
            self.ctx.table_name,
            &self.ctx.provenance.render(),
            params,
            fields,
        )
    }
}
