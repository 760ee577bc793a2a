//! The service operations: interpolation (static and time-varying),
//! boundary masking, output assembly, plane surfaces, field lines and
//! particle spectra.
//!
//! Requests arrive already validated; nothing here re-checks parameters.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hwa_catalog::Catalog;
use hwa_core::units::{Length, meters};
use hwa_core::{ScratchSpace, Table};
use hwa_catalog::CatalogError;
use hwa_engine::{
    EngineError, EngineRequest, FieldLineTracer, InterpolationMethod, Interpolator, MaskMode, MaskReport,
    RunTimeIndex, SnapshotResolver, TemporalRunSelector, TraceRequest, TracedField,
};
use hwa_input::{PointSet, PointSetReader, ReadOptions, plane_mesh, positions_text};
use hwa_output::{
    NcgenCompiler, OutputAssembler, OutputContext, OutputFormat, ParamValue, Provenance,
    RequestedVariable, VoField, VoParam,
};

use crate::config::ServiceConfig;
use crate::error::{AppError, AppResult};
use crate::metadata::{EnergySpectra, MetadataSource, SimulationRun};
use crate::request::{
    DEFAULT_MAX_STEPS, FieldLineRequest, InterpolateRequest, SpectraRequest, SurfaceRequest,
    Validated,
};

/// Engine symbol of a spectral snapshot. The engine answers with every
/// energy channel whatever is asked for.
const SPECTRA_SYMBOL: &str = "Ebin0";

pub struct Service<'a> {
    config: ServiceConfig,
    catalog: Catalog,
    metadata: &'a dyn MetadataSource,
    engine: &'a dyn Interpolator,
    tracer: FieldLineTracer,
    ncgen: NcgenCompiler,
    scratch: ScratchSpace,
}

impl<'a> Service<'a> {
    pub fn new(
        config: ServiceConfig,
        metadata: &'a dyn MetadataSource,
        engine: &'a dyn Interpolator,
    ) -> AppResult<Self> {
        let scratch = ScratchSpace::new(&config.scratch_dir)?;
        Ok(Self {
            catalog: Catalog::standard(),
            tracer: FieldLineTracer::new(&config.tracer),
            ncgen: NcgenCompiler::new(&config.ncgen),
            metadata,
            engine,
            scratch,
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// One engine call over every point against a single snapshot.
    pub fn interpolate_static(
        &self,
        snapshot: &Path,
        points: &PointSet,
        symbols: &[String],
        method: InterpolationMethod,
    ) -> AppResult<Table> {
        let sample_file = PointSetReader::new(&self.catalog).canonicalize(points, &self.scratch)?;
        let table = self.engine.interpolate(&EngineRequest {
            sample_file: sample_file.path(),
            snapshot,
            symbols,
            method,
        })?;
        Ok(table)
    }

    /// Per-sample interpolation against the snapshot nearest each sample time.
    pub fn interpolate_dynamic(
        &self,
        index: &RunTimeIndex,
        snapshots: &dyn SnapshotResolver,
        points: &PointSet,
        symbols: &[String],
        method: InterpolationMethod,
    ) -> AppResult<Table> {
        let Some(times) = &points.times else {
            return Err(AppError::InvalidRequest(
                "a time-varying run needs a time column in the input".into(),
            ));
        };
        let instants: Vec<DateTime<Utc>> = times.iter().map(|t| t.instant).collect();
        let selector = TemporalRunSelector::new(self.engine, index, snapshots, &self.scratch);
        Ok(selector.run(&instants, &points.positions(), symbols, method)?)
    }

    pub fn mask_boundary(
        &self,
        table: &mut Table,
        inner_radius: Option<Length>,
        mode: MaskMode,
        skip_leading_columns: usize,
    ) -> AppResult<MaskReport> {
        let report = hwa_engine::mask_boundary(table, inner_radius, mode, skip_leading_columns)?;
        if report.masked > 0 {
            tracing::info!(masked = report.masked, inspected = report.inspected, ?mode, "inner boundary masked");
        }
        Ok(report)
    }

    pub fn assemble_output(
        &self,
        run: &SimulationRun,
        provenance: &Provenance,
        variables: &[RequestedVariable],
        result: &Table,
        input: &PointSet,
        format: OutputFormat,
    ) -> AppResult<PathBuf> {
        let table_name = run.table_name();
        let assembler = OutputAssembler::new(self.output_context(
            provenance,
            variables,
            &table_name,
        ));
        Ok(assembler.assemble(result, input, format)?)
    }

    /// Interpolate a caller's sample file; returns the output file path.
    pub fn interpolate(&self, request: &Validated<InterpolateRequest>) -> AppResult<PathBuf> {
        tracing::info!(resource = %request.resource_id, input = %request.input.display(), "interpolate request");
        let run = self.metadata.lookup(&request.resource_id)?;
        let variables = self.select_variables(run, &request.variables)?;
        let symbols = symbols_of(&variables);
        let method = request.method.unwrap_or(self.config.default_method);
        let format = request.format.unwrap_or(self.config.default_format);

        let mut required_fields = ReadOptions::default().required_fields;
        if run.is_dynamic() {
            required_fields.push("Time".into());
        }
        let options = ReadOptions {
            required_fields,
            position_coeff: request
                .coordinate_unit
                .coefficient(meters(run.planet_radius()?)),
        };
        let points = PointSetReader::new(&self.catalog).read(&request.input, &options)?;

        let mut result = match run.dynamic_layout()? {
            None => {
                let snapshot = self.static_snapshot(run)?;
                self.interpolate_static(snapshot, &points, &symbols, method)?
            }
            Some((index, snapshots)) => {
                self.interpolate_dynamic(&index, &snapshots, &points, &symbols, method)?
            }
        };
        let offset = position_offset(&result);
        self.mask_boundary(&mut result, run.inner_radius()?, MaskMode::FillSentinel, offset)?;

        let provenance = self.provenance(
            run,
            "Values interpolated at the requested points",
            method,
            request.parameters(),
        )?;
        let path = self.assemble_output(run, &provenance, &variables, &result, &points, format)?;
        tracing::info!(path = %path.display(), rows = points.len(), "interpolate request done");
        Ok(path)
    }

    /// Interpolate on an axis-aligned plane mesh spanning the simulation box.
    pub fn surface(&self, request: &Validated<SurfaceRequest>) -> AppResult<PathBuf> {
        tracing::info!(resource = %request.resource_id, normal = ?request.plane_normal, "surface request");
        let run = self.metadata.lookup(&request.resource_id)?;
        let variables = self.select_variables(run, &request.variables)?;
        let symbols = symbols_of(&variables);
        let method = request.method.unwrap_or(self.config.default_method);
        let format = request.format.unwrap_or(self.config.default_format);

        let resolution = request.resolution.unwrap_or_else(|| run.basic_cell_size());
        let points = plane_mesh(
            &run.bounding_box(),
            request.plane()?,
            request.plane_point,
            resolution,
        )?;
        let snapshot = self.snapshot_at(run, request.time)?;

        let mut result = self.interpolate_static(&snapshot, &points, &symbols, method)?;
        let offset = position_offset(&result);
        self.mask_boundary(&mut result, run.inner_radius()?, MaskMode::FillSentinel, offset)?;

        let provenance = self.provenance(
            run,
            "Values interpolated on a plane through the simulation box",
            method,
            request.parameters(),
        )?;
        self.assemble_output(run, &provenance, &variables, &result, &points, format)
    }

    /// Trace field lines from the caller's start points; always VOTable.
    pub fn field_lines(&self, request: &Validated<FieldLineRequest>) -> AppResult<PathBuf> {
        tracing::info!(resource = %request.resource_id, direction = ?request.direction, "field line request");
        let run = self.metadata.lookup(&request.resource_id)?;
        let field = request.traced_field()?;

        let options = ReadOptions {
            position_coeff: request
                .coordinate_unit
                .coefficient(meters(run.planet_radius()?)),
            ..ReadOptions::default()
        };
        let points = PointSetReader::new(&self.catalog).read(&request.start_points, &options)?;
        let start_file = self.scratch.file("start", "txt");
        start_file.write(&positions_text(&points.positions()))?;
        let snapshot = self.snapshot_at(run, request.time)?;
        let inner_radius = run.inner_radius()?;

        let mut lines = self.tracer.trace(&TraceRequest {
            snapshot: &snapshot,
            start_file: start_file.path(),
            field,
            direction: request.direction,
            max_steps: request.max_steps.unwrap_or(DEFAULT_MAX_STEPS),
            step_size: request.step_size.unwrap_or(run.finest_cell() / 4.0),
            stop_radius: request.stop_radius.or(inner_radius.map(meters)),
            stop_region: request.stop_region,
        })?;
        self.mask_boundary(&mut lines, inner_radius, MaskMode::RemoveRows, 1)?;

        let fields = self.field_line_fields(&lines, field);
        let provenance = self.provenance(
            run,
            "Field lines traced from the requested start points",
            self.config.default_method,
            request.parameters(),
        )?;
        let table_name = run.table_name();
        let assembler = OutputAssembler::new(self.output_context(&provenance, &[], &table_name));
        Ok(assembler.write_votable(&[], &fields)?)
    }

    /// Energy spectra at the caller's points of a spectral run; always VOTable
    /// with the channel edges as an `EnergyRange` param.
    pub fn spectra(&self, request: &Validated<SpectraRequest>) -> AppResult<PathBuf> {
        tracing::info!(resource = %request.resource_id, channels = request.channels.len(), "spectra request");
        let run = self.metadata.lookup(&request.resource_id)?;
        let spectra = run.spectra.as_ref().ok_or_else(|| {
            AppError::InvalidRequest(format!("{} is not a spectral product", run.resource_id))
        })?;
        let channels = select_channels(spectra, &request.channels)?;
        let method = request.method.unwrap_or(self.config.default_method);

        let options = ReadOptions {
            position_coeff: request
                .coordinate_unit
                .coefficient(meters(run.planet_radius()?)),
            ..ReadOptions::default()
        };
        let points = PointSetReader::new(&self.catalog).read(&request.input, &options)?;
        let snapshot = self.static_snapshot(run)?;
        let symbols = [SPECTRA_SYMBOL.to_string()];
        let mut result = self.interpolate_static(snapshot, &points, &symbols, method)?;

        let offset = position_offset(&result);
        let reported = result.width().saturating_sub(offset + 3);
        if reported != spectra.bins.len() {
            return Err(EngineError::Malformed {
                message: format!(
                    "spectral snapshot reports {reported} channels, {} declared",
                    spectra.bins.len()
                ),
            }
            .into());
        }
        self.mask_boundary(&mut result, run.inner_radius()?, MaskMode::FillSentinel, offset)?;

        let mut fields = self.position_fields(&result, offset);
        fields.extend(self.channel_fields(&result, offset + 3, spectra, &channels));
        let params = [VoParam::reals("EnergyRange", spectra.range_edges())
            .with_unit(&spectra.unit)
            .with_ucd("instr.param")];
        let provenance = self.provenance(
            run,
            "Particle energy spectra at the requested points",
            method,
            request.parameters(),
        )?;
        let table_name = run.table_name();
        let assembler = OutputAssembler::new(self.output_context(&provenance, &[], &table_name));
        let path = assembler.write_votable(&params, &fields)?;
        tracing::info!(path = %path.display(), rows = points.len(), "spectra request done");
        Ok(path)
    }

    /// Requested keys resolved against the run's declared variables; an
    /// empty list selects every declared variable in declaration order.
    pub fn select_variables(
        &self,
        run: &SimulationRun,
        keys: &[String],
    ) -> AppResult<Vec<RequestedVariable>> {
        let keys: Vec<&str> = if keys.is_empty() {
            run.variables.iter().map(|v| v.key.as_str()).collect()
        } else {
            keys.iter().map(String::as_str).collect()
        };
        keys.into_iter()
            .map(|key| -> AppResult<RequestedVariable> {
                let decl = run.variable(key).ok_or_else(|| {
                    CatalogError::UnknownVariable {
                        key: key.to_string(),
                    }
                })?;
                let mut requested = RequestedVariable::new(self.catalog.resolve(key)?);
                requested.description = decl.description.clone();
                Ok(requested)
            })
            .collect()
    }

    fn static_snapshot<'r>(&self, run: &'r SimulationRun) -> AppResult<&'r Path> {
        run.static_snapshot().ok_or_else(|| {
            AppError::Metadata(format!("{} has no static snapshot", run.resource_id))
        })
    }

    /// Snapshot for a single-instant request: the static snapshot, or for a
    /// time-varying run the snapshot within a few minutes of `time`.
    fn snapshot_at(&self, run: &SimulationRun, time: Option<DateTime<Utc>>) -> AppResult<PathBuf> {
        match run.dynamic_layout()? {
            None => Ok(self.static_snapshot(run)?.to_path_buf()),
            Some((_, snapshots)) => {
                let time = time.ok_or_else(|| {
                    AppError::InvalidRequest(format!(
                        "{} is time-varying; a time is required",
                        run.resource_id
                    ))
                })?;
                Ok(snapshots.locate_near(time)?)
            }
        }
    }

    fn provenance(
        &self,
        run: &SimulationRun,
        summary: &str,
        method: InterpolationMethod,
        parameters: Vec<(String, ParamValue)>,
    ) -> AppResult<Provenance> {
        Ok(Provenance {
            summary: summary.to_string(),
            model_title: run.model_title.clone(),
            model_id: run.model_id.clone(),
            run_id: run.run_id.clone(),
            output_id: run.resource_id.clone(),
            content_description: run.content_description.clone(),
            object_name: run.planet.name.clone(),
            object_radius_m: meters(run.planet_radius()?),
            coordinate_system: run.coordinate_system.clone(),
            interpolation_method: format!("{method:?}"),
            spacecraft: None,
            parameters,
        })
    }

    fn output_context<'c>(
        &'c self,
        provenance: &'c Provenance,
        variables: &'c [RequestedVariable],
        table_name: &'c str,
    ) -> OutputContext<'c> {
        OutputContext {
            catalog: &self.catalog,
            provenance,
            variables,
            table_name,
            service_name: &self.config.service_name,
            output_dir: &self.config.output_dir,
            ncgen: &self.ncgen,
        }
    }

    /// `X`, `Y` and `Z` in meters from the three columns at `offset`.
    fn position_fields(&self, table: &Table, offset: usize) -> Vec<VoField> {
        ["x", "y", "z"]
            .into_iter()
            .enumerate()
            .map(|(i, axis)| {
                let field = VoField::reals(axis.to_ascii_uppercase(), table.column(offset + i));
                match self.catalog.describe_symbol(axis) {
                    Ok(var) => field.with_unit(var.unit).with_ucd(var.ucd),
                    Err(_) => field,
                }
            })
            .collect()
    }

    /// Tracer columns `line x y z cx cy cz ctot` as output fields, line
    /// number last.
    fn field_line_fields(&self, lines: &Table, field: TracedField) -> Vec<VoField> {
        let mut fields = self.position_fields(lines, 1);
        for (i, name) in field.component_names().into_iter().enumerate() {
            let column = VoField::reals(name, lines.column(i + 4));
            fields.push(match self.catalog.resolve(name) {
                Ok(var) => column
                    .with_unit(var.unit)
                    .with_ucd(var.ucd)
                    .with_description(var.description),
                Err(_) => column,
            });
        }
        let line_numbers = lines.column(0).into_iter().map(|v| v as i64).collect();
        fields.push(VoField::ints("Line_no", line_numbers).with_description("Field line number"));
        fields
    }

    /// One flux field per selected channel; channel columns start at `first`.
    fn channel_fields(
        &self,
        result: &Table,
        first: usize,
        spectra: &EnergySpectra,
        channels: &[usize],
    ) -> Vec<VoField> {
        let flux = self.catalog.describe_symbol(SPECTRA_SYMBOL).ok();
        channels
            .iter()
            .map(|&channel| {
                let bin = &spectra.bins[channel];
                let field = VoField::reals(bin.name.clone(), result.column(first + channel))
                    .with_description(format!(
                        "Particle flux, {} to {} {}",
                        bin.low, bin.high, spectra.unit
                    ));
                match &flux {
                    Some(var) => field.with_unit(var.unit.clone()).with_ucd(var.ucd.clone()),
                    None => field,
                }
            })
            .collect()
    }
}

/// Channel positions for `names`, or every channel when none are named.
fn select_channels(spectra: &EnergySpectra, names: &[String]) -> AppResult<Vec<usize>> {
    if names.is_empty() {
        return Ok((0..spectra.bins.len()).collect());
    }
    names
        .iter()
        .map(|name| {
            spectra.channel_index(name).ok_or_else(|| {
                AppError::from(CatalogError::UnknownVariable { key: name.clone() })
            })
        })
        .collect()
}

fn symbols_of(variables: &[RequestedVariable]) -> Vec<String> {
    variables.iter().map(|v| v.variable.symbol.clone()).collect()
}

/// Column where the engine reports `x`; positions are the three columns from there.
fn position_offset(result: &Table) -> usize {
    result.column_index("x").unwrap_or(0)
}
