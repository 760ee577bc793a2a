use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use hwa_app::{
    AppError, AppResult, CoordinateUnit, FaultCategory, FieldLineRequest, InterpolateRequest,
    MetadataRegistry, MetadataSource, Service, ServiceConfig, SpectraRequest, SurfaceRequest,
    load_config,
};
use hwa_engine::{InterpolationInvoker, InterpolationMethod, TraceDirection};
use hwa_output::OutputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hwa")]
#[command(about = "Interpolate space-plasma simulation archives at arbitrary points", long_about = None)]
struct Cli {
    /// Service configuration (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Simulation metadata registry (YAML); overrides the configured one
    #[arg(short, long, global = true)]
    metadata: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpolate variables at the points of a sample file
    Interpolate {
        /// Numerical output resource id
        resource_id: String,
        /// Sample file (plain columns or VOTable)
        input: PathBuf,
        /// Variables to interpolate, comma-separated (default: all)
        #[arg(short, long, value_delimiter = ',')]
        variables: Vec<String>,
        /// Unit of the input coordinates
        #[arg(short, long, value_enum, default_value_t = Units::M)]
        units: Units,
        /// Use nearest-grid-point instead of linear interpolation
        #[arg(long)]
        nearest: bool,
        #[arg(short, long, value_enum)]
        format: Option<Format>,
    },
    /// Interpolate on an axis-aligned plane through the simulation box
    Surface {
        resource_id: String,
        /// Plane normal, e.g. 0,0,1
        #[arg(long, required = true, value_delimiter = ',', allow_hyphen_values = true)]
        normal: Vec<f64>,
        /// A point on the plane in meters
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.0, 0.0, 0.0])]
        point: Vec<f64>,
        /// Mesh spacing in meters (default: basic grid cell size)
        #[arg(long)]
        resolution: Option<f64>,
        /// Snapshot time for time-varying runs (ISO 8601)
        #[arg(long)]
        time: Option<String>,
        #[arg(short, long, value_delimiter = ',')]
        variables: Vec<String>,
        #[arg(long)]
        nearest: bool,
        #[arg(short, long, value_enum)]
        format: Option<Format>,
    },
    /// Trace magnetic field or velocity lines from start points
    FieldLine {
        resource_id: String,
        /// Start point file
        start: PathBuf,
        /// Variables; a B* variable traces the magnetic field, U* the velocity
        #[arg(short, long, value_delimiter = ',', default_value = "Btot")]
        variables: Vec<String>,
        #[arg(short, long, value_enum, default_value_t = Units::M)]
        units: Units,
        #[arg(short, long, value_enum, default_value_t = Direction::Forward)]
        direction: Direction,
        #[arg(long)]
        max_steps: Option<u32>,
        /// Step size in meters
        #[arg(long)]
        step: Option<f64>,
        /// Stop radius in meters
        #[arg(long)]
        stop_radius: Option<f64>,
        #[arg(long)]
        time: Option<String>,
    },
    /// Interpolate particle energy spectra at the points of a sample file (VOTable)
    Spectra {
        resource_id: String,
        input: PathBuf,
        /// Energy channels, comma-separated (default: all)
        #[arg(short, long, value_delimiter = ',')]
        channels: Vec<String>,
        #[arg(short, long, value_enum, default_value_t = Units::M)]
        units: Units,
        #[arg(long)]
        nearest: bool,
    },
    /// List the simulation runs in the metadata registry
    Runs,
    /// Print the SI factor of a unit string, e.g. "6.371x10+6m"
    UnitFactor { unit: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Units {
    M,
    Km,
    /// Planetary radii
    Rp,
}

impl From<Units> for CoordinateUnit {
    fn from(u: Units) -> Self {
        match u {
            Units::M => CoordinateUnit::Meters,
            Units::Km => CoordinateUnit::Kilometers,
            Units::Rp => CoordinateUnit::PlanetRadius,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Ascii,
    Votable,
    Netcdf,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Ascii => OutputFormat::Ascii,
            Format::Votable => OutputFormat::VoTable,
            Format::Netcdf => OutputFormat::NetCdf,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Forward,
    Backward,
    Both,
}

impl From<Direction> for TraceDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Forward => TraceDirection::Forward,
            Direction::Backward => TraceDirection::Backward,
            Direction::Both => TraceDirection::Both,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let fault = err.fault();
            tracing::error!(category = ?fault.category, "{}", fault.message);
            match serde_yaml::to_string(&fault) {
                Ok(text) => eprint!("{text}"),
                Err(_) => eprintln!("{}", fault.message),
            }
            match fault.category {
                FaultCategory::Client => ExitCode::from(2),
                FaultCategory::Server => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    match cli.command {
        Commands::UnitFactor { unit } => {
            println!("{}", hwa_catalog::unit_factor(&unit));
            Ok(())
        }
        Commands::Runs => {
            let registry = load_registry(&config, cli.metadata.as_deref())?;
            cmd_runs(&registry);
            Ok(())
        }
        Commands::Interpolate {
            resource_id,
            input,
            variables,
            units,
            nearest,
            format,
        } => {
            let request = InterpolateRequest {
                resource_id,
                input,
                variables,
                coordinate_unit: units.into(),
                method: method(nearest),
                format: format.map(Into::into),
            }
            .validate()?;
            with_service(config, cli.metadata.as_deref(), |s| s.interpolate(&request))
        }
        Commands::Surface {
            resource_id,
            normal,
            point,
            resolution,
            time,
            variables,
            nearest,
            format,
        } => {
            let request = SurfaceRequest {
                resource_id,
                variables,
                plane_normal: vec3(&normal, "normal")?,
                plane_point: vec3(&point, "point")?,
                resolution,
                time: time.as_deref().map(parse_time).transpose()?,
                method: method(nearest),
                format: format.map(Into::into),
            }
            .validate()?;
            with_service(config, cli.metadata.as_deref(), |s| s.surface(&request))
        }
        Commands::FieldLine {
            resource_id,
            start,
            variables,
            units,
            direction,
            max_steps,
            step,
            stop_radius,
            time,
        } => {
            let request = FieldLineRequest {
                resource_id,
                start_points: start,
                variables,
                coordinate_unit: units.into(),
                direction: direction.into(),
                max_steps,
                step_size: step,
                stop_radius,
                stop_region: None,
                time: time.as_deref().map(parse_time).transpose()?,
            }
            .validate()?;
            with_service(config, cli.metadata.as_deref(), |s| s.field_lines(&request))
        }
        Commands::Spectra {
            resource_id,
            input,
            channels,
            units,
            nearest,
        } => {
            let request = SpectraRequest {
                resource_id,
                input,
                channels,
                coordinate_unit: units.into(),
                method: method(nearest),
            }
            .validate()?;
            with_service(config, cli.metadata.as_deref(), |s| s.spectra(&request))
        }
    }
}

fn with_service(
    config: ServiceConfig,
    metadata: Option<&Path>,
    op: impl FnOnce(&Service<'_>) -> AppResult<PathBuf>,
) -> AppResult<()> {
    let registry = load_registry(&config, metadata)?;
    let engine = InterpolationInvoker::new(&config.engine);
    let service = Service::new(config, &registry, &engine)?;
    let path = op(&service)?;
    println!("{}", path.display());
    Ok(())
}

fn load_registry(config: &ServiceConfig, metadata: Option<&Path>) -> AppResult<MetadataRegistry> {
    let path = metadata
        .or(config.metadata.as_deref())
        .ok_or_else(|| AppError::Config {
            path: PathBuf::from("<none>"),
            message: "no metadata registry given (--metadata or `metadata:` in the config)".into(),
        })?;
    MetadataRegistry::load(path)
}

fn cmd_runs(registry: &MetadataRegistry) {
    if registry.runs().is_empty() {
        println!("No simulation runs registered");
        return;
    }
    for run in registry.runs() {
        let kind = if run.is_dynamic() { "dynamic" } else { "static" };
        let keys: Vec<&str> = run.variables.iter().map(|v| v.key.as_str()).collect();
        println!("{} ({}, {kind})", run.resource_id, run.planet.name);
        println!("  Model: {}  Coordinates: {}", run.model_title, run.coordinate_system);
        println!("  Variables: {}", keys.join(", "));
        if let Some(spectra) = &run.spectra {
            let names: Vec<&str> = spectra.bins.iter().map(|b| b.name.as_str()).collect();
            println!("  Energy channels ({}): {}", spectra.unit, names.join(", "));
        }
    }
}

fn method(nearest: bool) -> Option<InterpolationMethod> {
    nearest.then_some(InterpolationMethod::NearestGridPoint)
}

fn vec3(values: &[f64], what: &str) -> AppResult<[f64; 3]> {
    <[f64; 3]>::try_from(values).map_err(|_| {
        AppError::InvalidRequest(format!("--{what} needs three comma-separated values"))
    })
}

fn parse_time(text: &str) -> AppResult<DateTime<Utc>> {
    hwa_input::parse_timestamp(text)
        .ok_or_else(|| AppError::InvalidRequest(format!("invalid time '{text}'")))
}
