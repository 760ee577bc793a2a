//! Field-line requests against a shell-script tracer.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use hwa_app::{
    CoordinateUnit, FaultCategory, FieldLineRequest, GridDef, MetadataRegistry, Planet, Radius,
    RunData, Service, ServiceConfig, SimulationRun, VariableDecl,
};
use hwa_core::Table;
use hwa_engine::{EngineRequest, EngineResult, Interpolator, TraceDirection};

struct NoEngine;

impl Interpolator for NoEngine {
    fn interpolate(&self, _: &EngineRequest<'_>) -> EngineResult<Table> {
        panic!("field lines never call the interpolation engine");
    }
}

const TRACER_OUTPUT: &str = "# fieldline tracer\n\
> tracing 2 lines\n\
1 1000 0 0 3 4 0\n\
1 500 0 0 3 4 0\n\
2 0 2000 0 0 0 2\n";

fn tracer(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("fake-tracer");
    let script = format!(
        "#!/bin/sh\necho \"$@\" >> \"{}\"\ncat <<'OUT'\n{TRACER_OUTPUT}OUT\n",
        dir.join("args.txt").display()
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn registry() -> MetadataRegistry {
    MetadataRegistry::new(vec![SimulationRun {
        resource_id: "spase://IMPEX/NumericalOutput/FMI/HYB/mars_run2/tetra".into(),
        model_id: "spase://IMPEX/SimulationModel/FMI/HYB".into(),
        model_title: "HYB".into(),
        run_id: "spase://IMPEX/SimulationRun/FMI/HYB/mars_run2".into(),
        run_directory: "mars_run2".into(),
        content_description: String::new(),
        planet: Planet {
            name: "Mars".into(),
            radius: 3390.0,
            radius_unit: "km".into(),
        },
        coordinate_system: "MSO".into(),
        grid: GridDef::Adaptive {
            finest_cell: 1000.0,
            levels: 2,
        },
        bbox_min: [-1.0e7; 3],
        bbox_max: [1.0e7; 3],
        variables: vec![VariableDecl {
            key: "Btot".into(),
            description: None,
        }],
        inner_boundary: Some(Radius {
            value: 1.0,
            unit: "km".into(),
        }),
        spectra: None,
        data: RunData::Static {
            snapshot: "/snapshots/mars.hc".into(),
        },
    }])
}

fn request(start_points: &Path, direction: TraceDirection) -> FieldLineRequest {
    FieldLineRequest {
        resource_id: "spase://IMPEX/NumericalOutput/FMI/HYB/mars_run2/tetra".into(),
        start_points: start_points.to_path_buf(),
        variables: vec!["Btot".into()],
        coordinate_unit: CoordinateUnit::Meters,
        direction,
        max_steps: None,
        step_size: None,
        stop_radius: None,
        stop_region: None,
        time: None,
    }
}

#[test]
fn traced_lines_are_masked_and_written_as_votable() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        tracer: tracer(dir.path()),
        scratch_dir: dir.path().join("scratch"),
        output_dir: dir.path().join("out"),
        ..ServiceConfig::default()
    };
    let start = dir.path().join("start.txt");
    fs::write(&start, "1000 0 0\n0 2000 0\n").unwrap();
    let registry = registry();
    let service = Service::new(config, &registry, &NoEngine).unwrap();

    let path = service
        .field_lines(&request(&start, TraceDirection::Forward).validate().unwrap())
        .unwrap();
    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains(r#"<TABLE name="Mars_mars_run2" nrows="2">"#));
    assert!(text.contains(r#"<FIELD ID="col8" name="Line_no" datatype="int">"#));
    assert!(text.contains(
        "<TR><TD>1e3</TD><TD>0e0</TD><TD>0e0</TD><TD>3e0</TD><TD>4e0</TD><TD>0e0</TD><TD>5e0</TD><TD>1</TD></TR>"
    ));
    assert!(text.contains("<TD>2e0</TD><TD>2</TD></TR>"));
    assert!(!text.contains("<TD>5e2</TD>"));

    let args = fs::read_to_string(dir.path().join("args.txt")).unwrap();
    let args: Vec<&str> = args.split_whitespace().collect();
    assert_eq!(&args[..8], ["-r", "1000", "-ms", "100", "-ss", "250", "B", "/snapshots/mars.hc"]);
    assert_eq!(args[8], "-i");
}

#[test]
fn both_directions_run_the_tracer_twice() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        tracer: tracer(dir.path()),
        scratch_dir: dir.path().join("scratch"),
        output_dir: dir.path().join("out"),
        ..ServiceConfig::default()
    };
    let start = dir.path().join("start.txt");
    fs::write(&start, "1 0 0\n").unwrap();
    let registry = registry();
    let service = Service::new(config, &registry, &NoEngine).unwrap();

    let mut req = request(&start, TraceDirection::Both);
    req.coordinate_unit = CoordinateUnit::PlanetRadius;
    let path = service.field_lines(&req.validate().unwrap()).unwrap();
    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains(r#"nrows="4""#));

    let args = fs::read_to_string(dir.path().join("args.txt")).unwrap();
    let runs: Vec<&str> = args.lines().collect();
    assert_eq!(runs.len(), 2);
    assert!(runs[1].starts_with("-b -r 1000 "));
}

#[test]
fn scalar_variables_cannot_be_traced() {
    let mut req = request(Path::new("start.txt"), TraceDirection::Forward);
    req.variables = vec!["Density".into()];
    let err = req.validate().unwrap_err();
    assert_eq!(err.category(), FaultCategory::Client);
}
