//! Provenance text embedded in self-describing outputs.

use std::fmt::Write;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
    Group(Vec<(String, ParamValue)>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpacecraftWindow {
    pub name: String,
    pub start: String,
    pub stop: String,
    pub sampling: String,
}

/// Identity of the simulation behind a result and the parameters that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Provenance {
    /// One-line summary heading the block.
    pub summary: String,
    pub model_title: String,
    pub model_id: String,
    pub run_id: String,
    pub output_id: String,
    pub content_description: String,
    pub object_name: String,
    pub object_radius_m: f64,
    pub coordinate_system: String,
    pub interpolation_method: String,
    pub spacecraft: Option<SpacecraftWindow>,
    pub parameters: Vec<(String, ParamValue)>,
}

const LABEL_WIDTH: usize = 27;

impl Provenance {
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.summary.is_empty() {
            out.push_str(&self.summary);
            out.push_str("\n\n");
        }
        let mut line = |label: &str, value: &str| {
            let _ = writeln!(out, "  {label:<LABEL_WIDTH$}: {value}");
        };
        line("SimulationModel", &self.model_title);
        line("SimulationModel_ResourceID", &self.model_id);
        line("SimulationRun_ResourceID", &self.run_id);
        line("NumericalOutput_ResourceID", &self.output_id);
        line("Content description", &self.content_description);
        line("Object", &self.object_name);
        line("Object radius", &format!("{} m", self.object_radius_m));
        line("Coordinate system", &self.coordinate_system);
        if let Some(sc) = &self.spacecraft {
            line("Spacecraft", &sc.name);
            line("Start time", &sc.start);
            line("Stop time", &sc.stop);
            line("Sampling", &sc.sampling);
        }
        if !self.parameters.is_empty() {
            out.push_str("\n  Input parameters :\n");
            for (key, value) in &self.parameters {
                render_param(&mut out, key, value, 1);
            }
        }
        out
    }
}

fn render_param(out: &mut String, key: &str, value: &ParamValue, depth: usize) {
    let indent = format!("     {}", "    ".repeat(depth - 1));
    match value {
        ParamValue::Scalar(v) => {
            let _ = writeln!(out, "{indent}{key} => {v}");
        }
        ParamValue::List(items) => {
            let _ = writeln!(out, "{indent}{key} => [{}]", items.join(", "));
        }
        ParamValue::Group(children) => {
            let _ = writeln!(out, "{indent}{key} => [");
            for (k, v) in children {
                render_param(out, k, v, depth + 1);
            }
            let _ = writeln!(out, "{indent}]");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_identity_and_nested_parameters() {
        let p = Provenance {
            summary: "Interpolated values".into(),
            model_title: "GUMICS-4".into(),
            object_name: "Earth".into(),
            object_radius_m: 6.371e6,
            coordinate_system: "GSE".into(),
            parameters: vec![
                ("ResourceID".into(), ParamValue::Scalar("spase://x".into())),
                (
                    "Variable".into(),
                    ParamValue::List(vec!["Bx".into(), "Btot".into()]),
                ),
                (
                    "extraParams".into(),
                    ParamValue::Group(vec![(
                        "InterpolationMethod".into(),
                        ParamValue::Scalar("Linear".into()),
                    )]),
                ),
            ],
            ..Provenance::default()
        };
        let text = p.render();
        assert!(text.starts_with("Interpolated values\n\n"));
        assert!(text.contains("  Object                     : Earth\n"));
        assert!(text.contains("  Object radius              : 6371000 m\n"));
        assert!(text.contains("     Variable => [Bx, Btot]\n"));
        assert!(text.contains("     extraParams => [\n         InterpolationMethod => Linear\n     ]\n"));
        assert!(!text.contains("Spacecraft"));
    }
}
