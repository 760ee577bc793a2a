//! netCDF output, staged as CDL text and compiled by `ncgen`.

use std::fmt::Write;
use std::path::Path;
use std::process::Command;

use hwa_core::{MISSING_SENTINEL, Real, format_value};

use crate::columns::Joined;
use crate::{OutputError, OutputResult, Provenance};

const VALUES_PER_LINE: usize = 10;

/// Adapter for the external CDL compiler.
#[derive(Debug, Clone)]
pub struct NcgenCompiler {
    program: String,
}

impl NcgenCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// `ncgen -o <out> <cdl>`
    pub fn compile(&self, cdl: &Path, out: &Path) -> OutputResult<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-o").arg(out).arg(cdl);
        tracing::debug!(command = ?cmd, "compiling CDL");
        let output = cmd.output().map_err(|source| OutputError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(OutputError::Compiler {
                program: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for NcgenCompiler {
    fn default() -> Self {
        Self::new("ncgen")
    }
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn push_values(out: &mut String, name: &str, values: impl Iterator<Item = String>) {
    let values: Vec<String> = values.collect();
    if values.is_empty() {
        return;
    }
    let _ = write!(out, "\n {name} =");
    for (i, chunk) in values.chunks(VALUES_PER_LINE).enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "\n  {}", chunk.join(", "));
    }
    out.push_str(" ;\n");
}

struct NumericVar<'j> {
    name: String,
    unit: String,
    long_name: String,
    values: Box<dyn Iterator<Item = Real> + 'j>,
}

pub fn render_cdl(joined: &Joined<'_>, provenance: &Provenance) -> String {
    let rows = joined.rows();
    let times = joined.input.raw_times();
    let time_len = times
        .as_ref()
        .and_then(|t| t.iter().map(|s| s.len()).max())
        .unwrap_or(0);

    let mut vars: Vec<NumericVar<'_>> = ["X", "Y", "Z"]
        .into_iter()
        .enumerate()
        .map(|(axis, name)| NumericVar {
            name: name.to_string(),
            unit: "m".into(),
            long_name: format!("Position {name}"),
            values: Box::new(joined.positions.iter().map(move |p| p[axis])),
        })
        .collect();
    for column in &joined.physical {
        let var = &column.requested.variable;
        let description = column.requested.description.as_deref().unwrap_or(&var.description);
        vars.push(NumericVar {
            name: var.field_name.clone(),
            unit: var.unit.clone(),
            long_name: format!("{description}, {}", var.field_name),
            values: Box::new(column.values.iter().copied()),
        });
    }

    let mut out = String::from("netcdf simulation {\ndimensions:\n");
    out.push_str("\tdim_1 = 1 ;\n");
    let _ = writeln!(out, "\tdimname = {} ;", provenance.object_name.len().max(1));
    if rows == 0 {
        out.push_str("\tcount = UNLIMITED ;\n");
    } else {
        let _ = writeln!(out, "\tcount = {rows} ;");
    }
    if time_len > 0 {
        let _ = writeln!(out, "\ttimelen = {time_len} ;");
    }

    out.push_str("variables:\n");
    out.push_str("\tchar planetname(dimname) ;\n");
    out.push_str("\tdouble r_planet(dim_1) ;\n\t\tr_planet:units = \"m\" ;\n");
    if time_len > 0 {
        out.push_str("\tchar Time(count, timelen) ;\n\t\tTime:long_name = \"Time\" ;\n");
    }
    for var in &vars {
        let _ = writeln!(out, "\tdouble {}(count) ;", var.name);
        let _ = writeln!(out, "\t\t{}:units = {} ;", var.name, quoted(&var.unit));
        let _ = writeln!(
            out,
            "\t\t{}:missing_value = {:.1} ;",
            var.name, MISSING_SENTINEL
        );
        let _ = writeln!(out, "\t\t{}:long_name = {} ;", var.name, quoted(&var.long_name));
    }

    out.push_str("\n// global attributes:\n");
    for (key, value) in [
        ("Title", provenance.summary.as_str()),
        ("SimulationModel", provenance.model_id.as_str()),
        ("SimulationRun", provenance.run_id.as_str()),
        ("NumericalOutput", provenance.output_id.as_str()),
        ("InterpolationMethod", provenance.interpolation_method.as_str()),
    ] {
        let _ = writeln!(out, "\t\t:{key} = {} ;", quoted(value));
    }

    out.push_str("data:\n");
    let _ = writeln!(out, "\n planetname = {} ;", quoted(&provenance.object_name));
    let _ = writeln!(out, "\n r_planet = {} ;", format_value(provenance.object_radius_m));
    if let Some(times) = times {
        push_values(&mut out, "Time", times.into_iter().map(quoted));
    }
    for var in vars {
        push_values(&mut out, &var.name, var.values.map(format_value));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RequestedVariable, columns};
    use hwa_catalog::Catalog;
    use hwa_core::Table;
    use hwa_input::PointSet;

    fn provenance() -> Provenance {
        Provenance {
            summary: "Interpolated values".into(),
            model_id: "spase://model".into(),
            object_name: "Earth".into(),
            object_radius_m: 6.371e6,
            interpolation_method: "Linear".into(),
            ..Provenance::default()
        }
    }

    #[test]
    fn cdl_declares_units_missing_value_and_wraps_rows() {
        let cat = Catalog::standard();
        let positions: Vec<[Real; 3]> = (0..12).map(|i| [i as Real, 0.0, 0.0]).collect();
        let input = PointSet::from_positions(&positions).unwrap();
        let mut result = Table::new(vec!["x".into(), "y".into(), "z".into(), "Bx".into()]);
        for p in &positions {
            result.push_row(vec![p[0], p[1], p[2], MISSING_SENTINEL]).unwrap();
        }
        let vars = vec![RequestedVariable::new(cat.resolve("Bx").unwrap())];
        let joined = columns::join(&result, &input, &vars).unwrap();

        let cdl = render_cdl(&joined, &provenance());
        assert!(cdl.starts_with("netcdf simulation {\n"));
        assert!(cdl.contains("\tcount = 12 ;\n"));
        assert!(cdl.contains("\tdimname = 5 ;\n"));
        assert!(cdl.contains("\t\tBx:units = \"T\" ;\n"));
        assert!(cdl.contains("\t\tBx:missing_value = -999.0 ;\n"));
        assert!(cdl.contains("\t\tBx:long_name = \"Magnetic field, X component, Bx\" ;\n"));
        assert!(cdl.contains("\t\t:SimulationModel = \"spase://model\" ;\n"));
        assert!(cdl.contains(" planetname = \"Earth\" ;\n"));
        assert!(cdl.contains(" r_planet = 6.371e6 ;\n"));
        assert!(cdl.contains(
            "\n X =\n  0e0, 1e0, 2e0, 3e0, 4e0, 5e0, 6e0, 7e0, 8e0, 9e0,\n  1e1, 1.1e1 ;\n"
        ));
        assert!(!cdl.contains("Time"));
        assert!(cdl.ends_with("}\n"));
    }

    #[test]
    fn empty_result_uses_unlimited_dimension() {
        let input = PointSet::from_positions(&[]).unwrap();
        let result = Table::new(vec!["x".into(), "y".into(), "z".into()]);
        let joined = columns::join(&result, &input, &[]).unwrap();
        let cdl = render_cdl(&joined, &provenance());
        assert!(cdl.contains("\tcount = UNLIMITED ;\n"));
        assert!(!cdl.contains(" X ="));
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(quoted(r#"a "b" \c"#), r#""a \"b\" \\c""#);
    }
}
