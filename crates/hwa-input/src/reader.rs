use std::fs;
use std::path::Path;

use hwa_catalog::Catalog;
use hwa_core::{Real, ScratchFile, ScratchSpace, Table};

use crate::format::detect_format_bytes;
use crate::plain::parse_plain;
use crate::point_set::{InputField, PointSet, SampleTime};
use crate::votable::{RawVoTable, parse_votable};
use crate::{InputError, InputFormat, InputResult, canonical_text, parse_timestamp};

#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Fields that a self-describing input must declare (case-insensitive).
    pub required_fields: Vec<String>,
    /// Multiplier taking positions to meters (e.g. a planetary radius).
    pub position_coeff: Real,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            required_fields: vec!["X".into(), "Y".into(), "Z".into()],
            position_coeff: 1.0,
        }
    }
}

pub struct PointSetReader<'a> {
    catalog: &'a Catalog,
}

impl<'a> PointSetReader<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn read(&self, path: &Path, options: &ReadOptions) -> InputResult<PointSet> {
        let bytes = fs::read(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let format = detect_format_bytes(&bytes)?;
        let text = String::from_utf8_lossy(&bytes);
        let set = self.read_str(&text, format, options)?;
        tracing::debug!(
            path = %path.display(),
            ?format,
            samples = set.len(),
            time = set.has_time(),
            "sample points read"
        );
        Ok(set)
    }

    pub fn read_str(
        &self,
        text: &str,
        format: InputFormat,
        options: &ReadOptions,
    ) -> InputResult<PointSet> {
        match format {
            InputFormat::Plain => parse_plain(text, options.position_coeff),
            InputFormat::VoTable => self.select_votable(parse_votable(text)?, options),
        }
    }

    /// Write the canonical columns to a fresh scratch file. Dropping the
    /// returned guard removes the file.
    pub fn canonicalize(&self, set: &PointSet, scratch: &ScratchSpace) -> InputResult<ScratchFile> {
        let file = scratch.file("points", "txt");
        file.write(&canonical_text(&set.table, false))?;
        Ok(file)
    }

    fn select_votable(&self, raw: RawVoTable, options: &ReadOptions) -> InputResult<PointSet> {
        let axes = position_fields(&raw.fields);
        let time_field = raw.fields.iter().position(is_time_field);
        let find = |wanted: &str| {
            raw.fields
                .iter()
                .position(|f| f.name.eq_ignore_ascii_case(wanted))
        };

        for required in &options.required_fields {
            let present = match axis_index(required) {
                Some(axis) => axes[axis].is_some(),
                None if required.eq_ignore_ascii_case("time") => {
                    time_field.is_some() || find(required).is_some()
                }
                None => find(required).is_some(),
            };
            if !present {
                return Err(InputError::MissingField {
                    field: required.clone(),
                });
            }
        }

        let mut selected = Vec::new();
        for (axis, index) in AXES.iter().zip(axes) {
            let index = index.ok_or_else(|| InputError::MissingField {
                field: axis.to_string(),
            })?;
            selected.push(index);
        }
        for required in &options.required_fields {
            if axis_index(required).is_some() {
                continue;
            }
            if let Some(index) = find(required) {
                if !selected.contains(&index) && Some(index) != time_field {
                    selected.push(index);
                }
            }
        }

        let factors: Vec<Real> = selected
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                let unit_factor = match raw.fields[index].unit.as_deref() {
                    Some(unit) if !unit.is_empty() && !self.catalog.units.is_canonical(unit) => {
                        self.catalog.unit_factor(unit)
                    }
                    _ => 1.0,
                };
                if position < 3 {
                    unit_factor * options.position_coeff
                } else {
                    unit_factor
                }
            })
            .collect();

        let columns = selected
            .iter()
            .enumerate()
            .map(|(position, &index)| match position {
                0 => "x".to_string(),
                1 => "y".to_string(),
                2 => "z".to_string(),
                _ => raw.fields[index].name.clone(),
            })
            .collect();
        let mut table = Table::new(columns);

        let mut times = time_field.map(|_| Vec::with_capacity(raw.rows.len()));
        for (row_no, row) in raw.rows.iter().enumerate() {
            let mut values = Vec::with_capacity(selected.len());
            for (&index, factor) in selected.iter().zip(&factors) {
                let cell = &row[index];
                let value: Real = cell.parse().map_err(|_| {
                    InputError::format(format!(
                        "row {}: field '{}' is not numeric: '{cell}'",
                        row_no + 1,
                        raw.fields[index].name
                    ))
                })?;
                values.push(value * factor);
            }
            table.push_row(values)?;

            if let (Some(times), Some(index)) = (times.as_mut(), time_field) {
                let cell = &row[index];
                let instant = parse_timestamp(cell).ok_or_else(|| {
                    InputError::format(format!("row {}: invalid time '{cell}'", row_no + 1))
                })?;
                times.push(SampleTime {
                    raw: cell.clone(),
                    instant,
                });
            }
        }

        Ok(PointSet {
            format: InputFormat::VoTable,
            fields: raw.fields,
            raw_rows: raw.rows,
            position_fields: [selected[0], selected[1], selected[2]],
            time_field,
            times,
            table,
        })
    }
}

const AXES: [&str; 3] = ["X", "Y", "Z"];

fn axis_index(name: &str) -> Option<usize> {
    AXES.iter().position(|axis| axis.eq_ignore_ascii_case(name))
}

fn ucd_axis(field: &InputField) -> Option<usize> {
    match field.ucd.as_deref()? {
        "pos.cartesian.x" => Some(0),
        "pos.cartesian.y" => Some(1),
        "pos.cartesian.z" => Some(2),
        _ => None,
    }
}

/// Field index of each position axis. A cartesian-position UCD always wins;
/// an axis no UCD covers falls back to the first untagged field of that name.
fn position_fields(fields: &[InputField]) -> [Option<usize>; 3] {
    let mut axes = [None; 3];
    for (index, field) in fields.iter().enumerate() {
        if let Some(axis) = ucd_axis(field) {
            axes[axis].get_or_insert(index);
        }
    }
    for (axis, name) in AXES.iter().enumerate() {
        if axes[axis].is_none() {
            axes[axis] = fields
                .iter()
                .position(|f| ucd_axis(f).is_none() && f.name.eq_ignore_ascii_case(name));
        }
    }
    axes
}

fn is_time_field(field: &InputField) -> bool {
    field
        .ucd
        .as_deref()
        .is_some_and(|ucd| ucd.starts_with("time.epoch"))
        || matches!(
            field.name.to_ascii_uppercase().as_str(),
            "TIME" | "T" | "EPOCH"
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votable(fields: &str, rows: &str) -> String {
        format!(
            "<VOTABLE version=\"1.2\"><RESOURCE><TABLE>{fields}<DATA><TABLEDATA>{rows}</TABLEDATA></DATA></TABLE></RESOURCE></VOTABLE>"
        )
    }

    #[test]
    fn ucd_wins_over_field_name() {
        let cat = Catalog::standard();
        let reader = PointSetReader::new(&cat);
        let text = votable(
            r#"<FIELD name="a" ucd="pos.cartesian.z"/><FIELD name="b" ucd="pos.cartesian.x"/><FIELD name="c" ucd="pos.cartesian.y"/>"#,
            "<TR><TD>3</TD><TD>1</TD><TD>2</TD></TR>",
        );
        let set = reader
            .read_str(&text, InputFormat::VoTable, &ReadOptions::default())
            .unwrap();
        assert_eq!(set.positions(), vec![[1.0, 2.0, 3.0]]);
        assert_eq!(set.table.columns(), &["x", "y", "z"]);
    }

    #[test]
    fn ucd_tagged_axis_beats_an_earlier_field_named_x() {
        let cat = Catalog::standard();
        let reader = PointSetReader::new(&cat);
        let text = votable(
            r#"<FIELD name="X" unit="km"/><FIELD name="px" ucd="pos.cartesian.x"/><FIELD name="py" ucd="pos.cartesian.y"/><FIELD name="pz" ucd="pos.cartesian.z"/>"#,
            "<TR><TD>99</TD><TD>1</TD><TD>2</TD><TD>3</TD></TR>",
        );
        let set = reader
            .read_str(&text, InputFormat::VoTable, &ReadOptions::default())
            .unwrap();
        assert_eq!(set.positions(), vec![[1.0, 2.0, 3.0]]);
        assert_eq!(set.position_fields, [1, 2, 3]);
        assert_eq!(set.raw_position(0), ["1", "2", "3"]);
    }

    #[test]
    fn names_fill_axes_without_a_ucd() {
        let cat = Catalog::standard();
        let reader = PointSetReader::new(&cat);
        let text = votable(
            r#"<FIELD name="y" ucd="pos.cartesian.x"/><FIELD name="Y"/><FIELD name="z"/>"#,
            "<TR><TD>1</TD><TD>2</TD><TD>3</TD></TR>",
        );
        let set = reader
            .read_str(&text, InputFormat::VoTable, &ReadOptions::default())
            .unwrap();
        assert_eq!(set.position_fields, [0, 1, 2]);
        assert_eq!(set.positions(), vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn units_and_coefficient_scale_positions() {
        let cat = Catalog::standard();
        let reader = PointSetReader::new(&cat);
        let text = votable(
            r#"<FIELD name="X" unit="km"/><FIELD name="Y" unit="m"/><FIELD name="Z"/>"#,
            "<TR><TD>1</TD><TD>2</TD><TD>3</TD></TR>",
        );
        let options = ReadOptions {
            position_coeff: 2.0,
            ..ReadOptions::default()
        };
        let set = reader.read_str(&text, InputFormat::VoTable, &options).unwrap();
        assert_eq!(set.positions(), vec![[2000.0, 4.0, 6.0]]);
        assert_eq!(set.raw_rows[0], vec!["1", "2", "3"]);
    }

    #[test]
    fn missing_required_field() {
        let cat = Catalog::standard();
        let reader = PointSetReader::new(&cat);
        let text = votable(
            r#"<FIELD name="X"/><FIELD name="Y"/><FIELD name="Z"/>"#,
            "<TR><TD>1</TD><TD>2</TD><TD>3</TD></TR>",
        );
        let options = ReadOptions {
            required_fields: vec!["Time".into(), "X".into(), "Y".into(), "Z".into()],
            ..ReadOptions::default()
        };
        let err = reader
            .read_str(&text, InputFormat::VoTable, &options)
            .unwrap_err();
        assert!(matches!(err, InputError::MissingField { ref field } if field == "Time"));
    }

    #[test]
    fn time_field_and_extra_columns() {
        let cat = Catalog::standard();
        let reader = PointSetReader::new(&cat);
        let text = votable(
            r#"<FIELD name="Mass" unit="g"/><FIELD name="Z"/><FIELD name="Y"/><FIELD name="X"/><FIELD name="Epoch" ucd="time.epoch"/>"#,
            "<TR><TD>5</TD><TD>3</TD><TD>2</TD><TD>1</TD><TD>2010-01-01T00:00:00Z</TD></TR>",
        );
        let options = ReadOptions {
            required_fields: vec!["Mass".into(), "Time".into()],
            ..ReadOptions::default()
        };
        let set = reader.read_str(&text, InputFormat::VoTable, &options).unwrap();
        assert_eq!(set.table.columns(), &["x", "y", "z", "Mass"]);
        let row: Vec<Real> = set.table.data_rows().next().unwrap().to_vec();
        assert_eq!(row, vec![1.0, 2.0, 3.0, 0.005]);
        assert_eq!(set.time_field, Some(4));
        assert_eq!(set.position_fields, [3, 2, 1]);
        assert_eq!(set.raw_times().unwrap(), vec!["2010-01-01T00:00:00Z"]);
    }

    #[test]
    fn canonical_scratch_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path()).unwrap();
        let cat = Catalog::standard();
        let reader = PointSetReader::new(&cat);
        let set = reader
            .read_str("1 2 3\n", InputFormat::Plain, &ReadOptions::default())
            .unwrap();
        let file = reader.canonicalize(&set, &scratch).unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1e0 2e0 3e0\n");
        drop(file);
        assert!(!path.exists());
    }
}
