use chrono::{DateTime, Utc};
use hwa_core::{Real, Table};

use crate::{InputFormat, InputResult};

/// A sample time as parsed, plus the caller's own spelling of it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTime {
    pub raw: String,
    pub instant: DateTime<Utc>,
}

/// One declared column of the caller's input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputField {
    pub name: String,
    pub unit: Option<String>,
    pub ucd: Option<String>,
    pub datatype: Option<String>,
    pub description: Option<String>,
}

impl InputField {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Ingested sample points.
///
/// `table` holds the canonical columns (x, y, z first, meters); `fields` and
/// `raw_rows` keep the original input verbatim, row for row.
#[derive(Debug, Clone)]
pub struct PointSet {
    pub format: InputFormat,
    pub fields: Vec<InputField>,
    pub raw_rows: Vec<Vec<String>>,
    /// Indices into `fields` of the X, Y and Z columns.
    pub position_fields: [usize; 3],
    /// Index into `fields` of the time column, if any.
    pub time_field: Option<usize>,
    pub times: Option<Vec<SampleTime>>,
    pub table: Table,
}

impl PointSet {
    /// Points generated by the service itself (e.g. a plane mesh), in meters.
    pub fn from_positions(positions: &[[Real; 3]]) -> InputResult<Self> {
        let mut table = Table::new(vec!["x".into(), "y".into(), "z".into()]);
        let mut raw_rows = Vec::with_capacity(positions.len());
        for p in positions {
            raw_rows.push(p.iter().map(|v| hwa_core::format_value(*v)).collect());
            table.push_row(p.to_vec())?;
        }
        let fields = ["x", "y", "z"]
            .into_iter()
            .map(|name| InputField {
                unit: Some("m".into()),
                ..InputField::named(name)
            })
            .collect();
        Ok(Self {
            format: InputFormat::Plain,
            fields,
            raw_rows,
            position_fields: [0, 1, 2],
            time_field: None,
            times: None,
            table,
        })
    }

    pub fn len(&self) -> usize {
        self.table.data_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_time(&self) -> bool {
        self.times.is_some()
    }

    pub fn positions(&self) -> Vec<[Real; 3]> {
        self.table
            .data_rows()
            .map(|row| [row[0], row[1], row[2]])
            .collect()
    }

    /// The caller's own spelling of row `row`'s position.
    pub fn raw_position(&self, row: usize) -> [&str; 3] {
        self.position_fields
            .map(|field| self.raw_rows[row][field].as_str())
    }

    /// Raw tokens of the time column, in row order.
    pub fn raw_times(&self) -> Option<Vec<&str>> {
        self.times
            .as_ref()
            .map(|times| times.iter().map(|t| t.raw.as_str()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_points_are_plain_meters() {
        let set = PointSet::from_positions(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(!set.has_time());
        assert_eq!(set.positions()[1], [4.0, 5.0, 6.0]);
        assert_eq!(set.raw_rows[0], vec!["1e0", "2e0", "3e0"]);
        assert_eq!(set.fields[0].unit.as_deref(), Some("m"));
    }
}
