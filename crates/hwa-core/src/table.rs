//! Tabular result shape: a header of column names plus ordered rows.
//!
//! Every data row carries exactly one value per header column. Comment rows
//! pass through untouched so engine annotations survive to the output stage.

use crate::{CoreError, CoreResult, Real};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Row {
    Comment(String),
    Data(Vec<Real>),
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Case-insensitive lookup; column names come from external headers.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn push_row(&mut self, values: Vec<Real>) -> CoreResult<()> {
        if values.len() != self.columns.len() {
            return Err(CoreError::RowWidth {
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        self.rows.push(Row::Data(values));
        Ok(())
    }

    pub fn push_comment(&mut self, text: impl Into<String>) {
        self.rows.push(Row::Comment(text.into()));
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &[Real]> {
        self.rows.iter().filter_map(|row| match row {
            Row::Data(values) => Some(values.as_slice()),
            Row::Comment(_) => None,
        })
    }

    pub fn data_len(&self) -> usize {
        self.data_rows().count()
    }

    pub fn column(&self, index: usize) -> Vec<Real> {
        self.data_rows().map(|row| row[index]).collect()
    }

    /// Keep only the data rows for which `keep` returns true. Comments stay.
    pub fn retain_data(&mut self, mut keep: impl FnMut(&[Real]) -> bool) {
        self.rows.retain(|row| match row {
            Row::Data(values) => keep(values),
            Row::Comment(_) => true,
        });
    }

    /// Mutate data rows in place; row width cannot change through a slice.
    pub fn for_each_data_mut(&mut self, mut f: impl FnMut(&mut [Real])) {
        for row in &mut self.rows {
            if let Row::Data(values) = row {
                f(values.as_mut_slice());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xyz_table() -> Table {
        Table::new(vec!["x".into(), "y".into(), "z".into(), "Bx".into()])
    }

    #[test]
    fn push_row_checks_width() {
        let mut t = xyz_table();
        t.push_row(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let err = t.push_row(vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CoreError::RowWidth { expected: 4, found: 2 }));
        assert_eq!(t.data_len(), 1);
    }

    #[test]
    fn comments_are_kept_apart_from_data() {
        let mut t = xyz_table();
        t.push_comment("engine note");
        t.push_row(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        t.push_row(vec![5.0, 6.0, 7.0, 8.0]).unwrap();
        t.retain_data(|row| row[0] > 2.0);
        assert_eq!(t.rows().len(), 2);
        assert_eq!(t.column(3), vec![8.0]);
    }

    #[test]
    fn column_lookup_ignores_case() {
        let t = xyz_table();
        assert_eq!(t.column_index("bx"), Some(3));
        assert_eq!(t.column_index("Btot"), None);
    }
}
