//! Alignment of engine result columns with the caller's request and input.

use hwa_core::{Real, Table};
use hwa_input::PointSet;

use crate::{OutputError, OutputResult, RequestedVariable};

/// One requested variable with its values, in row order.
#[derive(Debug, Clone)]
pub struct PhysicalColumn<'a> {
    pub requested: &'a RequestedVariable,
    pub values: Vec<Real>,
}

/// Result and input joined row by row.
#[derive(Debug, Clone)]
pub struct Joined<'a> {
    pub input: &'a PointSet,
    /// Engine positions (meters), row order.
    pub positions: Vec<[Real; 3]>,
    pub physical: Vec<PhysicalColumn<'a>>,
}

impl Joined<'_> {
    pub fn rows(&self) -> usize {
        self.positions.len()
    }
}

/// Exact match first; engine symbols differ only by case in a few places
/// (`t` vs `T`), so case-insensitive lookup is a fallback.
pub fn find_column(result: &Table, symbol: &str) -> Option<usize> {
    result
        .columns()
        .iter()
        .position(|c| c == symbol)
        .or_else(|| result.column_index(symbol))
}

pub fn join<'a>(
    result: &Table,
    input: &'a PointSet,
    variables: &'a [RequestedVariable],
) -> OutputResult<Joined<'a>> {
    if result.data_len() != input.len() {
        return Err(OutputError::RowMismatch {
            result: result.data_len(),
            input: input.len(),
        });
    }

    let axis = |name: &str, fallback: usize| find_column(result, name).unwrap_or(fallback);
    let (ix, iy, iz) = (axis("x", 0), axis("y", 1), axis("z", 2));
    let positions = result
        .data_rows()
        .map(|row| [row[ix], row[iy], row[iz]])
        .collect();

    let physical = variables
        .iter()
        .map(|requested| {
            let symbol = &requested.variable.symbol;
            let index = find_column(result, symbol).ok_or_else(|| {
                OutputError::MissingResultColumn {
                    symbol: symbol.clone(),
                }
            })?;
            Ok(PhysicalColumn {
                requested,
                values: result.column(index),
            })
        })
        .collect::<OutputResult<Vec<_>>>()?;

    Ok(Joined {
        input,
        positions,
        physical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwa_catalog::Catalog;

    fn result() -> Table {
        let mut t = Table::new(vec!["x".into(), "y".into(), "z".into(), "B".into(), "Bx".into()]);
        t.push_row(vec![1.0, 2.0, 3.0, 10.0, 20.0]).unwrap();
        t
    }

    #[test]
    fn variables_follow_request_order_not_engine_order() {
        let cat = Catalog::standard();
        let vars = vec![
            RequestedVariable::new(cat.resolve("Bx").unwrap()),
            RequestedVariable::new(cat.resolve("Btot").unwrap()),
        ];
        let input = PointSet::from_positions(&[[1.0, 2.0, 3.0]]).unwrap();
        let joined = join(&result(), &input, &vars).unwrap();
        assert_eq!(joined.physical[0].values, vec![20.0]);
        assert_eq!(joined.physical[1].values, vec![10.0]);
        assert_eq!(joined.positions, vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn missing_symbol_and_row_mismatch() {
        let cat = Catalog::standard();
        let vars = vec![RequestedVariable::new(cat.resolve("Density").unwrap())];
        let input = PointSet::from_positions(&[[1.0, 2.0, 3.0]]).unwrap();
        assert!(matches!(
            join(&result(), &input, &vars),
            Err(OutputError::MissingResultColumn { .. })
        ));
        let two = PointSet::from_positions(&[[0.0; 3], [1.0; 3]]).unwrap();
        assert!(matches!(
            join(&result(), &two, &[]),
            Err(OutputError::RowMismatch { result: 1, input: 2 })
        ));
    }

    #[test]
    fn lowercase_t_does_not_shadow_temperature() {
        let mut t = Table::new(vec!["x".into(), "y".into(), "z".into(), "t".into(), "T".into()]);
        t.push_row(vec![0.0, 0.0, 0.0, 1.0, 2.0]).unwrap();
        assert_eq!(find_column(&t, "T"), Some(4));
        assert_eq!(find_column(&t, "bx"), None);
    }
}
