//! Plain columnar output.

use std::fmt::Write;

use hwa_core::format_value;

use crate::columns::Joined;

/// `#[t ]x y z <keys>` header, then one row per sample. Time and position
/// tokens are the caller's own; physical columns use the requested keys.
pub fn render(joined: &Joined<'_>) -> String {
    let input = joined.input;
    let times = input.raw_times();

    let mut out = String::from("#");
    if times.is_some() {
        out.push_str("t ");
    }
    out.push_str("x y z");
    for column in &joined.physical {
        out.push(' ');
        out.push_str(&column.requested.variable.key);
    }
    out.push('\n');

    for row in 0..joined.rows() {
        let mut cells: Vec<&str> = Vec::with_capacity(4);
        if let Some(times) = &times {
            cells.push(times[row]);
        }
        cells.extend(input.raw_position(row));
        out.push_str(&cells.join(" "));
        for column in &joined.physical {
            let _ = write!(out, " {}", format_value(column.values[row]));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RequestedVariable, columns};
    use hwa_catalog::Catalog;
    use hwa_core::{MISSING_SENTINEL, Table};
    use hwa_input::{InputFormat, PointSetReader, ReadOptions};

    #[test]
    fn echoes_caller_tokens_and_names_columns_by_key() {
        let cat = Catalog::standard();
        let input = PointSetReader::new(&cat)
            .read_str(
                "2010-01-01T00:00:00 1.5 2 3\n",
                InputFormat::Plain,
                &ReadOptions::default(),
            )
            .unwrap();
        let mut result = Table::new(vec!["x".into(), "y".into(), "z".into(), "Bx".into()]);
        result.push_row(vec![1.5, 2.0, 3.0, MISSING_SENTINEL]).unwrap();
        let vars = vec![RequestedVariable::new(cat.resolve("Bx").unwrap())];
        let joined = columns::join(&result, &input, &vars).unwrap();

        let text = render(&joined);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("#t x y z Bx"));
        assert_eq!(lines.next(), Some("2010-01-01T00:00:00 1.5 2 3 -999"));
        assert_eq!(lines.next(), None);
    }
}
