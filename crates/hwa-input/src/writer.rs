//! Text the interpolation engine reads: one `x y z` line per sample.

use hwa_core::{Real, Table, format_value};

pub fn canonical_text(table: &Table, header: bool) -> String {
    let mut out = String::new();
    if header {
        out.push_str("# ");
        out.push_str(&table.columns().join(" "));
        out.push('\n');
    }
    for row in table.data_rows() {
        let line: Vec<String> = row.iter().map(|v| format_value(*v)).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

pub fn positions_text(positions: &[[Real; 3]]) -> String {
    let mut out = String::new();
    for [x, y, z] in positions {
        out.push_str(&format!(
            "{} {} {}\n",
            format_value(*x),
            format_value(*y),
            format_value(*z)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_optional() {
        let mut t = Table::new(vec!["x".into(), "y".into(), "z".into()]);
        t.push_row(vec![1.0, -2.5, 3e6]).unwrap();
        assert_eq!(canonical_text(&t, false), "1e0 -2.5e0 3e6\n");
        assert_eq!(canonical_text(&t, true), "# x y z\n1e0 -2.5e0 3e6\n");
    }

    #[test]
    fn positions_lines() {
        assert_eq!(positions_text(&[[0.5, 0.0, -1.0]]), "5e-1 0e0 -1e0\n");
    }
}
