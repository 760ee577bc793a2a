//! Plain whitespace-separated columns, `#` comments, optional leading time.

use hwa_core::{Real, Table, ensure_finite};

use crate::point_set::{InputField, PointSet, SampleTime};
use crate::{InputError, InputFormat, InputResult, parse_timestamp};

pub fn parse_plain(text: &str, position_coeff: Real) -> InputResult<PointSet> {
    let lines: Vec<(usize, Vec<&str>)> = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| (n, line.split_whitespace().collect()))
        .collect();

    let time_included = lines
        .first()
        .and_then(|(_, tokens)| tokens.first())
        .is_some_and(|token| parse_timestamp(token).is_some());
    let offset = usize::from(time_included);

    let mut table = Table::new(vec!["x".into(), "y".into(), "z".into()]);
    let mut raw_rows = Vec::with_capacity(lines.len());
    let mut times = Vec::new();

    for (line_no, tokens) in &lines {
        if tokens.len() < offset + 3 {
            return Err(InputError::format(format!(
                "line {line_no}: expected {} columns, found {}",
                offset + 3,
                tokens.len()
            )));
        }
        if time_included {
            let instant = parse_timestamp(tokens[0]).ok_or_else(|| {
                InputError::format(format!("line {line_no}: invalid time '{}'", tokens[0]))
            })?;
            times.push(SampleTime {
                raw: tokens[0].to_string(),
                instant,
            });
        }
        let mut position = Vec::with_capacity(3);
        for token in &tokens[offset..offset + 3] {
            let value: Real = token.parse().map_err(|_| {
                InputError::format(format!("line {line_no}: invalid coordinate '{token}'"))
            })?;
            position.push(ensure_finite(value, "coordinate")? * position_coeff);
        }
        table.push_row(position)?;
        raw_rows.push(
            tokens[..offset + 3]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        );
    }

    let mut fields = Vec::new();
    if time_included {
        fields.push(InputField::named("Time"));
    }
    fields.extend(["X", "Y", "Z"].into_iter().map(InputField::named));

    Ok(PointSet {
        format: InputFormat::Plain,
        fields,
        raw_rows,
        position_fields: [offset, offset + 1, offset + 2],
        time_field: time_included.then_some(0),
        times: time_included.then_some(times),
        table,
    })
}
