//! Inner-boundary masking: samples inside the excluded sphere around the
//! planet carry no physical values.

use hwa_core::units::{Length, meters};
use hwa_core::{MISSING_SENTINEL, Table};

use crate::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    /// Drop the row (trajectory-style outputs).
    RemoveRows,
    /// Keep the position, replace every later column with the sentinel.
    FillSentinel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskReport {
    pub inspected: usize,
    pub masked: usize,
}

/// Mask rows whose position lies strictly inside `inner_radius`.
///
/// Positions are read from the three columns starting at `skip_leading_columns`.
/// Without an inner radius the table is left untouched.
pub fn mask_boundary(
    table: &mut Table,
    inner_radius: Option<Length>,
    mode: MaskMode,
    skip_leading_columns: usize,
) -> EngineResult<MaskReport> {
    let Some(radius) = inner_radius else {
        return Ok(MaskReport::default());
    };
    if table.width() < skip_leading_columns + 3 {
        return Err(EngineError::malformed(format!(
            "cannot read positions at column {skip_leading_columns} of a {}-column table",
            table.width()
        )));
    }

    let r = meters(radius);
    let r2 = r * r;
    let inside = |row: &[f64]| {
        let p = &row[skip_leading_columns..skip_leading_columns + 3];
        p[0] * p[0] + p[1] * p[1] + p[2] * p[2] < r2
    };

    let mut report = MaskReport {
        inspected: table.data_len(),
        masked: 0,
    };
    match mode {
        MaskMode::RemoveRows => {
            table.retain_data(|row| {
                let drop = inside(row);
                report.masked += usize::from(drop);
                !drop
            });
        }
        MaskMode::FillSentinel => {
            table.for_each_data_mut(|row| {
                if inside(row) {
                    report.masked += 1;
                    row[skip_leading_columns + 3..].fill(MISSING_SENTINEL);
                }
            });
        }
    }
    tracing::debug!(?mode, radius_m = r, inspected = report.inspected, masked = report.masked, "inner boundary applied");
    Ok(report)
}
