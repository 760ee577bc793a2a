//! Snapshot selection for time-varying simulation runs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, DurationRound, Utc};
use hwa_core::timing::{AccumulatingTimer, Timer};
use hwa_core::{MISSING_SENTINEL, Real, ScratchSpace, Table};
use hwa_input::positions_text;

use crate::{EngineError, EngineRequest, EngineResult, InterpolationMethod, Interpolator};

const SNAPSHOT_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTimeEntry {
    pub time: DateTime<Utc>,
    pub snapshot_id: String,
}

impl RunTimeEntry {
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            time,
            snapshot_id: time.format(SNAPSHOT_ID_FORMAT).to_string(),
        }
    }
}

/// Strictly increasing snapshot times of one dynamical run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTimeIndex {
    entries: Vec<RunTimeEntry>,
}

impl RunTimeIndex {
    pub fn new(entries: Vec<RunTimeEntry>) -> EngineResult<Self> {
        if entries.is_empty() {
            return Err(EngineError::TimeIndex {
                message: "no snapshot times".into(),
            });
        }
        if let Some(pair) = entries.windows(2).find(|w| w[0].time >= w[1].time) {
            return Err(EngineError::TimeIndex {
                message: format!(
                    "times not strictly increasing at {} -> {}",
                    pair[0].snapshot_id, pair[1].snapshot_id
                ),
            });
        }
        Ok(Self { entries })
    }

    /// One unix timestamp (seconds) per line; `#` lines are ignored.
    pub fn from_unix_seconds(text: &str) -> EngineResult<Self> {
        let mut entries = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let secs: i64 = line.parse().map_err(|_| EngineError::TimeIndex {
                message: format!("line {}: not a unix timestamp: '{line}'", n + 1),
            })?;
            let time = DateTime::from_timestamp(secs, 0).ok_or_else(|| EngineError::TimeIndex {
                message: format!("line {}: timestamp out of range: {secs}", n + 1),
            })?;
            entries.push(RunTimeEntry::at(time));
        }
        Self::new(entries)
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_unix_seconds(&text)
    }

    pub fn entries(&self) -> &[RunTimeEntry] {
        &self.entries
    }

    pub fn first(&self) -> &RunTimeEntry {
        &self.entries[0]
    }

    pub fn last(&self) -> &RunTimeEntry {
        &self.entries[self.entries.len() - 1]
    }

    pub fn covers(&self, t: DateTime<Utc>) -> bool {
        self.first().time <= t && t <= self.last().time
    }

    /// Index of the snapshot nearest to `t`, or `None` outside coverage.
    ///
    /// `cursor` carries the scan position between calls so a time-ordered
    /// input is walked once. An equidistant sample takes the later snapshot.
    pub fn nearest_from(&self, t: DateTime<Utc>, cursor: &mut usize) -> Option<usize> {
        if !self.covers(t) {
            return None;
        }
        let entries = &self.entries;
        if *cursor >= entries.len() || (*cursor > 0 && entries[*cursor - 1].time > t) {
            *cursor = entries.partition_point(|e| e.time < t);
        }
        while entries[*cursor].time < t {
            *cursor += 1;
        }
        let next = *cursor;
        if next == 0 {
            return Some(0);
        }
        let prev = next - 1;
        let dt_prev = t - entries[prev].time;
        let dt_next = entries[next].time - t;
        Some(if dt_prev < dt_next { prev } else { next })
    }

    pub fn nearest(&self, t: DateTime<Utc>) -> Option<usize> {
        self.nearest_from(t, &mut 0)
    }
}

/// Maps a snapshot id to the snapshot file on disk.
pub trait SnapshotResolver {
    fn resolve(&self, snapshot_id: &str) -> EngineResult<PathBuf>;
}

/// Snapshots laid out as `<root>/<YYYYMMDD>/mstate<YYYYMMDD_HHMMSS>.hc`.
#[derive(Debug, Clone)]
pub struct DirectorySnapshots {
    root: PathBuf,
}

impl DirectorySnapshots {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, snapshot_id: &str) -> PathBuf {
        let day = snapshot_id.get(..8).unwrap_or(snapshot_id);
        self.root.join(day).join(format!("mstate{snapshot_id}.hc"))
    }

    /// Snapshot within three minutes of `time` (seconds dropped), trying
    /// 0, +1, -1, +2, -2, +3, -3 minutes in that order.
    pub fn locate_near(&self, time: DateTime<Utc>) -> EngineResult<PathBuf> {
        let base = time
            .duration_trunc(Duration::minutes(1))
            .map_err(|e| EngineError::TimeIndex {
                message: format!("cannot truncate {time}: {e}"),
            })?;
        for offset in [0, 1, -1, 2, -2, 3, -3] {
            let candidate = base + Duration::minutes(offset);
            let path = self.path_for(&candidate.format(SNAPSHOT_ID_FORMAT).to_string());
            if path.is_file() {
                return Ok(path);
            }
        }
        Err(EngineError::SnapshotNotFound {
            id: time.format(SNAPSHOT_ID_FORMAT).to_string(),
        })
    }
}

impl SnapshotResolver for DirectorySnapshots {
    fn resolve(&self, snapshot_id: &str) -> EngineResult<PathBuf> {
        let path = self.path_for(snapshot_id);
        if path.is_file() {
            Ok(path)
        } else {
            Err(EngineError::SnapshotNotFound {
                id: snapshot_id.to_string(),
            })
        }
    }
}

/// Interpolates each sample against the snapshot nearest to its time.
///
/// One engine call per in-coverage sample; samples outside the run's time
/// span get a sentinel row without touching the engine. Any engine failure
/// aborts the whole run.
pub struct TemporalRunSelector<'a> {
    engine: &'a dyn Interpolator,
    index: &'a RunTimeIndex,
    snapshots: &'a dyn SnapshotResolver,
    scratch: &'a ScratchSpace,
}

impl<'a> TemporalRunSelector<'a> {
    pub fn new(
        engine: &'a dyn Interpolator,
        index: &'a RunTimeIndex,
        snapshots: &'a dyn SnapshotResolver,
        scratch: &'a ScratchSpace,
    ) -> Self {
        Self {
            engine,
            index,
            snapshots,
            scratch,
        }
    }

    pub fn run(
        &self,
        times: &[DateTime<Utc>],
        positions: &[[Real; 3]],
        symbols: &[String],
        method: InterpolationMethod,
    ) -> EngineResult<Table> {
        if times.len() != positions.len() {
            return Err(EngineError::malformed(format!(
                "{} sample times for {} positions",
                times.len(),
                positions.len()
            )));
        }

        let sample_file = self.scratch.file("sample", "txt");
        let mut header: Option<Vec<String>> = None;
        let mut rows: Vec<Vec<Real>> = Vec::with_capacity(positions.len());
        let mut cursor = 0usize;
        let mut engine_time = AccumulatingTimer::new();
        let mut gaps = 0usize;

        for (t, position) in times.iter().zip(positions) {
            let Some(nearest) = self.index.nearest_from(*t, &mut cursor) else {
                gaps += 1;
                let mut row = position.to_vec();
                row.extend(std::iter::repeat_n(MISSING_SENTINEL, symbols.len()));
                rows.push(row);
                continue;
            };

            let entry = &self.index.entries()[nearest];
            let snapshot = self.snapshots.resolve(&entry.snapshot_id)?;
            tracing::debug!(sample_time = %t, snapshot = %entry.snapshot_id, "nearest snapshot");

            sample_file.write(&positions_text(std::slice::from_ref(position)))?;
            let timer = Timer::start("single-sample interpolation");
            let result = self.engine.interpolate(&EngineRequest {
                sample_file: sample_file.path(),
                snapshot: &snapshot,
                symbols,
                method,
            })?;
            engine_time.record(timer.elapsed_s());

            let mut data = result.data_rows();
            let (Some(row), None) = (data.next(), data.next()) else {
                return Err(EngineError::malformed(format!(
                    "expected one row for a single sample, got {}",
                    result.data_len()
                )));
            };
            match &header {
                None => header = Some(result.columns().to_vec()),
                Some(h) if h.len() != result.width() => {
                    return Err(EngineError::malformed(format!(
                        "snapshot {} reports {} columns, run header has {}",
                        entry.snapshot_id,
                        result.width(),
                        h.len()
                    )));
                }
                Some(_) => {}
            }
            rows.push(row.to_vec());
        }

        let columns = header.unwrap_or_else(|| {
            ["x", "y", "z"]
                .into_iter()
                .map(str::to_string)
                .chain(symbols.iter().cloned())
                .collect()
        });
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row)?;
        }

        tracing::info!(
            samples = positions.len(),
            engine_calls = engine_time.count(),
            coverage_gaps = gaps,
            engine_s = engine_time.total_seconds(),
            "dynamic interpolation finished"
        );
        Ok(table)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn nearest_is_never_farther_than_any_other(
            gaps in prop::collection::vec(1_i64..1000, 1..20),
            query in 0_i64..20_000,
        ) {
            let mut acc = 0;
            let entries: Vec<RunTimeEntry> = std::iter::once(0)
                .chain(gaps.iter().map(|g| { acc += g; acc }))
                .map(|s| RunTimeEntry::at(Utc.timestamp_opt(s, 0).unwrap()))
                .collect();
            let idx = RunTimeIndex::new(entries).unwrap();
            let t = Utc.timestamp_opt(query, 0).unwrap();
            match idx.nearest(t) {
                None => prop_assert!(!idx.covers(t)),
                Some(i) => {
                    let best = (idx.entries()[i].time - t).num_seconds().abs();
                    for e in idx.entries() {
                        prop_assert!(best <= (e.time - t).num_seconds().abs());
                    }
                }
            }
        }
    }
}
