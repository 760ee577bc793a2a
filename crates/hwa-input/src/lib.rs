//! hwa-input: sample point ingestion.
//!
//! Reads caller-supplied sample files (plain columnar text or VOTable) into a
//! [`PointSet`]: canonical X/Y/Z positions in meters plus the original tokens,
//! so the output stage can echo the caller's own time and position columns.

pub mod error;
pub mod format;
pub mod mesh;
pub mod plain;
pub mod point_set;
pub mod reader;
pub mod time;
pub mod votable;
pub mod writer;

pub use error::{InputError, InputResult};
pub use format::{InputFormat, detect_format};
pub use mesh::{BoundingBox, GridStructure, Plane, basic_cell_size, plane_mesh};
pub use point_set::{InputField, PointSet, SampleTime};
pub use reader::{PointSetReader, ReadOptions};
pub use time::parse_timestamp;
pub use writer::{canonical_text, positions_text};
