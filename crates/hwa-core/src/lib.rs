//! hwa-core: shared foundation for the interpolation service.
//!
//! Contains:
//! - numeric (Real, tolerances, missing-value sentinel)
//! - units (uom SI types + constructors)
//! - table (header + rows, the shape every stage hands around)
//! - scratch (uniquely named temporary files with cleanup)
//! - timing (lightweight stage timers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod scratch;
pub mod table;
pub mod timing;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use scratch::{ScratchFile, ScratchSpace};
pub use table::{Row, Table};
pub use units::*;
