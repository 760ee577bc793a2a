//! hwa-engine: adapters around the external interpolation tools.
//!
//! - [`InterpolationInvoker`]: runs the interpolation engine, parses its
//!   header-driven output
//! - [`TemporalRunSelector`]: nearest-snapshot selection for time-varying runs
//! - [`boundary`]: inner-boundary masking
//! - [`FieldLineTracer`]: runs the field-line tracer
//!
//! Every external call is a blocking subprocess; nothing here runs concurrently.

pub mod boundary;
pub mod error;
pub mod invoker;
pub mod temporal;
pub mod tracer;

pub use boundary::{MaskMode, MaskReport, mask_boundary};
pub use error::{EngineError, EngineResult};
pub use invoker::{
    EngineRequest, InterpolationInvoker, InterpolationMethod, Interpolator, parse_engine_output,
};
pub use temporal::{
    DirectorySnapshots, RunTimeEntry, RunTimeIndex, SnapshotResolver, TemporalRunSelector,
};
pub use tracer::{FieldLineTracer, TraceDirection, TraceRequest, TracedField};
