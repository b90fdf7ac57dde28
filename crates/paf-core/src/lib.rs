//! `paf-core`: a typed, dependency-ordered execution engine for
//! computing per-column statistics over tabular data.
//!
//! A caller registers [`StatFunc`]s declaring what they require and
//! provide, hands them to [`Pipeline::new`], and gets back a schedule
//! that's validated once (duplicate/missing providers, cycles) and then
//! replayed per column, filtered to whatever that column's dtype can
//! satisfy. Concrete statistics, the DataFrame abstraction, and display
//! are the caller's concern; this crate only orders and runs.
//!
//! Module map:
//! - [`key`] / [`value`] / [`func`] — the data model (slot identity,
//!   value vocabulary, stat metadata).
//! - [`dag`] — global schedule construction.
//! - [`column_dag`] — per-column filtering and cascade removal.
//! - [`raw`] — the traits a DataFrame collaborator implements.
//! - [`executor`] — the per-column interpreter.
//! - [`result`] — the Ok/Err union and recorded-failure shape.
//! - [`reporter`] — reproduction text and quiet-stat filtering.
//! - [`pipeline`] — the public façade.
//! - [`smoke`] — the bundled construction-time smoke test.

pub mod column_dag;
pub mod dag;
pub mod errors;
pub mod executor;
pub mod func;
pub mod key;
pub mod pipeline;
pub mod raw;
pub mod reporter;
pub mod result;
pub mod smoke;
pub mod value;

pub use errors::{DAGConfigError, PipelineError};
pub use func::{ColumnFilter, ComputeInput, ComputeOutput, ComputeResult, StatFunc, StatFuncBuilder};
pub use key::StatKey;
pub use pipeline::{ColumnSummary, IntoStatFuncs, Pipeline, PipelineInput, Summary};
pub use raw::{DataSource, RawDataSource};
pub use result::{RuntimeError, StatError, StatResult};
pub use value::{DType, RawMarker, SlotType, Value};
