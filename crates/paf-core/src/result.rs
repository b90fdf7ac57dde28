//! The Ok/Err union threaded through the accumulator, and the error
//! shapes the executor and reporter build on top of it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::func::StatFunc;
use crate::value::Value;

/// A cheaply-cloneable, type-erased compute failure.
///
/// `StatFunc::compute` closures are `Arc<dyn Fn>` and may be shared across
/// columns run in parallel, so their errors must be `Send + Sync + Clone`
/// to travel with a `StatError` into the reporter without forcing the
/// compute signature to commit to one concrete error type.
pub type ComputeError = Arc<dyn std::error::Error + Send + Sync>;

/// Runtime failure of a single stat invocation. Never fatal to the
/// pipeline: it is recorded and, where a `default` exists, papered over.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("compute failed: {0}")]
    Compute(ComputeError),

    /// `failed_input` names the upstream slot whose own failure forced
    /// this stat to short-circuit before `compute` ever ran. `original`
    /// is kept for reproduction rendering rather than wired through
    /// `Error::source` — it's a type-erased `Arc`, not a concrete type
    /// std's blanket `Error` impls cover.
    #[error("upstream '{failed_input}' required by '{stat_name}' failed: {original}")]
    Upstream { stat_name: String, failed_input: String, original: ComputeError },

    #[error("required input '{0}' was never produced")]
    MissingInput(String),
}

/// Per-stat result stored in the accumulator.
pub type StatResult = Result<Value, RuntimeError>;

/// A recorded failure, carrying enough context to explain and reproduce
/// it without re-running the pipeline.
#[derive(Clone)]
pub struct StatError {
    pub column: String,
    pub stat_key: String,
    pub error: RuntimeError,
    pub stat_func: Arc<StatFunc>,
    pub inputs: IndexMap<String, Value>,
}

impl fmt::Debug for StatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatError")
            .field("column", &self.column)
            .field("stat_key", &self.stat_key)
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for StatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.stat_key, self.column, self.error)
    }
}
