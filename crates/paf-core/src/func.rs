//! `StatFunc`: the immutable unit of scheduling.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::key::StatKey;
pub use crate::result::ComputeError;
use crate::value::{DType, RawMarker, Value};

/// Input record handed to a `compute` closure: one entry per declared
/// `requires`, already resolved to a value (raw markers resolved by the
/// executor from the column's `RawDataSource`).
pub type ComputeInput = IndexMap<String, Value>;

/// What a `compute` closure may hand back. Most stats provide exactly one
/// key and use `Single`; stats that provide several keys at once (a
/// `StatFunc` with `provides.len() > 1`) use `Record`.
#[derive(Debug, Clone)]
pub enum ComputeOutput {
    Single(Value),
    Record(IndexMap<String, Value>),
}

pub type ComputeResult = Result<ComputeOutput, ComputeError>;

/// `Arc` rather than `Box` so a `StatFunc` registered once can be shared
/// across columns processed concurrently by `rayon`.
pub type ComputeFn = Arc<dyn Fn(&ComputeInput) -> ComputeResult + Send + Sync>;

/// Predicate deciding whether a `StatFunc` applies to a given column's
/// dtype. Boxed as a closure rather than a trait object hierarchy because
/// `paf-predicates` composes filters with ordinary function combinators
/// (`any_of`, `not_`) rather than a vtable.
pub type ColumnFilter = Arc<dyn Fn(&DType) -> bool + Send + Sync>;

/// Errors raised by [`StatFuncBuilder::build`]. Configuration errors, not
/// runtime ones — they mean the `StatFunc` itself is malformed, never that
/// a particular column failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidStatFuncError {
    #[error("stat '{0}' must provide at least one key")]
    EmptyProvides(String),
    #[error("stat '{0}' declares '{1}' as a provided key, but raw markers can only be injected, never produced")]
    ProvidesRawMarker(String, String),
    #[error("stat '{0}' has no compute function")]
    MissingCompute(String),
}

/// Immutable metadata plus behavior for one stat. Construct with
/// [`StatFunc::builder`]; there is no public way to build one with an
/// empty `provides` list or one that claims to produce a raw marker.
pub struct StatFunc {
    pub name: String,
    pub compute: ComputeFn,
    pub requires: Vec<StatKey>,
    pub provides: Vec<StatKey>,
    pub column_filter: Option<ColumnFilter>,
    pub quiet: bool,
    pub default: Option<Value>,
    /// Set only by `paf-legacy` for the synthesized "computed phase"
    /// stat, which receives the full accumulator snapshot instead of a
    /// requires-filtered input record. See `paf-core::executor`.
    pub v1_computed: bool,
}

impl Clone for StatFunc {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            compute: self.compute.clone(),
            requires: self.requires.clone(),
            provides: self.provides.clone(),
            column_filter: self.column_filter.clone(),
            quiet: self.quiet,
            default: self.default.clone(),
            v1_computed: self.v1_computed,
        }
    }
}

impl fmt::Debug for StatFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatFunc")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("provides", &self.provides)
            .field("quiet", &self.quiet)
            .field("v1_computed", &self.v1_computed)
            .finish()
    }
}

impl StatFunc {
    pub fn builder(name: impl Into<String>) -> StatFuncBuilder {
        StatFuncBuilder::new(name)
    }

    /// True if any declared `requires` key names a raw marker slot.
    pub fn needs_raw(&self) -> bool {
        self.requires.iter().any(|k| matches!(k.ty, crate::value::SlotType::Raw(_)))
    }

    pub(crate) fn provides_raw_marker(&self) -> Option<&StatKey> {
        self.provides.iter().find(|k| matches!(k.ty, crate::value::SlotType::Raw(_)))
    }
}

/// Builder for [`StatFunc`]. Rust has no runtime signature reflection, so
/// unlike the `@stat` decorator this mirrors, every field is set
/// explicitly rather than inferred from a function's parameter names.
pub struct StatFuncBuilder {
    name: String,
    compute: Option<ComputeFn>,
    requires: Vec<StatKey>,
    provides: Vec<StatKey>,
    column_filter: Option<ColumnFilter>,
    quiet: bool,
    default: Option<Value>,
    v1_computed: bool,
}

impl StatFuncBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            compute: None,
            requires: Vec::new(),
            provides: Vec::new(),
            column_filter: None,
            quiet: false,
            default: None,
            v1_computed: false,
        }
    }

    pub fn requires(mut self, keys: impl IntoIterator<Item = StatKey>) -> Self {
        self.requires.extend(keys);
        self
    }

    pub fn provides(mut self, keys: impl IntoIterator<Item = StatKey>) -> Self {
        self.provides.extend(keys);
        self
    }

    pub fn compute<F>(mut self, f: F) -> Self
        where F: Fn(&ComputeInput) -> ComputeResult + Send + Sync + 'static
    {
        self.compute = Some(Arc::new(f));
        self
    }

    pub fn column_filter<F>(mut self, f: F) -> Self
        where F: Fn(&DType) -> bool + Send + Sync + 'static
    {
        self.column_filter = Some(Arc::new(f));
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Marks this stat as a legacy "computed phase": the executor hands
    /// it the full accumulator snapshot instead of a requires-filtered
    /// input record. Reserved for `paf-legacy`'s adapter; ordinary stats
    /// should never need it.
    pub fn v1_computed(mut self, v: bool) -> Self {
        self.v1_computed = v;
        self
    }

    pub fn build(self) -> Result<StatFunc, InvalidStatFuncError> {
        if self.provides.is_empty() {
            return Err(InvalidStatFuncError::EmptyProvides(self.name));
        }
        let compute = self.compute.ok_or_else(|| InvalidStatFuncError::MissingCompute(self.name.clone()))?;
        let func = StatFunc {
            name: self.name,
            compute,
            requires: self.requires,
            provides: self.provides,
            column_filter: self.column_filter,
            quiet: self.quiet,
            default: self.default,
            v1_computed: self.v1_computed,
        };
        if let Some(bad) = func.provides_raw_marker() {
            return Err(InvalidStatFuncError::ProvidesRawMarker(func.name.clone(), bad.name.clone()));
        }
        Ok(func)
    }
}

/// Convenience constructor for the three raw-data slot keys a
/// `RawDataSource` injects directly.
pub fn raw_key(marker: RawMarker) -> StatKey {
    StatKey::new(marker.slot_name(), crate::value::SlotType::Raw(marker))
}
