//! Value and type vocabulary shared by slots.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Advisory type for a [`crate::key::StatKey`].
///
/// Never consulted for slot identity, only for the type-compatibility
/// warning DAG construction logs when a provider and a consumer disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotType {
    Any,
    Int,
    Float,
    Bool,
    Str,
    Named(String),
    Raw(RawMarker),
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotType::Any => write!(f, "any"),
            SlotType::Int => write!(f, "int"),
            SlotType::Float => write!(f, "float"),
            SlotType::Bool => write!(f, "bool"),
            SlotType::Str => write!(f, "str"),
            SlotType::Named(n) => write!(f, "{n}"),
            SlotType::Raw(m) => write!(f, "{m}"),
        }
    }
}

/// The three raw-data markers a column's environment injects directly;
/// no `StatFunc` may produce one of these as output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawMarker {
    RawSeries,
    SampledSeries,
    RawDataFrame,
}

impl RawMarker {
    pub fn slot_name(self) -> &'static str {
        match self {
            RawMarker::RawSeries => "raw_series",
            RawMarker::SampledSeries => "sampled_series",
            RawMarker::RawDataFrame => "raw_dataframe",
        }
    }
}

impl fmt::Display for RawMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slot_name())
    }
}

/// A value flowing between slots.
///
/// `Json` covers everything the scheduler itself may need to introspect:
/// scalars, records, defaults, reproduction rendering. `Raw` is an erased
/// handle for caller-owned data (a series, a sampled series, a whole
/// dataframe) that PAF passes along without ever looking inside.
#[derive(Clone)]
pub enum Value {
    Json(serde_json::Value),
    Raw(Arc<dyn Any + Send + Sync>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Raw(a), Value::Raw(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    pub fn null() -> Self {
        Value::Json(serde_json::Value::Null)
    }

    pub fn json(v: impl Into<serde_json::Value>) -> Self {
        Value::Json(v.into())
    }

    pub fn raw<T: Any + Send + Sync>(v: T) -> Self {
        Value::Raw(Arc::new(v))
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            Value::Raw(_) => None,
        }
    }

    pub fn downcast_raw<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Value::Raw(v) => v.downcast_ref::<T>(),
            Value::Json(_) => None,
        }
    }

    /// Best-effort display used by the reporter when rendering
    /// reproduction text; raw handles render as a type placeholder since
    /// the scheduler has no way to serialize caller-owned data.
    pub fn describe(&self) -> String {
        match self {
            Value::Json(v) => v.to_string(),
            Value::Raw(_) => "<raw>".to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Json(v) => write!(f, "Value::Json({v})"),
            Value::Raw(_) => write!(f, "Value::Raw(<opaque>)"),
        }
    }
}

/// The caller-supplied opaque dtype tag a [`crate::func::ColumnFilter`]
/// matches against. Concrete dtypes belong to the DataFrame collaborator;
/// `Other` is the escape hatch for whatever vocabulary it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DType {
    Int,
    Float,
    Bool,
    Str,
    Temporal,
    Other(String),
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Int => write!(f, "int"),
            DType::Float => write!(f, "float"),
            DType::Bool => write!(f, "bool"),
            DType::Str => write!(f, "str"),
            DType::Temporal => write!(f, "temporal"),
            DType::Other(s) => write!(f, "{s}"),
        }
    }
}
