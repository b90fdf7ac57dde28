//! The façade PAF exposes to callers: register stats, run a DataFrame
//! through them, and inspect or extend the registration afterwards.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::column_dag::build_column_order;
use crate::dag::build_global_order;
use crate::errors::{DAGConfigError, PipelineError};
use crate::executor::run_column;
use crate::func::{ComputeOutput, StatFunc};
use crate::raw::{DataSource, RawDataSource};
use crate::result::{RuntimeError, StatError, StatResult};
use crate::value::{DType, Value};

/// One column's resolved values, keyed by slot name.
pub type ColumnSummary = IndexMap<String, Option<Value>>;
/// The whole-dataframe result: column name -> its `ColumnSummary`.
pub type Summary = IndexMap<String, ColumnSummary>;

/// Anything that normalizes to a list of `StatFunc`s at registration
/// time: a single stat, a bundle of them (as a legacy adapter or a
/// related group of stats might produce), or any caller type exposing
/// `IntoStatFuncs`.
pub enum PipelineInput {
    Func(StatFunc),
    Many(Vec<StatFunc>),
}

impl From<StatFunc> for PipelineInput {
    fn from(f: StatFunc) -> Self {
        PipelineInput::Func(f)
    }
}

impl From<Vec<StatFunc>> for PipelineInput {
    fn from(v: Vec<StatFunc>) -> Self {
        PipelineInput::Many(v)
    }
}

impl PipelineInput {
    fn into_funcs(self) -> Vec<StatFunc> {
        match self {
            PipelineInput::Func(f) => vec![f],
            PipelineInput::Many(v) => v,
        }
    }
}

/// Anything that can hand back a list of `StatFunc`s without being one
/// itself — the trait a legacy adapter's output, or any grouped stat
/// bundle, implements to plug into `Pipeline::new`/`add_stat`.
pub trait IntoStatFuncs {
    fn into_stat_funcs(self) -> Vec<StatFunc>;
}

pub struct Pipeline {
    order: Vec<Arc<StatFunc>>,
    run_unit_test: bool,
    smoke_errors: Vec<StatError>,
}

impl Pipeline {
    /// Builds the global schedule from `inputs` and, unless
    /// `run_unit_test` is false, immediately runs the bundled smoke test
    /// (see `paf_core::smoke`). A failing smoke test is logged, never
    /// fatal — only a `DAGConfigError` (duplicate/missing provider,
    /// cycle) stops construction.
    pub fn new(inputs: Vec<PipelineInput>, run_unit_test: bool) -> Result<Pipeline, DAGConfigError> {
        let funcs: Vec<StatFunc> = inputs.into_iter().flat_map(PipelineInput::into_funcs).collect();
        let order = build_global_order(funcs)?;
        let mut pipeline = Pipeline { order, run_unit_test, smoke_errors: Vec::new() };
        pipeline.run_smoke_test();
        Ok(pipeline)
    }

    fn run_smoke_test(&mut self) {
        if !self.run_unit_test {
            return;
        }
        let errors = crate::smoke::run(self);
        if !errors.is_empty() {
            log::warn!("pipeline smoke test recorded {} error(s)", errors.len());
        }
        self.smoke_errors = errors;
    }

    pub fn smoke_test_passed(&self) -> bool {
        self.run_unit_test && self.smoke_errors.is_empty()
    }

    pub fn smoke_test_errors(&self) -> &[StatError] {
        &self.smoke_errors
    }

    /// Runs every registered stat over every column `source` exposes.
    /// Columns are processed with `rayon`; there is no ordering
    /// guarantee across columns, but each column's row lands at its own
    /// key in the returned `Summary` regardless of completion order.
    pub fn process_df(&self, source: &dyn DataSource) -> (Summary, Vec<StatError>) {
        let columns = source.column_names();
        let rows: Vec<(String, ColumnSummary, Vec<StatError>)> = columns
            .par_iter()
            .map(|name| {
                let dtype = source.dtype_of(name);
                let raw = source.raw_source(name);
                let (mut row, errors) = self.process_column(name, &dtype, raw.as_ref());
                row.insert("orig_col_name".to_string(), Some(Value::json(name.clone())));
                row.insert("rewritten_col_name".to_string(), Some(Value::json(source.rewritten_name(name))));
                (name.clone(), row, errors)
            })
            .collect();

        let mut summary = Summary::new();
        let mut all_errors = Vec::new();
        for (name, row, mut errors) in rows {
            summary.insert(name, row);
            all_errors.append(&mut errors);
        }
        (summary, all_errors)
    }

    /// Runs the subset of registered stats applicable to `dtype` against
    /// one column's raw data.
    pub fn process_column(&self, name: &str, dtype: &DType, raw: &dyn RawDataSource) -> (ColumnSummary, Vec<StatError>) {
        let order = build_column_order(&self.order, dtype);
        let (acc, errors) = run_column(&order, raw, name);
        let row: ColumnSummary = acc.into_iter().map(|(k, v)| (k, v.ok())).collect();
        (row, errors)
    }

    /// Registers or replaces (by name) the stats in `input`, rebuilding
    /// the global schedule and re-running the smoke test. The returned
    /// `bool` is true iff an existing stat was replaced rather than
    /// purely added. Must be externally serialized by the caller — the
    /// `&mut self` receiver is what makes a concurrent call a compile
    /// error rather than a data race.
    pub fn add_stat(&mut self, input: PipelineInput) -> Result<(bool, Vec<StatError>), DAGConfigError> {
        let new_funcs = input.into_funcs();
        let new_names: HashSet<String> = new_funcs.iter().map(|f| f.name.clone()).collect();

        let mut replaced = false;
        let mut funcs: Vec<StatFunc> = self
            .order
            .iter()
            .filter_map(|f| {
                if new_names.contains(&f.name) {
                    replaced = true;
                    None
                } else {
                    Some(f.as_ref().clone())
                }
            })
            .collect();
        funcs.extend(new_funcs);

        let order = build_global_order(funcs)?;
        self.order = order;
        self.run_smoke_test();
        Ok((replaced, self.smoke_errors.clone()))
    }

    /// Invokes one stat's `compute` directly against caller-supplied
    /// inputs, bypassing the scheduler entirely. Useful for unit-testing
    /// a stat in isolation.
    pub fn test_stat(&self, name: &str, inputs: IndexMap<String, Value>) -> Result<StatResult, PipelineError> {
        let f = self.find(name)?;
        Ok(match (f.compute)(&inputs) {
            Ok(ComputeOutput::Single(v)) => Ok(v),
            Ok(ComputeOutput::Record(map)) => {
                let obj: serde_json::Map<String, serde_json::Value> = map
                    .into_iter()
                    .filter_map(|(k, v)| v.as_json().cloned().map(|j| (k, j)))
                    .collect();
                Ok(Value::Json(serde_json::Value::Object(obj)))
            }
            Err(e) => Err(RuntimeError::Compute(e)),
        })
    }

    /// A short human-readable description of one registered stat: its
    /// name, requires, provides, and quiet/default flags.
    pub fn explain(&self, name: &str) -> Result<String, PipelineError> {
        let f = self.find(name)?;
        let requires: Vec<&str> = f.requires.iter().map(|k| k.name.as_str()).collect();
        let provides: Vec<&str> = f.provides.iter().map(|k| k.name.as_str()).collect();
        Ok(format!(
            "{name} requires [{req}] provides [{prov}]{quiet}{default}",
            name = f.name,
            req = requires.join(", "),
            prov = provides.join(", "),
            quiet = if f.quiet { " quiet" } else { "" },
            default = if f.default.is_some() { " has-default" } else { "" },
        ))
    }

    fn find(&self, name: &str) -> Result<&Arc<StatFunc>, PipelineError> {
        self.order.iter().find(|f| f.name == name).ok_or_else(|| PipelineError::UnknownStat(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::StatKey;
    use crate::smoke::DegenerateDataSource;

    fn len_stat() -> StatFunc {
        StatFunc::builder("len")
            .requires(vec![crate::func::raw_key(crate::value::RawMarker::RawSeries)])
            .provides(vec![StatKey::any("len")])
            .compute(|input| {
                let series = input.get("raw_series").and_then(|v| v.downcast_raw::<Vec<Value>>());
                Ok(ComputeOutput::Single(Value::json(series.map(|s| s.len()).unwrap_or(0))))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn process_df_populates_rewritten_names() {
        let pipeline = Pipeline::new(vec![len_stat().into()], false).unwrap();
        let source = DegenerateDataSource::default();
        let (summary, _errors) = pipeline.process_df(&source);
        let row = &summary["ints"];
        assert_eq!(row["orig_col_name"], Some(Value::json("ints")));
        assert_eq!(row["rewritten_col_name"], Some(Value::json("ints")));
    }

    #[test]
    fn add_stat_replaces_by_name() {
        let mut pipeline = Pipeline::new(vec![len_stat().into()], false).unwrap();
        let replacement = StatFunc::builder("len")
            .requires(vec![crate::func::raw_key(crate::value::RawMarker::RawSeries)])
            .provides(vec![StatKey::any("len")])
            .compute(|_| Ok(ComputeOutput::Single(Value::json(-1))))
            .build()
            .unwrap();
        let (replaced, _errors) = pipeline.add_stat(replacement.into()).unwrap();
        assert!(replaced);
        let source = DegenerateDataSource::default();
        let (summary, _) = pipeline.process_df(&source);
        assert_eq!(summary["ints"]["len"], Some(Value::json(-1)));
    }

    #[test]
    fn explain_describes_a_stat() {
        let pipeline = Pipeline::new(vec![len_stat().into()], false).unwrap();
        let text = pipeline.explain("len").unwrap();
        assert!(text.contains("len"));
        assert!(text.contains("raw_series"));
    }

    #[test]
    fn unknown_stat_is_an_error() {
        let pipeline = Pipeline::new(vec![len_stat().into()], false).unwrap();
        assert!(matches!(pipeline.explain("ghost"), Err(PipelineError::UnknownStat(_))));
    }
}
