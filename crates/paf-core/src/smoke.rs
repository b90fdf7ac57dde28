//! The built-in smoke test run from `Pipeline::new`: a small bundled
//! data source exercising every dtype PAF knows about, including the
//! degenerate cases (empty, all-null) a real DataFrame collaborator
//! might hand us. Its own definition is original to this crate — the
//! reference implementation's equivalent fixture wasn't available to
//! crib from, only its name (`PERVERSE_DF`) and its role.

use indexmap::IndexMap;

use crate::raw::{DataSource, RawDataSource};
use crate::value::{DType, RawMarker, Value};

struct DegenerateColumn {
    dtype: DType,
    series: Vec<Value>,
}

struct DegenerateRaw {
    series: Vec<Value>,
}

impl RawDataSource for DegenerateRaw {
    fn resolve(&self, marker: RawMarker) -> Option<Value> {
        match marker {
            RawMarker::RawSeries | RawMarker::SampledSeries => {
                Some(Value::raw(self.series.clone()))
            }
            RawMarker::RawDataFrame => None,
        }
    }
}

/// Bundled fixture standing in for the reference implementation's
/// smoke-test dataframe: one column per dtype, plus an empty column and
/// an all-null column.
pub struct DegenerateDataSource {
    columns: IndexMap<String, DegenerateColumn>,
}

impl Default for DegenerateDataSource {
    fn default() -> Self {
        let mut columns = IndexMap::new();
        columns.insert(
            "ints".to_string(),
            DegenerateColumn { dtype: DType::Int, series: vec![Value::json(1), Value::json(2), Value::json(3)] },
        );
        columns.insert(
            "floats".to_string(),
            DegenerateColumn { dtype: DType::Float, series: vec![Value::json(1.5), Value::json(2.5)] },
        );
        columns.insert(
            "strings".to_string(),
            DegenerateColumn { dtype: DType::Str, series: vec![Value::json("a"), Value::json("b")] },
        );
        columns.insert(
            "bools".to_string(),
            DegenerateColumn { dtype: DType::Bool, series: vec![Value::json(true), Value::json(false)] },
        );
        columns.insert("empty".to_string(), DegenerateColumn { dtype: DType::Int, series: vec![] });
        columns.insert(
            "all_null".to_string(),
            DegenerateColumn {
                dtype: DType::Str,
                series: vec![Value::Json(serde_json::Value::Null), Value::Json(serde_json::Value::Null)],
            },
        );
        Self { columns }
    }
}

impl DataSource for DegenerateDataSource {
    fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    fn dtype_of(&self, column: &str) -> DType {
        self.columns.get(column).map(|c| c.dtype.clone()).unwrap_or(DType::Other("unknown".to_string()))
    }

    fn raw_source(&self, column: &str) -> Box<dyn RawDataSource> {
        let series = self.columns.get(column).map(|c| c.series.clone()).unwrap_or_default();
        Box::new(DegenerateRaw { series })
    }
}

/// Runs the degenerate fixture through `pipeline` and returns whatever
/// errors surfaced. An empty vec means the smoke test passed; a non-empty
/// one is logged by `Pipeline::new` but never prevents construction.
pub fn run(pipeline: &crate::pipeline::Pipeline) -> Vec<crate::result::StatError> {
    let source = DegenerateDataSource::default();
    let (_, errors) = pipeline.process_df(&source);
    errors
}
