//! Demo binary: registers a handful of stats, builds a tiny in-memory
//! dataframe, and runs it through a `Pipeline`.

use indexmap::IndexMap;
use paf_core::func::ComputeOutput;
use paf_core::value::RawMarker;
use paf_core::{DType, DataSource, Pipeline, RawDataSource, StatFunc, StatKey, Value};
use paf_predicates::{is_numeric, is_string};

struct Column {
    dtype: DType,
    values: Vec<Value>,
}

struct DemoSource {
    columns: IndexMap<String, Column>,
}

struct DemoRaw {
    values: Vec<Value>,
}

impl RawDataSource for DemoRaw {
    fn resolve(&self, marker: RawMarker) -> Option<Value> {
        match marker {
            RawMarker::RawSeries | RawMarker::SampledSeries => Some(Value::raw(self.values.clone())),
            RawMarker::RawDataFrame => None,
        }
    }
}

impl DataSource for DemoSource {
    fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    fn dtype_of(&self, column: &str) -> DType {
        self.columns[column].dtype.clone()
    }

    fn raw_source(&self, column: &str) -> Box<dyn RawDataSource> {
        Box::new(DemoRaw { values: self.columns[column].values.clone() })
    }
}

fn len_stat() -> StatFunc {
    StatFunc::builder("len")
        .requires(vec![paf_core::func::raw_key(RawMarker::RawSeries)])
        .provides(vec![StatKey::any("len")])
        .compute(|input| {
            let series = input.get(RawMarker::RawSeries.slot_name()).and_then(|v| v.downcast_raw::<Vec<Value>>());
            Ok(ComputeOutput::Single(Value::json(series.map(|s| s.len()).unwrap_or(0))))
        })
        .build()
        .expect("len stat is well-formed")
}

fn mean_stat() -> StatFunc {
    StatFunc::builder("mean")
        .requires(vec![paf_core::func::raw_key(RawMarker::RawSeries)])
        .provides(vec![StatKey::any("mean")])
        .column_filter(is_numeric)
        .default(Value::json(0.0))
        .compute(|input| {
            let series = input
                .get(RawMarker::RawSeries.slot_name())
                .and_then(|v| v.downcast_raw::<Vec<Value>>())
                .cloned()
                .unwrap_or_default();
            let nums: Vec<f64> =
                series.iter().filter_map(|v| v.as_json()).filter_map(|v| v.as_f64()).collect();
            if nums.is_empty() {
                return Ok(ComputeOutput::Single(Value::json(0.0)));
            }
            let mean = nums.iter().sum::<f64>() / nums.len() as f64;
            Ok(ComputeOutput::Single(Value::json(mean)))
        })
        .build()
        .expect("mean stat is well-formed")
}

fn uppercased_stat() -> StatFunc {
    StatFunc::builder("uppercased")
        .requires(vec![paf_core::func::raw_key(RawMarker::RawSeries)])
        .provides(vec![StatKey::any("uppercased")])
        .column_filter(is_string)
        .compute(|input| {
            let series = input
                .get(RawMarker::RawSeries.slot_name())
                .and_then(|v| v.downcast_raw::<Vec<Value>>())
                .cloned()
                .unwrap_or_default();
            let upper: Vec<String> = series
                .iter()
                .filter_map(|v| v.as_json())
                .filter_map(|v| v.as_str())
                .map(|s| s.to_uppercase())
                .collect();
            Ok(ComputeOutput::Single(Value::json(upper)))
        })
        .build()
        .expect("uppercased stat is well-formed")
}

fn main() {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let mut columns = IndexMap::new();
    columns.insert(
        "age".to_string(),
        Column { dtype: DType::Int, values: vec![Value::json(30), Value::json(41), Value::json(25)] },
    );
    columns.insert(
        "city".to_string(),
        Column { dtype: DType::Str, values: vec![Value::json("berlin"), Value::json("lima")] },
    );
    let source = DemoSource { columns };

    let stats: Vec<StatFunc> = vec![len_stat(), mean_stat(), uppercased_stat()];
    let pipeline = Pipeline::new(stats.into_iter().map(Into::into).collect(), true).expect("valid stat registration");

    println!("smoke test passed: {}", pipeline.smoke_test_passed());
    for err in pipeline.smoke_test_errors() {
        log::warn!("smoke test error: {err}");
    }

    let (summary, errors) = pipeline.process_df(&source);
    for (column, row) in &summary {
        println!("{column}:");
        for (key, value) in row {
            println!("  {key} = {}", value.as_ref().map(Value::describe).unwrap_or_else(|| "null".to_string()));
        }
    }

    for err in paf_core::reporter::visible(&errors) {
        println!("error: {}", paf_core::reporter::reproduce(err));
    }

    println!("{}", pipeline.explain("mean").unwrap());
}
