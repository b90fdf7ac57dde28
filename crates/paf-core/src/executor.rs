//! Per-column interpreter. Walks a column's filtered stat order once,
//! resolving raw markers, short-circuiting on upstream failure, and
//! applying defaults so a stat with one never surfaces as `Err`.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::func::{ComputeInput, ComputeOutput, StatFunc};
use crate::raw::RawDataSource;
use crate::result::{ComputeError, RuntimeError, StatError, StatResult};
use crate::value::{SlotType, Value};

pub type Accumulator = IndexMap<String, StatResult>;

/// Runs every stat in `order` against one column, in order, and returns
/// the resolved accumulator plus any recorded failures.
pub fn run_column(order: &[Arc<StatFunc>], raw_source: &dyn RawDataSource, column: &str) -> (Accumulator, Vec<StatError>) {
    let mut acc: Accumulator = IndexMap::new();
    let mut errors: Vec<StatError> = Vec::new();

    for f in order {
        if f.v1_computed {
            let snapshot = snapshot_accumulator(&acc);
            match (f.compute)(&snapshot) {
                Ok(out) => record_success(f, out, &mut acc),
                Err(e) => record_compute_failure(f, RuntimeError::Compute(e), column, &snapshot, &mut acc, &mut errors),
            }
            continue;
        }

        match build_input(f, raw_source, &acc) {
            Ok(input) => match (f.compute)(&input) {
                Ok(out) => record_success(f, out, &mut acc),
                Err(e) => record_compute_failure(f, RuntimeError::Compute(e), column, &input, &mut acc, &mut errors),
            },
            Err((err, partial_input)) => record_upstream_failure(f, err, column, &partial_input, &mut acc, &mut errors),
        }
    }

    (acc, errors)
}

fn snapshot_accumulator(acc: &Accumulator) -> ComputeInput {
    acc.iter().map(|(k, v)| (k.clone(), v.clone().unwrap_or_else(|_| Value::null()))).collect()
}

/// Resolves every declared `requires` key into `input`, short-circuiting
/// with the first failure or missing slot encountered (declaration
/// order, matching the executor's single left-to-right pass).
fn build_input(
    f: &StatFunc,
    raw_source: &dyn RawDataSource,
    acc: &Accumulator,
) -> Result<ComputeInput, (RuntimeError, ComputeInput)> {
    let mut input = ComputeInput::new();
    for key in &f.requires {
        if let SlotType::Raw(marker) = &key.ty {
            match raw_source.resolve(*marker) {
                Some(v) => {
                    input.insert(key.name.clone(), v);
                }
                None => return Err((RuntimeError::MissingInput(key.name.clone()), input)),
            }
            continue;
        }
        match acc.get(&key.name) {
            Some(Ok(v)) => {
                input.insert(key.name.clone(), v.clone());
            }
            Some(Err(e)) => {
                let original: ComputeError = Arc::new(e.clone());
                let err = RuntimeError::Upstream {
                    stat_name: f.name.clone(),
                    failed_input: key.name.clone(),
                    original,
                };
                return Err((err, input));
            }
            None => return Err((RuntimeError::MissingInput(key.name.clone()), input)),
        }
    }
    Ok(input)
}

fn record_success(f: &Arc<StatFunc>, out: ComputeOutput, acc: &mut Accumulator) {
    match out {
        ComputeOutput::Single(v) => {
            if let Some(key) = f.provides.first() {
                acc.insert(key.name.clone(), Ok(v));
            }
        }
        ComputeOutput::Record(map) => {
            for (k, v) in map {
                acc.insert(k, Ok(v));
            }
        }
    }
}

/// `compute` itself threw. `default`, if present, absorbs the failure
/// per provided key; a `StatError` is only recorded when at least one
/// key was left without a default to fall back on.
fn record_compute_failure(
    f: &Arc<StatFunc>,
    err: RuntimeError,
    column: &str,
    inputs: &ComputeInput,
    acc: &mut Accumulator,
    errors: &mut Vec<StatError>,
) {
    let mut any_unresolved = false;
    for key in &f.provides {
        let resolved = match default_for_key(f, &key.name) {
            Some(d) => Ok(d),
            None => {
                any_unresolved = true;
                Err(err.clone())
            }
        };
        acc.insert(key.name.clone(), resolved);
    }
    if any_unresolved {
        errors.push(StatError {
            column: column.to_string(),
            stat_key: f.name.clone(),
            error: err,
            stat_func: f.clone(),
            inputs: inputs.clone(),
        });
    }
}

/// A required slot was never produced or itself failed, before `compute`
/// ever ran. `default` never applies here: every provided key resolves
/// to `Err` unconditionally and the failure is always recorded.
fn record_upstream_failure(
    f: &Arc<StatFunc>,
    err: RuntimeError,
    column: &str,
    inputs: &ComputeInput,
    acc: &mut Accumulator,
    errors: &mut Vec<StatError>,
) {
    for key in &f.provides {
        acc.insert(key.name.clone(), Err(err.clone()));
    }
    errors.push(StatError {
        column: column.to_string(),
        stat_key: f.name.clone(),
        error: err,
        stat_func: f.clone(),
        inputs: inputs.clone(),
    });
}

/// A single `default` may cover several `provides` keys at once when it's
/// a JSON object keyed by provided name; otherwise it applies verbatim to
/// a single-output stat.
fn default_for_key(f: &StatFunc, key_name: &str) -> Option<Value> {
    let default = f.default.as_ref()?;
    if f.provides.len() <= 1 {
        return Some(default.clone());
    }
    if let Value::Json(serde_json::Value::Object(map)) = default {
        return map.get(key_name).cloned().map(Value::Json);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::build_global_order;
    use crate::key::StatKey;
    use crate::value::RawMarker;
    use std::fmt;

    #[derive(Debug)]
    struct Boom;
    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }
    impl std::error::Error for Boom {}

    struct NoRaw;
    impl RawDataSource for NoRaw {
        fn resolve(&self, _marker: RawMarker) -> Option<Value> {
            None
        }
    }

    #[test]
    fn short_circuits_on_upstream_failure() {
        let failing = StatFunc::builder("failing")
            .provides(vec![StatKey::any("a")])
            .compute(|_| Err(Arc::new(Boom) as ComputeError))
            .build()
            .unwrap();
        let dependent = StatFunc::builder("dependent")
            .requires(vec![StatKey::any("a")])
            .provides(vec![StatKey::any("b")])
            .compute(|_| Ok(ComputeOutput::Single(Value::json(1))))
            .build()
            .unwrap();
        let order = build_global_order(vec![failing, dependent]).unwrap();
        let (acc, errors) = run_column(&order, &NoRaw, "col");
        assert!(acc["a"].is_err());
        assert!(acc["b"].is_err());
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[1].error, RuntimeError::Upstream { .. }));
    }

    #[test]
    fn default_absorbs_compute_failure() {
        let failing = StatFunc::builder("failing")
            .provides(vec![StatKey::any("a")])
            .default(Value::json(0))
            .compute(|_| Err(Arc::new(Boom) as ComputeError))
            .build()
            .unwrap();
        let order = build_global_order(vec![failing]).unwrap();
        let (acc, errors) = run_column(&order, &NoRaw, "col");
        assert_eq!(acc["a"].as_ref().unwrap().as_json().unwrap(), &serde_json::json!(0));
        assert!(errors.is_empty(), "a fully-defaulted compute failure is silently absorbed, not recorded");
    }

    #[test]
    fn upstream_failure_ignores_default() {
        let a = StatFunc::builder("a")
            .provides(vec![StatKey::any("a")])
            .compute(|_| Err(Arc::new(Boom) as ComputeError))
            .build()
            .unwrap();
        let b = StatFunc::builder("b")
            .requires(vec![StatKey::any("a")])
            .provides(vec![StatKey::any("b")])
            .default(Value::json(0))
            .compute(|_| Ok(ComputeOutput::Single(Value::json(1))))
            .build()
            .unwrap();
        let order = build_global_order(vec![a, b]).unwrap();
        let (acc, errors) = run_column(&order, &NoRaw, "col");
        assert!(acc["b"].is_err(), "default must not absorb an upstream failure");
        assert_eq!(errors.len(), 2);
    }
}
