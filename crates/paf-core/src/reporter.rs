//! Human-readable rendering of recorded failures.

use crate::result::StatError;

/// Drops `quiet` stats from a list of recorded errors. Default renderers
/// should call this rather than iterate `StatError`s directly; `quiet`
/// stats are still recorded (and still reachable for programmatic
/// inspection), they're just not meant to be shown to a human by default.
pub fn visible(errors: &[StatError]) -> Vec<&StatError> {
    errors.iter().filter(|e| !e.stat_func.quiet).collect()
}

/// Renders a reproduction of one failure: the call that failed, its
/// inputs as literals where they can be, and the original error.
pub fn reproduce(err: &StatError) -> String {
    let args: Vec<String> = err.inputs.iter().map(|(name, value)| format!("{name}={}", value.describe())).collect();
    format!(
        "{stat}[column={col:?}]({args}) failed: {cause}",
        stat = err.stat_key,
        col = err.column,
        args = args.join(", "),
        cause = err.error,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::func::StatFunc;
    use crate::key::StatKey;
    use crate::result::RuntimeError;
    use crate::value::Value;
    use indexmap::IndexMap;
    use std::sync::Arc;

    #[test]
    fn visible_drops_quiet_stats() {
        let loud = Arc::new(
            StatFunc::builder("loud")
                .provides(vec![StatKey::any("x")])
                .compute(|_| Ok(crate::func::ComputeOutput::Single(Value::null())))
                .build()
                .unwrap(),
        );
        let quiet = Arc::new(
            StatFunc::builder("quiet")
                .provides(vec![StatKey::any("y")])
                .quiet(true)
                .compute(|_| Ok(crate::func::ComputeOutput::Single(Value::null())))
                .build()
                .unwrap(),
        );
        let errors = vec![
            StatError {
                column: "c".into(),
                stat_key: "loud".into(),
                error: RuntimeError::MissingInput("x".into()),
                stat_func: loud,
                inputs: IndexMap::new(),
            },
            StatError {
                column: "c".into(),
                stat_key: "quiet".into(),
                error: RuntimeError::MissingInput("y".into()),
                stat_func: quiet,
                inputs: IndexMap::new(),
            },
        ];
        let shown = visible(&errors);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].stat_key, "loud");
    }

    #[test]
    fn reproduce_includes_stat_and_column() {
        let func = Arc::new(
            StatFunc::builder("mean")
                .provides(vec![StatKey::any("mean")])
                .compute(|_| Ok(crate::func::ComputeOutput::Single(Value::null())))
                .build()
                .unwrap(),
        );
        let mut inputs = IndexMap::new();
        inputs.insert("values".to_string(), Value::json(serde_json::json!([1, 2, 3])));
        let err = StatError {
            column: "age".into(),
            stat_key: "mean".into(),
            error: RuntimeError::MissingInput("values".into()),
            stat_func: func,
            inputs,
        };
        let text = reproduce(&err);
        assert!(text.contains("mean"));
        assert!(text.contains("age"));
    }
}
