//! Per-column filtering: column-type predicates plus cascade removal of
//! anything left with an unsatisfiable dependency. Never an error —
//! an unsatisfiable subgraph for this column's dtype is simply dropped.

use std::collections::HashSet;
use std::sync::Arc;

use crate::func::StatFunc;
use crate::value::{DType, SlotType};

/// Filters `global_order` down to the stats applicable to `dtype`,
/// already in execution order since filtering a topologically sorted
/// list in place preserves the order of what remains.
pub fn build_column_order(global_order: &[Arc<StatFunc>], dtype: &DType) -> Vec<Arc<StatFunc>> {
    let mut candidates: Vec<Arc<StatFunc>> = global_order
        .iter()
        .filter(|f| f.column_filter.as_ref().map(|p| p(dtype)).unwrap_or(true))
        .cloned()
        .collect();

    loop {
        let provided: HashSet<&str> =
            candidates.iter().flat_map(|f| f.provides.iter().map(|k| k.name.as_str())).collect();

        let before = candidates.len();
        candidates.retain(|f| {
            f.requires.iter().all(|k| matches!(k.ty, SlotType::Raw(_)) || provided.contains(k.name.as_str()))
        });
        if candidates.len() == before {
            break;
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::build_global_order;
    use crate::func::ComputeOutput;
    use crate::key::StatKey;
    use crate::value::Value;

    fn numeric_only(name: &str, requires: &[&str], provides: &[&str]) -> StatFunc {
        StatFunc::builder(name)
            .requires(requires.iter().map(|k| StatKey::any(*k)))
            .provides(provides.iter().map(|k| StatKey::any(*k)))
            .column_filter(|d| matches!(d, DType::Int | DType::Float))
            .compute(|_| Ok(ComputeOutput::Single(Value::null())))
            .build()
            .unwrap()
    }

    fn any_type(name: &str, requires: &[&str], provides: &[&str]) -> StatFunc {
        StatFunc::builder(name)
            .requires(requires.iter().map(|k| StatKey::any(*k)))
            .provides(provides.iter().map(|k| StatKey::any(*k)))
            .compute(|_| Ok(ComputeOutput::Single(Value::null())))
            .build()
            .unwrap()
    }

    #[test]
    fn filters_by_column_type() {
        let funcs = vec![numeric_only("mean", &[], &["mean"]), any_type("len", &[], &["len"])];
        let order = build_global_order(funcs).unwrap();

        let str_order = build_column_order(&order, &DType::Str);
        let names: Vec<_> = str_order.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["len"]);

        let int_order = build_column_order(&order, &DType::Int);
        let mut names: Vec<_> = int_order.iter().map(|f| f.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["len", "mean"]);
    }

    #[test]
    fn cascades_removal_through_dependents() {
        // histogram requires mean, mean is numeric-only; on a string
        // column mean is dropped, so histogram must cascade away too.
        let funcs = vec![
            numeric_only("mean", &[], &["mean"]),
            any_type("histogram", &["mean"], &["histogram"]),
        ];
        let order = build_global_order(funcs).unwrap();
        let str_order = build_column_order(&order, &DType::Str);
        assert!(str_order.is_empty());

        let int_order = build_column_order(&order, &DType::Int);
        let names: Vec<_> = int_order.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["mean", "histogram"]);
    }
}
