//! Global DAG construction: duplicate/missing provider checks, advisory
//! type compatibility, and deterministic topological order.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::errors::DAGConfigError;
use crate::func::StatFunc;
use crate::value::SlotType;

/// Orders `funcs` so that every stat appears after everything it
/// `requires` (raw markers excepted, since those are injected rather than
/// computed). Ties among ready stats are broken lexicographically by
/// name, so two runs over the same registration order always produce the
/// same schedule.
pub fn build_global_order(funcs: Vec<StatFunc>) -> Result<Vec<Arc<StatFunc>>, DAGConfigError> {
    let funcs: Vec<Arc<StatFunc>> = funcs.into_iter().map(Arc::new).collect();

    // key name -> (index of providing stat, declared SlotType)
    let mut providers: HashMap<String, (usize, SlotType)> = HashMap::new();
    for (idx, f) in funcs.iter().enumerate() {
        for key in &f.provides {
            if let Some((_, _)) = providers.get(&key.name) {
                let all: Vec<String> = funcs
                    .iter()
                    .filter(|g| g.provides.iter().any(|k| k.name == key.name))
                    .map(|g| g.name.clone())
                    .collect();
                return Err(DAGConfigError::DuplicateProvider(key.name.clone(), all));
            }
            providers.insert(key.name.clone(), (idx, key.ty.clone()));
        }
    }

    // edges[provider_idx] = set of consumer indices that require it
    let mut edges: Vec<HashSet<usize>> = vec![HashSet::new(); funcs.len()];
    let mut indegree: Vec<usize> = vec![0; funcs.len()];

    for (idx, f) in funcs.iter().enumerate() {
        for key in &f.requires {
            if matches!(key.ty, SlotType::Raw(_)) {
                continue;
            }
            match providers.get(&key.name) {
                Some((producer_idx, provided_ty)) => {
                    if *provided_ty != SlotType::Any && key.ty != SlotType::Any && *provided_ty != key.ty {
                        log::warn!(
                            "stat '{}' requires '{}' as {}, but '{}' provides it as {}",
                            f.name, key.name, key.ty, funcs[*producer_idx].name, provided_ty
                        );
                    }
                    if edges[*producer_idx].insert(idx) {
                        indegree[idx] += 1;
                    }
                }
                None => {
                    return Err(DAGConfigError::MissingProvider {
                        stat: f.name.clone(),
                        key: key.name.clone(),
                    });
                }
            }
        }
    }

    // Kahn's algorithm, ready set ordered by name for determinism.
    let mut ready: BTreeMap<String, usize> =
        funcs.iter().enumerate().filter(|(i, _)| indegree[*i] == 0).map(|(i, f)| (f.name.clone(), i)).collect();
    let mut indegree = indegree;
    let mut order = Vec::with_capacity(funcs.len());
    let mut queue: VecDeque<usize> = VecDeque::new();

    while !ready.is_empty() || !queue.is_empty() {
        let idx = if let Some((name, _)) = ready.iter().next() {
            let name = name.clone();
            ready.remove(&name).unwrap()
        } else {
            queue.pop_front().unwrap()
        };
        order.push(funcs[idx].clone());
        for &consumer in &edges[idx] {
            indegree[consumer] -= 1;
            if indegree[consumer] == 0 {
                ready.insert(funcs[consumer].name.clone(), consumer);
            }
        }
    }

    if order.len() != funcs.len() {
        let remaining: Vec<String> = (0..funcs.len())
            .filter(|i| indegree[*i] > 0)
            .map(|i| funcs[i].name.clone())
            .collect();
        return Err(DAGConfigError::Cycle(remaining));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::func::ComputeOutput;
    use crate::key::StatKey;
    use crate::value::Value;

    fn stub(name: &str, requires: &[&str], provides: &[&str]) -> StatFunc {
        StatFunc::builder(name)
            .requires(requires.iter().map(|k| StatKey::any(*k)))
            .provides(provides.iter().map(|k| StatKey::any(*k)))
            .compute(|_| Ok(ComputeOutput::Single(Value::null())))
            .build()
            .unwrap()
    }

    #[test]
    fn orders_by_dependency_then_name() {
        let funcs = vec![stub("b", &["a"], &["b"]), stub("a", &[], &["a"]), stub("c", &["a"], &["c"])];
        let order = build_global_order(funcs).unwrap();
        let names: Vec<_> = order.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn detects_duplicate_provider() {
        let funcs = vec![stub("x", &[], &["shared"]), stub("y", &[], &["shared"])];
        let err = build_global_order(funcs).unwrap_err();
        assert!(matches!(err, DAGConfigError::DuplicateProvider(k, _) if k == "shared"));
    }

    #[test]
    fn detects_missing_provider() {
        let funcs = vec![stub("needs_ghost", &["ghost"], &["out"])];
        let err = build_global_order(funcs).unwrap_err();
        assert!(matches!(err, DAGConfigError::MissingProvider { key, .. } if key == "ghost"));
    }

    #[test]
    fn detects_cycle() {
        let funcs = vec![stub("a", &["b"], &["a"]), stub("b", &["a"], &["b"])];
        let err = build_global_order(funcs).unwrap_err();
        match err {
            DAGConfigError::Cycle(names) => {
                let mut names = names;
                names.sort();
                assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }
}
