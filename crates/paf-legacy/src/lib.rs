//! Adapter for two-phase "class-style" stat definitions: a `series`
//! phase computed straight from a column's raw series, and a `computed`
//! phase that reads back whatever summary has accumulated so far
//! (including other stats' output, not just this analysis' own series
//! phase) and derives further values from it.
//!
//! Rust has no runtime "is this method overridden" reflection, so unlike
//! the class hierarchy this mirrors, presence of a phase is signalled by
//! the accessor returning `Some` rather than by inspecting whether a
//! default method body ran.

use std::sync::Arc;

use indexmap::IndexMap;
use paf_core::func::{ComputeInput, ComputeResult};
use paf_core::key::StatKey;
use paf_core::value::{RawMarker, Value};
use paf_core::{ColumnFilter, StatFunc};

pub type SeriesPhase = Arc<dyn Fn(&Value) -> ComputeResult + Send + Sync>;
pub type ComputedPhase = Arc<dyn Fn(&ComputeInput) -> ComputeResult + Send + Sync>;

/// A legacy, class-style stat definition.
pub trait LegacyAnalysis: Send + Sync {
    fn name(&self) -> &str;

    /// Keys (and their fallback values) this analysis provides when no
    /// phase can compute them. Also used to size-check and default the
    /// series phase's output.
    fn provides_defaults(&self) -> IndexMap<String, Value> {
        IndexMap::new()
    }

    /// Keys the computed phase contributes, distinct from
    /// `provides_defaults`'s keys when a series phase is also present
    /// (the reference implementation doesn't need this declared
    /// up front because it inspects the dict the computed method
    /// returns at runtime; Rust has no such introspection).
    fn computed_provides(&self) -> Vec<String> {
        Vec::new()
    }

    /// Keys the series phase provides. Falls back to `provides_defaults`'s
    /// keys when not overridden, mirroring a class that never narrows its
    /// series output below its declared defaults.
    fn provides_series_stats(&self) -> Vec<String> {
        Vec::new()
    }

    /// Other stats' keys the computed phase reads out of the full
    /// accumulator snapshot. Declared so the DAG schedules their
    /// providers before this one; the executor itself ignores this
    /// list's content for a `v1_computed` stat and hands over the whole
    /// snapshot regardless (see `paf_core::executor`).
    fn requires_summary(&self) -> Vec<String> {
        Vec::new()
    }

    fn quiet(&self) -> bool {
        false
    }

    fn column_filter(&self) -> Option<ColumnFilter> {
        None
    }

    fn series_summary(&self) -> Option<SeriesPhase> {
        None
    }

    fn computed_summary(&self) -> Option<ComputedPhase> {
        None
    }
}

fn defaults_subset(defaults: &IndexMap<String, Value>, keys: &[String]) -> Option<Value> {
    let obj: serde_json::Map<String, serde_json::Value> = keys
        .iter()
        .filter_map(|k| defaults.get(k).and_then(|v| v.as_json().cloned()).map(|j| (k.clone(), j)))
        .collect();
    if obj.is_empty() {
        None
    } else {
        Some(Value::Json(serde_json::Value::Object(obj)))
    }
}

fn keys_of(keys: &IndexMap<String, Value>) -> Vec<String> {
    keys.keys().cloned().collect()
}

/// Builds the 0–2 `StatFunc`s a legacy analysis translates to: a
/// defaults-only stat when neither phase is implemented, one stat when
/// only one phase is, or a `series`/`computed` pair wired so the
/// computed stat always runs after the series stat.
pub fn legacy_to_stat_funcs(analysis: &dyn LegacyAnalysis) -> Vec<StatFunc> {
    let name = analysis.name().to_string();
    let defaults = analysis.provides_defaults();
    let default_keys = keys_of(&defaults);
    let quiet = analysis.quiet();
    let column_filter = analysis.column_filter();

    let series_keys = if analysis.provides_series_stats().is_empty() {
        default_keys.clone()
    } else {
        analysis.provides_series_stats()
    };
    let cross_requires = analysis.requires_summary();

    let has_series = analysis.series_summary().is_some();
    let has_computed = analysis.computed_summary().is_some();

    match (has_series, has_computed) {
        (true, true) => {
            let series = series_stat(&name, &series_keys, &defaults, quiet, column_filter.clone(), analysis.series_summary().unwrap());
            let computed_keys = if analysis.computed_provides().is_empty() {
                default_keys.clone()
            } else {
                analysis.computed_provides()
            };
            // The computed phase always runs after this analysis' own
            // series phase, plus whatever other analyses' keys it reads
            // out of the full accumulator snapshot.
            let mut computed_requires = series_keys.clone();
            computed_requires.extend(cross_requires.clone());
            let computed = computed_stat(
                &name,
                &computed_keys,
                &computed_requires,
                &defaults,
                quiet,
                column_filter,
                analysis.computed_summary().unwrap(),
            );
            vec![series, computed]
        }
        (true, false) => {
            vec![series_stat(&name, &series_keys, &defaults, quiet, column_filter, analysis.series_summary().unwrap())]
        }
        (false, true) => {
            let computed_keys = if analysis.computed_provides().is_empty() { default_keys.clone() } else { analysis.computed_provides() };
            vec![computed_stat(&name, &computed_keys, &cross_requires, &defaults, quiet, column_filter, analysis.computed_summary().unwrap())]
        }
        (false, false) => {
            if default_keys.is_empty() {
                return Vec::new();
            }
            let provides: Vec<StatKey> = default_keys.iter().map(|k| StatKey::any(k.clone())).collect();
            let default_value = defaults_subset(&defaults, &default_keys);
            let mut builder = StatFunc::builder(name)
                .provides(provides)
                .quiet(quiet)
                .compute(|_| Ok(paf_core::func::ComputeOutput::Single(Value::null())));
            // A defaults-only stat has no `column_filter` in the reference
            // implementation and so is never removed by column-type
            // cascade filtering; mirrored here by leaving it unset.
            if let Some(d) = default_value {
                builder = builder.default(d);
            }
            vec![builder.build().expect("defaults-only legacy stat is always valid")]
        }
    }
}

fn series_stat(
    name: &str,
    keys: &[String],
    defaults: &IndexMap<String, Value>,
    quiet: bool,
    column_filter: Option<ColumnFilter>,
    phase: SeriesPhase,
) -> StatFunc {
    let provides: Vec<StatKey> = keys.iter().map(|k| StatKey::any(k.clone())).collect();
    let raw_key = StatKey::new(RawMarker::RawSeries.slot_name(), paf_core::value::SlotType::Raw(RawMarker::RawSeries));
    let mut builder = StatFunc::builder(format!("{name}__series"))
        .requires(vec![raw_key])
        .provides(provides)
        .quiet(quiet)
        .compute(move |input: &ComputeInput| {
            let series = input.get(RawMarker::RawSeries.slot_name()).cloned().unwrap_or_else(Value::null);
            (phase)(&series)
        });
    if let Some(filter) = column_filter {
        builder = builder.column_filter(move |d| filter(d));
    }
    if let Some(d) = defaults_subset(defaults, keys) {
        builder = builder.default(d);
    }
    builder.build().expect("series-phase legacy stat is always valid")
}

fn computed_stat(
    name: &str,
    provides_keys: &[String],
    requires_keys: &[String],
    defaults: &IndexMap<String, Value>,
    quiet: bool,
    column_filter: Option<ColumnFilter>,
    phase: ComputedPhase,
) -> StatFunc {
    let provides: Vec<StatKey> = provides_keys.iter().map(|k| StatKey::any(k.clone())).collect();
    let requires: Vec<StatKey> = requires_keys.iter().map(|k| StatKey::any(k.clone())).collect();
    let mut builder = StatFunc::builder(format!("{name}__computed"))
        .requires(requires)
        .provides(provides)
        .quiet(quiet)
        .v1_computed(true)
        .compute(move |snapshot: &ComputeInput| (phase)(snapshot));
    if let Some(filter) = column_filter {
        builder = builder.column_filter(move |d| filter(d));
    }
    if let Some(d) = defaults_subset(defaults, provides_keys) {
        builder = builder.default(d);
    }
    builder.build().expect("computed-phase legacy stat is always valid")
}
