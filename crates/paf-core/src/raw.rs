//! Traits a DataFrame collaborator implements to hand PAF raw column
//! data. PAF never interprets what comes back — it only resolves raw
//! markers into [`Value::Raw`] handles and passes them to `compute`.

use crate::value::{DType, RawMarker, Value};

/// One column's raw-data access, injected per `process_column` /
/// `process_df` call.
pub trait RawDataSource: Send + Sync {
    /// Resolve a raw marker into a value, or `None` if this source can't
    /// supply that marker (e.g. no sampled variant available).
    fn resolve(&self, marker: RawMarker) -> Option<Value>;
}

/// The whole-dataframe collaborator: enumerates columns and hands back a
/// per-column `RawDataSource`, plus the rewritten-name mapping recorded
/// in the summary under `orig_col_name` / `rewritten_col_name`.
pub trait DataSource: Send + Sync {
    fn column_names(&self) -> Vec<String>;
    fn dtype_of(&self, column: &str) -> DType;
    fn raw_source(&self, column: &str) -> Box<dyn RawDataSource>;

    /// Identity mapping by default; override when the collaborator has
    /// a column-renaming convention of its own.
    fn rewritten_name(&self, column: &str) -> String {
        column.to_string()
    }
}
