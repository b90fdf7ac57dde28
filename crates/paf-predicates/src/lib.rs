//! Column-type predicates for use as `StatFunc::column_filter`s, and the
//! combinators to build compound ones.

use paf_core::value::DType;
use paf_core::ColumnFilter;

/// Bool counts as numeric here, matching a dtype-introspection library
/// that treats boolean columns as a numeric subtype; use
/// `is_numeric_not_bool` where that overlap isn't wanted.
pub fn is_numeric(dtype: &DType) -> bool {
    matches!(dtype, DType::Int | DType::Float | DType::Bool)
}

pub fn is_numeric_not_bool(dtype: &DType) -> bool {
    is_numeric(dtype) && !is_boolean(dtype)
}

pub fn is_string(dtype: &DType) -> bool {
    matches!(dtype, DType::Str)
}

pub fn is_temporal(dtype: &DType) -> bool {
    matches!(dtype, DType::Temporal)
}

pub fn is_boolean(dtype: &DType) -> bool {
    matches!(dtype, DType::Bool)
}

/// True if any of `filters` matches. Stored as plain `fn` pointers rather
/// than boxed closures since every predicate above is a bare function;
/// `any_of`/`not_` return a boxed `ColumnFilter` because that's what
/// `StatFunc::builder().column_filter` expects.
pub fn any_of(filters: Vec<fn(&DType) -> bool>) -> ColumnFilter {
    std::sync::Arc::new(move |dtype: &DType| filters.iter().any(|f| f(dtype)))
}

pub fn not_(filter: fn(&DType) -> bool) -> ColumnFilter {
    std::sync::Arc::new(move |dtype: &DType| !filter(dtype))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_includes_bool_but_not_string() {
        assert!(is_numeric(&DType::Int));
        assert!(is_numeric(&DType::Float));
        assert!(is_numeric(&DType::Bool));
        assert!(!is_numeric(&DType::Str));
    }

    #[test]
    fn numeric_not_bool_excludes_bool() {
        assert!(is_numeric_not_bool(&DType::Int));
        assert!(!is_numeric_not_bool(&DType::Bool));
    }

    #[test]
    fn any_of_matches_union() {
        let filter = any_of(vec![is_string, is_temporal]);
        assert!(filter(&DType::Str));
        assert!(filter(&DType::Temporal));
        assert!(!filter(&DType::Int));
    }

    #[test]
    fn not_inverts() {
        let filter = not_(is_boolean);
        assert!(filter(&DType::Int));
        assert!(!filter(&DType::Bool));
    }
}
