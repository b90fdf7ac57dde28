//! Configuration-time errors: the ones that stop construction cold rather
//! than being collected and returned alongside a summary.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DAGConfigError {
    #[error("key '{0}' is provided by more than one stat: {1:?}")]
    DuplicateProvider(String, Vec<String>),
    #[error("stat '{stat}' requires '{key}', which no registered stat provides")]
    MissingProvider { stat: String, key: String },
    #[error("dependency cycle detected among stats: {0:?}")]
    Cycle(Vec<String>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no stat named '{0}' is registered")]
    UnknownStat(String),
    #[error(transparent)]
    Config(#[from] DAGConfigError),
}
