use crate::parameter::Value;

/// Everything that can abort a run.
///
/// Each variant describes a configuration defect on the caller's side, so
/// none of them are retried: the run stops at the point of violation and no
/// best solution is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvolveError {
    #[error("InvalidDomain: parameter `{name}`: {reason}")]
    InvalidDomain { name: String, reason: String },

    #[error("DuplicateParameterName: parameter `{name}` is declared more than once")]
    DuplicateParameterName { name: String },

    #[error("NoParameters: at least one parameter is required")]
    NoParameters,

    #[error("UninitializedIndividual: the individual has no values, call randomize first")]
    UninitializedIndividual,

    #[error(
        "InvalidSelectionSize: cannot select {requested} individuals from a population of {available}"
    )]
    InvalidSelectionSize { requested: usize, available: usize },

    #[error("FitnessArity: expected {expected} objective values, fitness function returned {actual}")]
    FitnessArity { expected: usize, actual: usize },

    #[error("ShapeMismatch: expected {expected} parameters, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("ValueOutOfDomain: `{value}` is not a legal value of parameter `{name}`")]
    ValueOutOfDomain { name: String, value: Value },

    #[error("InvalidConfig: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("EmptyHistory: no generation has been recorded yet")]
    EmptyHistory,
}

impl EvolveError {
    pub(crate) fn invalid_domain(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDomain {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = EvolveError> = std::result::Result<T, E>;
