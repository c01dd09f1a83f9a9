//! Error taxonomy and the fallback-carrying result type.
//!
//! Nothing in the decision path fails outright. Bad or missing inputs are
//! recovered with a conservative value, and the reason travels alongside it
//! so callers can tell a computed answer from a fallback.

use serde::Serialize;
use thiserror::Error;

/// Why a component fell back to its safe default.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum RiskError {
    /// An input was outside its valid domain (probability, balance, price...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Not enough history to run the computation.
    #[error("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },
}

impl RiskError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    pub fn insufficient(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }
}

/// A value that is either computed from the inputs or a documented fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum Estimate<T> {
    Computed(T),
    Fallback { value: T, reason: RiskError },
}

impl<T> Estimate<T> {
    pub fn fallback(value: T, reason: RiskError) -> Self {
        Self::Fallback { value, reason }
    }

    /// The usable value, whichever way it was produced.
    pub fn value(&self) -> &T {
        match self {
            Self::Computed(v) => v,
            Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Computed(v) => v,
            Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&RiskError> {
        match self {
            Self::Computed(_) => None,
            Self::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Estimate<U> {
        match self {
            Self::Computed(v) => Estimate::Computed(f(v)),
            Self::Fallback { value, reason } => Estimate::Fallback {
                value: f(value),
                reason,
            },
        }
    }
}
