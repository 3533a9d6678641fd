// ⚠️ Errors & Warnings - Failure taxonomy for the analysis core
// Errors stop a computation; warnings ride along with a result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ANALYSIS ERROR
// ============================================================================

/// Errors raised by the pure analysis functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Malformed or out-of-domain scalar input (bad sex code, negative bodyweight)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Filters left nothing to compare against
    #[error("no matching population: {0}")]
    NoMatchingPopulation(String),

    /// Input violated a stated precondition (e.g. several names in one resolver call)
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),
}

impl AnalysisError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AnalysisError::InvalidArgument(message.into())
    }

    pub fn no_population(message: impl Into<String>) -> Self {
        AnalysisError::NoMatchingPopulation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        AnalysisError::PreconditionViolated(message.into())
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

// ============================================================================
// ANALYSIS WARNING
// ============================================================================

/// Informational findings that do not stop a computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// More than one real lifter appears to compete under this name
    AmbiguousIdentity { name: String, personas: usize },
}

impl AnalysisWarning {
    pub fn message(&self) -> String {
        match self {
            AnalysisWarning::AmbiguousIdentity { name, personas } => format!(
                "Identified more than one lifter under '{}' ({} personas)",
                name, personas
            ),
        }
    }
}

impl std::fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AnalysisError::invalid("sex must be 'm' or 'f', got 'x'");
        assert_eq!(
            err.to_string(),
            "invalid argument: sex must be 'm' or 'f', got 'x'"
        );

        let err = AnalysisError::no_population("no lifters for USAPL / F");
        assert!(matches!(err, AnalysisError::NoMatchingPopulation(_)));
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = AnalysisWarning::AmbiguousIdentity {
            name: "A. Lifter".to_string(),
            personas: 2,
        };

        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "ambiguous_identity");
        assert_eq!(json["personas"], 2);
        assert!(warning.message().contains("more than one lifter"));
    }
}
