//! Analytics error model.

use thiserror::Error;

/// Result type used across the analytics kernel.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Kernel-level error.
///
/// Every variant is fatal for the current run: the kernel validates before it
/// computes and never returns partial output. Messages name the violated rule
/// and, where useful, the offending count or keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// A required column is missing, or a value is null/non-numeric where a
    /// number is required.
    #[error("schema error: {0}")]
    Schema(String),

    /// Duplicate rows or keys, or a value outside its declared range.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// An input required by a computation is absent or unusable
    /// (e.g. a missing target, a non-positive denominator).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The input is too small to produce a meaningful result
    /// (e.g. an empty comparison window).
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

impl AnalyticsError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateInput(msg.into())
    }

    /// Short rule-family name, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema(_) => "schema",
            Self::Integrity(_) => "integrity",
            Self::Precondition(_) => "precondition",
            Self::DegenerateInput(_) => "degenerate_input",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_rule_family() {
        let err = AnalyticsError::integrity("3 duplicated rows in ledger");
        assert_eq!(err.to_string(), "integrity error: 3 duplicated rows in ledger");
        assert_eq!(err.kind(), "integrity");
    }

    #[test]
    fn constructors_map_to_variants() {
        assert!(matches!(AnalyticsError::schema("x"), AnalyticsError::Schema(_)));
        assert!(matches!(
            AnalyticsError::precondition("x"),
            AnalyticsError::Precondition(_)
        ));
        assert!(matches!(
            AnalyticsError::degenerate("x"),
            AnalyticsError::DegenerateInput(_)
        ));
    }
}
