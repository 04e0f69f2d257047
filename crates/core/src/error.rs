//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (rule violations,
/// missing entities). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A business rule rejected the candidate entity.
    ///
    /// `field` names the attribute that caused the rejection (empty when the
    /// rule applies to the entity as a whole), for user-facing error mapping
    /// by the presentation layer.
    #[error("rule violation: {reason}")]
    Rule {
        field: &'static str,
        reason: &'static str,
    },

    /// A requested entity id does not exist.
    ///
    /// Reported distinctly from a rule violation: no candidate entity was
    /// available to validate.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
}

impl DomainError {
    pub fn rule(field: &'static str, reason: &'static str) -> Self {
        Self::Rule { field, reason }
    }

    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    /// The rejected field, if this is a rule violation.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Rule { field, .. } => Some(field),
            Self::NotFound { .. } => None,
        }
    }
}
