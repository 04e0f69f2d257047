use thiserror::Error;

use librarian_core::DomainError;
use librarian_store::StoreError;

/// Failure of one public operation.
///
/// Domain errors are terminal for the attempt but recoverable with corrected
/// input; store errors are transient infrastructure failures, surfaced as-is
/// with no retry here. The presentation layer decides whether to resubmit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepositoryError {
    /// Whether this is a rule violation or missing entity, as opposed to an
    /// infrastructure failure.
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}
