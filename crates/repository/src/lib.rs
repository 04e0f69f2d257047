//! Transaction coordinator for the library system.
//!
//! Every public operation runs as one atomic unit: take a versioned
//! snapshot, run the rule checkers against it, build an ordered write
//! batch, and commit it at the snapshot's version. A failed check or a
//! stale snapshot aborts the whole operation with no partial write.

mod error;
mod repository;

pub use error::RepositoryError;
pub use repository::Librarian;
