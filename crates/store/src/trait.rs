//! The entity store contract: snapshot reads and atomic write batches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use librarian_core::{BookId, BorrowingId, ClientId, ShelfId};
use librarian_domain::{
    Book, Borrowing, Client, NewBook, NewBorrowing, NewClient, NewShelf, Shelf, Snapshot,
};

/// Store-level failure.
///
/// `Conflict` and `Unavailable` are transient from the caller's perspective:
/// the whole operation may be resubmitted. `Constraint` and `Missing` signal
/// races the isolation level did not prevent; the store is the backstop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The snapshot a batch was validated against is stale.
    #[error("concurrent modification (expected version {expected}, found {actual})")]
    Conflict { expected: u64, actual: u64 },

    /// A store-level constraint rejected the batch.
    #[error("constraint violated: {0}")]
    Constraint(&'static str),

    /// An update or delete targeted a row that does not exist.
    #[error("missing row: {0}")]
    Missing(&'static str),

    /// The store could not serve the request (connectivity, poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Optimistic concurrency expectation for a commit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (seeding, migrations).
    Any,
    /// Require the store to be at the exact version the snapshot carried.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}

/// A snapshot paired with the commit version it was taken at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSnapshot {
    pub version: u64,
    pub state: Snapshot,
}

/// One row-level mutation inside a batch.
///
/// Inserts carry id-less payloads; the store assigns identifiers at commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOp {
    InsertShelf(NewShelf),
    UpdateShelf(Shelf),
    DeleteShelf(ShelfId),
    InsertBook(NewBook),
    UpdateBook(Book),
    DeleteBook(BookId),
    InsertClient(NewClient),
    UpdateClient(Client),
    DeleteClient(ClientId),
    InsertBorrowing(NewBorrowing),
    UpdateBorrowing(Borrowing),
    DeleteBorrowing(BorrowingId),
}

/// An ordered list of mutations applied as one atomic unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

impl From<Vec<WriteOp>> for WriteBatch {
    fn from(ops: Vec<WriteOp>) -> Self {
        Self { ops }
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// The store version after the commit.
    pub version: u64,
    /// Identifiers assigned to the batch's inserts, in batch order.
    pub assigned: Vec<i64>,
}

/// Transactional access to the four entity collections.
///
/// One commit per public operation; validation reads come from `snapshot`
/// and the matching `commit` carries the snapshot's version so that no other
/// writer can interleave between the two.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// A consistent point-in-time copy of all collections.
    async fn snapshot(&self) -> Result<VersionedSnapshot, StoreError>;

    /// Apply a batch atomically: every op succeeds or none does.
    ///
    /// Implementations must re-check the uniqueness invariants (shelf number,
    /// shelf position, book title+name, client name, one open borrowing per
    /// book) as a backstop against races the version check does not cover.
    async fn commit(
        &self,
        expected: ExpectedVersion,
        batch: WriteBatch,
    ) -> Result<CommitReceipt, StoreError>;
}
