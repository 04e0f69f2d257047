//! In-memory entity store.
//!
//! Intended for tests and embedding. Commits apply to a scratch copy and
//! swap it in, so a failed batch leaves the published state untouched.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::debug;

use librarian_domain::{Book, Borrowing, Client, Shelf, Snapshot};

use crate::r#trait::{
    CommitReceipt, EntityStore, ExpectedVersion, StoreError, VersionedSnapshot, WriteBatch, WriteOp,
};

#[derive(Debug, Clone, Default)]
struct Inner {
    version: u64,
    next_id: i64,
    shelves: BTreeMap<i64, Shelf>,
    books: BTreeMap<i64, Book>,
    clients: BTreeMap<i64, Client>,
    borrowings: BTreeMap<i64, Borrowing>,
}

impl Inner {
    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            shelves: self.shelves.values().cloned().collect(),
            books: self.books.values().cloned().collect(),
            clients: self.clients.values().cloned().collect(),
            borrowings: self.borrowings.values().cloned().collect(),
        }
    }

    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn apply(&mut self, op: &WriteOp) -> Result<Option<i64>, StoreError> {
        match op {
            WriteOp::InsertShelf(draft) => {
                let id = self.assign_id();
                self.shelves.insert(id, draft.clone().with_id(id.into()));
                Ok(Some(id))
            }
            WriteOp::UpdateShelf(shelf) => {
                let slot = self
                    .shelves
                    .get_mut(&shelf.id.get())
                    .ok_or(StoreError::Missing("shelf"))?;
                *slot = shelf.clone();
                Ok(None)
            }
            WriteOp::DeleteShelf(id) => {
                self.shelves
                    .remove(&id.get())
                    .ok_or(StoreError::Missing("shelf"))?;
                Ok(None)
            }
            WriteOp::InsertBook(draft) => {
                let id = self.assign_id();
                self.books.insert(id, draft.clone().with_id(id.into()));
                Ok(Some(id))
            }
            WriteOp::UpdateBook(book) => {
                let slot = self
                    .books
                    .get_mut(&book.id.get())
                    .ok_or(StoreError::Missing("book"))?;
                *slot = book.clone();
                Ok(None)
            }
            WriteOp::DeleteBook(id) => {
                self.books
                    .remove(&id.get())
                    .ok_or(StoreError::Missing("book"))?;
                Ok(None)
            }
            WriteOp::InsertClient(draft) => {
                let id = self.assign_id();
                self.clients.insert(id, draft.clone().with_id(id.into()));
                Ok(Some(id))
            }
            WriteOp::UpdateClient(client) => {
                let slot = self
                    .clients
                    .get_mut(&client.id.get())
                    .ok_or(StoreError::Missing("client"))?;
                *slot = client.clone();
                Ok(None)
            }
            WriteOp::DeleteClient(id) => {
                self.clients
                    .remove(&id.get())
                    .ok_or(StoreError::Missing("client"))?;
                Ok(None)
            }
            WriteOp::InsertBorrowing(draft) => {
                let id = self.assign_id();
                self.borrowings.insert(id, draft.clone().with_id(id.into()));
                Ok(Some(id))
            }
            WriteOp::UpdateBorrowing(borrowing) => {
                let slot = self
                    .borrowings
                    .get_mut(&borrowing.id.get())
                    .ok_or(StoreError::Missing("borrowing"))?;
                *slot = borrowing.clone();
                Ok(None)
            }
            WriteOp::DeleteBorrowing(id) => {
                self.borrowings
                    .remove(&id.get())
                    .ok_or(StoreError::Missing("borrowing"))?;
                Ok(None)
            }
        }
    }

    /// Uniqueness backstop, re-checked on the post-batch state.
    fn check_constraints(&self) -> Result<(), StoreError> {
        let mut numbers = HashSet::new();
        for shelf in self.shelves.values() {
            if !numbers.insert(shelf.number) {
                return Err(StoreError::Constraint("shelf number must be unique"));
            }
        }

        let mut positions = HashSet::new();
        let mut works = HashSet::new();
        for book in self.books.values() {
            if !positions.insert((book.shelf_id, book.position)) {
                return Err(StoreError::Constraint("shelf position must be unique"));
            }
            if !works.insert((book.title.as_str(), book.name.as_str())) {
                return Err(StoreError::Constraint("book title and author must be unique"));
            }
        }

        let mut names = HashSet::new();
        for client in self.clients.values() {
            if !names.insert(client.name.as_str()) {
                return Err(StoreError::Constraint("client name must be unique"));
            }
        }

        let mut open_books = HashSet::new();
        for borrowing in self.borrowings.values().filter(|b| b.is_open()) {
            if !open_books.insert(borrowing.book_id) {
                return Err(StoreError::Constraint(
                    "at most one open borrowing per book",
                ));
            }
        }

        Ok(())
    }
}

/// In-memory [`EntityStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait::async_trait]
impl EntityStore for InMemoryStore {
    async fn snapshot(&self) -> Result<VersionedSnapshot, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(VersionedSnapshot {
            version: inner.version,
            state: inner.to_snapshot(),
        })
    }

    async fn commit(
        &self,
        expected: ExpectedVersion,
        batch: WriteBatch,
    ) -> Result<CommitReceipt, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if !expected.matches(inner.version) {
            let actual = inner.version;
            let expected = match expected {
                ExpectedVersion::Exact(v) => v,
                ExpectedVersion::Any => actual,
            };
            return Err(StoreError::Conflict { expected, actual });
        }

        // Build the post-batch state on a scratch copy first.
        let mut scratch = inner.clone();
        let mut assigned = Vec::new();
        for op in batch.ops() {
            if let Some(id) = scratch.apply(op)? {
                assigned.push(id);
            }
        }
        scratch.check_constraints()?;

        scratch.version += 1;
        debug!(version = scratch.version, ops = batch.len(), "batch committed");
        *inner = scratch;

        Ok(CommitReceipt {
            version: inner.version,
            assigned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use librarian_core::{BookId, ClientId, ShelfId};
    use librarian_domain::{NewBook, NewBorrowing, NewClient, NewShelf};

    fn shelf_draft(number: u32) -> NewShelf {
        NewShelf {
            number,
            description: "Fine Arts".to_string(),
            capacity: 20,
        }
    }

    fn book_draft(shelf_id: ShelfId, position: u32) -> NewBook {
        NewBook {
            title: format!("Title {position}"),
            name: "Author".to_string(),
            shelf_id,
            position,
            age_limit: None,
            duration_limit: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_bumps_the_version() {
        let store = InMemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertShelf(shelf_draft(1)));
        batch.push(WriteOp::InsertShelf(shelf_draft(2)));

        let receipt = store.commit(ExpectedVersion::Exact(0), batch).await.unwrap();
        assert_eq!(receipt.version, 1);
        assert_eq!(receipt.assigned, vec![1, 2]);

        let snap = store.snapshot().await.unwrap();
        assert_eq!(snap.version, 1);
        assert_eq!(snap.state.shelves.len(), 2);
    }

    #[tokio::test]
    async fn stale_snapshot_version_is_a_conflict() {
        let store = InMemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertShelf(shelf_draft(1)));
        store
            .commit(ExpectedVersion::Exact(0), batch.clone())
            .await
            .unwrap();

        let mut second = WriteBatch::new();
        second.push(WriteOp::InsertShelf(shelf_draft(2)));
        let err = store.commit(ExpectedVersion::Exact(0), second).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict { expected: 0, actual: 1 });
    }

    #[tokio::test]
    async fn failed_batch_leaves_the_store_untouched() {
        let store = InMemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertShelf(shelf_draft(1)));
        store.commit(ExpectedVersion::Exact(0), batch).await.unwrap();
        let before = store.snapshot().await.unwrap();

        // Second op collides on the shelf number; the first must not stick.
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertShelf(shelf_draft(2)));
        batch.push(WriteOp::InsertShelf(shelf_draft(2)));
        let err = store
            .commit(ExpectedVersion::Exact(1), batch)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Constraint("shelf number must be unique"));

        let after = store.snapshot().await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn two_open_borrowings_for_one_book_are_rejected() {
        let store = InMemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertShelf(shelf_draft(1)));
        let receipt = store.commit(ExpectedVersion::Exact(0), batch).await.unwrap();
        let shelf_id = ShelfId::from(receipt.assigned[0]);

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertBook(book_draft(shelf_id, 1)));
        batch.push(WriteOp::InsertClient(NewClient {
            name: "John Walker".to_string(),
            birthdate: Utc::now().date_naive(),
            is_untrustworthy: false,
        }));
        let receipt = store.commit(ExpectedVersion::Exact(1), batch).await.unwrap();
        let book_id = BookId::from(receipt.assigned[0]);
        let client_id = ClientId::from(receipt.assigned[1]);

        // Both borrow attempts land in one batch, as if two callers raced
        // past validation; the backstop catches it.
        let mut batch = WriteBatch::new();
        for _ in 0..2 {
            batch.push(WriteOp::InsertBorrowing(NewBorrowing {
                book_id,
                client_id,
                date_borrowed: Utc::now(),
            }));
        }
        let err = store
            .commit(ExpectedVersion::Exact(2), batch)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Constraint("at most one open borrowing per book"));
    }

    #[tokio::test]
    async fn update_of_missing_row_is_reported() {
        let store = InMemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::DeleteShelf(ShelfId::new(13)));
        let err = store.commit(ExpectedVersion::Any, batch).await.unwrap_err();
        assert_eq!(err, StoreError::Missing("shelf"));
    }
}
