//! The coordinator itself: snapshot → validate → write batch → commit.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use librarian_core::{BookId, BorrowingId, ClientId, DomainError, ShelfId};
use librarian_domain::{
    book, borrowing, client, shelf, Book, Borrowing, Client, NewBook, NewBorrowing, NewClient,
    NewShelf, Shelf, Snapshot,
};
use librarian_store::{
    CommitReceipt, EntityStore, ExpectedVersion, StoreError, VersionedSnapshot, WriteBatch, WriteOp,
};

use crate::error::RepositoryError;

type OpResult<T> = Result<T, RepositoryError>;

/// Public operation set over the four entity collections.
///
/// Holds the entity store; all access to it goes through here, one commit
/// per operation.
pub struct Librarian<S> {
    store: S,
}

impl<S: EntityStore> Librarian<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn begin(&self) -> OpResult<VersionedSnapshot> {
        Ok(self.store.snapshot().await?)
    }

    async fn finish(&self, version: u64, batch: WriteBatch) -> OpResult<CommitReceipt> {
        Ok(self.store.commit(ExpectedVersion::Exact(version), batch).await?)
    }

    /// The single id assigned by a one-insert batch.
    fn assigned_id(receipt: &CommitReceipt) -> OpResult<i64> {
        match receipt.assigned.as_slice() {
            [id] => Ok(*id),
            _ => Err(StoreError::Unavailable("store assigned no id on insert".to_string()).into()),
        }
    }

    // ---- shelves ----

    /// All shelves, ordered by number.
    pub async fn list_shelves(&self) -> OpResult<Vec<Shelf>> {
        let snap = self.begin().await?;
        let mut shelves = snap.state.shelves;
        shelves.sort_by_key(|s| s.number);
        Ok(shelves)
    }

    pub async fn get_shelf(&self, id: ShelfId) -> OpResult<Option<Shelf>> {
        let snap = self.begin().await?;
        Ok(snap.state.shelf(id).cloned())
    }

    pub async fn add_shelf(&self, draft: NewShelf) -> OpResult<ShelfId> {
        let snap = self.begin().await?;
        shelf::admit(&draft, None, &snap.state)?;

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertShelf(draft));
        let receipt = self.finish(snap.version, batch).await?;

        let id = ShelfId::from(Self::assigned_id(&receipt)?);
        info!(shelf = %id, "shelf added");
        Ok(id)
    }

    pub async fn update_shelf(&self, shelf: Shelf) -> OpResult<()> {
        let snap = self.begin().await?;
        if snap.state.shelf(shelf.id).is_none() {
            return Err(DomainError::not_found("shelf").into());
        }
        shelf::admit(&shelf.as_candidate(), Some(shelf.id), &snap.state)?;

        let id = shelf.id;
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateShelf(shelf));
        self.finish(snap.version, batch).await?;
        info!(shelf = %id, "shelf updated");
        Ok(())
    }

    /// Deletes the shelf, its books, and those books' closed borrowings.
    /// A single open borrowing anywhere on the shelf blocks the whole delete.
    pub async fn delete_shelf(&self, id: ShelfId) -> OpResult<()> {
        let snap = self.begin().await?;
        shelf::admit_delete(id, &snap.state)?;

        let mut batch = WriteBatch::new();
        for book in snap.state.books_on_shelf(id) {
            for borrowing in snap.state.borrowings_for_book(book.id) {
                batch.push(WriteOp::DeleteBorrowing(borrowing.id));
            }
            batch.push(WriteOp::DeleteBook(book.id));
        }
        batch.push(WriteOp::DeleteShelf(id));
        self.finish(snap.version, batch).await?;
        info!(shelf = %id, "shelf deleted");
        Ok(())
    }

    // ---- books ----

    /// All books, ordered by author name.
    pub async fn list_books(&self) -> OpResult<Vec<Book>> {
        let snap = self.begin().await?;
        let mut books = snap.state.books;
        books.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(books)
    }

    pub async fn get_book(&self, id: BookId) -> OpResult<Option<Book>> {
        let snap = self.begin().await?;
        Ok(snap.state.book(id).cloned())
    }

    pub async fn add_book(&self, draft: NewBook) -> OpResult<BookId> {
        let snap = self.begin().await?;
        let now = Utc::now();
        book::admit(&draft, None, &snap.state, now.date_naive(), now)?;

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertBook(draft));
        let receipt = self.finish(snap.version, batch).await?;

        let id = BookId::from(Self::assigned_id(&receipt)?);
        info!(book = %id, "book added");
        Ok(id)
    }

    pub async fn update_book(&self, book: Book) -> OpResult<()> {
        let snap = self.begin().await?;
        if snap.state.book(book.id).is_none() {
            return Err(DomainError::not_found("book").into());
        }
        let now = Utc::now();
        book::admit(&book.as_candidate(), Some(book.id), &snap.state, now.date_naive(), now)?;

        let id = book.id;
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateBook(book));
        self.finish(snap.version, batch).await?;
        info!(book = %id, "book updated");
        Ok(())
    }

    /// Deletes the book and its closed borrowings; an open borrowing blocks
    /// the delete and is never silently removed.
    pub async fn delete_book(&self, id: BookId) -> OpResult<()> {
        let snap = self.begin().await?;
        book::admit_delete(id, &snap.state)?;

        let mut batch = WriteBatch::new();
        for borrowing in snap.state.borrowings_for_book(id) {
            batch.push(WriteOp::DeleteBorrowing(borrowing.id));
        }
        batch.push(WriteOp::DeleteBook(id));
        self.finish(snap.version, batch).await?;
        info!(book = %id, "book deleted");
        Ok(())
    }

    // ---- clients ----

    /// All clients, ordered by name.
    pub async fn list_clients(&self) -> OpResult<Vec<Client>> {
        let snap = self.begin().await?;
        let mut clients = snap.state.clients;
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    pub async fn get_client(&self, id: ClientId) -> OpResult<Option<Client>> {
        let snap = self.begin().await?;
        Ok(snap.state.client(id).cloned())
    }

    pub async fn add_client(&self, draft: NewClient) -> OpResult<ClientId> {
        let snap = self.begin().await?;
        client::admit(&draft, None, &snap.state, Utc::now().date_naive())?;

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertClient(draft));
        let receipt = self.finish(snap.version, batch).await?;

        let id = ClientId::from(Self::assigned_id(&receipt)?);
        info!(client = %id, "client added");
        Ok(id)
    }

    pub async fn update_client(&self, mut client: Client) -> OpResult<()> {
        let snap = self.begin().await?;
        let Some(stored) = snap.state.client(client.id) else {
            return Err(DomainError::not_found("client").into());
        };
        // The untrustworthy flag is one-way; an edit can set it, never clear it.
        client.is_untrustworthy |= stored.is_untrustworthy;
        client::admit(
            &client.as_candidate(),
            Some(client.id),
            &snap.state,
            Utc::now().date_naive(),
        )?;

        let id = client.id;
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateClient(client));
        self.finish(snap.version, batch).await?;
        info!(client = %id, "client updated");
        Ok(())
    }

    /// Deletes the client and their closed borrowings; an open borrowing
    /// blocks the delete.
    pub async fn delete_client(&self, id: ClientId) -> OpResult<()> {
        let snap = self.begin().await?;
        client::admit_delete(id, &snap.state)?;

        let mut batch = WriteBatch::new();
        for borrowing in snap.state.borrowings_for_client(id) {
            batch.push(WriteOp::DeleteBorrowing(borrowing.id));
        }
        batch.push(WriteOp::DeleteClient(id));
        self.finish(snap.version, batch).await?;
        info!(client = %id, "client deleted");
        Ok(())
    }

    // ---- borrowings ----

    /// Open borrowings only, ordered by borrow date.
    pub async fn list_active_borrowings(&self) -> OpResult<Vec<Borrowing>> {
        let snap = self.begin().await?;
        let mut open: Vec<Borrowing> = snap
            .state
            .borrowings
            .into_iter()
            .filter(Borrowing::is_open)
            .collect();
        open.sort_by_key(|b| b.date_borrowed);
        Ok(open)
    }

    pub async fn get_borrowing(&self, id: BorrowingId) -> OpResult<Option<Borrowing>> {
        let snap = self.begin().await?;
        Ok(snap.state.borrowing(id).cloned())
    }

    /// Opens a borrowing at `date` (defaults to now).
    pub async fn borrow_book(
        &self,
        client_id: ClientId,
        book_id: BookId,
        date: Option<DateTime<Utc>>,
    ) -> OpResult<BorrowingId> {
        let snap = self.begin().await?;
        let now = Utc::now();
        borrowing::admit_borrow(client_id, book_id, &snap.state, now.date_naive(), now)?;

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertBorrowing(NewBorrowing {
            book_id,
            client_id,
            date_borrowed: date.unwrap_or(now),
        }));
        let receipt = self.finish(snap.version, batch).await?;

        let id = BorrowingId::from(Self::assigned_id(&receipt)?);
        info!(borrowing = %id, client = %client_id, book = %book_id, "book borrowed");
        Ok(id)
    }

    /// Closes the borrowing, computing its overdue status, then reassesses
    /// the client's trust standing.
    pub async fn return_book(&self, borrowing_id: BorrowingId) -> OpResult<()> {
        let snap = self.begin().await?;
        let now = Utc::now();
        let mut closed = borrowing::admit_return(borrowing_id, &snap.state)?.clone();

        let duration_limit = snap
            .state
            .book(closed.book_id)
            .and_then(|book| book.duration_limit);
        closed.close(now, duration_limit);
        debug!(
            borrowing = %closed.id,
            overdue = closed.is_overdue == Some(true),
            "borrowing closed"
        );

        let mut batch = WriteBatch::new();
        if let Some(flagged) = self.reassess_trust(&snap.state, &closed) {
            info!(client = %flagged.id, "client flagged untrustworthy");
            batch.push(WriteOp::UpdateClient(flagged));
        }
        batch.push(WriteOp::UpdateBorrowing(closed));
        self.finish(snap.version, batch).await?;
        Ok(())
    }

    /// Trust post-condition of the close transition: counts the client's
    /// overdue returns including the one just closed.
    fn reassess_trust(&self, state: &Snapshot, just_closed: &Borrowing) -> Option<Client> {
        let client = state.client(just_closed.client_id)?;
        let borrowings = state
            .borrowings_for_client(client.id)
            .filter(|b| b.id != just_closed.id)
            .chain(std::iter::once(just_closed));
        if borrowing::should_flag_untrustworthy(client, borrowings) {
            let mut flagged = client.clone();
            flagged.is_untrustworthy = true;
            Some(flagged)
        } else {
            None
        }
    }
}
