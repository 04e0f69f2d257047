//! Borrowing lifecycle: the open → closed state machine, its admission
//! rules, and the trust reassessment that follows a return.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use librarian_core::{BookId, BorrowingId, ClientId, DomainError, DomainResult, Entity};

use crate::client::Client;
use crate::snapshot::Snapshot;

/// How many borrowings a client may hold open at once.
pub const OPEN_LIMIT: usize = 3;
/// The tighter limit applied to untrustworthy clients.
pub const UNTRUSTWORTHY_OPEN_LIMIT: usize = 1;
/// Overdue returns after which a client is flagged untrustworthy.
pub const UNTRUSTWORTHY_OVERDUE_COUNT: usize = 3;

/// One client holding one book for a span of time.
///
/// Open while `date_returned` is absent; closing sets `date_returned` and
/// computes `is_overdue` exactly once. There is no reopening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrowing {
    pub id: BorrowingId,
    pub book_id: BookId,
    pub client_id: ClientId,
    pub date_borrowed: DateTime<Utc>,
    pub date_returned: Option<DateTime<Utc>>,
    /// Computed on close; absent while open.
    pub is_overdue: Option<bool>,
}

impl Borrowing {
    pub fn is_open(&self) -> bool {
        self.date_returned.is_none()
    }

    /// Whole days between `date_borrowed` and the return date (or `now` while
    /// still open), floored.
    pub fn duration_days(&self, now: DateTime<Utc>) -> i64 {
        (self.date_returned.unwrap_or(now) - self.date_borrowed).num_days()
    }

    /// The open → closed transition.
    ///
    /// `duration_limit` is the borrowed book's limit; an absent limit can
    /// never be overdue.
    pub fn close(&mut self, returned_at: DateTime<Utc>, duration_limit: Option<u32>) {
        let duration = (returned_at - self.date_borrowed).num_days();
        self.date_returned = Some(returned_at);
        self.is_overdue = Some(duration_limit.is_some_and(|limit| duration > i64::from(limit)));
    }
}

impl Entity for Borrowing {
    type Id = BorrowingId;

    fn id(&self) -> BorrowingId {
        self.id
    }
}

/// Insert payload for the borrow operation: always opens in the Open state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBorrowing {
    pub book_id: BookId,
    pub client_id: ClientId,
    pub date_borrowed: DateTime<Utc>,
}

impl NewBorrowing {
    pub fn with_id(self, id: BorrowingId) -> Borrowing {
        Borrowing {
            id,
            book_id: self.book_id,
            client_id: self.client_id,
            date_borrowed: self.date_borrowed,
            date_returned: None,
            is_overdue: None,
        }
    }
}

/// Borrow preconditions, checked in order; the first failure wins.
pub fn admit_borrow(
    client_id: ClientId,
    book_id: BookId,
    snap: &Snapshot,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> DomainResult<()> {
    let Some(book) = snap.book(book_id) else {
        return Err(DomainError::not_found("book"));
    };

    if snap.open_borrowing_for_book(book_id).is_some() {
        return Err(DomainError::rule("BookId", "The book is already borrowed"));
    }

    let Some(client) = snap.client(client_id) else {
        return Err(DomainError::not_found("client"));
    };

    // An outstanding overdue item blocks any new borrowing.
    let holds_overdue = snap.open_borrowings_for_client(client_id).any(|b| {
        snap.book(b.book_id)
            .and_then(|held| held.duration_limit)
            .is_some_and(|limit| b.duration_days(now) > i64::from(limit))
    });
    if holds_overdue {
        return Err(DomainError::rule("ClientId", "Another borrowing is overdue"));
    }

    let open_count = snap.open_borrowings_for_client(client_id).count();
    if !client.is_untrustworthy && open_count >= OPEN_LIMIT {
        return Err(DomainError::rule("ClientId", "Borrowing limit exceeded"));
    }
    if client.is_untrustworthy && open_count >= UNTRUSTWORTHY_OPEN_LIMIT {
        return Err(DomainError::rule(
            "ClientId",
            "Untrustworthy borrowing limit exceeded",
        ));
    }

    let too_young = book
        .age_limit
        .is_some_and(|limit| i64::from(client.age_on(today)) < i64::from(limit));
    if too_young {
        return Err(DomainError::rule("ClientId", "Age restriction is not satisfied"));
    }

    Ok(())
}

/// Return preconditions: the borrowing exists and is still open.
pub fn admit_return(id: BorrowingId, snap: &Snapshot) -> DomainResult<&Borrowing> {
    let Some(borrowing) = snap.borrowing(id) else {
        return Err(DomainError::not_found("borrowing"));
    };

    if !borrowing.is_open() {
        return Err(DomainError::rule("", "Borrowing is already closed"));
    }

    Ok(borrowing)
}

/// Trust reassessment, evaluated after each close.
///
/// One-way: returns `true` only for a client not yet flagged whose overdue
/// returns (including the one just closed) have reached the threshold. The
/// flag is never cleared.
pub fn should_flag_untrustworthy<'a, I>(client: &Client, borrowings: I) -> bool
where
    I: IntoIterator<Item = &'a Borrowing>,
{
    if client.is_untrustworthy {
        return false;
    }

    let overdue_returns = borrowings
        .into_iter()
        .filter(|b| b.client_id == client.id && b.is_overdue == Some(true))
        .count();
    overdue_returns >= UNTRUSTWORTHY_OVERDUE_COUNT
}
