#![allow(dead_code)]

//! Shared fixtures for the repository test suite.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Months, NaiveDate, Utc};

use librarian_core::{BookId, BorrowingId, ClientId, ShelfId};
use librarian_domain::{NewBook, NewClient, NewShelf};
use librarian_repository::Librarian;
use librarian_store::InMemoryStore;

static UNIQUE: AtomicUsize = AtomicUsize::new(0);

/// Per-process unique suffix for unique-indexed fields.
pub fn unique() -> usize {
    UNIQUE.fetch_add(1, Ordering::Relaxed) + 1
}

pub fn librarian() -> Librarian<InMemoryStore> {
    librarian_observability::init();
    Librarian::new(InMemoryStore::new())
}

pub async fn add_sample_shelf(
    repo: &Librarian<InMemoryStore>,
    number: u32,
    capacity: u32,
) -> ShelfId {
    repo.add_shelf(NewShelf {
        number,
        description: "Fine Arts".to_string(),
        capacity,
    })
    .await
    .unwrap()
}

pub fn sample_book(shelf_id: ShelfId, position: u32) -> NewBook {
    let n = unique();
    NewBook {
        title: format!("The Mythical Man-Month {n}"),
        name: format!("Frederick P. Brooks Jr. {n}"),
        shelf_id,
        position,
        age_limit: None,
        duration_limit: None,
    }
}

pub async fn add_sample_book(
    repo: &Librarian<InMemoryStore>,
    shelf_id: ShelfId,
    position: u32,
    age_limit: Option<u32>,
    duration_limit: Option<u32>,
) -> BookId {
    repo.add_book(NewBook {
        age_limit,
        duration_limit,
        ..sample_book(shelf_id, position)
    })
    .await
    .unwrap()
}

/// Birthdate that makes the client exactly `age` years old today.
pub fn birthdate_for_age(age: u32) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(age * 12))
        .unwrap()
}

pub async fn add_sample_client(
    repo: &Librarian<InMemoryStore>,
    age: u32,
    is_untrustworthy: bool,
) -> ClientId {
    let n = unique();
    repo.add_client(NewClient {
        name: format!("John Walker {n}"),
        birthdate: birthdate_for_age(age),
        is_untrustworthy,
    })
    .await
    .unwrap()
}

pub async fn add_sample_borrowing(
    repo: &Librarian<InMemoryStore>,
    client_id: ClientId,
    book_id: BookId,
    date: Option<chrono::DateTime<Utc>>,
) -> BorrowingId {
    repo.borrow_book(client_id, book_id, date).await.unwrap()
}
