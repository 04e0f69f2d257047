//! Immutable view of store state, handed to the rule checkers.
//!
//! Checkers never traverse live object graphs; every rule is evaluated
//! against one of these point-in-time copies, which keeps the rules pure
//! and independently testable.

use serde::{Deserialize, Serialize};

use librarian_core::{BookId, BorrowingId, ClientId, Entity, ShelfId};

use crate::book::Book;
use crate::borrowing::Borrowing;
use crate::client::Client;
use crate::shelf::Shelf;

/// A consistent copy of all four collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub shelves: Vec<Shelf>,
    pub books: Vec<Book>,
    pub clients: Vec<Client>,
    pub borrowings: Vec<Borrowing>,
}

fn find<E: Entity>(items: &[E], id: E::Id) -> Option<&E> {
    items.iter().find(|e| e.id() == id)
}

impl Snapshot {
    pub fn shelf(&self, id: ShelfId) -> Option<&Shelf> {
        find(&self.shelves, id)
    }

    pub fn book(&self, id: BookId) -> Option<&Book> {
        find(&self.books, id)
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        find(&self.clients, id)
    }

    pub fn borrowing(&self, id: BorrowingId) -> Option<&Borrowing> {
        find(&self.borrowings, id)
    }

    pub fn books_on_shelf(&self, id: ShelfId) -> impl Iterator<Item = &Book> {
        self.books.iter().filter(move |b| b.shelf_id == id)
    }

    /// Highest occupied position on the shelf; 0 for an empty shelf.
    pub fn max_position_on_shelf(&self, id: ShelfId) -> u32 {
        self.books_on_shelf(id)
            .map(|b| b.position)
            .max()
            .unwrap_or(0)
    }

    /// The book's active borrowing, if any. At most one exists at a time.
    pub fn open_borrowing_for_book(&self, id: BookId) -> Option<&Borrowing> {
        self.borrowings
            .iter()
            .find(|b| b.book_id == id && b.is_open())
    }

    pub fn open_borrowings_for_client(&self, id: ClientId) -> impl Iterator<Item = &Borrowing> {
        self.borrowings
            .iter()
            .filter(move |b| b.client_id == id && b.is_open())
    }

    pub fn borrowings_for_book(&self, id: BookId) -> impl Iterator<Item = &Borrowing> {
        self.borrowings.iter().filter(move |b| b.book_id == id)
    }

    pub fn borrowings_for_client(&self, id: ClientId) -> impl Iterator<Item = &Borrowing> {
        self.borrowings.iter().filter(move |b| b.client_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn empty_shelf_has_vacuous_max_position_zero() {
        let snap = Snapshot::default();
        assert_eq!(snap.max_position_on_shelf(ShelfId::new(1)), 0);
    }

    #[test]
    fn open_borrowing_lookup_skips_closed_ones() {
        let now = Utc::now();
        let snap = Snapshot {
            borrowings: vec![
                Borrowing {
                    id: BorrowingId::new(1),
                    book_id: BookId::new(9),
                    client_id: ClientId::new(3),
                    date_borrowed: now,
                    date_returned: Some(now),
                    is_overdue: Some(false),
                },
                Borrowing {
                    id: BorrowingId::new(2),
                    book_id: BookId::new(9),
                    client_id: ClientId::new(4),
                    date_borrowed: now,
                    date_returned: None,
                    is_overdue: None,
                },
            ],
            ..Snapshot::default()
        };

        let open = snap.open_borrowing_for_book(BookId::new(9)).unwrap();
        assert_eq!(open.id, BorrowingId::new(2));
        assert_eq!(snap.open_borrowings_for_client(ClientId::new(3)).count(), 0);
        assert_eq!(snap.borrowings_for_book(BookId::new(9)).count(), 2);
    }
}
