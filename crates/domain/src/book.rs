//! Book entity and its admission rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use librarian_core::{BookId, DomainError, DomainResult, Entity, ShelfId};

use crate::shelf::Shelf;
use crate::snapshot::Snapshot;

/// A book occupying one position on a shelf.
///
/// `name` is the author; the `(title, name)` pair identifies the work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub name: String,
    pub shelf_id: ShelfId,
    pub position: u32,
    /// Minimum borrower age; absent means no restriction.
    pub age_limit: Option<u32>,
    /// Maximum borrowing duration in days; absent means unlimited.
    pub duration_limit: Option<u32>,
}

impl Book {
    /// Display label, e.g. `Frederick P. Brooks Jr. – The Mythical Man-Month`.
    pub fn display_text(&self) -> String {
        format!("{} – {}", self.name, self.title)
    }

    /// Physical locator label, e.g. `3-12` for shelf number 3, position 12.
    pub fn identifier_code(&self, shelf: &Shelf) -> String {
        format!("{}-{}", shelf.number, self.position)
    }

    /// The candidate view of this book's current field values.
    pub fn as_candidate(&self) -> NewBook {
        NewBook {
            title: self.title.clone(),
            name: self.name.clone(),
            shelf_id: self.shelf_id,
            position: self.position,
            age_limit: self.age_limit,
            duration_limit: self.duration_limit,
        }
    }
}

impl Entity for Book {
    type Id = BookId;

    fn id(&self) -> BookId {
        self.id
    }
}

/// A book candidate: the full post-edit field set submitted for admission.
/// Also the insert payload (the store assigns the id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub name: String,
    pub shelf_id: ShelfId,
    pub position: u32,
    pub age_limit: Option<u32>,
    pub duration_limit: Option<u32>,
}

impl NewBook {
    pub fn with_id(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            name: self.name,
            shelf_id: self.shelf_id,
            position: self.position,
            age_limit: self.age_limit,
            duration_limit: self.duration_limit,
        }
    }
}

/// Admit or reject a book candidate against current store state.
///
/// `prior` is the book's own id on update (excluded from uniqueness checks
/// and used to look up the active borrowing); `None` on add. `today`/`now`
/// feed the borrower-age and borrowing-duration rules.
pub fn admit(
    candidate: &NewBook,
    prior: Option<BookId>,
    snap: &Snapshot,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> DomainResult<()> {
    if candidate.position < 1 {
        return Err(DomainError::rule("Position", "Invalid value"));
    }

    let Some(shelf) = snap.shelf(candidate.shelf_id) else {
        return Err(DomainError::rule("ShelfId", "No such shelf"));
    };

    if candidate.position > shelf.capacity {
        return Err(DomainError::rule("Position", "Position exceeds shelf capacity"));
    }

    let collision = snap.books.iter().any(|b| {
        b.shelf_id == candidate.shelf_id && b.position == candidate.position && Some(b.id) != prior
    });
    if collision {
        return Err(DomainError::rule("Position", "There's already a book there"));
    }

    let duplicate_work = snap
        .books
        .iter()
        .any(|b| b.title == candidate.title && b.name == candidate.name && Some(b.id) != prior);
    if duplicate_work {
        return Err(DomainError::rule("Title", "There's already such a book"));
    }

    // Tightening a limit must not retroactively disqualify the current holder.
    if let Some(id) = prior {
        if let Some(active) = snap.open_borrowing_for_book(id) {
            if let (Some(limit), Some(holder)) = (candidate.age_limit, snap.client(active.client_id))
            {
                if i64::from(limit) >= i64::from(holder.age_on(today)) {
                    return Err(DomainError::rule(
                        "AgeLimit",
                        "The book is currently borrowed by a younger client",
                    ));
                }
            }

            if let Some(limit) = candidate.duration_limit {
                if i64::from(limit) < active.duration_days(now) {
                    return Err(DomainError::rule(
                        "DurationLimit",
                        "The book is currently borrowed longer",
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Admit or reject deleting the book with the given id.
pub fn admit_delete(id: BookId, snap: &Snapshot) -> DomainResult<()> {
    if snap.book(id).is_none() {
        return Err(DomainError::not_found("book"));
    }

    if snap.open_borrowing_for_book(id).is_some() {
        return Err(DomainError::rule("", "Can't delete the currently borrowed book"));
    }

    Ok(())
}
