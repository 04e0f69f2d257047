//! Shelf entity and its admission rules.

use serde::{Deserialize, Serialize};

use librarian_core::{DomainError, DomainResult, Entity, ShelfId};

use crate::snapshot::Snapshot;

/// Capacity assigned to a shelf when the caller does not pick one.
pub const DEFAULT_CAPACITY: u32 = 20;

/// A physical shelf holding books at numbered positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    pub id: ShelfId,
    pub number: u32,
    pub description: String,
    pub capacity: u32,
}

impl Shelf {
    /// Display label, e.g. `3 (Fine Arts)`.
    pub fn display_text(&self) -> String {
        format!("{} ({})", self.number, self.description)
    }

    /// The candidate view of this shelf's current field values.
    pub fn as_candidate(&self) -> NewShelf {
        NewShelf {
            number: self.number,
            description: self.description.clone(),
            capacity: self.capacity,
        }
    }
}

impl Entity for Shelf {
    type Id = ShelfId;

    fn id(&self) -> ShelfId {
        self.id
    }
}

/// A shelf candidate: the full post-edit field set submitted for admission.
/// Also the insert payload (the store assigns the id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShelf {
    pub number: u32,
    pub description: String,
    pub capacity: u32,
}

impl NewShelf {
    pub fn with_id(self, id: ShelfId) -> Shelf {
        Shelf {
            id,
            number: self.number,
            description: self.description,
            capacity: self.capacity,
        }
    }
}

impl Default for NewShelf {
    fn default() -> Self {
        Self {
            number: 1,
            description: String::new(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Admit or reject a shelf candidate against current store state.
///
/// `prior` is the shelf's own id on update (excluded from uniqueness checks);
/// `None` on add.
pub fn admit(candidate: &NewShelf, prior: Option<ShelfId>, snap: &Snapshot) -> DomainResult<()> {
    if candidate.number < 1 {
        return Err(DomainError::rule("Number", "Invalid value"));
    }

    if candidate.description.trim().is_empty() {
        return Err(DomainError::rule("Description", "Invalid value"));
    }

    let duplicate_number = snap
        .shelves
        .iter()
        .any(|s| s.number == candidate.number && Some(s.id) != prior);
    if duplicate_number {
        return Err(DomainError::rule("Number", "Such number already exists"));
    }

    // Never shrink capacity below existing occupancy.
    if let Some(id) = prior {
        if candidate.capacity < snap.max_position_on_shelf(id) {
            return Err(DomainError::rule(
                "Capacity",
                "An existing book position exceeds the capacity",
            ));
        }
    }

    Ok(())
}

/// Admit or reject deleting the shelf with the given id.
pub fn admit_delete(id: ShelfId, snap: &Snapshot) -> DomainResult<()> {
    if snap.shelf(id).is_none() {
        return Err(DomainError::not_found("shelf"));
    }

    let holds_borrowed_book = snap
        .books_on_shelf(id)
        .any(|book| snap.open_borrowing_for_book(book.id).is_some());
    if holds_borrowed_book {
        return Err(DomainError::rule("", "Shelf contains currently borrowed books"));
    }

    Ok(())
}
