//! Library inventory & lending domain.
//!
//! This crate contains the data model and all business rules, implemented
//! purely as deterministic domain logic (no IO, no storage). Every rule is a
//! function of a candidate entity plus an immutable [`Snapshot`] of store
//! state and, where the rule depends on time, an explicit clock input.

pub mod book;
pub mod borrowing;
pub mod client;
pub mod shelf;
pub mod snapshot;

pub use book::{Book, NewBook};
pub use borrowing::{Borrowing, NewBorrowing};
pub use client::{Client, NewClient};
pub use shelf::{NewShelf, Shelf};
pub use snapshot::Snapshot;
