//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are integers assigned by the entity store on insert; the
//! newtypes keep a shelf id from ever being passed where a book id belongs.

use serde::{Deserialize, Serialize};

/// Identifier of a shelf.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShelfId(i64);

/// Identifier of a book.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(i64);

/// Identifier of a client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(i64);

/// Identifier of a borrowing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowingId(i64);

macro_rules! impl_int_id {
    ($t:ty) => {
        impl $t {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$t> for i64 {
            fn from(id: $t) -> Self {
                id.0
            }
        }
    };
}

impl_int_id!(ShelfId);
impl_int_id!(BookId);
impl_int_id!(ClientId);
impl_int_id!(BorrowingId);
