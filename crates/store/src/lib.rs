//! Entity store boundary.
//!
//! This crate defines the persistence collaborator contract consumed by the
//! transaction coordinator (versioned snapshot reads plus atomic multi-row
//! commits) without making any storage assumptions, and ships an in-memory
//! reference implementation.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use r#trait::{
    CommitReceipt, EntityStore, ExpectedVersion, StoreError, VersionedSnapshot, WriteBatch, WriteOp,
};
