//! Repository layer for document-store operations

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook},
};

pub use memory::MemoryBookStore;
pub use mongo::MongoBookStore;

/// Result of a conditional copies increment
#[derive(Debug, Clone, PartialEq)]
pub enum CopiesAdjustment {
    Applied(Book),
    /// The increment would have taken `availableCopies` below zero
    WouldGoNegative,
    /// The increment would have taken `availableCopies` past `i64::MAX`
    WouldOverflow,
    NotFound,
}

/// Result of a conditional delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookRemoval {
    Removed,
    /// `availableCopies` is not zero
    HasCopies,
    NotFound,
}

/// Document-store collaborator holding the book collection.
///
/// Conditional operations (`adjust_copies`, `remove_if_no_copies`) must be
/// applied atomically by the implementation; callers never read-then-write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book; the store assigns its identifier
    async fn insert(&self, data: CreateBook) -> AppResult<Book>;

    /// All books in natural order
    async fn find_all(&self) -> AppResult<Vec<Book>>;

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Book>>;

    /// Exact, case-sensitive category match
    async fn find_by_category(&self, category: &str) -> AppResult<Vec<Book>>;

    /// Books with `publishedYear` strictly greater than `year`
    async fn find_published_after(&self, year: i32) -> AppResult<Vec<Book>>;

    /// Add `delta` to `availableCopies` unless the result would be negative
    /// or overflow
    async fn adjust_copies(&self, id: &ObjectId, delta: i64) -> AppResult<CopiesAdjustment>;

    /// Replace the category, returning the updated book
    async fn set_category(&self, id: &ObjectId, category: &str) -> AppResult<Option<Book>>;

    /// Delete the book only when it has no available copies
    async fn remove_if_no_copies(&self, id: &ObjectId) -> AppResult<BookRemoval>;

    /// Connectivity probe
    async fn ping(&self) -> AppResult<()>;
}
