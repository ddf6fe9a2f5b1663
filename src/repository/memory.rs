//! In-process book store.
//!
//! Keeps books in insertion order behind a single lock, so every conditional
//! operation is atomic with respect to concurrent requests. Used by the test
//! suites and for running the server without a MongoDB instance.

use async_trait::async_trait;
use indexmap::IndexMap;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{BookRemoval, BookStore, CopiesAdjustment};
use crate::{
    error::AppResult,
    models::book::{Book, CreateBook},
};

#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<IndexMap<ObjectId, Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filtered(&self, keep: impl Fn(&Book) -> bool) -> Vec<Book> {
        self.books
            .read()
            .await
            .values()
            .filter(|book| keep(*book))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, data: CreateBook) -> AppResult<Book> {
        let id = ObjectId::new();
        let book = Book::new(id.to_hex(), data);
        self.books.write().await.insert(id, book.clone());
        Ok(book)
    }

    async fn find_all(&self) -> AppResult<Vec<Book>> {
        Ok(self.filtered(|_| true).await)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Book>> {
        Ok(self.books.read().await.get(id).cloned())
    }

    async fn find_by_category(&self, category: &str) -> AppResult<Vec<Book>> {
        Ok(self
            .filtered(|book| book.category.as_deref() == Some(category))
            .await)
    }

    async fn find_published_after(&self, year: i32) -> AppResult<Vec<Book>> {
        Ok(self
            .filtered(|book| book.published_year.is_some_and(|published| published > year))
            .await)
    }

    async fn adjust_copies(&self, id: &ObjectId, delta: i64) -> AppResult<CopiesAdjustment> {
        let mut books = self.books.write().await;
        let Some(book) = books.get_mut(id) else {
            return Ok(CopiesAdjustment::NotFound);
        };

        match book.available_copies.checked_add(delta) {
            Some(copies) if copies >= 0 => {
                book.available_copies = copies;
                Ok(CopiesAdjustment::Applied(book.clone()))
            }
            Some(_) => Ok(CopiesAdjustment::WouldGoNegative),
            None if delta < 0 => Ok(CopiesAdjustment::WouldGoNegative),
            None => Ok(CopiesAdjustment::WouldOverflow),
        }
    }

    async fn set_category(&self, id: &ObjectId, category: &str) -> AppResult<Option<Book>> {
        let mut books = self.books.write().await;
        Ok(books.get_mut(id).map(|book| {
            book.category = Some(category.to_string());
            book.clone()
        }))
    }

    async fn remove_if_no_copies(&self, id: &ObjectId) -> AppResult<BookRemoval> {
        let mut books = self.books.write().await;
        let copies = match books.get(id) {
            Some(book) => book.available_copies,
            None => return Ok(BookRemoval::NotFound),
        };
        if copies != 0 {
            return Ok(BookRemoval::HasCopies);
        }

        books.shift_remove(id);
        Ok(BookRemoval::Removed)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
