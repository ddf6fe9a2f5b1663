//! Catalog management service

use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use validator::Validate;

use crate::{
    error::{messages, AppError, AppResult},
    models::book::{Book, CreateBook, UpdateCategory, UpdateCopies},
    repository::{BookRemoval, BookStore, CopiesAdjustment},
};

/// Parse a client-supplied identifier into the store's key type
pub fn parse_book_id(id: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| AppError::invalid_book_id())
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn BookStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a new book
    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        data.validate().map_err(|e| {
            tracing::debug!("Rejected book data: {}", e);
            AppError::invalid_book_data()
        })?;

        let book = self.store.insert(data.without_reserved_fields()).await?;
        tracing::info!("Catalog create: book id={} title={:?}", book.id, book.title);
        Ok(book)
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.store.find_all().await
    }

    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        let id = parse_book_id(id)?;
        self.store
            .find_by_id(&id)
            .await?
            .ok_or_else(AppError::book_not_found)
    }

    pub async fn books_by_category(&self, category: &str) -> AppResult<Vec<Book>> {
        self.store.find_by_category(category).await
    }

    /// Books published strictly after `year`; the year is compared numerically
    pub async fn books_published_after(&self, year: &str) -> AppResult<Vec<Book>> {
        let year: i32 = year
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(messages::INVALID_YEAR.to_string()))?;
        self.store.find_published_after(year).await
    }

    /// Apply a signed copies delta; the stock can never drop below zero
    pub async fn adjust_copies(&self, id: &str, update: UpdateCopies) -> AppResult<Book> {
        let id = parse_book_id(id)?;

        match self.store.adjust_copies(&id, update.add_copies).await? {
            CopiesAdjustment::Applied(book) => {
                tracing::info!(
                    "Catalog copies: book id={} delta={} now={}",
                    book.id,
                    update.add_copies,
                    book.available_copies
                );
                Ok(book)
            }
            CopiesAdjustment::WouldGoNegative => {
                tracing::warn!("Catalog copies: delta {} rejected for book id={}", update.add_copies, id);
                Err(AppError::BusinessRule(messages::NEGATIVE_STOCK.to_string()))
            }
            CopiesAdjustment::WouldOverflow => {
                tracing::warn!("Catalog copies: delta {} overflows book id={}", update.add_copies, id);
                Err(AppError::invalid_update())
            }
            CopiesAdjustment::NotFound => Err(AppError::book_not_found()),
        }
    }

    pub async fn change_category(&self, id: &str, update: UpdateCategory) -> AppResult<Book> {
        update.validate().map_err(|_| AppError::invalid_update())?;
        let id = parse_book_id(id)?;

        let book = self
            .store
            .set_category(&id, &update.category)
            .await?
            .ok_or_else(AppError::book_not_found)?;
        tracing::info!("Catalog category: book id={} category={:?}", book.id, update.category);
        Ok(book)
    }

    /// Remove a book; only allowed once no copies are available
    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        let id = parse_book_id(id)?;

        match self.store.remove_if_no_copies(&id).await? {
            BookRemoval::Removed => {
                tracing::info!("Catalog delete: book id={}", id);
                Ok(())
            }
            BookRemoval::HasCopies => {
                tracing::warn!("Catalog delete: book id={} still has copies", id);
                Err(AppError::BusinessRule(messages::BOOK_HAS_COPIES.to_string()))
            }
            BookRemoval::NotFound => Err(AppError::book_not_found()),
        }
    }

    /// Readiness probe against the store
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
