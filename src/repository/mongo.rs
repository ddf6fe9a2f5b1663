//! MongoDB-backed book store

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Client, Collection,
};
use serde::{Deserialize, Serialize};

use super::{BookRemoval, BookStore, CopiesAdjustment};
use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    models::book::{Book, CreateBook},
};

/// Stored layout of a book document
#[derive(Debug, Serialize, Deserialize)]
struct BookDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(flatten)]
    data: CreateBook,
}

impl BookDocument {
    fn into_book(self) -> AppResult<Book> {
        let id = self
            .id
            .ok_or_else(|| AppError::Internal("Stored book has no _id".to_string()))?;
        Ok(Book::new(id.to_hex(), self.data))
    }
}

#[derive(Clone)]
pub struct MongoBookStore {
    client: Client,
    books: Collection<BookDocument>,
}

impl MongoBookStore {
    /// Connect using the configured connection string and verify the server answers
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let client = Client::with_uri_str(&config.url).await?;
        let store = Self::from_client(client, &config.name, &config.collection);
        store.ping().await?;
        Ok(store)
    }

    pub fn from_client(client: Client, database: &str, collection: &str) -> Self {
        let books = client.database(database).collection::<BookDocument>(collection);
        Self { client, books }
    }

    /// Underlying client, used to close the connection pool on shutdown
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    async fn find_many(&self, filter: Document) -> AppResult<Vec<Book>> {
        let cursor = self.books.find(filter, None).await?;
        let documents: Vec<BookDocument> = cursor.try_collect().await?;
        documents.into_iter().map(BookDocument::into_book).collect()
    }

    async fn exists(&self, id: &ObjectId) -> AppResult<bool> {
        let count = self
            .books
            .count_documents(doc! { "_id": *id }, None)
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn insert(&self, data: CreateBook) -> AppResult<Book> {
        let document = BookDocument { id: None, data };
        let result = self.books.insert_one(&document, None).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Internal("Inserted book id is not an ObjectId".to_string()))?;
        Ok(Book::new(id.to_hex(), document.data))
    }

    async fn find_all(&self) -> AppResult<Vec<Book>> {
        self.find_many(doc! {}).await
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Book>> {
        self.books
            .find_one(doc! { "_id": *id }, None)
            .await?
            .map(BookDocument::into_book)
            .transpose()
    }

    async fn find_by_category(&self, category: &str) -> AppResult<Vec<Book>> {
        self.find_many(doc! { "category": category }).await
    }

    async fn find_published_after(&self, year: i32) -> AppResult<Vec<Book>> {
        self.find_many(doc! { "publishedYear": { "$gt": year } }).await
    }

    async fn adjust_copies(&self, id: &ObjectId, delta: i64) -> AppResult<CopiesAdjustment> {
        // Decrement: availableCopies + delta >= 0  <=>  availableCopies >= -delta.
        // Increment: availableCopies + delta <= i64::MAX.
        // i64::MIN has no positive counterpart, so nothing in stock can satisfy it.
        let bound = if delta < 0 {
            delta.checked_neg().map(|floor| doc! { "$gte": floor })
        } else {
            Some(doc! { "$lte": i64::MAX - delta })
        };

        if let Some(bound) = bound {
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            let updated = self
                .books
                .find_one_and_update(
                    doc! { "_id": *id, "availableCopies": bound },
                    doc! { "$inc": { "availableCopies": delta } },
                    options,
                )
                .await?;

            if let Some(document) = updated {
                return Ok(CopiesAdjustment::Applied(document.into_book()?));
            }
        }

        if !self.exists(id).await? {
            Ok(CopiesAdjustment::NotFound)
        } else if delta < 0 {
            Ok(CopiesAdjustment::WouldGoNegative)
        } else {
            Ok(CopiesAdjustment::WouldOverflow)
        }
    }

    async fn set_category(&self, id: &ObjectId, category: &str) -> AppResult<Option<Book>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.books
            .find_one_and_update(
                doc! { "_id": *id },
                doc! { "$set": { "category": category } },
                options,
            )
            .await?
            .map(BookDocument::into_book)
            .transpose()
    }

    async fn remove_if_no_copies(&self, id: &ObjectId) -> AppResult<BookRemoval> {
        let result = self
            .books
            .delete_one(doc! { "_id": *id, "availableCopies": 0 }, None)
            .await?;

        if result.deleted_count > 0 {
            Ok(BookRemoval::Removed)
        } else if self.exists(id).await? {
            Ok(BookRemoval::HasCopies)
        } else {
            Ok(BookRemoval::NotFound)
        }
    }

    async fn ping(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }
}
