//! Book endpoints, mounted at the resource root

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{messages, AppError, AppResult},
    models::book::{Book, CreateBook, MessageResponse, UpdateCategory, UpdateCopies},
};

/// Create a new book
#[utoipa::path(
    post,
    path = "/",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid book data", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let Json(data) = payload.map_err(|e| {
        tracing::debug!("Rejected create body: {}", e);
        AppError::invalid_book_data()
    })?;

    let created = state.services.catalog.create_book(data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List all books
#[utoipa::path(
    get,
    path = "/",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 400, description = "Invalid book ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(&id).await?;
    Ok(Json(book))
}

/// List books of a category (exact match)
#[utoipa::path(
    get,
    path = "/category/{category}",
    tag = "books",
    params(("category" = String, Path, description = "Category, case-sensitive")),
    responses(
        (status = 200, description = "Books in the category", body = Vec<Book>)
    )
)]
pub async fn list_by_category(
    State(state): State<crate::AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.books_by_category(&category).await?;
    Ok(Json(books))
}

/// List books published after a year
#[utoipa::path(
    get,
    path = "/after/{year}",
    tag = "books",
    params(("year" = i32, Path, description = "Exclusive lower bound on publishedYear")),
    responses(
        (status = 200, description = "Books published after the year", body = Vec<Book>),
        (status = 400, description = "Invalid year", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_published_after(
    State(state): State<crate::AppState>,
    Path(year): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.books_published_after(&year).await?;
    Ok(Json(books))
}

/// Add or remove available copies
#[utoipa::path(
    patch,
    path = "/{id}/copies",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    request_body = UpdateCopies,
    responses(
        (status = 200, description = "Copies updated", body = Book),
        (status = 400, description = "Invalid update or negative stock", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn adjust_copies(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCopies>, JsonRejection>,
) -> AppResult<Json<Book>> {
    let Json(update) = payload.map_err(|_| AppError::invalid_update())?;
    let book = state.services.catalog.adjust_copies(&id, update).await?;
    Ok(Json(book))
}

/// Change the category of a book
#[utoipa::path(
    patch,
    path = "/{id}/category",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated", body = Book),
        (status = 400, description = "Invalid update", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_category(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCategory>, JsonRejection>,
) -> AppResult<Json<Book>> {
    let Json(update) = payload.map_err(|_| AppError::invalid_update())?;
    let book = state.services.catalog.change_category(&id, update).await?;
    Ok(Json(book))
}

/// Delete a book that has no available copies
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book removed", body = MessageResponse),
        (status = 400, description = "Book still has available copies", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_book(&id).await?;
    Ok(Json(MessageResponse {
        message: messages::BOOK_REMOVED.to_string(),
    }))
}
