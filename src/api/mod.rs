//! API handlers and router for the catalog REST endpoints

pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/", get(books::list_books).post(books::create_book))
        .route("/category/:category", get(books::list_by_category))
        .route("/after/:year", get(books::list_published_after))
        .route("/:id", get(books::get_book).delete(books::delete_book))
        .route("/:id/copies", patch(books::adjust_copies))
        .route("/:id/category", patch(books::change_category))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
