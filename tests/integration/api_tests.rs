//! API integration tests

use std::{future::Future, sync::Arc};

use catalog_server::{
    api::create_router,
    config::AppConfig,
    repository::{BookStore, MemoryBookStore, MongoBookStore},
    AppState,
};
use mongodb::bson::{oid::ObjectId, Document};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
async fn spawn_server(store: Arc<dyn BookStore>) -> String {
    let app = create_router(AppState::new(AppConfig::default(), store));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

async fn spawn_test_server() -> String {
    spawn_server(Arc::new(MemoryBookStore::new())).await
}

/// Run a scenario against a server backed by a fresh MongoDB collection,
/// dropping the collection afterwards.
async fn on_mongodb<F, Fut>(scenario: F)
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut config = AppConfig::default();
    if let Ok(url) = std::env::var("MONGODB_URI") {
        config.database.url = url;
    }
    config.database.name = "libraryDB_test".to_string();
    config.database.collection = format!("books_{}", ObjectId::new().to_hex());

    let store = MongoBookStore::connect(&config.database)
        .await
        .expect("Failed to connect to MongoDB");
    let client = store.client();
    let base = spawn_server(Arc::new(store)).await;

    scenario(base).await;

    client
        .database(&config.database.name)
        .collection::<Document>(&config.database.collection)
        .drop(None)
        .await
        .expect("Failed to drop test collection");
}

async fn fetch(client: &Client, base: &str, id: &str) -> Value {
    client
        .get(format!("{}/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn patch_copies(client: &Client, url: &str, body: Value) -> reqwest::Response {
    client.patch(url).json(&body).send().await.unwrap()
}

async fn create(client: &Client, base: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}/", base))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn list(client: &Client, url: String) -> Vec<Value> {
    let response = client.get(url).send().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.expect("Failed to parse response")
}

async fn error_of(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse response");
    body["error"].as_str().expect("No error message").to_string()
}

fn titles(books: &[Value]) -> Vec<&str> {
    books.iter().map(|b| b["title"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn test_health_check() {
    let base = spawn_test_server().await;
    let client = Client::new();

    let response = client.get(format!("{}/health", base)).send().await.unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let response = client.get(format!("{}/ready", base)).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_create_assigns_id_and_lists_book() {
    let base = spawn_test_server().await;
    let client = Client::new();

    let book = create(
        &client,
        &base,
        json!({"title": "Dune", "category": "fiction", "publishedYear": 1965, "availableCopies": 2}),
    )
    .await;
    let id = book["_id"].as_str().expect("No book ID");
    assert_eq!(id.len(), 24);
    assert_eq!(book["availableCopies"], 2);

    let books = list(&client, format!("{}/", base)).await;
    assert_eq!(books, vec![book.clone()]);
}

#[tokio::test]
async fn test_create_invalid_data() {
    let base = spawn_test_server().await;
    let client = Client::new();

    for body in [
        json!({"category": "fiction"}),
        json!({"title": ""}),
        json!({"title": "X", "publishedYear": "recent"}),
        json!({"title": "X", "availableCopies": -3}),
        json!(["not", "an", "object"]),
    ] {
        let response = client
            .post(format!("{}/", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(error_of(response).await, "Invalid book data");
    }

    let response = client
        .post(format!("{}/", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(list(&client, format!("{}/", base)).await.is_empty());
}

#[tokio::test]
async fn test_get_book_by_id() {
    let base = spawn_test_server().await;
    let client = Client::new();

    let book = create(&client, &base, json!({"title": "Emma", "isbn": "978-0141439587"})).await;
    let id = book["_id"].as_str().unwrap();

    let response = client.get(format!("{}/{}", base, id)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched, book);
    assert_eq!(fetched["isbn"], "978-0141439587");

    let response = client.get(format!("{}/not-a-valid-id", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Invalid book ID");

    let response = client
        .get(format!("{}/65a1b2c3d4e5f60718293a4b", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(response).await, "Book not found");
}

#[tokio::test]
async fn test_list_by_category() {
    let base = spawn_test_server().await;
    let client = Client::new();

    create(&client, &base, json!({"title": "A", "category": "fiction"})).await;
    create(&client, &base, json!({"title": "B", "category": "history"})).await;
    create(&client, &base, json!({"title": "C", "category": "fiction"})).await;
    create(&client, &base, json!({"title": "D", "category": "Fiction"})).await;

    let books = list(&client, format!("{}/category/fiction", base)).await;
    assert_eq!(titles(&books), ["A", "C"]);

    let books = list(&client, format!("{}/category/poetry", base)).await;
    assert!(books.is_empty());
}

#[tokio::test]
async fn test_list_published_after_year() {
    let base = spawn_test_server().await;
    let client = Client::new();

    create(&client, &base, json!({"title": "Old", "publishedYear": 1999})).await;
    create(&client, &base, json!({"title": "Edge", "publishedYear": 2015})).await;
    create(&client, &base, json!({"title": "New", "publishedYear": 2020})).await;
    create(&client, &base, json!({"title": "Undated"})).await;

    let books = list(&client, format!("{}/after/2015", base)).await;
    assert_eq!(titles(&books), ["New"]);

    // Numeric, not lexical: 999 < 1999
    let books = list(&client, format!("{}/after/999", base)).await;
    assert_eq!(titles(&books), ["Old", "Edge", "New"]);

    let response = client.get(format!("{}/after/soon", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Invalid year");
}

async fn adjust_copies_scenario(base: String) {
    let client = Client::new();

    let book = create(&client, &base, json!({"title": "X", "availableCopies": 5})).await;
    let id = book["_id"].as_str().unwrap();
    let url = format!("{}/{}/copies", base, id);

    let response = patch_copies(&client, &url, json!({"addCopies": -10})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Negative stock not allowed");

    let response = patch_copies(&client, &url, json!({"addCopies": "3"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Invalid update");

    let response = patch_copies(&client, &url, json!({"addCopies": 1.5})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Invalid update");

    assert_eq!(fetch(&client, &base, id).await["availableCopies"], 5);

    let response = patch_copies(&client, &url, json!({"addCopies": 3})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["availableCopies"], 8);
    assert_eq!(fetch(&client, &base, id).await["availableCopies"], 8);

    let response = patch_copies(&client, &url, json!({"addCopies": -2.0})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["availableCopies"], 6);

    // Down to exactly zero is allowed
    let response = patch_copies(&client, &url, json!({"addCopies": -6})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fetch(&client, &base, id).await["availableCopies"], 0);

    let response = patch_copies(
        &client,
        &format!("{}/65a1b2c3d4e5f60718293a4b/copies", base),
        json!({"addCopies": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(response).await, "Book not found");
}

#[tokio::test]
async fn test_adjust_copies() {
    adjust_copies_scenario(spawn_test_server().await).await;
}

#[tokio::test]
#[ignore] // Requires MongoDB; run with: MONGODB_URI=mongodb://127.0.0.1:27017 cargo test -- --ignored
async fn test_adjust_copies_on_mongodb() {
    on_mongodb(adjust_copies_scenario).await;
}

async fn extreme_copies_deltas_scenario(base: String) {
    let client = Client::new();

    let book = create(&client, &base, json!({"title": "X", "availableCopies": 5})).await;
    let id = book["_id"].as_str().unwrap();
    let url = format!("{}/{}/copies", base, id);

    let response = patch_copies(&client, &url, json!({"addCopies": i64::MAX})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Invalid update");

    let response = patch_copies(&client, &url, json!({"addCopies": i64::MIN})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Negative stock not allowed");

    assert_eq!(fetch(&client, &base, id).await["availableCopies"], 5);

    let response = patch_copies(
        &client,
        &format!("{}/65a1b2c3d4e5f60718293a4b/copies", base),
        json!({"addCopies": i64::MIN}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_extreme_copies_deltas() {
    extreme_copies_deltas_scenario(spawn_test_server().await).await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn test_extreme_copies_deltas_on_mongodb() {
    on_mongodb(extreme_copies_deltas_scenario).await;
}

async fn concurrent_copies_scenario(base: String) {
    let client = Client::new();

    let book = create(&client, &base, json!({"title": "Popular"})).await;
    let id = book["_id"].as_str().unwrap().to_string();
    let url = format!("{}/{}/copies", base, id);

    let requests: Vec<_> = (0..20)
        .map(|_| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                patch_copies(&client, &url, json!({"addCopies": 1}))
                    .await
                    .status()
            })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(fetch(&client, &base, &id).await["availableCopies"], 20);

    // Racing decrements never take the stock below zero
    let requests: Vec<_> = (0..30)
        .map(|_| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                patch_copies(&client, &url, json!({"addCopies": -1}))
                    .await
                    .status()
            })
        })
        .collect();
    let mut applied = 0;
    for request in requests {
        let status = request.await.unwrap();
        if status == StatusCode::OK {
            applied += 1;
        } else {
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }
    assert_eq!(applied, 20);
    assert_eq!(fetch(&client, &base, &id).await["availableCopies"], 0);
}

#[tokio::test]
async fn test_concurrent_copy_adjustments_are_not_lost() {
    concurrent_copies_scenario(spawn_test_server().await).await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn test_concurrent_copy_adjustments_are_not_lost_on_mongodb() {
    on_mongodb(concurrent_copies_scenario).await;
}

async fn change_category_scenario(base: String) {
    let client = Client::new();

    let book = create(&client, &base, json!({"title": "X", "category": "fiction"})).await;
    let id = book["_id"].as_str().unwrap();
    let url = format!("{}/{}/category", base, id);

    for body in [json!({"category": ""}), json!({}), json!({"category": 7})] {
        let response = client.patch(&url).json(&body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(error_of(response).await, "Invalid update");
    }

    let response = client
        .patch(&url)
        .json(&json!({"category": "classics"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["category"], "classics");
    assert_eq!(fetch(&client, &base, id).await["category"], "classics");

    let response = client
        .patch(format!("{}/65a1b2c3d4e5f60718293a4b/category", base))
        .json(&json!({"category": "classics"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_category() {
    change_category_scenario(spawn_test_server().await).await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn test_change_category_on_mongodb() {
    on_mongodb(change_category_scenario).await;
}

async fn delete_requires_zero_copies_scenario(base: String) {
    let client = Client::new();

    let stocked = create(&client, &base, json!({"title": "Stocked", "availableCopies": 1})).await;
    let empty = create(&client, &base, json!({"title": "Empty", "availableCopies": 0})).await;

    let response = client
        .delete(format!("{}/{}", base, stocked["_id"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Cannot delete book with available copies");

    let response = client
        .delete(format!("{}/{}", base, empty["_id"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let books = list(&client, format!("{}/", base)).await;
    assert_eq!(books, vec![stocked]);

    let response = client
        .delete(format!("{}/{}", base, empty["_id"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_requires_zero_copies() {
    delete_requires_zero_copies_scenario(spawn_test_server().await).await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn test_delete_requires_zero_copies_on_mongodb() {
    on_mongodb(delete_requires_zero_copies_scenario).await;
}

async fn insert_delete_get_scenario(base: String) {
    let client = Client::new();

    let book = create(
        &client,
        &base,
        json!({"title": "X", "category": "fiction", "publishedYear": 2020, "availableCopies": 0}),
    )
    .await;
    let id = book["_id"].as_str().unwrap();

    let response = client.delete(format!("{}/{}", base, id)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Book removed successfully"}));

    let response = client.get(format!("{}/{}", base, id)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insert_delete_get_scenario() {
    insert_delete_get_scenario(spawn_test_server().await).await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn test_insert_delete_get_scenario_on_mongodb() {
    on_mongodb(insert_delete_get_scenario).await;
}
