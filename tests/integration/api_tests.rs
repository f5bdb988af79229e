//! API integration tests against a running server backed by PostgreSQL.
//!
//! Start the server, then run with: cargo test --test integration -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

/// ISBN unique to this test run, so reruns don't collide on the constraint
fn unique_isbn(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

async fn create_book(client: &Client, isbn: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({ "title": "T", "author": "A", "isbn": isbn }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book ID")
}

async fn create_loan(client: &Client, isbn: &str, customer: &str) -> reqwest::Response {
    client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "isbn": isbn, "customer": customer }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_ready() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_is_rejected() {
    let client = Client::new();
    let isbn = unique_isbn("dup");
    create_book(&client, &isbn).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({ "title": "Other", "author": "B", "isbn": isbn }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0], "ISBN already being used");
}

#[tokio::test]
#[ignore]
async fn test_search_books_case_insensitive() {
    let client = Client::new();
    let isbn = unique_isbn("search");
    create_book(&client, &isbn).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .query(&[("isbn", isbn.to_uppercase()), ("size", "5".to_string())])
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["isbn"], isbn);
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let isbn = unique_isbn("loan");
    let book_id = create_book(&client, &isbn).await;

    let response = create_loan(&client, &isbn, "C").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_i64().expect("No loan ID");

    let response = create_loan(&client, &isbn, "C2").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0], "Book already loaned");

    let response = client
        .patch(format!("{}/loans/{}", BASE_URL, loan_id))
        .json(&json!({ "returned": true }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = create_loan(&client, &isbn, "C3").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .query(&[("isbn", isbn.as_str())])
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total"], 2);

    // Loans reference the book, so it can't be removed
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn set_returned(client: &Client, loan_id: i64, returned: bool) -> reqwest::Response {
    client
        .patch(format!("{}/loans/{}", BASE_URL, loan_id))
        .json(&json!({ "returned": returned }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore]
async fn test_list_loans_by_isbn_or_customer() {
    let client = Client::new();
    let first_isbn = unique_isbn("or-a");
    let second_isbn = unique_isbn("or-b");
    let customer = unique_isbn("customer");
    create_book(&client, &first_isbn).await;
    create_book(&client, &second_isbn).await;

    // One loan matches by isbn, the other only by customer
    let response = create_loan(&client, &first_isbn, "Someone").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = create_loan(&client, &second_isbn, &customer).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .query(&[("isbn", first_isbn.as_str()), ("customer", customer.as_str())])
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total"], 2);

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .query(&[("customer", customer.as_str())])
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["book"]["isbn"], second_isbn);
}

#[tokio::test]
#[ignore]
async fn test_reopening_loan_while_book_is_out_is_rejected() {
    let client = Client::new();
    let isbn = unique_isbn("reopen");
    create_book(&client, &isbn).await;

    let response = create_loan(&client, &isbn, "C").await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let first = body["id"].as_i64().expect("No loan ID");

    assert_eq!(set_returned(&client, first, true).await.status(), StatusCode::OK);
    let response = create_loan(&client, &isbn, "C2").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = set_returned(&client, first, false).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0], "Book already loaned");

    let response = client
        .get(format!("{}/loans/{}", BASE_URL, first))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["returned"], true);
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_book() {
    let client = Client::new();
    let book_id = create_book(&client, &unique_isbn("delete")).await;

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
