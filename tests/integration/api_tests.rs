//! API integration tests.
//!
//! These run against a live server on localhost:8080 with a seeded staff
//! account (admin/adminpass). Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to log in and get a bearer token
async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    login(client, "admin", "adminpass").await
}

/// Create a throwaway member account and return its token
async fn signup_member(client: &Client, username: &str) -> String {
    let response = client
        .post(format!("{}/users/signup", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "memberpass",
            "name": "Member",
            "user_type": "enrolled"
        }))
        .send()
        .await
        .expect("Failed to send signup request");
    assert_eq!(response.status(), 201);

    login(client, username, "memberpass").await
}

/// Create a catalog entry with a unique code and return (id, code)
async fn create_book(client: &Client, token: &str, code: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "book_code": code,
            "title": "Integration Test Book",
            "author": "Tester"
        }))
        .send()
        .await
        .expect("Failed to send create book request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book ID")
}

fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("{}{}", prefix, nanos)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .get(format!("{}/users/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "admin");
    assert_eq!(body["is_staff"], true);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_search_term_too_short() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?q=a", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_rental_requires_auth() {
    let client = Client::new();

    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .json(&json!({ "code": "REG-000" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_borrow_unknown_code() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "code": "NO-SUCH-CODE" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_rental_lifecycle() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let code = unique("REG-");
    let book_id = create_book(&client, &admin, &code).await;

    let member = signup_member(&client, &unique("reader")).await;

    // Borrow
    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "code": code }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let rental: Value = response.json().await.expect("Failed to parse response");
    let rental_id = rental["id"].as_i64().expect("No rental ID");

    // Book is now RENTED
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "RENTED");

    // Borrowing the same copy again fails with the rule code
    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "code": code }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Return
    let response = client
        .post(format!("{}/rentals/{}/return", BASE_URL, rental_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Returning twice fails
    let response = client
        .post(format!("{}/rentals/{}/return", BASE_URL, rental_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Book is free again
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "AVAILABLE");

    // Cleanup
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_reserve_available_book_rejected() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let book_id = create_book(&client, &admin, &unique("REG-")).await;

    // An AVAILABLE book can be borrowed directly, not reserved
    let response = client
        .post(format!("{}/books/{}/reserve", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_reservation_cancel_is_idempotent() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let code = unique("REG-");
    let book_id = create_book(&client, &admin, &code).await;

    let borrower = signup_member(&client, &unique("borrower")).await;
    let holder = signup_member(&client, &unique("holder")).await;

    // Borrower takes the copy, holder queues a reservation
    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .header("Authorization", format!("Bearer {}", borrower))
        .json(&json!({ "code": code }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let rental: Value = response.json().await.expect("Failed to parse response");
    let rental_id = rental["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/books/{}/reserve", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", holder))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let reservation: Value = response.json().await.expect("Failed to parse response");
    let reservation_id = reservation["id"].as_i64().unwrap();

    // Duplicate reservation by the same user is rejected
    let response = client
        .post(format!("{}/books/{}/reserve", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", holder))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // First cancel changes state, second does not
    let response = client
        .post(format!("{}/reservations/{}/cancel", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", holder))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["changed"], true);

    let response = client
        .post(format!("{}/reservations/{}/cancel", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", holder))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["changed"], false);

    // Cleanup
    let _ = client
        .post(format!("{}/rentals/{}/return", BASE_URL, rental_id))
        .header("Authorization", format!("Bearer {}", borrower))
        .send()
        .await;
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_sweep_requires_staff() {
    let client = Client::new();
    let member = signup_member(&client, &unique("sweeper")).await;

    let response = client
        .post(format!("{}/reservations/sweep", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_sweep_is_idempotent() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    // Back-to-back sweeps: the second finds nothing new to expire
    let response = client
        .post(format!("{}/reservations/sweep", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/reservations/sweep", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["expired"], 0);
}

#[tokio::test]
#[ignore]
async fn test_review_lifecycle() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let book_id = create_book(&client, &admin, &unique("REG-")).await;
    let member = signup_member(&client, &unique("critic")).await;

    // Create
    let response = client
        .post(format!("{}/reviews", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({
            "book_id": book_id,
            "content": "A fine read",
            "rating": 4
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let review: Value = response.json().await.expect("Failed to parse response");
    let review_id = review["id"].as_i64().unwrap();

    // A second review of the same book by the same user is rejected
    let response = client
        .post(format!("{}/reviews", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({
            "book_id": book_id,
            "content": "Changed my mind",
            "rating": 2
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Out-of-range rating is rejected
    let response = client
        .post(format!("{}/reviews", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({
            "book_id": book_id,
            "content": "x",
            "rating": 6
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Delete
    let response = client
        .delete(format!("{}/reviews/{}", BASE_URL, review_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_delete_book_with_rental_history() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let code = unique("REG-");
    let book_id = create_book(&client, &admin, &code).await;
    let member = signup_member(&client, &unique("history")).await;

    // Borrow and return so the book has circulation history
    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "code": code }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let rental: Value = response.json().await.expect("Failed to parse response");
    let rental_id = rental["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/rentals/{}/return", BASE_URL, rental_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // History cascades with the book; the delete must not fail
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_return_promotes_oldest_reservation() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let code = unique("REG-");
    let book_id = create_book(&client, &admin, &code).await;

    let borrower = signup_member(&client, &unique("lender")).await;
    let holder = signup_member(&client, &unique("nexth")).await;

    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .header("Authorization", format!("Bearer {}", borrower))
        .json(&json!({ "code": code }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let rental: Value = response.json().await.expect("Failed to parse response");
    let rental_id = rental["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/books/{}/reserve", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", holder))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let reservation: Value = response.json().await.expect("Failed to parse response");
    assert!(reservation["due_date"].is_null());

    // Returning with an active reservation queued promotes it
    let response = client
        .post(format!("{}/rentals/{}/return", BASE_URL, rental_id))
        .header("Authorization", format!("Bearer {}", borrower))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "RESERVED");

    // The promoted reservation now carries a pickup deadline
    let response = client
        .get(format!("{}/reservations?status=ACTIVE", BASE_URL))
        .header("Authorization", format!("Bearer {}", holder))
        .send()
        .await
        .expect("Failed to send request");
    let reservations: Value = response.json().await.expect("Failed to parse response");
    let promoted = reservations
        .as_array()
        .and_then(|a| a.iter().find(|r| r["book"]["id"].as_i64() == Some(book_id)))
        .expect("Promoted reservation not listed");
    assert!(promoted["due_date"].is_string());

    // Cleanup: cancel frees the book, then delete it
    let reservation_id = promoted["id"].as_i64().unwrap();
    let _ = client
        .post(format!("{}/reservations/{}/cancel", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", holder))
        .send()
        .await;
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrow_single_winner() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let code = unique("REG-");
    let book_id = create_book(&client, &admin, &code).await;

    let first = signup_member(&client, &unique("racer_a")).await;
    let second = signup_member(&client, &unique("racer_b")).await;

    let borrow = |token: String, code: String| {
        let client = client.clone();
        async move {
            client
                .post(format!("{}/rentals", BASE_URL))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({ "code": code }))
                .send()
                .await
                .expect("Failed to send request")
        }
    };

    let (a, b) = tokio::join!(
        borrow(first.clone(), code.clone()),
        borrow(second.clone(), code.clone())
    );

    let mut statuses = [a.status().as_u16(), b.status().as_u16()];
    statuses.sort_unstable();

    // Exactly one borrow wins; the loser gets the rule rejection or,
    // if both passed the checks, the storage-level conflict
    assert_eq!(statuses[0], 201);
    assert!(
        statuses[1] == 409 || statuses[1] == 422,
        "unexpected loser status {}",
        statuses[1]
    );

    let winner = if a.status().as_u16() == 201 { a } else { b };
    let rental: Value = winner.json().await.expect("Failed to parse response");
    let rental_id = rental["id"].as_i64().unwrap();

    // Staff may return any rental, so cleanup does not need the winner's token
    let _ = client
        .post(format!("{}/rentals/{}/return", BASE_URL, rental_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_search_term_is_trimmed() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let book_id = create_book(&client, &admin, &unique("REG-")).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .query(&[("q", "  Integration Test Book  ")])
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let found = body["items"]
        .as_array()
        .map(|items| items.iter().any(|b| b["id"].as_i64() == Some(book_id)))
        .unwrap_or(false);
    assert!(found, "padded search term did not match the title");

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_like_toggle() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let book_id = create_book(&client, &admin, &unique("REG-")).await;
    let member = signup_member(&client, &unique("fan")).await;

    let response = client
        .post(format!("{}/books/{}/like", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["liked"], true);

    let response = client
        .post(format!("{}/books/{}/like", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["liked"], false);

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}
