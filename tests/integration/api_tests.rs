//! HTTP smoke tests against a running server
//!
//! Needs an active, verified administrator account. Credentials are read from
//! INVENTORY_TEST_EMAIL and INVENTORY_TEST_PASSWORD.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:3000";

fn credentials() -> (String, String) {
    (
        std::env::var("INVENTORY_TEST_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string()),
        std::env::var("INVENTORY_TEST_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
    )
}

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let (email, password) = credentials();
    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
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
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
#[ignore]
async fn test_ready_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_login_with_wrong_password() {
    let client = Client::new();
    let (email, _) = credentials();

    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "definitely-wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_device_borrow_and_return() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/api/borrowings/devices", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "Smoke Test Projector", "category": "AV", "total_stock": 2 }))
        .send()
        .await
        .expect("Failed to create device");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let device_id = body["deviceId"].as_i64().expect("No deviceId");

    let response = client
        .put(format!("{}/api/borrowings/devices/{}/stock", BASE_URL, device_id))
        .bearer_auth(&token)
        .json(&json!({ "total_stock": 3 }))
        .send()
        .await
        .expect("Failed to update stock");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total_stock"], 3);
    assert_eq!(body["available_stock"], 3);
    assert_eq!(body["borrowed_count"], 0);

    let response = client
        .put(format!("{}/api/borrowings/devices/{}/stock", BASE_URL, device_id))
        .bearer_auth(&token)
        .json(&json!({ "total_stock": 2 }))
        .send()
        .await
        .expect("Failed to update stock");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/api/borrowings", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "employee_name": "Smoke Tester",
            "device_id": device_id,
            "quantity": 3,
            "borrow_date": "2024-05-01",
            "return_date": "2024-05-02"
        }))
        .send()
        .await
        .expect("Failed to send borrowing");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available"], 2);

    let response = client
        .post(format!("{}/api/borrowings", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "employee_name": "Smoke Tester",
            "device_id": device_id,
            "quantity": 2,
            "borrow_date": "2024-05-01",
            "return_date": "2024-05-02"
        }))
        .send()
        .await
        .expect("Failed to send borrowing");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let borrowing_id = body["borrowingId"].as_i64().expect("No borrowingId");

    let response = client
        .patch(format!("{}/api/borrowings/{}/return", BASE_URL, borrowing_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to return");
    assert!(response.status().is_success());

    let response = client
        .patch(format!("{}/api/borrowings/{}/return", BASE_URL, borrowing_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to return");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .delete(format!("{}/api/borrowings/devices/{}", BASE_URL, device_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete device");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_dashboard_stats() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/api/dashboard/stats", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);
    let health = body["data"]["systemHealth"].as_i64().expect("No systemHealth");
    assert!((0..=100).contains(&health));
}

#[tokio::test]
#[ignore]
async fn test_asset_export_is_csv() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/api/assets/export", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("assets_export.csv"));
    let body = response.text().await.expect("Failed to read body");
    assert!(body.starts_with("Asset Number,"));
}
