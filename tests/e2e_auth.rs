//! E2E tests for the magic-link login flow and session handling.

mod common;

use common::{TEST_SECRET, TestServer};
use howdy::auth::session::{LoginTicket, create_login_token};
use serde_json::json;

/// Client that does not follow redirects, so the callback's 303 and
/// Set-Cookie header stay observable.
fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn session_cookie_from(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim_start_matches("session=").to_string())
}

#[tokio::test]
async fn login_accepts_valid_email() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "creator@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn login_rejects_invalid_email() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn callback_sets_session_cookie_and_grants_access() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let ticket = LoginTicket::new("creator@example.com".to_string(), 900);
    let token = create_login_token(&ticket, TEST_SECRET).unwrap();

    let response = client
        .get(server.url(&format!("/auth/callback?token={}", token)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/dashboard"
    );
    let cookie = session_cookie_from(&response).expect("session cookie set");

    // The cookie authenticates API calls.
    let me = server
        .client
        .get(server.url("/api/me"))
        .header("Cookie", format!("session={}", cookie))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), 200);

    let body: serde_json::Value = me.json().await.unwrap();
    assert_eq!(body["email"], "creator@example.com");
    assert_eq!(body["account_name"], "New Account");
}

#[tokio::test]
async fn callback_rejects_forged_token() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let ticket = LoginTicket::new("creator@example.com".to_string(), 900);
    let token = create_login_token(&ticket, "wrong-secret-key-32-bytes-long!!").unwrap();

    let response = client
        .get(server.url(&format!("/auth/callback?token={}", token)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn callback_rejects_expired_ticket() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let ticket = LoginTicket::new("creator@example.com".to_string(), -1);
    let token = create_login_token(&ticket, TEST_SECRET).unwrap();

    let response = client
        .get(server.url(&format!("/auth/callback?token={}", token)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn session_token_works_as_bearer_token() {
    let server = TestServer::new().await;
    let (user, _) = server.create_test_user("creator@example.com").await;
    let token = server.session_token_for(&user);

    let response = server
        .client
        .get(server.url("/api/me"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user_id"], user.id);
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/me"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .post(server.url("/logout"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    assert_eq!(response.headers().get("location").unwrap(), "/login");

    let removal = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .expect("removal cookie present");
    assert!(removal.contains("Max-Age=0") || removal.contains("Expires="));
}
