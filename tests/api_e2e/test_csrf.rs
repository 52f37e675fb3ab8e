//! E2E tests: double-submit CSRF protection.

use super::test_helpers::*;

#[actix_rt::test]
async fn test_state_changing_request_without_token_is_forbidden() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let mut client = signed_in_client(&app, "csrf@example.com").await;
    client.csrf_cookie = None;
    client.csrf_token = None;

    let (status, body) = send(
        &app,
        client
            .post("/api/accounts", account_body("Work", "secret"))
            .to_request(),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "FORBIDDEN");
    assert_eq!(body["message"], "Invalid CSRF token");
}

#[actix_rt::test]
async fn test_mismatched_header_is_forbidden() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let mut client = signed_in_client(&app, "mismatch@example.com").await;

    // Same length, different bytes.
    client.csrf_token = Some("ab".repeat(32));
    let (status, _) = send(
        &app,
        client
            .post("/api/accounts", account_body("Work", "secret"))
            .to_request(),
    )
    .await;
    assert_eq!(status, 403);

    // Different length.
    client.csrf_token = Some("abcd".to_string());
    let (status, _) = send(
        &app,
        client
            .post("/api/accounts", account_body("Work", "secret"))
            .to_request(),
    )
    .await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_csrf_is_checked_before_the_session() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;

    // No session and no CSRF token: the CSRF stage answers first.
    let anonymous = TestClient::new();
    let (status, _) = send(
        &app,
        anonymous
            .post("/api/launch", serde_json::json!({}))
            .to_request(),
    )
    .await;
    assert_eq!(status, 403);

    // With a valid CSRF pair the session stage is reached.
    let mut anonymous = TestClient::new();
    anonymous.fetch_csrf(&app).await;
    let (status, _) = send(
        &app,
        anonymous
            .post(
                "/api/launch",
                serde_json::json!({
                    "accountId": "6f1c1c2e-8d7e-4c1a-9f55-3b8e1f0c9a11",
                    "webmailBackend": "native"
                }),
            )
            .to_request(),
    )
    .await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_safe_methods_skip_csrf() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let mut client = signed_in_client(&app, "reader@example.com").await;
    client.csrf_cookie = None;
    client.csrf_token = None;

    let (status, body) = send(&app, client.get("/api/accounts").to_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["accounts"], serde_json::json!([]));
}
