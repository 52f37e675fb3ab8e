//! E2E tests: per-client, per-endpoint rate limiting.

use actix_web::test;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_sixth_login_attempt_is_rate_limited() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;

    let mut client = TestClient::new();
    for attempt in 1..=5 {
        let (status, _) = client
            .submit_credentials(&app, "login", "nobody@example.com", "wrong password")
            .await;
        assert_eq!(status, 401, "attempt {attempt} should reach the handler");
    }

    let req = client
        .post(
            "/api/auth/login",
            serde_json::json!({ "email": "nobody@example.com", "password": "wrong password" }),
        )
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 429);

    let headers = resp.headers();
    assert_eq!(headers.get("X-RateLimit-Limit").unwrap(), "5");
    assert_eq!(headers.get("X-RateLimit-Remaining").unwrap(), "0");
    assert!(headers.get("X-RateLimit-Reset").is_some());
    let retry_after: u64 = headers
        .get("Retry-After")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 15 * 60);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "RATE_LIMITED");

    // Another client address has its own budget.
    let mut other = TestClient::new();
    let (status, _) = other
        .submit_credentials(&app, "login", "nobody@example.com", "wrong password")
        .await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_allowed_responses_carry_rate_limit_headers() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = TestClient::new();

    let resp = test::call_service(&app, client.get("/api/auth/csrf").to_request()).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("X-RateLimit-Limit").unwrap(), "100");
    assert_eq!(resp.headers().get("X-RateLimit-Remaining").unwrap(), "99");
    assert!(resp.headers().get("Retry-After").is_none());
}

#[actix_rt::test]
async fn test_rate_limit_runs_before_csrf() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let anonymous = TestClient::new();

    for _ in 0..20 {
        let (status, _) = send(
            &app,
            anonymous
                .post("/api/launch", serde_json::json!({}))
                .to_request(),
        )
        .await;
        assert_eq!(status, 403);
    }

    let (status, _) = send(
        &app,
        anonymous
            .post("/api/launch", serde_json::json!({}))
            .to_request(),
    )
    .await;
    assert_eq!(status, 429);
}

#[actix_rt::test]
async fn test_methods_on_one_resource_share_a_counter() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = signed_in_client(&app, "budget@example.com").await;

    for i in 0..10 {
        create_account(&app, &client, &format!("Account {i}")).await;
    }
    let (status, _) = send(
        &app,
        client
            .post("/api/accounts", account_body("One too many", "secret"))
            .to_request(),
    )
    .await;
    assert_eq!(status, 429);

    // GET has a larger limit on the same counter.
    let (status, body) = send(&app, client.get("/api/accounts").to_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["accounts"].as_array().unwrap().len(), 10);
}

#[actix_rt::test]
async fn test_spoofed_forwarded_for_does_not_bypass_login_limit() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = TestClient::new();

    let mut statuses = Vec::new();
    for i in 0..8 {
        let req = client
            .post(
                "/api/auth/login",
                serde_json::json!({ "email": "nobody@example.com", "password": "wrong password" }),
            )
            .insert_header(("x-forwarded-for", format!("198.51.100.{i}")))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status().as_u16());
    }

    assert!(statuses[..5].iter().all(|s| *s == 401), "{statuses:?}");
    assert!(statuses[5..].iter().all(|s| *s == 429), "{statuses:?}");
}
