//! E2E tests: registration, login, sessions and logout.

use actix_web::test;
use futures_util::future::join_all;
use sea_orm::EntityTrait;
use webmail_launcher_lib::config::SESSION_COOKIE;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_first_user_is_admin_and_later_users_are_not() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;

    let mut first = TestClient::new();
    let (status, body) = first
        .submit_credentials(&app, "register", "Admin@Example.COM", TEST_PASSWORD)
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["user"]["email"], "admin@example.com");
    assert_eq!(body["user"]["role"], "admin");
    assert!(first.session.is_some(), "register should start a session");

    let mut second = TestClient::new();
    let (status, body) = second
        .submit_credentials(&app, "register", "user@example.com", TEST_PASSWORD)
        .await;
    assert_eq!(status, 201);
    assert_eq!(body["user"]["role"], "user");
}

#[actix_rt::test]
async fn test_concurrent_first_registrations_yield_one_admin() {
    for _ in 0..5 {
        let ctx = TestContext::new().await;
        let app = create_test_app(&ctx).await;

        let app = &app;
        let attempts = (0..4).map(|i| {
            let req = TestClient::new()
                .post(
                    "/api/auth/register",
                    serde_json::json!({ "email": format!("racer{i}@example.com"), "password": TEST_PASSWORD }),
                )
                .to_request();
            send(app, req)
        });
        let results = join_all(attempts).await;

        assert!(results.iter().all(|(status, _)| *status == 201), "{results:?}");
        let admins = results
            .iter()
            .filter(|(_, body)| body["user"]["role"] == "admin")
            .count();
        assert_eq!(admins, 1);
    }
}

#[actix_rt::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;

    signed_in_client(&app, "dup@example.com").await;

    let mut client = TestClient::new();
    let (status, body) = client
        .submit_credentials(&app, "register", "DUP@example.com", TEST_PASSWORD)
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "CONFLICT");

    let mut client = TestClient::new();
    let (status, _) = client
        .submit_credentials(&app, "register", "not-an-email", TEST_PASSWORD)
        .await;
    assert_eq!(status, 400);

    let mut client = TestClient::new();
    let (status, _) = client
        .submit_credentials(&app, "register", "short@example.com", "short")
        .await;
    assert_eq!(status, 400);
    assert!(client.session.is_none());
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    signed_in_client(&app, "known@example.com").await;

    let mut wrong_password = TestClient::new();
    let (status_a, body_a) = wrong_password
        .submit_credentials(&app, "login", "known@example.com", "not the password")
        .await;

    let mut unknown_user = TestClient::new();
    let (status_b, body_b) = unknown_user
        .submit_credentials(&app, "login", "nobody@example.com", "not the password")
        .await;

    assert_eq!(status_a, 401);
    assert_eq!(status_b, 401);
    assert_eq!(body_a, body_b);
    assert_eq!(body_a["message"], "Invalid credentials");
    assert!(wrong_password.session.is_none());
    assert!(unknown_user.session.is_none());
}

#[actix_rt::test]
async fn test_login_with_malformed_input_is_bad_request() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;

    let mut client = TestClient::new();
    let (status, _) = client
        .submit_credentials(&app, "login", "no-at-sign", TEST_PASSWORD)
        .await;
    assert_eq!(status, 400);

    let (status, _) = send(
        &app,
        client
            .request(
                test::TestRequest::post()
                    .uri("/api/auth/login")
                    .insert_header(("content-type", "application/json"))
                    .set_payload("{\"email\":"),
            )
            .to_request(),
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_login_then_session_then_logout() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    signed_in_client(&app, "cycle@example.com").await;

    let mut client = TestClient::new();
    let (status, body) = client
        .submit_credentials(&app, "login", "CYCLE@example.com", TEST_PASSWORD)
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["user"]["email"], "cycle@example.com");

    let (status, body) = send(&app, client.get("/api/auth/session").to_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["email"], "cycle@example.com");

    // Logout is state-changing and needs the CSRF pair.
    let (status, _) = send(
        &app,
        client.post("/api/auth/logout", serde_json::json!({})).to_request(),
    )
    .await;
    assert_eq!(status, 403);

    client.fetch_csrf(&app).await;
    let resp = test::call_service(
        &app,
        client.post("/api/auth/logout", serde_json::json!({})).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let cleared = response_cookie(&resp, SESSION_COOKIE).expect("logout should clear the cookie");
    assert_eq!(cleared.value(), "");

    // The old cookie is dead server-side even if the browser kept it.
    let (status, body) = send(&app, client.get("/api/auth/session").to_request()).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_session_requires_cookie_and_valid_signature() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;

    let anonymous = TestClient::new();
    let (status, _) = send(&app, anonymous.get("/api/auth/session").to_request()).await;
    assert_eq!(status, 401);

    let mut forged = TestClient::new();
    forged.session = Some(actix_web::cookie::Cookie::new(
        SESSION_COOKIE,
        "eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl",
    ));
    let (status, _) = send(&app, forged.get("/api/auth/session").to_request()).await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_deleted_session_row_revokes_a_valid_token() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = signed_in_client(&app, "revoked@example.com").await;

    let (status, _) = send(&app, client.get("/api/auth/session").to_request()).await;
    assert_eq!(status, 200);

    webmail_launcher_lib::entity::session::Entity::delete_many()
        .exec(ctx.pool.connection())
        .await
        .unwrap();

    let (status, _) = send(&app, client.get("/api/auth/session").to_request()).await;
    assert_eq!(status, 401);
}
