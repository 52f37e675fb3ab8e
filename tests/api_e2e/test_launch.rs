//! E2E tests: one-time launch tokens.

use chrono::Utc;
use futures_util::future::join_all;
use sea_orm::sea_query::Expr;
use sea_orm::EntityTrait;
use serde_json::Value;

use super::test_helpers::*;

fn token_from_url(url: &str) -> String {
    url.split_once("?token=")
        .map(|(_, token)| token.to_string())
        .expect("launch URL has no token")
}

async fn issue_launch<S>(app: &S, client: &TestClient, account_id: &str, backend: &str) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (status, body) = send(
        app,
        client
            .post(
                "/api/launch",
                serde_json::json!({ "accountId": account_id, "webmailBackend": backend }),
            )
            .to_request(),
    )
    .await;
    assert_eq!(status, 200, "Failed to issue launch token: {body}");
    body
}

#[actix_rt::test]
async fn test_launch_token_is_single_use() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = signed_in_client(&app, "launcher@example.com").await;
    let account_id = create_account(&app, &client, "Work").await;

    let body = issue_launch(&app, &client, &account_id, "snappymail").await;
    assert_eq!(body["expiresIn"], 300);
    let url = body["launchUrl"].as_str().unwrap();
    assert!(url.starts_with("/snappymail?token="), "{url}");
    let token = token_from_url(url);
    assert_eq!(token.len(), 64);

    let consumer = TestClient::new();
    let (status, grant) = send(
        &app,
        consumer
            .post("/api/launch/consume", serde_json::json!({ "token": token }))
            .to_request(),
    )
    .await;
    assert_eq!(status, 200, "{grant}");
    assert_eq!(grant["accountId"], account_id.as_str());
    assert_eq!(grant["backend"], "snappymail");

    let (status, body) = send(
        &app,
        consumer
            .post("/api/launch/consume", serde_json::json!({ "token": token }))
            .to_request(),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Invalid token");
}

#[actix_rt::test]
async fn test_concurrent_consumers_get_exactly_one_grant() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = signed_in_client(&app, "race@example.com").await;
    let account_id = create_account(&app, &client, "Work").await;
    let body = issue_launch(&app, &client, &account_id, "native").await;
    let token = token_from_url(body["launchUrl"].as_str().unwrap());

    let app = &app;
    let token = token.as_str();
    let attempts = (0..8).map(|_| {
        let req = TestClient::new()
            .post("/api/launch/consume", serde_json::json!({ "token": token }))
            .to_request();
        send(app, req)
    });
    let results = join_all(attempts).await;

    let granted = results.iter().filter(|(status, _)| *status == 200).count();
    let refused = results.iter().filter(|(status, _)| *status == 401).count();
    assert_eq!(granted, 1);
    assert_eq!(refused, 7);
}

#[actix_rt::test]
async fn test_expired_and_unknown_tokens_look_the_same() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = signed_in_client(&app, "expired@example.com").await;
    let account_id = create_account(&app, &client, "Work").await;
    let body = issue_launch(&app, &client, &account_id, "roundcube").await;
    assert!(body["launchUrl"].as_str().unwrap().starts_with("/roundcube?token="));
    let token = token_from_url(body["launchUrl"].as_str().unwrap());

    webmail_launcher_lib::entity::launch_token::Entity::update_many()
        .col_expr(
            webmail_launcher_lib::entity::launch_token::Column::ExpiresAt,
            Expr::value(Utc::now() - chrono::Duration::seconds(1)),
        )
        .exec(ctx.pool.connection())
        .await
        .unwrap();

    let consumer = TestClient::new();
    let (status_expired, body_expired) = send(
        &app,
        consumer
            .post("/api/launch/consume", serde_json::json!({ "token": token }))
            .to_request(),
    )
    .await;
    let (status_unknown, body_unknown) = send(
        &app,
        consumer
            .post("/api/launch/consume", serde_json::json!({ "token": "f".repeat(64) }))
            .to_request(),
    )
    .await;

    assert_eq!(status_expired, 401);
    assert_eq!(status_unknown, 401);
    assert_eq!(body_expired, body_unknown);
}

#[actix_rt::test]
async fn test_launch_requires_ownership_and_known_backend() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let owner = signed_in_client(&app, "owner@example.com").await;
    let other = signed_in_client(&app, "other@example.com").await;
    let account_id = create_account(&app, &owner, "Work").await;

    let (status, _) = send(
        &app,
        other
            .post(
                "/api/launch",
                serde_json::json!({ "accountId": account_id, "webmailBackend": "native" }),
            )
            .to_request(),
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = send(
        &app,
        owner
            .post(
                "/api/launch",
                serde_json::json!({ "accountId": account_id, "webmailBackend": "gmail" }),
            )
            .to_request(),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = send(
        &app,
        owner
            .post("/api/launch", serde_json::json!({ "accountId": account_id }))
            .to_request(),
    )
    .await;
    assert_eq!(status, 400);
}
