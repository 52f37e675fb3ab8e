//! E2E tests: mail accounts and credential sealing.

use secrecy::ExposeSecret;
use sea_orm::EntityTrait;
use uuid::Uuid;
use webmail_launcher_lib::services::account;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_account_lifecycle() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = signed_in_client(&app, "owner@example.com").await;

    let (status, body) = send(
        &app,
        client
            .post("/api/accounts", account_body("<b>Work</b>", "imap-secret"))
            .to_request(),
    )
    .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["account"]["name"], "bWork/b");
    let id = body["account"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, client.get("/api/accounts").to_request()).await;
    assert_eq!(status, 200);
    let listed = &body["accounts"][0];
    assert_eq!(listed["id"], id.as_str());
    assert_eq!(listed["imapHost"], "imap.example.org");
    assert!(listed.get("password").is_none());
    assert!(listed.get("encryptedPassword").is_none());

    let (status, body) = send(&app, client.get(&format!("/api/accounts/{id}")).to_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["account"]["smtpPort"], 587);
    assert_eq!(body["account"]["imapSecurity"], "ssl");
    assert!(!body.to_string().contains("imap-secret"));

    let (status, body) = send(
        &app,
        client
            .put(
                &format!("/api/accounts/{id}"),
                serde_json::json!({ "name": "Personal", "smtpPort": 465, "smtpSecurity": "ssl" }),
            )
            .to_request(),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["account"]["name"], "Personal");
    assert_eq!(body["account"]["smtpPort"], 465);
    assert_eq!(body["account"]["imapHost"], "imap.example.org");

    let (status, _) = send(&app, client.delete(&format!("/api/accounts/{id}")).to_request()).await;
    assert_eq!(status, 200);

    let (status, _) = send(&app, client.get(&format!("/api/accounts/{id}")).to_request()).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_password_is_sealed_at_rest_and_unsealed_for_owner() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = signed_in_client(&app, "sealed@example.com").await;
    let id = create_account(&app, &client, "Sealed").await;
    let id = Uuid::parse_str(&id).unwrap();

    let row = webmail_launcher_lib::entity::mail_account::Entity::find_by_id(id)
        .one(ctx.pool.connection())
        .await
        .unwrap()
        .unwrap();
    assert!(!row.encrypted_password.contains("imap-secret"));

    let (_, session) = send(&app, client.get("/api/auth/session").to_request()).await;
    let user_id = Uuid::parse_str(session["user"]["id"].as_str().unwrap()).unwrap();

    let password = account::decrypted_password(ctx.pool.connection(), &ctx.cipher, user_id, id)
        .await
        .unwrap();
    assert_eq!(password.expose_secret(), "imap-secret");

    // A new password replaces the sealed blob.
    let (status, _) = send(
        &app,
        client
            .put(
                &format!("/api/accounts/{id}"),
                serde_json::json!({ "password": "rotated-secret" }),
            )
            .to_request(),
    )
    .await;
    assert_eq!(status, 200);
    let password = account::decrypted_password(ctx.pool.connection(), &ctx.cipher, user_id, id)
        .await
        .unwrap();
    assert_eq!(password.expose_secret(), "rotated-secret");
}

#[actix_rt::test]
async fn test_accounts_are_scoped_to_their_owner() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let owner = signed_in_client(&app, "alice@example.com").await;
    let intruder = signed_in_client(&app, "mallory@example.com").await;
    let id = create_account(&app, &owner, "Private").await;

    let (status, body) = send(&app, intruder.get("/api/accounts").to_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["accounts"], serde_json::json!([]));

    let uri = format!("/api/accounts/{id}");
    let (status, _) = send(&app, intruder.get(&uri).to_request()).await;
    assert_eq!(status, 404);
    let (status, _) = send(
        &app,
        intruder
            .put(&uri, serde_json::json!({ "name": "Mine now" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, 404);
    let (status, _) = send(&app, intruder.delete(&uri).to_request()).await;
    assert_eq!(status, 404);

    let (status, body) = send(&app, owner.get(&uri).to_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["account"]["name"], "Private");
}

#[actix_rt::test]
async fn test_create_validates_fields() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let client = signed_in_client(&app, "strict@example.com").await;

    let mut bad_port = account_body("Work", "secret");
    bad_port["imapPort"] = serde_json::json!(70000);
    let (status, body) = send(&app, client.post("/api/accounts", bad_port).to_request()).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, _) = send(&app, client.post("/api/accounts", account_body("Work", "")).to_request()).await;
    assert_eq!(status, 400);

    let mut bad_security = account_body("Work", "secret");
    bad_security["smtpSecurity"] = serde_json::json!("tls1.0");
    let (status, _) = send(&app, client.post("/api/accounts", bad_security).to_request()).await;
    assert_eq!(status, 400);

    let (status, _) = send(&app, client.get("/api/accounts/not-a-uuid").to_request()).await;
    assert_eq!(status, 404);

    let (status, body) = send(&app, client.get("/api/accounts").to_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["accounts"], serde_json::json!([]));
}

#[actix_rt::test]
async fn test_accounts_require_a_session() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;
    let mut anonymous = TestClient::new();
    anonymous.fetch_csrf(&app).await;

    let (status, _) = send(&app, anonymous.get("/api/accounts").to_request()).await;
    assert_eq!(status, 401);
    let (status, _) = send(
        &app,
        anonymous
            .post("/api/accounts", account_body("Work", "secret"))
            .to_request(),
    )
    .await;
    assert_eq!(status, 401);
}
