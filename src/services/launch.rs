//! One-time launch tokens for handing an account off to a webmail front end.
//!
//! The raw token only travels in the launch URL. The database keeps its
//! SHA-256, an expiry and a `used_at` marker.

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{launch_tokens, mail_accounts};
use crate::error::AppResult;
use crate::models::launch::{LaunchGrant, WebmailBackend};

/// Whether `user_id` owns `account_id`. Checked before any token is minted.
pub async fn verify_ownership(
    db: &DatabaseConnection,
    user_id: Uuid,
    account_id: Uuid,
) -> AppResult<bool> {
    mail_accounts::is_owned_by(db, account_id, user_id).await
}

/// Mint a token for `account_id` valid for `ttl_secs`. Returns the raw token.
pub async fn issue(
    db: &DatabaseConnection,
    account_id: Uuid,
    backend: WebmailBackend,
    ttl_secs: u64,
) -> AppResult<String> {
    let token = launch_tokens::generate_token();
    let expires_at = Utc::now() + chrono::Duration::seconds(ttl_secs as i64);

    launch_tokens::insert(
        db,
        &launch_tokens::hash_token(&token),
        account_id,
        backend.as_str(),
        expires_at,
    )
    .await?;

    info!(account_id = %account_id, backend = %backend, "Launch token issued");
    Ok(token)
}

/// Redeem a token. Unknown, expired and already-used tokens all return `None`.
pub async fn consume(db: &DatabaseConnection, token: &str) -> AppResult<Option<LaunchGrant>> {
    let Some(row) = launch_tokens::consume(db, &launch_tokens::hash_token(token), Utc::now()).await?
    else {
        warn!("Launch token rejected");
        return Ok(None);
    };

    let Some(backend) = WebmailBackend::parse(&row.backend) else {
        warn!(backend = %row.backend, "Launch token has unknown backend");
        return Ok(None);
    };

    Ok(Some(LaunchGrant {
        account_id: row.account_id,
        backend,
    }))
}

/// `<backend base path>?token=<token>`
pub fn build_launch_url(backend: WebmailBackend, token: &str) -> String {
    format!("{}?token={}", backend.base_path(), urlencoding::encode(token))
}
