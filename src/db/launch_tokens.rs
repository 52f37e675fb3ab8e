//! Database operations for launch tokens.
//!
//! Only the SHA-256 of a token is stored; the raw token never reaches the database.

use chrono::{DateTime, Utc};
use sea_orm::*;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppResult;

/// Hash a launch token using SHA-256.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a random launch token: 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

/// Insert a new launch token (stores the hash, not the raw token).
pub async fn insert(
    db: &DatabaseConnection,
    token_hash: &str,
    account_id: Uuid,
    backend: &str,
    expires_at: DateTime<Utc>,
) -> AppResult<()> {
    let model = crate::entity::launch_token::ActiveModel {
        id: Set(token_hash.to_string()),
        account_id: Set(account_id),
        backend: Set(backend.to_string()),
        expires_at: Set(expires_at),
        used_at: Set(None),
        created_at: Set(Utc::now()),
    };

    crate::entity::launch_token::Entity::insert(model)
        .exec(db)
        .await?;

    Ok(())
}

/// Mark an unused, unexpired token as used and return it.
///
/// The check and the mark are one conditional UPDATE, so of any number of
/// concurrent callers at most one sees `Some`.
pub async fn consume(
    db: &DatabaseConnection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> AppResult<Option<crate::entity::launch_token::Model>> {
    let result = crate::entity::launch_token::Entity::update_many()
        .col_expr(
            crate::entity::launch_token::Column::UsedAt,
            sea_orm::prelude::Expr::value(Some(now)),
        )
        .filter(crate::entity::launch_token::Column::Id.eq(token_hash))
        .filter(crate::entity::launch_token::Column::UsedAt.is_null())
        .filter(crate::entity::launch_token::Column::ExpiresAt.gt(now))
        .exec(db)
        .await?;

    if result.rows_affected != 1 {
        return Ok(None);
    }

    let row = crate::entity::launch_token::Entity::find_by_id(token_hash.to_string())
        .one(db)
        .await?;
    Ok(row)
}

/// Delete tokens that are used or expired (cleanup job).
pub async fn purge_spent(db: &DatabaseConnection, now: DateTime<Utc>) -> AppResult<u64> {
    let result = crate::entity::launch_token::Entity::delete_many()
        .filter(
            Condition::any()
                .add(crate::entity::launch_token::Column::ExpiresAt.lte(now))
                .add(crate::entity::launch_token::Column::UsedAt.is_not_null()),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
