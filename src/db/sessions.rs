//! Database operations for sessions.

use chrono::{DateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::error::AppResult;

/// Insert a session row.
pub async fn insert(
    db: &DatabaseConnection,
    id: Uuid,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> AppResult<()> {
    let model = crate::entity::session::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        expires_at: Set(expires_at),
        created_at: Set(Utc::now()),
    };

    crate::entity::session::Entity::insert(model).exec(db).await?;
    Ok(())
}

/// Find an unexpired session matching both ids.
pub async fn find_active(
    db: &DatabaseConnection,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<Option<crate::entity::session::Model>> {
    let result = crate::entity::session::Entity::find_by_id(id)
        .filter(crate::entity::session::Column::UserId.eq(user_id))
        .filter(crate::entity::session::Column::ExpiresAt.gt(Utc::now()))
        .one(db)
        .await?;

    Ok(result)
}

/// Delete a session. Returns whether a row was removed.
pub async fn delete(db: &DatabaseConnection, id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let result = crate::entity::session::Entity::delete_many()
        .filter(crate::entity::session::Column::Id.eq(id))
        .filter(crate::entity::session::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Move a session's expiry. Used to end sessions early.
pub async fn set_expiry(
    db: &DatabaseConnection,
    id: Uuid,
    expires_at: DateTime<Utc>,
) -> AppResult<bool> {
    let result = crate::entity::session::Entity::update_many()
        .col_expr(
            crate::entity::session::Column::ExpiresAt,
            sea_orm::prelude::Expr::value(expires_at),
        )
        .filter(crate::entity::session::Column::Id.eq(id))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Delete sessions whose expiry has passed (cleanup job).
pub async fn purge_expired(db: &DatabaseConnection) -> AppResult<u64> {
    let result = crate::entity::session::Entity::delete_many()
        .filter(crate::entity::session::Column::ExpiresAt.lte(Utc::now()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
