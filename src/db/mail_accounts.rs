//! Database operations for mail accounts.
//!
//! Every query is scoped by `user_id`; an account owned by someone else is
//! indistinguishable from one that does not exist.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::account::{ConnectionSecurity, MailAccount, MailAccountChanges, NewMailAccount};

/// Insert a new account.
pub async fn insert(db: &DatabaseConnection, account: NewMailAccount) -> AppResult<MailAccount> {
    let id = Uuid::now_v7();
    let now = Utc::now();

    let model = crate::entity::mail_account::ActiveModel {
        id: Set(id),
        user_id: Set(account.user_id),
        name: Set(account.name),
        email: Set(account.email),
        username: Set(account.username),
        encrypted_password: Set(account.encrypted_password),
        imap_host: Set(account.imap_host),
        imap_port: Set(i32::from(account.imap_port)),
        imap_security: Set(account.imap_security.as_str().to_string()),
        smtp_host: Set(account.smtp_host),
        smtp_port: Set(i32::from(account.smtp_port)),
        smtp_security: Set(account.smtp_security.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    crate::entity::mail_account::Entity::insert(model)
        .exec(db)
        .await?;

    let inserted = crate::entity::mail_account::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::Database("Failed to fetch newly inserted mail account".to_string())
        })?;

    Ok(model_to_account(inserted))
}

/// List a user's accounts, newest first.
pub async fn list_for_user(db: &DatabaseConnection, user_id: Uuid) -> AppResult<Vec<MailAccount>> {
    let rows = crate::entity::mail_account::Entity::find()
        .filter(crate::entity::mail_account::Column::UserId.eq(user_id))
        .order_by_desc(crate::entity::mail_account::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(model_to_account).collect())
}

/// Find an account owned by `user_id`.
pub async fn find_for_user(
    db: &DatabaseConnection,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<Option<MailAccount>> {
    Ok(find_row(db, id, user_id).await?.map(model_to_account))
}

/// Sealed password of an account owned by `user_id`.
pub async fn find_encrypted_password(
    db: &DatabaseConnection,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<Option<String>> {
    Ok(find_row(db, id, user_id).await?.map(|m| m.encrypted_password))
}

/// Whether `user_id` owns account `id`.
pub async fn is_owned_by(db: &DatabaseConnection, id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let count = crate::entity::mail_account::Entity::find_by_id(id)
        .filter(crate::entity::mail_account::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Apply a partial update. Returns `None` when the account is not owned by `user_id`.
pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    user_id: Uuid,
    changes: MailAccountChanges,
) -> AppResult<Option<MailAccount>> {
    let Some(existing) = find_row(db, id, user_id).await? else {
        return Ok(None);
    };

    let mut active: crate::entity::mail_account::ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(email) = changes.email {
        active.email = Set(email);
    }
    if let Some(username) = changes.username {
        active.username = Set(username);
    }
    if let Some(encrypted_password) = changes.encrypted_password {
        active.encrypted_password = Set(encrypted_password);
    }
    if let Some(host) = changes.imap_host {
        active.imap_host = Set(host);
    }
    if let Some(port) = changes.imap_port {
        active.imap_port = Set(i32::from(port));
    }
    if let Some(security) = changes.imap_security {
        active.imap_security = Set(security.as_str().to_string());
    }
    if let Some(host) = changes.smtp_host {
        active.smtp_host = Set(host);
    }
    if let Some(port) = changes.smtp_port {
        active.smtp_port = Set(i32::from(port));
    }
    if let Some(security) = changes.smtp_security {
        active.smtp_security = Set(security.as_str().to_string());
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    Ok(Some(model_to_account(updated)))
}

/// Delete an account owned by `user_id`. Returns whether a row was removed.
pub async fn delete(db: &DatabaseConnection, id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let result = crate::entity::mail_account::Entity::delete_many()
        .filter(crate::entity::mail_account::Column::Id.eq(id))
        .filter(crate::entity::mail_account::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

async fn find_row(
    db: &DatabaseConnection,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<Option<crate::entity::mail_account::Model>> {
    let result = crate::entity::mail_account::Entity::find_by_id(id)
        .filter(crate::entity::mail_account::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(result)
}

fn model_to_account(m: crate::entity::mail_account::Model) -> MailAccount {
    MailAccount {
        id: m.id,
        name: m.name,
        email: m.email,
        username: m.username,
        imap_host: m.imap_host,
        imap_port: u16::try_from(m.imap_port).unwrap_or_default(),
        imap_security: ConnectionSecurity::parse(&m.imap_security).unwrap_or_default(),
        smtp_host: m.smtp_host,
        smtp_port: u16::try_from(m.smtp_port).unwrap_or_default(),
        smtp_security: ConnectionSecurity::parse(&m.smtp_security).unwrap_or_default(),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[cfg(test)]
pub(crate) fn sample_account(user_id: Uuid, encrypted_password: &str) -> NewMailAccount {
    NewMailAccount {
        user_id,
        name: "Work".to_string(),
        email: "me@work.example".to_string(),
        username: "me".to_string(),
        encrypted_password: encrypted_password.to_string(),
        imap_host: "imap.work.example".to_string(),
        imap_port: 993,
        imap_security: ConnectionSecurity::Ssl,
        smtp_host: "smtp.work.example".to_string(),
        smtp_port: 587,
        smtp_security: ConnectionSecurity::Starttls,
    }
}
