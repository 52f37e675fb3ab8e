//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::user::{User, UserRole};

/// Insert a new user. `email` must already be normalized.
///
/// Returns `AppError::Conflict` when the email is taken.
pub async fn insert(
    db: &DatabaseConnection,
    email: &str,
    password_hash: &str,
    role: UserRole,
) -> AppResult<User> {
    insert_row(db, email, password_hash, role)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                email_conflict()
            } else {
                AppError::from(e)
            }
        })
}

/// Insert a self-registered user. The first user becomes admin.
///
/// The admin role is claimed through the single-admin unique index, so when
/// several first registrations race exactly one of them wins it and the rest
/// fall back to the default role.
pub async fn register(
    db: &DatabaseConnection,
    email: &str,
    password_hash: &str,
) -> AppResult<User> {
    if count(db).await? == 0 {
        match insert_row(db, email, password_hash, UserRole::Admin).await {
            Ok(user) => return Ok(user),
            Err(e) if is_unique_violation(&e) => {
                if email_exists(db, email).await? {
                    return Err(email_conflict());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    insert(db, email, password_hash, UserRole::User).await
}

async fn insert_row(
    db: &DatabaseConnection,
    email: &str,
    password_hash: &str,
    role: UserRole,
) -> Result<User, DbErr> {
    let id = Uuid::now_v7();
    let now = Utc::now();

    let model = crate::entity::user::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        role: Set(role.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    crate::entity::user::Entity::insert(model).exec(db).await?;

    // Fetch back the inserted user
    let inserted = crate::entity::user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("Failed to fetch newly inserted user".to_string()))?;

    Ok(model_to_user(inserted))
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn email_conflict() -> AppError {
    AppError::Conflict("Email already registered".to_string())
}

/// Number of registered users.
pub async fn count(db: &DatabaseConnection) -> AppResult<u64> {
    Ok(crate::entity::user::Entity::find().count(db).await?)
}

/// Find a user by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<User>> {
    let result = crate::entity::user::Entity::find_by_id(id).one(db).await?;
    Ok(result.map(model_to_user))
}

/// Find a user and their password hash by normalized email.
pub async fn find_credentials_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> AppResult<Option<(User, String)>> {
    let result = crate::entity::user::Entity::find()
        .filter(crate::entity::user::Column::Email.eq(email))
        .one(db)
        .await?;

    Ok(result.map(|m| {
        let hash = m.password_hash.clone();
        (model_to_user(m), hash)
    }))
}

/// Whether an account with this normalized email exists.
pub async fn email_exists(db: &DatabaseConnection, email: &str) -> AppResult<bool> {
    let count = crate::entity::user::Entity::find()
        .filter(crate::entity::user::Column::Email.eq(email))
        .count(db)
        .await?;
    Ok(count > 0)
}

fn model_to_user(m: crate::entity::user::Model) -> User {
    User {
        id: m.id,
        email: m.email,
        role: UserRole::parse(&m.role).unwrap_or_default(),
        created_at: m.created_at,
    }
}
