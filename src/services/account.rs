//! Mail account service: validation plus credential sealing around `db::mail_accounts`.

use secrecy::{ExposeSecret, SecretString};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use uuid::Uuid;

use super::validation::{normalize_email, require_port, require_text, sanitize_text};
use crate::crypto::CredentialCipher;
use crate::db::mail_accounts;
use crate::error::{AppError, AppResult};
use crate::models::account::{
    CreateAccountRequest, MailAccount, MailAccountChanges, NewMailAccount, UpdateAccountRequest,
};

const MAX_NAME_LEN: usize = 100;
const MAX_HOST_LEN: usize = 255;
const MAX_USERNAME_LEN: usize = 255;
const MAX_PASSWORD_LEN: usize = 1024;

fn not_found() -> AppError {
    AppError::NotFound("Account".to_string())
}

fn require_password(password: &SecretString) -> AppResult<()> {
    let len = password.expose_secret().len();
    if len == 0 || len > MAX_PASSWORD_LEN {
        return Err(AppError::InvalidInput("Password is required".to_string()));
    }
    Ok(())
}

/// List a user's accounts.
pub async fn list(db: &DatabaseConnection, user_id: Uuid) -> AppResult<Vec<MailAccount>> {
    mail_accounts::list_for_user(db, user_id).await
}

/// Fetch one of the user's accounts, or `NotFound`.
pub async fn get(db: &DatabaseConnection, user_id: Uuid, account_id: Uuid) -> AppResult<MailAccount> {
    mail_accounts::find_for_user(db, account_id, user_id)
        .await?
        .ok_or_else(not_found)
}

/// Validate, seal the password, and store a new account.
pub async fn create(
    db: &DatabaseConnection,
    cipher: &CredentialCipher,
    user_id: Uuid,
    req: CreateAccountRequest,
) -> AppResult<MailAccount> {
    require_password(&req.password)?;
    let mut account = NewMailAccount {
        user_id,
        name: sanitize_text("name", &req.name, 1, MAX_NAME_LEN)?,
        email: normalize_email(&req.email)?,
        username: require_text("username", &req.username, 1, MAX_USERNAME_LEN)?,
        encrypted_password: String::new(),
        imap_host: require_text("imapHost", &req.imap_host, 1, MAX_HOST_LEN)?,
        imap_port: require_port("imapPort", req.imap_port)?,
        imap_security: req.imap_security,
        smtp_host: require_text("smtpHost", &req.smtp_host, 1, MAX_HOST_LEN)?,
        smtp_port: require_port("smtpPort", req.smtp_port)?,
        smtp_security: req.smtp_security,
    };

    account.encrypted_password = cipher.encrypt(req.password.expose_secret()).await?;

    let created = mail_accounts::insert(db, account).await?;
    info!(account_id = %created.id, user_id = %user_id, "Mail account created");
    Ok(created)
}

/// Apply a partial update. A new password is sealed before it is stored.
pub async fn update(
    db: &DatabaseConnection,
    cipher: &CredentialCipher,
    user_id: Uuid,
    account_id: Uuid,
    req: UpdateAccountRequest,
) -> AppResult<MailAccount> {
    let mut changes = MailAccountChanges {
        name: req
            .name
            .map(|v| sanitize_text("name", &v, 1, MAX_NAME_LEN))
            .transpose()?,
        email: req.email.map(|v| normalize_email(&v)).transpose()?,
        username: req
            .username
            .map(|v| require_text("username", &v, 1, MAX_USERNAME_LEN))
            .transpose()?,
        encrypted_password: None,
        imap_host: req
            .imap_host
            .map(|v| require_text("imapHost", &v, 1, MAX_HOST_LEN))
            .transpose()?,
        imap_port: req.imap_port.map(|v| require_port("imapPort", v)).transpose()?,
        imap_security: req.imap_security,
        smtp_host: req
            .smtp_host
            .map(|v| require_text("smtpHost", &v, 1, MAX_HOST_LEN))
            .transpose()?,
        smtp_port: req.smtp_port.map(|v| require_port("smtpPort", v)).transpose()?,
        smtp_security: req.smtp_security,
    };

    // Don't pay for a KDF run on an account the caller cannot touch.
    if !mail_accounts::is_owned_by(db, account_id, user_id).await? {
        return Err(not_found());
    }

    if let Some(password) = req.password {
        require_password(&password)?;
        changes.encrypted_password = Some(cipher.encrypt(password.expose_secret()).await?);
    }

    mail_accounts::update(db, account_id, user_id, changes)
        .await?
        .ok_or_else(not_found)
}

/// Delete one of the user's accounts.
pub async fn delete(db: &DatabaseConnection, user_id: Uuid, account_id: Uuid) -> AppResult<()> {
    if !mail_accounts::delete(db, account_id, user_id).await? {
        return Err(not_found());
    }
    info!(account_id = %account_id, user_id = %user_id, "Mail account deleted");
    Ok(())
}

/// Unseal an account's password for the IMAP/SMTP layer.
///
/// A tampered blob or a changed master key aborts with `AppError::Decryption`.
pub async fn decrypted_password(
    db: &DatabaseConnection,
    cipher: &CredentialCipher,
    user_id: Uuid,
    account_id: Uuid,
) -> AppResult<SecretString> {
    let blob = mail_accounts::find_encrypted_password(db, account_id, user_id)
        .await?
        .ok_or_else(not_found)?;

    cipher.decrypt(&blob).await.map_err(|e| {
        warn!(account_id = %account_id, "Stored credential failed to decrypt");
        AppError::from(e)
    })
}
