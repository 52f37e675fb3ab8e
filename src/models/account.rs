//! Mail account models.
//!
//! Account passwords only exist in plaintext inside request bodies and the
//! return value of `services::account::decrypted_password`. Everything that
//! is serialized to clients omits them.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Transport security for IMAP/SMTP connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionSecurity {
    None,
    Starttls,
    #[default]
    Ssl,
}

impl ConnectionSecurity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Starttls => "starttls",
            Self::Ssl => "ssl",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "starttls" => Some(Self::Starttls),
            "ssl" => Some(Self::Ssl),
            _ => None,
        }
    }
}

/// Mail account as stored, minus the sealed password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MailAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    pub imap_host: String,
    pub imap_port: u16,
    pub imap_security: ConnectionSecurity,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_security: ConnectionSecurity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shown in the account list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub imap_host: String,
    pub smtp_host: String,
    pub created_at: DateTime<Utc>,
}

impl From<MailAccount> for AccountSummary {
    fn from(a: MailAccount) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            imap_host: a.imap_host,
            smtp_host: a.smtp_host,
            created_at: a.created_at,
        }
    }
}

/// Body of `POST /api/accounts`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub imap_host: String,
    pub imap_port: u32,
    #[serde(default)]
    pub imap_security: ConnectionSecurity,
    pub smtp_host: String,
    pub smtp_port: u32,
    #[serde(default = "default_smtp_security")]
    pub smtp_security: ConnectionSecurity,
    pub username: String,
    #[schema(value_type = String, format = Password)]
    pub password: SecretString,
}

fn default_smtp_security() -> ConnectionSecurity {
    ConnectionSecurity::Starttls
}

/// Body of `PUT /api/accounts/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub imap_host: Option<String>,
    pub imap_port: Option<u32>,
    pub imap_security: Option<ConnectionSecurity>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u32>,
    pub smtp_security: Option<ConnectionSecurity>,
    pub username: Option<String>,
    #[schema(value_type = Option<String>, format = Password)]
    pub password: Option<SecretString>,
}

/// Validated fields of a new account, password already sealed.
#[derive(Debug, Clone)]
pub struct NewMailAccount {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    pub encrypted_password: String,
    pub imap_host: String,
    pub imap_port: u16,
    pub imap_security: ConnectionSecurity,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_security: ConnectionSecurity,
}

/// Validated partial update, password already sealed.
#[derive(Debug, Clone, Default)]
pub struct MailAccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub encrypted_password: Option<String>,
    pub imap_host: Option<String>,
    pub imap_port: Option<u16>,
    pub imap_security: Option<ConnectionSecurity>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_security: Option<ConnectionSecurity>,
}

/// `{ "account": ... }` envelope for create responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedAccountEnvelope {
    pub account: CreatedAccount,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// `{ "accounts": [...] }` envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountListResponse {
    pub accounts: Vec<AccountSummary>,
}

/// `{ "account": ... }` envelope for detail responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountEnvelope {
    pub account: MailAccount,
}
