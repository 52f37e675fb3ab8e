//! Revocable login sessions.
//!
//! A session is an HS256 JWT in the `session` cookie plus a row in the
//! `sessions` table. Both must check out: a valid signature for a deleted or
//! expired row is rejected.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::DatabaseConnection;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{Config, SESSION_COOKIE};
use crate::db::{sessions, users};
use crate::error::{AppError, AppResult};
use crate::models::session::SessionClaims;
use crate::models::user::User;

/// Session JWT issuer.
pub const SESSION_ISSUER: &str = "webmail-launcher";

/// Issues, resolves and destroys sessions.
#[derive(Clone)]
pub struct SessionManager {
    secret: SecretString,
    ttl_secs: u64,
    secure_cookies: bool,
}

/// A freshly created session and the cookie that carries it.
#[derive(Debug)]
pub struct IssuedSession {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub cookie: Cookie<'static>,
}

/// A session that passed both the signature and the server-side check.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl SessionManager {
    pub fn new(secret: SecretString, ttl_secs: u64, secure_cookies: bool) -> Self {
        Self {
            secret,
            ttl_secs,
            secure_cookies,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.session_ttl_secs,
            config.secure_cookies(),
        )
    }

    /// Create a session row for `user_id` and sign a token for it.
    pub async fn create(&self, db: &DatabaseConnection, user_id: Uuid) -> AppResult<IssuedSession> {
        let session_id = Uuid::new_v4();
        let now = Utc::now();
        let expires_at = now + chrono::Duration::seconds(self.ttl_secs as i64);

        sessions::insert(db, session_id, user_id, expires_at).await?;

        let claims = SessionClaims {
            sub: user_id.to_string(),
            iss: SESSION_ISSUER.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))?;

        let mut cookie = self.base_cookie(token);
        cookie.set_max_age(Duration::seconds(self.ttl_secs as i64));

        Ok(IssuedSession {
            session_id,
            expires_at,
            cookie,
        })
    }

    /// Resolve a token to its live session.
    ///
    /// Bad signatures, expired claims and missing or expired rows all yield
    /// `Ok(None)`. Only storage failures are returned as errors.
    pub async fn resolve(
        &self,
        db: &DatabaseConnection,
        token: &str,
    ) -> AppResult<Option<AuthSession>> {
        let Some((session_id, user_id)) = self.verify_token(token) else {
            return Ok(None);
        };

        let Some(row) = sessions::find_active(db, session_id, user_id).await? else {
            debug!(session_id = %session_id, "Session row missing or expired");
            return Ok(None);
        };

        let Some(user) = users::find_by_id(db, user_id).await? else {
            return Ok(None);
        };

        Ok(Some(AuthSession {
            session_id,
            expires_at: row.expires_at,
            user,
        }))
    }

    /// Delete the session behind `token`, if any, and return the cookie that
    /// clears it on the client.
    ///
    /// Never fails: an unverifiable token or a storage error only skips the
    /// row deletion.
    pub async fn destroy(&self, db: &DatabaseConnection, token: Option<&str>) -> Cookie<'static> {
        if let Some((session_id, user_id)) = token.and_then(|t| self.verify_token(t)) {
            if let Err(e) = sessions::delete(db, session_id, user_id).await {
                warn!(session_id = %session_id, "Failed to delete session row: {}", e);
            }
        }

        let mut cookie = self.base_cookie(String::new());
        cookie.make_removal();
        cookie
    }

    /// Check signature, issuer and expiry. Returns `(session_id, user_id)`.
    pub fn verify_token(&self, token: &str) -> Option<(Uuid, Uuid)> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.validate_aud = false;
        validation.leeway = 0;

        let claims = match decode::<SessionClaims>(token, &key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Invalid session token: {}", e);
                return None;
            }
        };

        let session_id = Uuid::parse_str(&claims.session_id).ok()?;
        let user_id = Uuid::parse_str(&claims.user_id).ok()?;
        Some((session_id, user_id))
    }

    fn base_cookie(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Strict);
        cookie.set_secure(self.secure_cookies);
        cookie
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}
