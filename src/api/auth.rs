//! Email/password authentication endpoints.
//!
//! Register and login answer with a uniform message on failure so a caller
//! cannot tell an unknown address from a wrong password.

use actix_web::{HttpRequest, HttpResponse, web};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::auth::{PasswordHasher, SessionAuth, SessionManager, csrf};
use crate::config::{Config, SESSION_COOKIE};
use crate::db::{DbPool, users};
use crate::error::{AppError, AppResult};
use crate::models::user::{CredentialsRequest, CsrfTokenResponse, UserEnvelope};
use crate::services::validation::normalize_email;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Issue a CSRF token cookie and echo the token for the `X-CSRF-Token` header.
#[utoipa::path(
    get,
    path = "/api/auth/csrf",
    tag = "Auth",
    responses(
        (status = 200, description = "CSRF token issued", body = CsrfTokenResponse),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn csrf_token(config: web::Data<Config>) -> HttpResponse {
    let token = csrf::generate_token();
    let cookie = csrf::issue_cookie(token.clone(), config.csrf_ttl_secs, config.secure_cookies());

    HttpResponse::Ok()
        .cookie(cookie)
        .json(CsrfTokenResponse { token })
}

/// Create a user and sign them in. The first registered user is an admin.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User registered", body = UserEnvelope),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn register(
    pool: web::Data<DbPool>,
    sessions: web::Data<SessionManager>,
    hasher: web::Data<PasswordHasher>,
    body: web::Json<CredentialsRequest>,
) -> AppResult<HttpResponse> {
    let CredentialsRequest { email, password } = body.into_inner();
    let email = normalize_email(&email)?;
    let password_len = password.expose_secret().chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password_len) {
        return Err(AppError::InvalidInput(format!(
            "Password must be between {} and {} characters",
            MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
        )));
    }

    let db = pool.connection();
    if users::email_exists(db, &email).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hasher.hash(password.expose_secret()).await?;
    let user = users::register(db, &email, &password_hash).await?;
    let issued = sessions.create(db, user.id).await?;

    info!(user_id = %user.id, role = %user.role, "User registered");

    Ok(HttpResponse::Created()
        .cookie(issued.cookie)
        .json(UserEnvelope { user: user.into() }))
}

/// Verify email and password and start a session.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = UserEnvelope),
        (status = 400, description = "Malformed credentials"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    pool: web::Data<DbPool>,
    sessions: web::Data<SessionManager>,
    hasher: web::Data<PasswordHasher>,
    body: web::Json<CredentialsRequest>,
) -> AppResult<HttpResponse> {
    let CredentialsRequest { email, password } = body.into_inner();
    let password_len = password.expose_secret().chars().count();
    let email = match normalize_email(&email) {
        Ok(email) if (1..=MAX_PASSWORD_LEN).contains(&password_len) => email,
        _ => return Err(AppError::InvalidInput("Invalid credentials".to_string())),
    };

    let db = pool.connection();
    let Some((user, stored_hash)) = users::find_credentials_by_email(db, &email).await? else {
        // Spend the same KDF time as a real verification.
        hasher.verify_dummy(password.expose_secret()).await;
        warn!(target: "security", "Login failed");
        return Err(AppError::invalid_credentials());
    };

    if !hasher.verify(password.expose_secret(), &stored_hash).await {
        warn!(target: "security", user_id = %user.id, "Login failed");
        return Err(AppError::invalid_credentials());
    }

    let issued = sessions.create(db, user.id).await?;
    info!(user_id = %user.id, "User signed in");

    Ok(HttpResponse::Ok()
        .cookie(issued.cookie)
        .json(UserEnvelope { user: user.into() }))
}

/// End the current session. Always clears the session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Signed out"),
        (status = 403, description = "Invalid CSRF token")
    )
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    sessions: web::Data<SessionManager>,
) -> HttpResponse {
    let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
    let removal = sessions.destroy(pool.connection(), token.as_deref()).await;

    HttpResponse::Ok()
        .cookie(removal)
        .json(serde_json::json!({ "success": true }))
}

/// Current signed-in user.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Signed-in user", body = UserEnvelope),
        (status = 401, description = "No valid session")
    )
)]
pub async fn current_session(auth: SessionAuth) -> HttpResponse {
    HttpResponse::Ok().json(UserEnvelope {
        user: auth.user.into(),
    })
}
