//! Webmail launch endpoints.

use actix_web::{HttpResponse, web};
use tracing::warn;

use crate::auth::SessionAuth;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::launch::{ConsumeRequest, LaunchGrant, LaunchRequest, LaunchResponse};
use crate::services::launch;

/// Mint a one-time launch URL for one of the user's accounts.
#[utoipa::path(
    post,
    path = "/api/launch",
    tag = "Launch",
    request_body = LaunchRequest,
    responses(
        (status = 200, description = "Launch URL issued", body = LaunchResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Invalid CSRF token"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn create_launch(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<LaunchRequest>,
) -> AppResult<HttpResponse> {
    let LaunchRequest {
        account_id,
        webmail_backend,
    } = body.into_inner();
    let db = pool.connection();

    if !launch::verify_ownership(db, auth.user_id(), account_id).await? {
        return Err(AppError::NotFound("Account".to_string()));
    }

    let ttl = config.launch_token_ttl_secs;
    let token = launch::issue(db, account_id, webmail_backend, ttl).await?;

    Ok(HttpResponse::Ok().json(LaunchResponse {
        launch_url: launch::build_launch_url(webmail_backend, &token),
        expires_in: ttl,
    }))
}

/// Redeem a launch token. Succeeds at most once per token.
#[utoipa::path(
    post,
    path = "/api/launch/consume",
    tag = "Launch",
    request_body = ConsumeRequest,
    responses(
        (status = 200, description = "Token redeemed", body = LaunchGrant),
        (status = 401, description = "Invalid token")
    )
)]
pub async fn consume_launch(
    pool: web::Data<DbPool>,
    body: web::Json<ConsumeRequest>,
) -> AppResult<HttpResponse> {
    match launch::consume(pool.connection(), &body.token).await? {
        Some(grant) => Ok(HttpResponse::Ok().json(grant)),
        None => {
            warn!(target: "security", "Launch token consume refused");
            Err(AppError::Unauthorized("Invalid token".to_string()))
        }
    }
}
