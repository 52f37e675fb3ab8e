//! Mail account endpoints. Every query is scoped to the signed-in user.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::SessionAuth;
use crate::crypto::CredentialCipher;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::account::{
    AccountEnvelope, AccountListResponse, AccountSummary, CreateAccountRequest, CreatedAccount,
    CreatedAccountEnvelope, UpdateAccountRequest,
};
use crate::services::account;

/// List the user's accounts without credentials.
#[utoipa::path(
    get,
    path = "/api/accounts",
    tag = "Accounts",
    responses(
        (status = 200, description = "Accounts of the signed-in user", body = AccountListResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list_accounts(auth: SessionAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let accounts = account::list(pool.connection(), auth.user_id()).await?;

    Ok(HttpResponse::Ok().json(AccountListResponse {
        accounts: accounts.into_iter().map(AccountSummary::from).collect(),
    }))
}

/// Create an account. The password is sealed before it is stored.
#[utoipa::path(
    post,
    path = "/api/accounts",
    tag = "Accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = CreatedAccountEnvelope),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Invalid CSRF token")
    )
)]
pub async fn create_account(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    cipher: web::Data<CredentialCipher>,
    body: web::Json<CreateAccountRequest>,
) -> AppResult<HttpResponse> {
    let created = account::create(pool.connection(), &cipher, auth.user_id(), body.into_inner()).await?;

    Ok(HttpResponse::Created().json(CreatedAccountEnvelope {
        account: CreatedAccount {
            id: created.id,
            name: created.name,
            email: created.email,
        },
    }))
}

/// Fetch one account.
#[utoipa::path(
    get,
    path = "/api/accounts/{id}",
    tag = "Accounts",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account details", body = AccountEnvelope),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_account(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let found = account::get(pool.connection(), auth.user_id(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AccountEnvelope { account: found }))
}

/// Partially update an account.
#[utoipa::path(
    put,
    path = "/api/accounts/{id}",
    tag = "Accounts",
    params(("id" = Uuid, Path, description = "Account ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountEnvelope),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Invalid CSRF token"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn update_account(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    cipher: web::Data<CredentialCipher>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateAccountRequest>,
) -> AppResult<HttpResponse> {
    let updated = account::update(
        pool.connection(),
        &cipher,
        auth.user_id(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AccountEnvelope { account: updated }))
}

/// Delete an account.
#[utoipa::path(
    delete,
    path = "/api/accounts/{id}",
    tag = "Accounts",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Invalid CSRF token"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn delete_account(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    account::delete(pool.connection(), auth.user_id(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
