//! OpenAPI documentation configuration.

use actix_web::{HttpResponse, get};
use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Webmail Launcher Server",
        version = "0.1.0",
        description = "Stores mail-account credentials encrypted at rest and launches webmail sessions with one-time tokens"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Auth endpoints
        api::auth::csrf_token,
        api::auth::register,
        api::auth::login,
        api::auth::logout,
        api::auth::current_session,
        // Account endpoints
        api::accounts::list_accounts,
        api::accounts::create_account,
        api::accounts::get_account,
        api::accounts::update_account,
        api::accounts::delete_account,
        // Launch endpoints
        api::launch::create_launch,
        api::launch::consume_launch,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Auth
            models::UserRole,
            models::UserResponse,
            models::user::CredentialsRequest,
            models::user::UserEnvelope,
            models::user::CsrfTokenResponse,
            // Accounts
            models::ConnectionSecurity,
            models::MailAccount,
            models::AccountSummary,
            models::CreateAccountRequest,
            models::UpdateAccountRequest,
            models::account::CreatedAccount,
            models::account::CreatedAccountEnvelope,
            models::account::AccountListResponse,
            models::account::AccountEnvelope,
            // Launch
            models::WebmailBackend,
            models::LaunchRequest,
            models::LaunchResponse,
            models::LaunchGrant,
            models::launch::ConsumeRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and sessions"),
        (name = "Accounts", description = "Mail accounts of the signed-in user"),
        (name = "Launch", description = "One-time webmail launch tokens")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add session cookie and CSRF header security schemes.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    crate::config::SESSION_COOKIE,
                ))),
            );
            components.add_security_scheme(
                "csrf",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-CSRF-Token"))),
            );
        }
    }
}

/// Serve the generated OpenAPI document.
#[get("/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
