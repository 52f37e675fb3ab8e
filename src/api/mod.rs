//! API endpoint modules and route table.
//!
//! Each resource is wrapped as `RateLimit` (outermost) -> `CsrfGuard` ->
//! handler, and handlers that need a user take the `SessionAuth` extractor.
//! A request rejected by one stage never reaches the next.

use std::time::Duration;

use actix_web::http::Method;
use actix_web::web;

use crate::error::AppError;
use crate::middleware::{CsrfGuard, RateLimit};

pub mod accounts;
pub mod auth;
pub mod health;
pub mod launch;
pub mod openapi;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

const MINUTE: Duration = Duration::from_secs(60);
const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);
const REGISTER_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Register every `/api` route. Mount with
/// `web::scope("/api").configure(api::configure_routes)`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .configure(configure_health_routes)
        .service(openapi::openapi_json)
        .configure(configure_auth_routes)
        .configure(configure_account_routes)
        .configure(configure_launch_routes);
}

fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/auth/csrf")
            .route(web::get().to(auth::csrf_token))
            .wrap(RateLimit::per_minute(100)),
    )
    .service(
        web::resource("/auth/register")
            .route(web::post().to(auth::register))
            .wrap(RateLimit::new(3, REGISTER_WINDOW)),
    )
    .service(
        web::resource("/auth/login")
            .route(web::post().to(auth::login))
            .wrap(RateLimit::new(5, LOGIN_WINDOW)),
    )
    .service(
        web::resource("/auth/logout")
            .route(web::post().to(auth::logout))
            .wrap(CsrfGuard)
            .wrap(RateLimit::per_minute(100)),
    )
    .service(
        web::resource("/auth/session")
            .route(web::get().to(auth::current_session))
            .wrap(RateLimit::per_minute(100)),
    );
}

fn configure_account_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/accounts")
            .route(web::get().to(accounts::list_accounts))
            .route(web::post().to(accounts::create_account))
            .wrap(CsrfGuard)
            .wrap(RateLimit::per_minute(100).only(Method::GET))
            .wrap(RateLimit::per_minute(10).only(Method::POST)),
    )
    .service(
        web::resource("/accounts/{id}")
            .route(web::get().to(accounts::get_account))
            .route(web::put().to(accounts::update_account))
            .route(web::delete().to(accounts::delete_account))
            .wrap(CsrfGuard)
            .wrap(RateLimit::per_minute(100).only(Method::GET))
            .wrap(RateLimit::per_minute(20).only(Method::PUT))
            .wrap(RateLimit::per_minute(10).only(Method::DELETE)),
    );
}

fn configure_launch_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/launch")
            .route(web::post().to(launch::create_launch))
            .wrap(CsrfGuard)
            .wrap(RateLimit::new(20, MINUTE)),
    )
    .service(
        web::resource("/launch/consume")
            .route(web::post().to(launch::consume_launch))
            .wrap(RateLimit::new(20, MINUTE)),
    );
}

/// Malformed JSON bodies become `400 INVALID_INPUT` in the usual error shape.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

/// Unparseable path ids (e.g. a non-UUID account id) are reported as not found.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_err, _req| AppError::NotFound("Account".to_string()).into())
}
