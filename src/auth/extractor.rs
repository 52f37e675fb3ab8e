//! Actix-web extractor for session authentication.
//!
//! # Security
//! - The session cookie is read once and never logged
//! - Every extraction checks the signature and the server-side session row
//! - Failures collapse into a uniform 401

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use super::session::SessionManager;
use crate::config::SESSION_COOKIE;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::user::User;

/// Extractor that requires a live session.
///
/// ```ignore
/// async fn protected_handler(auth: SessionAuth) -> impl Responder {
///     // auth.user is the signed-in user
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub session_id: Uuid,
    pub user: User,
}

impl SessionAuth {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

impl FromRequest for SessionAuth {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let manager = req.app_data::<web::Data<SessionManager>>().cloned();
        let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());

        Box::pin(async move {
            let (Some(pool), Some(manager)) = (pool, manager) else {
                return Err(AppError::Internal(
                    "Session extractor is missing application state".to_string(),
                ));
            };
            let token = token.ok_or_else(AppError::unauthorized)?;

            let session = manager
                .resolve(pool.connection(), &token)
                .await?
                .ok_or_else(AppError::unauthorized)?;

            Ok(SessionAuth {
                session_id: session.session_id,
                user: session.user,
            })
        })
    }
}
