//! CSRF guard middleware for state-changing requests.

use std::future::{Ready, ready};

use actix_web::Error;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::Method;
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::auth::csrf;
use crate::error::AppError;

/// Rejects unsafe methods whose `x-csrf-token` header does not match the
/// `csrf_token` cookie. Safe methods pass through untouched.
pub struct CsrfGuard;

impl<S, B> Transform<S, ServiceRequest> for CsrfGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfGuardMiddleware { service }))
    }
}

/// CSRF guard middleware service.
pub struct CsrfGuardMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CsrfGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_state_changing(req.method()) && !csrf::validate_request(req.request()) {
            warn!(
                target: "security",
                method = %req.method(),
                path = %req.path(),
                "CSRF validation failed"
            );
            let response = req.error_response(AppError::Forbidden("Invalid CSRF token".to_string()));
            return Box::pin(ready(Ok(response.map_into_right_body())));
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

fn is_state_changing(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}
