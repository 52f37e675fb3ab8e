//! Double-submit CSRF tokens.
//!
//! The token is set as an HttpOnly cookie and must be echoed by the client in
//! the `x-csrf-token` header on every state-changing request.

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, SameSite, time::Duration};
use subtle::ConstantTimeEq;

use crate::config::{CSRF_COOKIE, CSRF_HEADER};

/// Generate a fresh token: 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

/// Build the cookie carrying `token`.
pub fn issue_cookie(token: String, ttl_secs: u64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(CSRF_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(secure);
    cookie.set_max_age(Duration::seconds(ttl_secs as i64));
    cookie
}

/// Compare the cookie and header copies of the token.
///
/// Returns `false` when either copy is missing or not hex, when the decoded
/// lengths differ, or when the bytes differ.
pub fn validate(cookie: Option<&str>, header: Option<&str>) -> bool {
    let (Some(cookie), Some(header)) = (cookie, header) else {
        return false;
    };
    let (Ok(expected), Ok(provided)) = (hex::decode(cookie), hex::decode(header)) else {
        return false;
    };
    if expected.is_empty() || expected.len() != provided.len() {
        return false;
    }
    expected.ct_eq(&provided).into()
}

/// Validate the token pair carried by `req`.
pub fn validate_request(req: &HttpRequest) -> bool {
    let cookie = req.cookie(CSRF_COOKIE);
    let header = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok());
    validate(cookie.as_ref().map(|c| c.value()), header)
}
