//! Authentication: password hashing, revocable sessions and CSRF tokens.

pub mod csrf;
mod extractor;
mod password;
mod session;

pub use extractor::SessionAuth;
pub use password::{PASSWORD_HASH_LEN, PASSWORD_SALT_LEN, PasswordHasher};
pub use session::{AuthSession, IssuedSession, SESSION_ISSUER, SessionManager};
