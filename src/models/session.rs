//! Session token claims.

use serde::{Deserialize, Serialize};

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub user_id: String,
    pub session_id: String,
}
