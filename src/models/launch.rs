//! Launch token models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Webmail front ends a launch token can hand off to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WebmailBackend {
    #[default]
    Native,
    Snappymail,
    Roundcube,
}

impl WebmailBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Snappymail => "snappymail",
            Self::Roundcube => "roundcube",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "native" => Some(Self::Native),
            "snappymail" => Some(Self::Snappymail),
            "roundcube" => Some(Self::Roundcube),
            _ => None,
        }
    }

    /// Path the front end is served under.
    pub fn base_path(&self) -> &'static str {
        match self {
            Self::Native => "/webmail",
            Self::Snappymail => "/snappymail",
            Self::Roundcube => "/roundcube",
        }
    }
}

impl std::fmt::Display for WebmailBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a consumed launch token grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchGrant {
    pub account_id: Uuid,
    pub backend: WebmailBackend,
}

/// Body of `POST /api/launch`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    pub account_id: Uuid,
    pub webmail_backend: WebmailBackend,
}

/// Response of `POST /api/launch`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResponse {
    pub launch_url: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

/// Body of `POST /api/launch/consume`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConsumeRequest {
    pub token: String,
}
