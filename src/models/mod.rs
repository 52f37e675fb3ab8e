//! Domain models for the webmail launcher.

pub mod account;
pub mod launch;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use account::{
    AccountSummary, ConnectionSecurity, CreateAccountRequest, MailAccount, MailAccountChanges,
    NewMailAccount, UpdateAccountRequest,
};
pub use launch::{LaunchGrant, LaunchRequest, LaunchResponse, WebmailBackend};
pub use user::{User, UserResponse, UserRole};
