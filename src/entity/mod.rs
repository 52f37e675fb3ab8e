//! SeaORM entity definitions.

pub mod launch_token;
pub mod mail_account;
pub mod session;
pub mod user;
