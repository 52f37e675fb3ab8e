//! Business logic services.

pub mod account;
pub mod cleanup;
pub mod launch;
pub mod validation;

pub use cleanup::start_cleanup_task;
