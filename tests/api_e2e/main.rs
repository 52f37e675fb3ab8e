//! API E2E test suite.
//!
//! Drives the full `/api` route table against a fresh in-memory SQLite
//! database per test. No external services are needed.
//!
//! Run with: cargo test --test api_e2e

mod test_helpers;

mod test_accounts;
mod test_auth;
mod test_csrf;
mod test_launch;
mod test_rate_limit;
