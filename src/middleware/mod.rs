//! HTTP middleware: request logging, rate limiting and CSRF protection.

pub mod csrf;
pub mod rate_limit;
pub mod request_logger;

pub use csrf::CsrfGuard;
pub use rate_limit::{RateLimit, RateLimitDecision, RateLimiter};
pub use request_logger::RequestLogger;
