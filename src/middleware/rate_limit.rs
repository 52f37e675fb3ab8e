//! Fixed-window rate limiting keyed by client address and request path.
//!
//! The client address is the socket peer. `Forwarded`/`X-Forwarded-For` are
//! only honoured when the limiter is configured to trust a reverse proxy.
//!
//! Counters live in a bounded moka cache: least-recently-used keys are evicted
//! once `capacity` is reached, and idle keys expire after the configured TTL
//! (never before their window closes).

use std::future::{Ready, ready};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::Method;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, web};
use futures_util::future::LocalBoxFuture;
use moka::Expiry;
use moka::ops::compute::Op;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tracing::warn;

use crate::config::RateLimitSettings;
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at_ms: u64,
    window_ms: u64,
}

impl Window {
    fn starting_at(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            reset_at_ms: now_ms.saturating_add(window_ms),
            window_ms,
        }
    }
}

/// Keeps an entry at least as long as its window.
struct WindowExpiry {
    min_ttl: Duration,
}

impl WindowExpiry {
    fn ttl_for(&self, window: &Window) -> Duration {
        self.min_ttl.max(Duration::from_millis(window.window_ms))
    }
}

impl Expiry<String, Window> for WindowExpiry {
    fn expire_after_create(&self, _key: &String, value: &Window, _created_at: Instant) -> Option<Duration> {
        Some(self.ttl_for(value))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Window,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(self.ttl_for(value))
    }
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Window end, milliseconds since the Unix epoch
    pub reset_at_ms: u64,
    /// Seconds until the window ends (rounded up)
    pub retry_after_secs: u64,
}

impl RateLimitDecision {
    /// Headers describing this decision. `Retry-After` is only set on denial.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_at_ms.div_ceil(1000).to_string()),
        ];
        if !self.allowed {
            headers.push(("Retry-After", self.retry_after_secs.to_string()));
        }
        headers
    }
}

/// Shared counter store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Cache<String, Window>,
    trust_proxy: bool,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let store = Cache::builder()
            .max_capacity(settings.capacity)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(WindowExpiry {
                min_ttl: Duration::from_secs(settings.entry_ttl_secs),
            })
            .build();
        Self {
            store,
            trust_proxy: settings.trust_proxy,
        }
    }

    /// Count one request for `key` against `max` per `window`.
    pub fn check(&self, key: &str, max: u32, window: Duration) -> RateLimitDecision {
        self.check_at(key, max, window, now_ms())
    }

    /// [`check`](Self::check) with an explicit clock.
    pub fn check_at(&self, key: &str, max: u32, window: Duration, now_ms: u64) -> RateLimitDecision {
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        let mut current = Window::starting_at(now_ms, window_ms);

        // The whole read-modify-write runs under moka's per-key lock.
        self.store
            .entry(key.to_string())
            .and_compute_with(|existing| {
                if let Some(previous) = existing.map(|entry| entry.into_value()) {
                    if now_ms <= previous.reset_at_ms {
                        current = Window {
                            count: previous.count.saturating_add(1),
                            ..previous
                        };
                    }
                }
                Op::Put(current)
            });

        RateLimitDecision {
            allowed: current.count <= max,
            limit: max,
            remaining: max.saturating_sub(current.count),
            reset_at_ms: current.reset_at_ms,
            retry_after_secs: current.reset_at_ms.saturating_sub(now_ms).div_ceil(1000),
        }
    }

    /// Number of tracked keys (approximate until pending maintenance runs).
    pub fn tracked_keys(&self) -> u64 {
        self.store.run_pending_tasks();
        self.store.entry_count()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Rate limit middleware factory. Wrap a resource with
/// `RateLimit::new(max, window)`; requires `web::Data<RateLimiter>`.
///
/// A resource serving several methods with different limits wraps one
/// `RateLimit` per method using [`only`](Self::only). Those limits share one
/// counter per client and path; each method is judged against its own limit.
#[derive(Debug, Clone)]
pub struct RateLimit {
    max: u32,
    window: Duration,
    method: Option<Method>,
}

impl RateLimit {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            method: None,
        }
    }

    pub fn per_minute(max: u32) -> Self {
        Self::new(max, Duration::from_secs(60))
    }

    /// Restrict this limit to requests using `method`; others pass through uncounted.
    pub fn only(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            max: self.max,
            window: self.window,
            method: self.method.clone(),
        }))
    }
}

/// Rate limit middleware service.
pub struct RateLimitMiddleware<S> {
    service: S,
    max: u32,
    window: Duration,
    method: Option<Method>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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
        if self.method.as_ref().is_some_and(|m| m != req.method()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let Some(limiter) = req.app_data::<web::Data<RateLimiter>>().cloned() else {
            let response =
                req.error_response(AppError::Internal("Rate limiter is not configured".to_string()));
            return Box::pin(ready(Ok(response.map_into_right_body())));
        };

        let key = client_key(&req, limiter.trust_proxy);
        let decision = limiter.check(&key, self.max, self.window);

        if !decision.allowed {
            warn!(
                target: "security",
                path = %req.path(),
                retry_after = decision.retry_after_secs,
                "Rate limit exceeded"
            );
            let response = req.error_response(AppError::RateLimited(decision));
            return Box::pin(ready(Ok(response.map_into_right_body())));
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            let headers = res.headers_mut();
            for (name, value) in decision.headers() {
                if let (Ok(name), Ok(value)) =
                    (HeaderName::try_from(name), HeaderValue::try_from(value))
                {
                    headers.insert(name, value);
                }
            }
            Ok(res.map_into_left_body())
        })
    }
}

/// `<client address>:<path>`.
///
/// Forwarding headers are client-controlled, so they only name the client
/// when a trusted proxy sets them.
fn client_key(req: &ServiceRequest, trust_proxy: bool) -> String {
    let ip = if trust_proxy {
        req.connection_info()
            .realip_remote_addr()
            .map(str::to_string)
    } else {
        req.peer_addr().map(|addr| addr.ip().to_string())
    };
    format!("{}:{}", ip.as_deref().unwrap_or("anonymous"), req.path())
}
