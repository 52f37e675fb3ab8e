//! Shared test helpers for API E2E tests.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use actix_web::cookie::Cookie;
use actix_web::{App, dev::ServiceResponse, test, web};
use base64::Engine;
use secrecy::SecretString;
use serde_json::Value;
use webmail_launcher_lib::api;
use webmail_launcher_lib::auth::{PasswordHasher, SessionManager};
use webmail_launcher_lib::config::{
    CSRF_COOKIE, CSRF_HEADER, Config, Environment, KdfSettings, RateLimitSettings, SESSION_COOKIE,
};
use webmail_launcher_lib::crypto::{CredentialCipher, Kdf, MasterKey};
use webmail_launcher_lib::db::DbPool;
use webmail_launcher_lib::middleware::RateLimiter;

/// Password used for every test user.
pub const TEST_PASSWORD: &str = "correct horse battery";

static NEXT_CLIENT: AtomicU32 = AtomicU32::new(1);

/// A distinct client address, so per-client rate limits don't leak between helpers.
pub fn unique_ip() -> IpAddr {
    let [_, a, b, c] = NEXT_CLIENT.fetch_add(1, Ordering::Relaxed).to_be_bytes();
    IpAddr::V4(Ipv4Addr::new(10, a, b, c))
}

/// Everything a test app is built from.
pub struct TestContext {
    pub pool: DbPool,
    pub config: Config,
    pub cipher: CredentialCipher,
    pub hasher: PasswordHasher,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = DbPool::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        pool.run_migrations()
            .await
            .expect("Failed to run migrations");

        let kdf_settings = KdfSettings {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
            max_concurrent: 4,
        };
        let config = Config {
            environment: Environment::Development,
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            encryption_key_file: PathBuf::from("unused"),
            jwt_secret: SecretString::from("e2e-session-signing-secret-0123456789abcdef".to_string()),
            session_ttl_secs: 3600,
            launch_token_ttl_secs: 300,
            csrf_ttl_secs: 3600,
            rate_limit: RateLimitSettings::default(),
            kdf: kdf_settings,
            cleanup_interval_secs: 3600,
        };

        let kdf = Kdf::new(&kdf_settings).expect("Invalid KDF settings");
        let encoded = base64::engine::general_purpose::STANDARD.encode([42u8; 32]);
        let master = MasterKey::from_base64(&encoded).expect("Invalid master key");

        let hasher = PasswordHasher::new(kdf.clone());
        hasher
            .prepare_dummy()
            .await
            .expect("Failed to prepare dummy hash");

        Self {
            pool,
            config,
            cipher: CredentialCipher::new(Arc::new(master), kdf),
            hasher,
        }
    }
}

/// Create a test app with its own rate limiter.
pub async fn create_test_app(
    ctx: &TestContext,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.pool.clone()))
            .app_data(web::Data::new(ctx.config.clone()))
            .app_data(web::Data::new(SessionManager::from_config(&ctx.config)))
            .app_data(web::Data::new(ctx.hasher.clone()))
            .app_data(web::Data::new(ctx.cipher.clone()))
            .app_data(web::Data::new(RateLimiter::new(&ctx.config.rate_limit)))
            .service(web::scope("/api").configure(api::configure_routes)),
    )
    .await
}

/// Find a cookie set by `resp`.
pub fn response_cookie(resp: &ServiceResponse, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.into_owned())
}

/// Send `req` and return status and JSON body.
pub async fn send<S>(app: &S, req: actix_http::Request) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// A browser-like client: session cookie, CSRF pair, fixed peer address.
#[derive(Clone)]
pub struct TestClient {
    pub ip: IpAddr,
    pub session: Option<Cookie<'static>>,
    pub csrf_cookie: Option<Cookie<'static>>,
    pub csrf_token: Option<String>,
}

impl TestClient {
    pub fn new() -> Self {
        Self {
            ip: unique_ip(),
            session: None,
            csrf_cookie: None,
            csrf_token: None,
        }
    }

    /// Request builder carrying this client's cookies, address and CSRF header.
    pub fn request(&self, req: test::TestRequest) -> test::TestRequest {
        let mut req = req.peer_addr(SocketAddr::new(self.ip, 40000));
        if let Some(cookie) = &self.session {
            req = req.cookie(cookie.clone());
        }
        if let Some(cookie) = &self.csrf_cookie {
            req = req.cookie(cookie.clone());
        }
        if let Some(token) = &self.csrf_token {
            req = req.insert_header((CSRF_HEADER, token.as_str()));
        }
        req
    }

    pub fn get(&self, uri: &str) -> test::TestRequest {
        self.request(test::TestRequest::get().uri(uri))
    }

    pub fn post(&self, uri: &str, body: Value) -> test::TestRequest {
        self.request(test::TestRequest::post().uri(uri).set_json(body))
    }

    pub fn put(&self, uri: &str, body: Value) -> test::TestRequest {
        self.request(test::TestRequest::put().uri(uri).set_json(body))
    }

    pub fn delete(&self, uri: &str) -> test::TestRequest {
        self.request(test::TestRequest::delete().uri(uri))
    }

    /// Fetch a CSRF token and keep both copies.
    pub async fn fetch_csrf<S>(&mut self, app: &S)
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let resp = test::call_service(app, self.get("/api/auth/csrf").to_request()).await;
        assert_eq!(resp.status(), 200, "CSRF endpoint failed");
        let cookie = response_cookie(&resp, CSRF_COOKIE).expect("CSRF cookie not set");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["token"].as_str(), Some(cookie.value()));
        self.csrf_token = Some(cookie.value().to_string());
        self.csrf_cookie = Some(cookie);
    }

    /// POST credentials to `/api/auth/{action}`; keeps the session cookie on success.
    pub async fn submit_credentials<S>(
        &mut self,
        app: &S,
        action: &str,
        email: &str,
        password: &str,
    ) -> (u16, Value)
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let req = self
            .post(
                &format!("/api/auth/{action}"),
                serde_json::json!({ "email": email, "password": password }),
            )
            .to_request();
        let resp = test::call_service(app, req).await;
        if let Some(cookie) = response_cookie(&resp, SESSION_COOKIE) {
            self.session = Some(cookie);
        }
        let status = resp.status().as_u16();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }
}

/// Register `email`, fetch a CSRF token, and return the signed-in client.
pub async fn signed_in_client<S>(app: &S, email: &str) -> TestClient
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut client = TestClient::new();
    let (status, body) = client
        .submit_credentials(app, "register", email, TEST_PASSWORD)
        .await;
    assert_eq!(status, 201, "Failed to register {email}: {body}");
    client.fetch_csrf(app).await;
    client
}

/// Body of a valid account creation request.
pub fn account_body(name: &str, password: &str) -> Value {
    serde_json::json!({
        "name": name,
        "email": "mailbox@example.org",
        "imapHost": "imap.example.org",
        "imapPort": 993,
        "imapSecurity": "ssl",
        "smtpHost": "smtp.example.org",
        "smtpPort": 587,
        "smtpSecurity": "starttls",
        "username": "mailbox@example.org",
        "password": password,
    })
}

/// Create an account for `client` and return its id.
pub async fn create_account<S>(app: &S, client: &TestClient, name: &str) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (status, body) = send(
        app,
        client
            .post("/api/accounts", account_body(name, "imap-secret"))
            .to_request(),
    )
    .await;
    assert_eq!(status, 201, "Failed to create account: {body}");
    body["account"]["id"]
        .as_str()
        .expect("account id missing")
        .to_string()
}
