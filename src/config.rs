//! Application configuration loaded from environment variables.

use std::env;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

/// Cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "session";

/// Cookie holding the CSRF token.
pub const CSRF_COOKIE: &str = "csrf_token";

/// Request header that must echo the CSRF cookie.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Minimum length of the session signing secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_DATABASE_URL: &str = "sqlite://data/webmail.db?mode=rwc";
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const SESSION_TTL_SECS: u64 = 3600;
    pub const LAUNCH_TOKEN_TTL_SECS: u64 = 300;
    pub const CSRF_TTL_SECS: u64 = 3600;
    pub const RATE_LIMIT_CAPACITY: u64 = 10_000;
    pub const RATE_LIMIT_TTL_SECS: u64 = 900;
    pub const KDF_MEMORY_KIB: u32 = 19_456;
    pub const KDF_ITERATIONS: u32 = 2;
    pub const KDF_PARALLELISM: u32 = 1;
    pub const CLEANUP_INTERVAL_SECS: u64 = 3600;
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Cost parameters for the Argon2id key-derivation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfSettings {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
    /// Maximum number of KDF computations running at once
    pub max_concurrent: usize,
}

impl Default for KdfSettings {
    fn default() -> Self {
        Self {
            memory_kib: defaults::KDF_MEMORY_KIB,
            iterations: defaults::KDF_ITERATIONS,
            parallelism: defaults::KDF_PARALLELISM,
            max_concurrent: num_cpus::get().max(1),
        }
    }
}

/// Bounds for the in-memory rate limiter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    /// Maximum number of tracked (client, endpoint) keys
    pub capacity: u64,
    /// Idle lifetime of a tracked key, in seconds
    pub entry_ttl_secs: u64,
    /// Identify clients by `Forwarded`/`X-Forwarded-For` instead of the
    /// socket peer. Only safe behind a proxy that overwrites those headers.
    pub trust_proxy: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            capacity: defaults::RATE_LIMIT_CAPACITY,
            entry_ttl_secs: defaults::RATE_LIMIT_TTL_SECS,
            trust_proxy: false,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL (SQLite or PostgreSQL connection string)
    pub database_url: String,
    /// Path to the base64 master encryption key
    pub encryption_key_file: PathBuf,
    /// Session token signing secret (read from `JWT_SECRET_FILE`)
    pub jwt_secret: SecretString,
    /// Session lifetime in seconds
    pub session_ttl_secs: u64,
    /// Launch token lifetime in seconds
    pub launch_token_ttl_secs: u64,
    /// CSRF cookie lifetime in seconds (at most one hour)
    pub csrf_ttl_secs: u64,
    /// Rate limiter store bounds
    pub rate_limit: RateLimitSettings,
    /// Argon2id cost parameters
    pub kdf: KdfSettings,
    /// How often expired sessions and launch tokens are purged
    pub cleanup_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `ENCRYPTION_KEY_FILE`: Path to the base64 master key - REQUIRED
    /// - `JWT_SECRET_FILE`: Path to the session signing secret - REQUIRED
    /// - `WML_HOST`: Server host (default: 127.0.0.1)
    /// - `WML_PORT`: Server port (default: 8080)
    /// - `DATABASE_URL`: Database connection string (required in production)
    /// - `WML_SESSION_TTL_SECS`: Session lifetime (default: 3600)
    /// - `WML_LAUNCH_TOKEN_TTL_SECS`: Launch token lifetime (default: 300)
    /// - `WML_CSRF_TTL_SECS`: CSRF cookie lifetime (default and maximum: 3600)
    /// - `WML_RATE_LIMIT_CAPACITY`: Max tracked rate-limit keys (default: 10000)
    /// - `WML_RATE_LIMIT_TTL_SECS`: Rate-limit entry lifetime (default: 900)
    /// - `WML_TRUST_PROXY`: Key rate limits on `X-Forwarded-For` (default: false).
    ///   Enable only behind a reverse proxy that overwrites the header.
    /// - `WML_KDF_MEMORY_KIB`, `WML_KDF_ITERATIONS`, `WML_KDF_PARALLELISM`:
    ///   Argon2id cost (defaults: 19456, 2, 1)
    /// - `WML_KDF_MAX_CONCURRENT`: Concurrent KDF computations (default: CPU count)
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("WML_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = parse_var("WML_PORT", defaults::DEV_PORT, "WML_PORT must be a valid port number")?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DEV_DATABASE_URL.to_string());

        let encryption_key_file = env::var("ENCRYPTION_KEY_FILE")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::MissingEnvVar("ENCRYPTION_KEY_FILE"))?;

        let jwt_secret_file = env::var("JWT_SECRET_FILE")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::MissingEnvVar("JWT_SECRET_FILE"))?;
        let jwt_secret = read_jwt_secret(&jwt_secret_file)?;

        let session_ttl_secs = parse_var(
            "WML_SESSION_TTL_SECS",
            defaults::SESSION_TTL_SECS,
            "WML_SESSION_TTL_SECS must be a valid number",
        )?;
        let launch_token_ttl_secs = parse_var(
            "WML_LAUNCH_TOKEN_TTL_SECS",
            defaults::LAUNCH_TOKEN_TTL_SECS,
            "WML_LAUNCH_TOKEN_TTL_SECS must be a valid number",
        )?;
        let csrf_ttl_secs = parse_var(
            "WML_CSRF_TTL_SECS",
            defaults::CSRF_TTL_SECS,
            "WML_CSRF_TTL_SECS must be a valid number",
        )?
        .min(defaults::CSRF_TTL_SECS);

        let rate_limit = RateLimitSettings {
            capacity: parse_var(
                "WML_RATE_LIMIT_CAPACITY",
                defaults::RATE_LIMIT_CAPACITY,
                "WML_RATE_LIMIT_CAPACITY must be a valid number",
            )?,
            entry_ttl_secs: parse_var(
                "WML_RATE_LIMIT_TTL_SECS",
                defaults::RATE_LIMIT_TTL_SECS,
                "WML_RATE_LIMIT_TTL_SECS must be a valid number",
            )?,
            trust_proxy: parse_var(
                "WML_TRUST_PROXY",
                false,
                "WML_TRUST_PROXY must be 'true' or 'false'",
            )?,
        };

        let kdf = KdfSettings {
            memory_kib: parse_var(
                "WML_KDF_MEMORY_KIB",
                defaults::KDF_MEMORY_KIB,
                "WML_KDF_MEMORY_KIB must be a valid number",
            )?,
            iterations: parse_var(
                "WML_KDF_ITERATIONS",
                defaults::KDF_ITERATIONS,
                "WML_KDF_ITERATIONS must be a valid number",
            )?,
            parallelism: parse_var(
                "WML_KDF_PARALLELISM",
                defaults::KDF_PARALLELISM,
                "WML_KDF_PARALLELISM must be a valid number",
            )?,
            max_concurrent: parse_var(
                "WML_KDF_MAX_CONCURRENT",
                num_cpus::get().max(1),
                "WML_KDF_MAX_CONCURRENT must be a valid number",
            )?
            .max(1),
        };

        let config = Config {
            environment,
            host,
            port,
            database_url,
            encryption_key_file,
            jwt_secret,
            session_ttl_secs,
            launch_token_ttl_secs,
            csrf_ttl_secs,
            rate_limit,
            kdf,
            cleanup_interval_secs: if environment.is_development() {
                60
            } else {
                defaults::CLEANUP_INTERVAL_SECS
            },
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url == defaults::DEV_DATABASE_URL {
            errors.push(format!(
                "DATABASE_URL is using development default '{}'. Set a production database URL.",
                defaults::DEV_DATABASE_URL
            ));
        }

        if self.session_ttl_secs == 0 {
            errors.push("WML_SESSION_TTL_SECS must be greater than zero.".to_string());
        }

        if self.launch_token_ttl_secs == 0 {
            errors.push("WML_LAUNCH_TOKEN_TTL_SECS must be greater than zero.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.environment.is_production()
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &str,
    default: T,
    message: &'static str,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue(message)),
        Err(_) => Ok(default),
    }
}

/// Read the session signing secret from disk.
pub fn read_jwt_secret(path: &Path) -> Result<SecretString, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::SecretFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let secret = SecretString::from(raw.trim().to_string());
    if secret.expose_secret().len() < MIN_JWT_SECRET_LEN {
        return Err(ConfigError::SecretFile {
            path: path.to_path_buf(),
            reason: format!("secret must be at least {MIN_JWT_SECRET_LEN} bytes"),
        });
    }

    Ok(secret)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Failed to load secret from {}: {reason}", path.display())]
    SecretFile { path: PathBuf, reason: String },

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
