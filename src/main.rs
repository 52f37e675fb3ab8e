//! Webmail Launcher server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::process;

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use actix_web::{App, HttpServer, web};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use webmail_launcher_lib::auth::{PasswordHasher, SessionManager};
use webmail_launcher_lib::config::{CSRF_HEADER, Config};
use webmail_launcher_lib::crypto::{CredentialCipher, Kdf, MasterKey};
use webmail_launcher_lib::db::DbPool;
use webmail_launcher_lib::middleware::{RateLimiter, RequestLogger};
use webmail_launcher_lib::{api, services};

/// Log a startup failure and exit.
fn fatal(context: &str, err: impl std::fmt::Display) -> ! {
    error!("{}: {}", context, err);
    process::exit(1);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - ENCRYPTION_KEY_FILE and JWT_SECRET_FILE must point to readable files");
            error!("  - In production, DATABASE_URL must be set and differ from the default");
            process::exit(1);
        }
    };

    info!("========================================");
    info!("  Webmail Launcher");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    if config.rate_limit.trust_proxy {
        warn!("WML_TRUST_PROXY is set: rate limits key on X-Forwarded-For. The proxy must overwrite it.");
    }

    // Key material: loaded once, before any request can need it
    let master_key = MasterKey::load(&config.encryption_key_file)
        .unwrap_or_else(|e| fatal("Failed to load master key", e));
    let kdf = Kdf::new(&config.kdf).unwrap_or_else(|e| fatal("Invalid KDF settings", e));
    info!(
        "KDF: Argon2id m={}KiB t={} p={} ({} concurrent)",
        config.kdf.memory_kib, config.kdf.iterations, config.kdf.parallelism, config.kdf.max_concurrent
    );

    // Initialize database
    let pool = DbPool::new(&config)
        .await
        .unwrap_or_else(|e| fatal("Failed to initialize database", e));
    info!("Database connection established");

    pool.run_migrations()
        .await
        .unwrap_or_else(|e| fatal("Failed to run migrations", e));
    info!("Database migrations complete");

    // Start the cleanup background task
    services::start_cleanup_task(pool.clone(), config.cleanup_interval_secs);

    // Prepare shared state
    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let sessions = web::Data::new(SessionManager::from_config(&config));
    let hasher = PasswordHasher::new(kdf.clone());
    hasher
        .prepare_dummy()
        .await
        .unwrap_or_else(|e| fatal("Failed to prepare login hasher", e));
    let hasher = web::Data::new(hasher);
    let cipher = web::Data::new(CredentialCipher::new(master_key, kdf));
    let limiter = web::Data::new(RateLimiter::new(&config.rate_limit));
    let pool = web::Data::new(pool);
    let config = web::Data::new(config);

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        let allowed_headers = vec![
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static(CSRF_HEADER),
        ];

        // Configure CORS
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers)
                .supports_credentials()
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers)
                .max_age(3600)
        };

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            // Add request logging middleware
            .wrap(RequestLogger)
            // Add shared state
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(sessions.clone())
            .app_data(hasher.clone())
            .app_data(cipher.clone())
            .app_data(limiter.clone())
            // Configure API routes
            .service(web::scope("/api").configure(api::configure_routes))
    });

    // Set worker count
    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
