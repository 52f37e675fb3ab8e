//! Database module providing connection management, migrations, and queries.

pub mod launch_tokens;
pub mod mail_accounts;
pub mod sessions;
pub mod users;

use std::path::Path;
use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Database connection pool wrapper.
///
/// `DatabaseConnection` is itself a pool, so cloning `DbPool` is cheap.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        Self::connect(&config.database_url).await
    }

    /// Connect to `url` (`sqlite://...` or `postgres://...`).
    pub async fn connect(url: &str) -> AppResult<Self> {
        let in_memory = url.starts_with("sqlite::memory:");
        if let Some(path) = sqlite_file_path(url) {
            // Ensure parent directory exists
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let mut options = ConnectOptions::new(url.to_owned());
        options
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if in_memory {
            // Each in-memory connection is its own database; keep exactly one alive.
            options.max_connections(1).min_connections(1);
        } else {
            options.max_connections(16).min_connections(1);
        }

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        info!(backend = ?conn.get_database_backend(), "Database connected");
        Ok(DbPool { conn })
    }

    /// Apply pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Get access to the connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}

/// File path of a `sqlite://` URL, without query parameters.
fn sqlite_file_path(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty() && path != ":memory:").then_some(path)
}
