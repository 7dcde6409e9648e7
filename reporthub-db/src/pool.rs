#[cfg(feature = "mysql")]
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
#[cfg(feature = "postgres")]
use sqlx::postgres::{PgPool, PgPoolOptions};
#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::DbConnectionConfig;
use crate::error::DbError;

#[cfg(feature = "postgres")]
pub type DbPool = PgPool;
#[cfg(feature = "mysql")]
pub type DbPool = MySqlPool;
#[cfg(feature = "sqlite")]
pub type DbPool = SqlitePool;

#[cfg(feature = "postgres")]
type DbPoolOptions = PgPoolOptions;
#[cfg(feature = "mysql")]
type DbPoolOptions = MySqlPoolOptions;
#[cfg(feature = "sqlite")]
type DbPoolOptions = SqlitePoolOptions;

/// Creates a new backend-specific connection pool using the provided configuration.
pub async fn create_pool(config: &DbConnectionConfig) -> Result<DbPool, DbError> {
    let url = config.url.trim();
    if url.is_empty() {
        return Err(DbError::EmptyDatabaseUrl);
    }

    // For file-based sqlite databases, make sure the file exists before sqlx
    // tries to open it, otherwise the pool fails with an opaque open error.
    #[cfg(feature = "sqlite")]
    ensure_sqlite_db_file_exists(url)?;

    let mut opts = DbPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout());

    if let Some(idle) = config.idle_timeout() {
        opts = opts.idle_timeout(idle);
    }

    let pool = opts.connect(url).await?;
    tracing::debug!(max_connections = config.max_connections, "database pool created");
    Ok(pool)
}

#[cfg(feature = "sqlite")]
fn ensure_sqlite_db_file_exists(database_url: &str) -> Result<(), DbError> {
    use std::fs::{create_dir_all, File};
    use std::path::Path;

    // In-memory DSNs have no backing file.
    let lower = database_url.to_ascii_lowercase();
    if lower.contains(":memory:") || lower.contains("mode=memory") {
        return Ok(());
    }

    let mut path = database_url;
    path = path
        .strip_prefix("sqlite://")
        .or_else(|| path.strip_prefix("sqlite:"))
        .unwrap_or(path);
    if let Some(idx) = path.find('?') {
        path = &path[..idx];
    }
    let path = path.trim();
    if path.is_empty() {
        return Ok(());
    }

    let db_path = Path::new(path);
    if let Some(parent) = db_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty() && !p.exists())
    {
        create_dir_all(parent).map_err(|e| {
            DbError::FileCreation(format!(
                "failed to create parent directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    if !db_path.exists() {
        File::create(db_path).map_err(|e| {
            DbError::FileCreation(format!("failed to create DB file '{}': {e}", db_path.display()))
        })?;
    }

    Ok(())
}
