#[cfg(not(any(feature = "postgres", feature = "mysql", feature = "sqlite")))]
compile_error!(
    "Enable exactly one of the `postgres`, `mysql`, or `sqlite` features for reporthub-db."
);

#[cfg(any(
    all(feature = "postgres", feature = "mysql"),
    all(feature = "postgres", feature = "sqlite"),
    all(feature = "mysql", feature = "sqlite"),
))]
compile_error!(
    "Activate only one backend feature (`postgres`, `mysql`, or `sqlite`) for reporthub-db."
);

#[cfg(feature = "postgres")]
pub type DbBackend = sqlx::Postgres;
#[cfg(feature = "mysql")]
pub type DbBackend = sqlx::MySql;
#[cfg(feature = "sqlite")]
pub type DbBackend = sqlx::Sqlite;

pub mod config;
pub mod error;
pub mod idempotency;
pub mod pool;
pub mod reports;

pub use config::DbConnectionConfig;
pub use error::DbError;
pub use pool::{create_pool, DbPool};
