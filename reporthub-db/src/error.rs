use thiserror::Error;

/// Errors that can occur while configuring or creating the database pool.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("environment variable {0} is missing")]
    MissingEnvVar(String),
    #[error("database url cannot be empty")]
    EmptyDatabaseUrl,
    #[error("invalid value '{value}' for {var}")]
    InvalidValue { var: String, value: String },
    #[error("file/directory creation error: {0}")]
    FileCreation(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Returns true when the error is a uniqueness-constraint violation reported
/// by the underlying database.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
