//! Common error types for Folio

use thiserror::Error;

/// Common result type for Folio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Folio services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Data integrity conflict (duplicate email, subdomain, payment reference)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// External provider failure (payment, hosting, email)
    #[error("External provider error: {0}")]
    External(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Translate a unique-constraint violation into a user-facing conflict.
    ///
    /// SQLite reports constraint violations as database errors; callers that
    /// insert rows with unique columns use this to surface a specific message
    /// instead of a raw driver error.
    pub fn conflict_on_unique(self, what: &str) -> Error {
        match &self {
            Error::Database(sqlx::Error::Database(db_err))
                if db_err.message().contains("UNIQUE constraint failed") =>
            {
                Error::Conflict(format!("{} already exists", what))
            }
            _ => self,
        }
    }
}
