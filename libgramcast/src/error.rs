//! Error types for Gramcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GramcastError>;

#[derive(Error, Debug)]
pub enum GramcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GramcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            GramcastError::InvalidInput(_) => 3,
            GramcastError::Publish(PublishError::NotConfigured) => 2,
            GramcastError::Publish(_) => 1,
            GramcastError::Config(_) => 1,
            GramcastError::Database(_) => 1,
        }
    }

    /// The message recorded on a failed post.
    ///
    /// Publish errors are stored without the outer "Publish error:" wrapper
    /// so that the platform's own message survives verbatim.
    pub fn failure_message(&self) -> String {
        match self {
            GramcastError::Publish(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone)]
pub enum PublishError {
    /// The process-level access token is absent or empty. Operational,
    /// never attributed to a single post's content.
    #[error("access token not configured")]
    NotConfigured,

    /// No usable connection record for the post's owner.
    #[error("no publishing credential for owner")]
    MissingCredential,

    /// The platform rejected a container-create or container-publish call.
    /// Carries the platform's message verbatim when one was returned.
    #[error("{0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),
}
