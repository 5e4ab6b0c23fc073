//! Error types for Portico

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for Portico
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema fetch could not complete
    #[error("Failed to fetch schema from '{host}': {message}")]
    Fetch {
        /// Service host
        host: String,
        /// Error message
        message: String,
    },

    /// Schema endpoint answered with something other than 200
    #[error("Schema endpoint of '{host}' returned status {status}")]
    UnexpectedStatus {
        /// Service host
        host: String,
        /// HTTP status code
        status: u16,
    },

    /// Route cache error
    #[error("Route cache error: {0}")]
    Cache(String),

    /// Restart collaborator rejected the restart
    #[error("Restart failed: {0}")]
    Restart(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a fetch error
    pub fn fetch(host: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Fetch {
            host: host.into(),
            message: message.into(),
        }
    }

    /// True for failures of the schema transport (network error, non-200
    /// status, unparsable body). These are recovered by treating the
    /// service as schema-less.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Fetch { .. } | Error::UnexpectedStatus { .. })
    }
}
