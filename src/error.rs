//! Error types for the triage engine.

use crate::triage::types::SeverityTier;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Keyword taxonomy construction errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("Phrase '{phrase}' is mapped to both {first} and {second}")]
    DuplicatePhrase {
        phrase: String,
        first: SeverityTier,
        second: SeverityTier,
    },

    #[error("Empty phrase in tier {tier}")]
    EmptyPhrase { tier: SeverityTier },

    #[error("Taxonomy contains no phrases")]
    EmptyTaxonomy,

    #[error("Failed to parse taxonomy: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server terminated: {0}")]
    Serve(#[source] std::io::Error),
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
