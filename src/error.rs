//! Error types for the gatekeeper engine.
//!
//! Core evaluation never raises past its own boundary; everything a policy
//! pass can produce is representable in its return value. Errors here come
//! from the collaborator edges (stores, config, document parsing).

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gatekeeper engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Error talking to a store collaborator (policy or descriptor store)
    #[error("Store error from {store}: {message}")]
    Store {
        /// Name of the store collaborator
        store: String,
        /// Detailed error message
        message: String,
    },

    /// Error during policy document parsing
    #[error("Policy parse error: {message}")]
    Parse {
        /// Detailed error message
        message: String,
        /// Policy name that caused the error, if known
        policy: Option<String>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Detailed error message
        message: String,
        /// Configuration key that caused the error
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Internal error (unexpected condition)
    #[error("Internal error: {message}")]
    Internal {
        /// Detailed error message
        message: String,
    },
}

impl Error {
    /// Create a store error.
    pub fn store(store: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Store {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            policy: None,
        }
    }

    /// Create a parse error with policy context.
    pub fn parse_with_policy(message: impl Into<String>, policy: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            policy: Some(policy.into()),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: None,
        }
    }

    /// Create a configuration error with key context.
    pub fn config_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (a retry may succeed).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Store { .. })
    }

    /// Get the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Store { .. } => "store",
            Error::Parse { .. } => "parse",
            Error::Config { .. } => "config",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
            Error::Yaml(_) => "yaml",
            Error::Internal { .. } => "internal",
        }
    }
}
