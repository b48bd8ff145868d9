//! Error types for the core library

use thiserror::Error;

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;

/// The core error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An identifier string could not be parsed as a guid
    #[error("Malformed guid '{input}'")]
    MalformedGuid { input: String },

    /// A textual value could not be coerced to the requested type
    #[error("Cannot convert '{input}' to {target}")]
    TypeCast { input: String, target: String },

    /// An external asset could not be acquired
    #[error("Asset load error: {0}")]
    AssetLoad(String),

    /// Configuration could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Create a type-cast error
    pub fn type_cast(input: impl Into<String>, target: impl core::fmt::Display) -> Self {
        Error::TypeCast {
            input: input.into(),
            target: target.to_string(),
        }
    }

    /// Check if this is a type-cast failure
    pub fn is_type_cast(&self) -> bool {
        matches!(self, Error::TypeCast { .. })
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Message(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Message(s)
    }
}
