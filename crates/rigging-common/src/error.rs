//! Error types for rigging
//!
//! Errors are structured with fields so a failed build can be traced back to
//! the app and option that caused it.

use thiserror::Error;

/// Main error type for rigging operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid app options
    #[error("validation error for {app}: {message}")]
    Validation {
        /// Name of the app with invalid options
        app: String,
        /// Description of what's invalid
        message: String,
        /// The invalid option path (e.g., "service.nodePort")
        field: Option<String>,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Filesystem error
    #[error("io error: {source}")]
    Io {
        /// The underlying io error
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a validation error with app context and option path
    pub fn validation_for_field(
        app: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            app: app.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error for a specific resource kind
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// The option path of a validation error, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
