//! Error types for the CLI

use std::path::PathBuf;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    App(#[from] rigging_common::Error),

    #[error(transparent)]
    Telemetry(#[from] rigging_common::telemetry::TelemetryError),

    #[error("failed to read {path}: {source}")]
    ReadDefinition {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{app}: no {backend} resources could be built")]
    NoResources { app: String, backend: String },

    #[error("{kind} does not serve connections")]
    NoConnectionUrl { kind: String },
}

impl Error {
    pub fn no_resources(app: impl Into<String>, backend: impl Into<String>) -> Self {
        Error::NoResources {
            app: app.into(),
            backend: backend.into(),
        }
    }
}
