//! Per-resource build errors
//!
//! A `CompilationError` never escapes an app's group builder: the builder logs
//! it and omits the resource it was building.

use thiserror::Error;

/// Errors that can occur while building a single resource
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompilationError {
    /// A volume or resource variant was selected without its required field
    #[error("{resource}: {field} not provided")]
    MissingField {
        /// What was being built (e.g., "volume-redis")
        resource: String,
        /// The missing option
        field: String,
    },

    /// The volume kind cannot be expressed on the selected backend
    #[error("volume type {kind} not supported on {backend}")]
    UnsupportedVolume {
        /// Volume kind (e.g., "awsEbs")
        kind: String,
        /// Backend name ("docker" or "kubernetes")
        backend: String,
    },

    /// Node port missing or outside the allowed range
    #[error("service {service}: node port {} invalid", display_port(.port))]
    InvalidNodePort {
        /// Service name
        service: String,
        /// The rejected port, if any was given
        port: Option<u16>,
    },

    /// An EBS volume reference could not be resolved to a volume id
    #[error("EBS volume {volume}: {message}")]
    VolumeLookup {
        /// Name of the referenced EBS volume
        volume: String,
        /// What went wrong
        message: String,
    },
}

fn display_port(port: &Option<u16>) -> String {
    match port {
        Some(p) => p.to_string(),
        None => "<none>".to_string(),
    }
}

impl CompilationError {
    /// Create a missing field error
    pub fn missing_field(resource: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            resource: resource.into(),
            field: field.into(),
        }
    }

    /// Create an unsupported volume error
    pub fn unsupported_volume(kind: impl Into<String>, backend: impl Into<String>) -> Self {
        Self::UnsupportedVolume {
            kind: kind.into(),
            backend: backend.into(),
        }
    }

    /// Create an invalid node port error
    pub fn invalid_node_port(service: impl Into<String>, port: Option<u16>) -> Self {
        Self::InvalidNodePort {
            service: service.into(),
            port,
        }
    }

    /// Create a volume lookup error
    pub fn volume_lookup(volume: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VolumeLookup {
            volume: volume.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let err = CompilationError::missing_field("volume-redis", "hostPath.path");
        assert_eq!(err.to_string(), "volume-redis: hostPath.path not provided");
    }

    #[test]
    fn test_unsupported_volume_display() {
        let err = CompilationError::unsupported_volume("awsEbs", "docker");
        assert_eq!(err.to_string(), "volume type awsEbs not supported on docker");
    }

    #[test]
    fn test_invalid_node_port_display() {
        let err = CompilationError::invalid_node_port("svc-redis", Some(29999));
        assert_eq!(err.to_string(), "service svc-redis: node port 29999 invalid");

        let err = CompilationError::invalid_node_port("svc-redis", None);
        assert!(err.to_string().contains("<none>"));
    }

    #[test]
    fn test_volume_lookup_display() {
        let err = CompilationError::volume_lookup("redis-data", "no volume in us-east-1");
        assert!(err.to_string().contains("redis-data"));
        assert!(err.to_string().contains("us-east-1"));
    }
}
