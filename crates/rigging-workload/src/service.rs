//! Service types and node-port validation

use std::collections::BTreeMap;

use rigging_common::{ObjectMeta, NODE_PORT_MAX, NODE_PORT_MIN};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CompilationError;
use crate::k8s::TargetPort;

// =============================================================================
// Service
// =============================================================================

/// How a Service is exposed
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum ServiceType {
    /// Cluster-internal virtual IP
    ClusterIP,
    /// Static port on every node
    NodePort,
    /// Cloud load balancer
    LoadBalancer,
}

/// Kubernetes Service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: ServiceSpec,
}

impl Service {
    /// Create a Service
    pub fn new(metadata: ObjectMeta, spec: ServiceSpec) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Service".to_string(),
            metadata,
            spec,
        }
    }
}

/// Service spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Selector
    pub selector: BTreeMap<String, String>,
    /// Ports
    pub ports: Vec<ServicePort>,
    /// Service type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<ServiceType>,
}

/// Service port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port number
    pub port: u16,
    /// Target port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<TargetPort>,
    /// Node port (NodePort and LoadBalancer only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<u16>,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

// =============================================================================
// Node port
// =============================================================================

fn in_node_port_range(port: u16) -> bool {
    (NODE_PORT_MIN..=NODE_PORT_MAX).contains(&port)
}

/// Decide the node port a Service port carries.
///
/// - `NodePort`: a port is required and must lie in the node-port range
/// - `LoadBalancer`: a given port must lie in the range; none lets the
///   cluster allocate one
/// - `ClusterIP` or unset: a given port is dropped with a warning
pub fn plan_node_port(
    service_type: Option<ServiceType>,
    node_port: Option<u16>,
    service: &str,
) -> Result<Option<u16>, CompilationError> {
    match (service_type, node_port) {
        (Some(ServiceType::NodePort), Some(port)) if in_node_port_range(port) => Ok(Some(port)),
        (Some(ServiceType::NodePort), port) => {
            Err(CompilationError::invalid_node_port(service, port))
        }
        (Some(ServiceType::LoadBalancer), Some(port)) if !in_node_port_range(port) => {
            Err(CompilationError::invalid_node_port(service, Some(port)))
        }
        (Some(ServiceType::LoadBalancer), port) => Ok(port),
        (Some(ServiceType::ClusterIP) | None, Some(port)) => {
            warn!(
                service = %service,
                node_port = port,
                "node port ignored for service without NodePort or LoadBalancer type"
            );
            Ok(None)
        }
        (Some(ServiceType::ClusterIP) | None, None) => Ok(None),
    }
}
