//! Common types for rigging: errors, metadata, naming and YAML utilities

#![deny(missing_docs)]

pub mod error;
pub mod meta;
pub mod naming;
pub mod telemetry;
pub mod yaml;

pub use error::Error;
pub use meta::ObjectMeta;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Label key carrying the app name on every generated resource
pub const LABEL_NAME: &str = "app.kubernetes.io/name";

/// Label key carrying the component (resource) name
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";

/// Label key identifying the tool that generated a resource
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value for [`LABEL_MANAGED_BY`]
pub const LABEL_MANAGED_BY_RIGGING: &str = "rigging";

/// Node label for the cloud region a node runs in
pub const TOPOLOGY_REGION_LABEL: &str = "topology.kubernetes.io/region";

/// Node label for the availability zone a node runs in
pub const TOPOLOGY_ZONE_LABEL: &str = "topology.kubernetes.io/zone";

/// Lowest port Kubernetes accepts for a NodePort service
pub const NODE_PORT_MIN: u16 = 30000;

/// Highest port Kubernetes accepts for a NodePort service
pub const NODE_PORT_MAX: u16 = 32767;
