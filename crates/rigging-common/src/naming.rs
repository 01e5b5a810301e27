//! Default resource names
//!
//! Every resource an app emits gets a name. An explicitly configured name is
//! used as-is; otherwise the name is `<prefix>-<app-name>`. Names never
//! depend on anything but the app name and the resource kind, so re-applying
//! the same options always targets the same objects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of resources that get a derived default name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Docker container or Kubernetes container
    Container,
    /// Kubernetes ConfigMap
    ConfigMap,
    /// Kubernetes Secret
    Secret,
    /// Kubernetes Service
    Service,
    /// Pod or Docker volume
    Volume,
    /// Kubernetes Deployment
    Deployment,
    /// Pod template
    Pod,
}

impl ResourceKind {
    /// Naming prefix for this kind
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::ConfigMap => "cm",
            Self::Secret => "secret",
            Self::Service => "svc",
            Self::Volume => "volume",
            Self::Deployment => "deploy",
            Self::Pod => "pod",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Derive the default name for a resource kind.
pub fn default_name(kind: ResourceKind, app_name: &str) -> String {
    format!("{}-{}", kind.prefix(), app_name)
}

/// Return the explicit name if set, else the derived default.
pub fn resolve_name(explicit: Option<&str>, kind: ResourceKind, app_name: &str) -> String {
    match explicit {
        Some(name) => name.to_string(),
        None => default_name(kind, app_name),
    }
}

/// Optional name overrides, one per resource kind
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NameOverrides {
    /// Container name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// ConfigMap name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<String>,
    /// Secret name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Service name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Volume name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    /// Deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    /// Pod name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
}

impl NameOverrides {
    fn get(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Container => self.container.as_deref(),
            ResourceKind::ConfigMap => self.config_map.as_deref(),
            ResourceKind::Secret => self.secret.as_deref(),
            ResourceKind::Service => self.service.as_deref(),
            ResourceKind::Volume => self.volume.as_deref(),
            ResourceKind::Deployment => self.deployment.as_deref(),
            ResourceKind::Pod => self.pod.as_deref(),
        }
    }

    /// Resolve every name for an app
    pub fn resolve(&self, app_name: &str) -> ResolvedNames {
        let name = |kind| resolve_name(self.get(kind), kind, app_name);
        ResolvedNames {
            container: name(ResourceKind::Container),
            config_map: name(ResourceKind::ConfigMap),
            secret: name(ResourceKind::Secret),
            service: name(ResourceKind::Service),
            volume: name(ResourceKind::Volume),
            deployment: name(ResourceKind::Deployment),
            pod: name(ResourceKind::Pod),
        }
    }
}

/// Concrete names for every resource of an app
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedNames {
    /// Container name
    pub container: String,
    /// ConfigMap name
    pub config_map: String,
    /// Secret name
    pub secret: String,
    /// Service name
    pub service: String,
    /// Volume name
    pub volume: String,
    /// Deployment name
    pub deployment: String,
    /// Pod name
    pub pod: String,
}
