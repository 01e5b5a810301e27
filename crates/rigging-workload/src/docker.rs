//! Docker resource types
//!
//! A Docker group is one container attached to one network. Field names
//! follow the `docker run` options so the group can be handed to any Docker
//! client as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::env::EnvironmentMap;

/// Default network apps are attached to
pub const DEFAULT_NETWORK: &str = "rigging";

/// Settings shared by every Docker group in one build
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DockerBuildContext {
    /// Network every container joins
    pub network: String,
}

impl Default for DockerBuildContext {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
        }
    }
}

impl DockerBuildContext {
    /// Use a specific network
    pub fn with_network(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
        }
    }
}

/// How a volume source is mounted into a container
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeBinding {
    /// Path inside the container
    pub bind: String,
    /// Mount mode ("rw" or "ro")
    pub mode: String,
}

impl VolumeBinding {
    /// Read-write bind at `path`
    pub fn read_write(path: impl Into<String>) -> Self {
        Self {
            bind: path.into(),
            mode: "rw".to_string(),
        }
    }
}

/// A Docker container
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DockerContainer {
    /// Container name
    pub name: String,
    /// Image reference (`name:tag`)
    pub image: String,
    /// Entrypoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    /// Command override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Run in the background
    pub detach: bool,
    /// Remove the container when it exits
    pub auto_remove: bool,
    /// Remove an existing container with the same name first
    pub remove: bool,
    /// Keep stdin open
    pub stdin_open: bool,
    /// Allocate a pseudo-TTY
    pub tty: bool,
    /// Environment variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: EnvironmentMap,
    /// Network to join
    pub network: String,
    /// Published ports, container port to host port
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ports: BTreeMap<u16, u16>,
    /// Volumes, source (named volume or host path) to binding
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, VolumeBinding>,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// A Docker network
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DockerNetwork {
    /// Network name
    pub name: String,
    /// Network driver
    pub driver: String,
}

impl DockerNetwork {
    /// A bridge network
    pub fn bridge(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: "bridge".to_string(),
        }
    }
}

/// Everything Docker needs to run one app
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DockerResourceGroup {
    /// Group name (the app name)
    pub name: String,
    /// Whether the group should be started
    pub enabled: bool,
    /// Network
    pub network: DockerNetwork,
    /// Container
    pub container: DockerContainer,
}
