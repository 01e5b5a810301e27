//! Volume resolution
//!
//! Turns a [`VolumeSource`] into the backend-specific volume, mount and, for
//! EBS volumes, the node selector that keeps pods in the volume's zone.

use std::collections::BTreeMap;

use rigging_common::{TOPOLOGY_REGION_LABEL, TOPOLOGY_ZONE_LABEL};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::docker::VolumeBinding;
use crate::error::CompilationError;
use crate::k8s::{Volume, VolumeMount};

// =============================================================================
// Options
// =============================================================================

fn default_true() -> bool {
    true
}

/// Volume options shared by every app
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeOptions {
    /// Whether the app gets a volume at all
    #[serde(default = "default_true")]
    pub create: bool,
    /// Mount path inside the container; each app has its own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,
    /// Where the data lives
    #[serde(default)]
    pub source: VolumeSource,
}

impl Default for VolumeOptions {
    fn default() -> Self {
        Self {
            create: true,
            mount_path: None,
            source: VolumeSource::default(),
        }
    }
}

/// Backing store of a volume
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VolumeSource {
    /// Scratch space tied to the pod (a named volume on Docker)
    #[default]
    EmptyDir,
    /// Directory on the host
    HostPath(HostPathSource),
    /// AWS Elastic Block Store volume (Kubernetes only)
    AwsEbs(AwsEbsSource),
}

impl VolumeSource {
    /// Kind name as used in app definitions
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyDir => "emptyDir",
            Self::HostPath(_) => "hostPath",
            Self::AwsEbs(_) => "awsEbs",
        }
    }
}

/// Host directory source
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostPathSource {
    /// Directory on the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// AWS EBS source
///
/// Either `volume_id` or `volume` must be set. `volume` is resolved to an id
/// through an [`EbsVolumeLookup`] in `region`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsEbsSource {
    /// EBS volume id (e.g., "vol-0abc")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<String>,
    /// EBS volume to look up when no id is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<EbsVolumeRef>,
    /// AWS region of the volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Availability zone of the volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Pin pods to the volume's region and zone
    #[serde(default = "default_true")]
    pub schedule_pods_in_topology: bool,
}

/// A named EBS volume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EbsVolumeRef {
    /// Volume name tag
    pub name: String,
    /// Availability zone the volume lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
}

// =============================================================================
// EBS lookup
// =============================================================================

/// Resolves EBS volume references to volume ids
#[cfg_attr(test, mockall::automock)]
pub trait EbsVolumeLookup: Send + Sync {
    /// Find the id of `volume` in `region`
    fn volume_id(&self, volume: &EbsVolumeRef, region: &str) -> Option<String>;
}

/// Lookup that never finds a volume
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEbsLookup;

impl EbsVolumeLookup for NoEbsLookup {
    fn volume_id(&self, _volume: &EbsVolumeRef, _region: &str) -> Option<String> {
        None
    }
}

// =============================================================================
// Kubernetes
// =============================================================================

/// A volume resolved for a pod
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedVolume {
    /// Pod volume
    pub volume: Volume,
    /// Container mount
    pub mount: VolumeMount,
    /// Node selector with any topology labels merged in
    pub node_selector: BTreeMap<String, String>,
}

/// Resolve a volume for a Kubernetes pod.
///
/// `node_selector` is never modified; the result carries a merged copy.
pub fn resolve_k8s(
    name: &str,
    mount_path: &str,
    source: &VolumeSource,
    node_selector: &BTreeMap<String, String>,
    lookup: &dyn EbsVolumeLookup,
) -> Result<ResolvedVolume, CompilationError> {
    let mount = VolumeMount::new(name, mount_path);
    let (volume, node_selector) = match source {
        VolumeSource::EmptyDir => (Volume::from_empty_dir(name), node_selector.clone()),
        VolumeSource::HostPath(host) => {
            let path = host
                .path
                .as_deref()
                .ok_or_else(|| CompilationError::missing_field(name, "hostPath.path"))?;
            (Volume::from_host_path(name, path), node_selector.clone())
        }
        VolumeSource::AwsEbs(ebs) => {
            let volume_id = resolve_ebs_id(name, ebs, lookup)?;
            let selector = if ebs.schedule_pods_in_topology {
                let zone = ebs
                    .availability_zone
                    .as_deref()
                    .or_else(|| ebs.volume.as_ref()?.availability_zone.as_deref());
                merge_topology_selector(node_selector, ebs.region.as_deref(), zone)
            } else {
                node_selector.clone()
            };
            (Volume::from_aws_ebs(name, volume_id), selector)
        }
    };

    debug!(volume = %name, kind = source.kind(), "resolved volume");
    Ok(ResolvedVolume {
        volume,
        mount,
        node_selector,
    })
}

fn resolve_ebs_id(
    name: &str,
    ebs: &AwsEbsSource,
    lookup: &dyn EbsVolumeLookup,
) -> Result<String, CompilationError> {
    if let Some(id) = &ebs.volume_id {
        return Ok(id.clone());
    }
    let reference = ebs
        .volume
        .as_ref()
        .ok_or_else(|| CompilationError::missing_field(name, "awsEbs.volumeId"))?;
    let region = ebs
        .region
        .as_deref()
        .ok_or_else(|| CompilationError::volume_lookup(&reference.name, "region not provided"))?;
    lookup.volume_id(reference, region).ok_or_else(|| {
        CompilationError::volume_lookup(&reference.name, format!("no volume found in {}", region))
    })
}

/// Merge region/zone node selectors into `base`, returning a new map.
///
/// Derived labels replace caller values for the same keys.
pub fn merge_topology_selector(
    base: &BTreeMap<String, String>,
    region: Option<&str>,
    zone: Option<&str>,
) -> BTreeMap<String, String> {
    let mut merged = base.clone();
    for (key, value) in [(TOPOLOGY_REGION_LABEL, region), (TOPOLOGY_ZONE_LABEL, zone)] {
        let Some(value) = value else { continue };
        if let Some(previous) = merged.insert(key.to_string(), value.to_string()) {
            if previous != value {
                warn!(
                    key,
                    previous = %previous,
                    value,
                    "node selector overridden by volume topology"
                );
            }
        }
    }
    merged
}

// =============================================================================
// Docker
// =============================================================================

/// Resolve a volume for a Docker container.
///
/// Returns the volume source (named volume or host path) and its binding.
pub fn resolve_docker(
    name: &str,
    mount_path: &str,
    source: &VolumeSource,
) -> Result<(String, VolumeBinding), CompilationError> {
    match source {
        VolumeSource::EmptyDir => Ok((name.to_string(), VolumeBinding::read_write(mount_path))),
        VolumeSource::HostPath(host) => {
            let path = host
                .path
                .as_deref()
                .ok_or_else(|| CompilationError::missing_field(name, "hostPath.path"))?;
            Ok((path.to_string(), VolumeBinding::read_write(mount_path)))
        }
        VolumeSource::AwsEbs(_) => Err(CompilationError::unsupported_volume(
            source.kind(),
            "docker",
        )),
    }
}
