//! PersistentVolume builder

use std::collections::BTreeMap;

use rigging_common::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::group::K8sBuildContext;
use crate::k8s::HostPathVolumeSource;

/// Node label holding the node's hostname
const HOSTNAME_LABEL: &str = "kubernetes.io/hostname";

// =============================================================================
// Options
// =============================================================================

/// Ways a PersistentVolume can be mounted
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum AccessMode {
    /// Read-write by a single node
    #[default]
    ReadWriteOnce,
    /// Read-only by many nodes
    ReadOnlyMany,
    /// Read-write by many nodes
    ReadWriteMany,
    /// Read-write by a single pod
    ReadWriteOncePod,
}

/// What happens to a PersistentVolume released from its claim
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum ReclaimPolicy {
    /// Keep the data
    Retain,
    /// Delete the backing storage
    Delete,
    /// Scrub and reuse
    Recycle,
}

/// Backing storage of a PersistentVolume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PersistentVolumeSource {
    /// Disk or directory attached to a node
    Local(LocalVolumeSource),
    /// Directory on the host (single-node clusters only)
    HostPath(HostDirectory),
    /// GCE persistent disk
    GcePersistentDisk(GcePersistentDiskVolumeSource),
}

/// Local volume source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalVolumeSource {
    /// Full path to the volume on the node
    pub path: String,
    /// Filesystem type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,
}

/// Host directory backing a PersistentVolume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct HostDirectory {
    /// Directory on the host
    pub path: String,
}

/// GCE persistent disk source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GcePersistentDiskVolumeSource {
    /// Name of the disk in GCE
    pub pd_name: String,
    /// Filesystem type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,
    /// Partition number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,
    /// Mount read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

fn default_access_modes() -> Vec<AccessMode> {
    vec![AccessMode::ReadWriteOnce]
}

/// PersistentVolume options
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeOptions {
    /// Volume name
    pub name: String,
    /// Access modes
    #[serde(default = "default_access_modes")]
    pub access_modes: Vec<AccessMode>,
    /// Capacity (e.g., `storage: 10Gi`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capacity: BTreeMap<String, String>,
    /// Mount options (e.g., `ro`, `soft`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mount_options: Vec<String>,
    /// Restrict the volume to nodes with these hostnames
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_hostnames: Vec<String>,
    /// Reclaim policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclaim_policy: Option<ReclaimPolicy>,
    /// Storage class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    /// `Filesystem` or `Block`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mode: Option<String>,
    /// Backing storage
    pub source: PersistentVolumeSource,
}

// =============================================================================
// Resource
// =============================================================================

/// Kubernetes PersistentVolume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolume {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: PersistentVolumeSpec,
}

/// PersistentVolume spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeSpec {
    /// Access modes
    pub access_modes: Vec<AccessMode>,
    /// Capacity
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capacity: BTreeMap<String, String>,
    /// Mount options
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mount_options: Vec<String>,
    /// Nodes the volume can be accessed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_affinity: Option<VolumeNodeAffinity>,
    /// Reclaim policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_reclaim_policy: Option<ReclaimPolicy>,
    /// Storage class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    /// Volume mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mode: Option<String>,
    /// Local source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalVolumeSource>,
    /// HostPath source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,
    /// GCE persistent disk source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gce_persistent_disk: Option<GcePersistentDiskVolumeSource>,
}

/// Node affinity of a PersistentVolume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeNodeAffinity {
    /// Required node selector
    pub required: NodeSelector,
}

/// Node selector
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelector {
    /// Terms, ORed together
    pub node_selector_terms: Vec<NodeSelectorTerm>,
}

/// Node selector term
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelectorTerm {
    /// Expressions, ANDed together
    pub match_expressions: Vec<NodeSelectorRequirement>,
}

/// Node selector requirement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelectorRequirement {
    /// Label key
    pub key: String,
    /// Operator (In, NotIn, Exists, ...)
    pub operator: String,
    /// Values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

fn hostname_affinity(hostnames: &[String]) -> Option<VolumeNodeAffinity> {
    if hostnames.is_empty() {
        return None;
    }
    Some(VolumeNodeAffinity {
        required: NodeSelector {
            node_selector_terms: vec![NodeSelectorTerm {
                match_expressions: vec![NodeSelectorRequirement {
                    key: HOSTNAME_LABEL.to_string(),
                    operator: "In".to_string(),
                    values: hostnames.to_vec(),
                }],
            }],
        },
    })
}

/// Build a PersistentVolume. PersistentVolumes are cluster-scoped, so the
/// context namespace is not applied.
pub fn build(
    options: &PersistentVolumeOptions,
    app_name: &str,
    ctx: &K8sBuildContext,
) -> PersistentVolume {
    debug!(persistent_volume = %options.name, "building persistent volume");

    let mut spec = PersistentVolumeSpec {
        access_modes: options.access_modes.clone(),
        capacity: options.capacity.clone(),
        mount_options: options.mount_options.clone(),
        node_affinity: hostname_affinity(&options.node_hostnames),
        persistent_volume_reclaim_policy: options.reclaim_policy,
        storage_class_name: options.storage_class_name.clone(),
        volume_mode: options.volume_mode.clone(),
        local: None,
        host_path: None,
        gce_persistent_disk: None,
    };
    match &options.source {
        PersistentVolumeSource::Local(local) => spec.local = Some(local.clone()),
        PersistentVolumeSource::HostPath(host) => {
            spec.host_path = Some(HostPathVolumeSource {
                path: host.path.clone(),
                type_: None,
            })
        }
        PersistentVolumeSource::GcePersistentDisk(gce) => {
            spec.gce_persistent_disk = Some(gce.clone())
        }
    }

    PersistentVolume {
        api_version: "v1".to_string(),
        kind: "PersistentVolume".to_string(),
        metadata: ctx.cluster_meta(&options.name, app_name),
        spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(source: serde_json::Value) -> PersistentVolumeOptions {
        serde_json::from_value(serde_json::json!({
            "name": "pv-redis",
            "capacity": {"storage": "10Gi"},
            "source": source,
        }))
        .unwrap()
    }

    #[test]
    fn story_access_mode_defaults_to_read_write_once() {
        let opts = options(serde_json::json!({"type": "local", "path": "/mnt/disks/ssd1"}));
        assert_eq!(opts.access_modes, vec![AccessMode::ReadWriteOnce]);
    }

    #[test]
    fn story_local_pv_is_cluster_scoped() {
        let ctx = K8sBuildContext {
            namespace: Some("data".to_string()),
            ..Default::default()
        };
        let opts = PersistentVolumeOptions {
            node_hostnames: vec!["node-a".to_string()],
            reclaim_policy: Some(ReclaimPolicy::Retain),
            ..options(serde_json::json!({"type": "local", "path": "/mnt/disks/ssd1"}))
        };
        let pv = build(&opts, "redis", &ctx);
        let json = serde_json::to_value(&pv).unwrap();

        assert_eq!(json["kind"], "PersistentVolume");
        assert!(json["metadata"].get("namespace").is_none());
        assert_eq!(json["spec"]["local"]["path"], "/mnt/disks/ssd1");
        assert_eq!(json["spec"]["accessModes"][0], "ReadWriteOnce");
        assert_eq!(json["spec"]["capacity"]["storage"], "10Gi");
        assert_eq!(json["spec"]["persistentVolumeReclaimPolicy"], "Retain");
        assert_eq!(
            json["spec"]["nodeAffinity"]["required"]["nodeSelectorTerms"][0]["matchExpressions"][0]
                ["values"][0],
            "node-a"
        );
        assert!(json["spec"].get("hostPath").is_none());
    }

    #[test]
    fn story_gce_disk_source() {
        let opts = options(serde_json::json!({
            "type": "gcePersistentDisk",
            "pdName": "redis-disk",
            "fsType": "ext4",
        }));
        let pv = build(&opts, "redis", &K8sBuildContext::default());
        let gce = pv.spec.gce_persistent_disk.unwrap();
        assert_eq!(gce.pd_name, "redis-disk");
        assert_eq!(gce.fs_type.as_deref(), Some("ext4"));
        assert!(pv.spec.node_affinity.is_none());
        assert!(pv.spec.local.is_none());
    }

    #[test]
    fn story_host_path_source() {
        let opts = options(serde_json::json!({"type": "hostPath", "path": "/srv/redis"}));
        let pv = build(&opts, "redis", &K8sBuildContext::default());
        assert_eq!(pv.spec.host_path.unwrap().path, "/srv/redis");
    }

    #[test]
    fn test_source_requires_its_fields() {
        let result: Result<PersistentVolumeOptions, _> = serde_json::from_value(serde_json::json!({
            "name": "pv-redis",
            "source": {"type": "gcePersistentDisk"},
        }));
        assert!(result.is_err());
    }
}
