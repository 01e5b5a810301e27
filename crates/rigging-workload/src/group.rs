//! Kubernetes resource groups and build context

use std::collections::BTreeMap;

use rigging_common::{Error, ObjectMeta};
use serde::Serialize;
use serde_json::Value;

use crate::deployment::Deployment;
use crate::k8s::{ConfigMap, Secret};
use crate::persistent_volume::PersistentVolume;
use crate::rbac::ClusterRoleBinding;
use crate::service::Service;

/// Settings shared by every Kubernetes group in one build
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct K8sBuildContext {
    /// Namespace for namespaced resources
    pub namespace: Option<String>,
    /// Service account pods run as
    pub service_account_name: Option<String>,
    /// Labels added to every resource
    pub labels: BTreeMap<String, String>,
}

impl K8sBuildContext {
    /// Metadata for a namespaced resource
    pub fn meta(&self, name: &str, app_name: &str) -> ObjectMeta {
        ObjectMeta::for_component(name, app_name, self.namespace.as_deref(), &self.labels)
    }

    /// Metadata for a cluster-scoped resource
    pub fn cluster_meta(&self, name: &str, app_name: &str) -> ObjectMeta {
        ObjectMeta::for_component(name, app_name, None, &self.labels)
    }
}

/// Everything Kubernetes needs to run one app.
///
/// Each resource is either complete or absent.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct K8sResourceGroup {
    /// Group name (the app name)
    pub name: String,
    /// Whether the group should be applied
    pub enabled: bool,
    /// Non-secret environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ConfigMap>,
    /// Secrets-file environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<Secret>,
    /// Workload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<Deployment>,
    /// Network exposure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Service>,
    /// Extra persistent volumes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub persistent_volumes: Vec<PersistentVolume>,
    /// Extra cluster role bindings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cluster_role_bindings: Vec<ClusterRoleBinding>,
}

impl K8sResourceGroup {
    /// Every resource as a manifest, in apply order:
    /// cluster-scoped first, then config, then workload and service.
    pub fn manifests(&self) -> Result<Vec<Value>, Error> {
        let mut out = Vec::new();
        for pv in &self.persistent_volumes {
            out.push(to_manifest(pv, "PersistentVolume")?);
        }
        for crb in &self.cluster_role_bindings {
            out.push(to_manifest(crb, "ClusterRoleBinding")?);
        }
        if let Some(cm) = &self.config_map {
            out.push(to_manifest(cm, "ConfigMap")?);
        }
        if let Some(secret) = &self.secret {
            out.push(to_manifest(secret, "Secret")?);
        }
        if let Some(deployment) = &self.deployment {
            out.push(to_manifest(deployment, "Deployment")?);
        }
        if let Some(service) = &self.service {
            out.push(to_manifest(service, "Service")?);
        }
        Ok(out)
    }

    /// Number of resources in the group
    pub fn len(&self) -> usize {
        self.persistent_volumes.len()
            + self.cluster_role_bindings.len()
            + usize::from(self.config_map.is_some())
            + usize::from(self.secret.is_some())
            + usize::from(self.deployment.is_some())
            + usize::from(self.service.is_some())
    }

    /// Whether the group has no resources
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn to_manifest<T: Serialize>(resource: &T, kind: &str) -> Result<Value, Error> {
    serde_json::to_value(resource).map_err(|e| Error::serialization_for_kind(kind, e.to_string()))
}
