//! Canonical Kubernetes metadata for all generated resources

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{LABEL_COMPONENT, LABEL_MANAGED_BY, LABEL_MANAGED_BY_RIGGING, LABEL_NAME};

/// Standard Kubernetes ObjectMeta for generated resources.
///
/// `namespace` is optional because cluster-scoped kinds (PersistentVolume,
/// ClusterRoleBinding) must not carry one.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    pub name: String,
    /// Resource namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Create metadata for a component of an app.
    ///
    /// Sets the name/component/managed-by labels, then layers `extra` on top.
    pub fn for_component(
        name: impl Into<String>,
        app_name: &str,
        namespace: Option<&str>,
        extra: &BTreeMap<String, String>,
    ) -> Self {
        let name = name.into();
        Self {
            labels: component_labels(&name, app_name, extra),
            name,
            namespace: namespace.map(str::to_string),
            annotations: BTreeMap::new(),
        }
    }

}

/// Labels shared by every resource of an app.
///
/// Caller-supplied labels are applied last and may override the defaults.
pub fn component_labels(
    component_name: &str,
    app_name: &str,
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(LABEL_NAME.to_string(), app_name.to_string());
    labels.insert(LABEL_COMPONENT.to_string(), component_name.to_string());
    labels.insert(
        LABEL_MANAGED_BY.to_string(),
        LABEL_MANAGED_BY_RIGGING.to_string(),
    );
    labels.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    labels
}

/// Selector labels that identify the pods of an app.
pub fn app_selector(app_name: &str) -> BTreeMap<String, String> {
    let mut selector = BTreeMap::new();
    selector.insert(LABEL_NAME.to_string(), app_name.to_string());
    selector
}
