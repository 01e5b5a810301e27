//! ClusterRoleBinding builder

use rigging_common::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CompilationError;
use crate::group::K8sBuildContext;

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Namespace used for the service account subject when the build has none
const DEFAULT_NAMESPACE: &str = "default";

/// Request a ClusterRoleBinding for the build's service account
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBindingOptions {
    /// Binding name
    pub name: String,
    /// ClusterRole to bind
    pub cluster_role: String,
}

/// Kubernetes ClusterRoleBinding
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Bound role
    pub role_ref: RoleRef,
    /// Subjects granted the role
    pub subjects: Vec<Subject>,
}

/// Role reference
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    /// API group
    pub api_group: String,
    /// Kind (ClusterRole)
    pub kind: String,
    /// Name
    pub name: String,
}

/// RBAC subject
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Kind (ServiceAccount)
    pub kind: String,
    /// Name
    pub name: String,
    /// Namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Bind the context's service account to a ClusterRole.
///
/// Fails if the context has no service account.
pub fn build(
    options: &ClusterRoleBindingOptions,
    app_name: &str,
    ctx: &K8sBuildContext,
) -> Result<ClusterRoleBinding, CompilationError> {
    let service_account = ctx
        .service_account_name
        .as_deref()
        .ok_or_else(|| CompilationError::missing_field(&options.name, "serviceAccountName"))?;

    debug!(
        binding = %options.name,
        cluster_role = %options.cluster_role,
        service_account,
        "building cluster role binding"
    );

    Ok(ClusterRoleBinding {
        api_version: format!("{}/v1", RBAC_API_GROUP),
        kind: "ClusterRoleBinding".to_string(),
        metadata: ctx.cluster_meta(&options.name, app_name),
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: "ClusterRole".to_string(),
            name: options.cluster_role.clone(),
        },
        subjects: vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: service_account.to_string(),
            namespace: Some(
                ctx.namespace
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            ),
        }],
    })
}
