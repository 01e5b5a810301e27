//! Deployment and pod template types

use std::collections::BTreeMap;

use rigging_common::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::k8s::{Container, LabelSelector, RestartPolicy, TopologySpreadConstraint, Volume};

// =============================================================================
// Deployment
// =============================================================================

/// Kubernetes Deployment
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: DeploymentSpec,
}

impl Deployment {
    /// Create a Deployment
    pub fn new(metadata: ObjectMeta, spec: DeploymentSpec) -> Self {
        Self {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            metadata,
            spec,
        }
    }

    /// The single container of the pod template, if any
    pub fn container(&self) -> Option<&Container> {
        self.spec.template.spec.containers.first()
    }
}

/// Deployment spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    /// Number of replicas
    pub replicas: u32,
    /// Label selector
    pub selector: LabelSelector,
    /// Pod template
    pub template: PodTemplateSpec,
    /// Deployment strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DeploymentStrategy>,
}

/// Deployment strategy
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStrategy {
    /// Strategy type: RollingUpdate or Recreate
    #[serde(rename = "type")]
    pub type_: String,
    /// Rolling update config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_update: Option<RollingUpdateConfig>,
}

/// Rolling update configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RollingUpdateConfig {
    /// Max unavailable pods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<String>,
    /// Max surge pods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_surge: Option<String>,
}

/// Pod template spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    /// Pod metadata
    pub metadata: PodMeta,
    /// Pod spec
    pub spec: PodSpec,
}

/// Pod metadata (subset of ObjectMeta)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodMeta {
    /// Pod name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Labels
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Pod spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Service account name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    /// Containers
    pub containers: Vec<Container>,
    /// Volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    /// Node selector for scheduling onto specific nodes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    /// Restart policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,
    /// Grace period before the pod is killed on termination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_grace_period_seconds: Option<i64>,
    /// Topology spread constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topology_spread_constraints: Vec<TopologySpreadConstraint>,
}

// =============================================================================
// User-facing options
// =============================================================================

/// How a Deployment replaces its pods
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum StrategyOptions {
    /// Replace pods gradually
    #[serde(rename_all = "camelCase")]
    RollingUpdate {
        /// Pods allowed above the desired count (number or percentage)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_surge: Option<String>,
        /// Pods allowed to be unavailable (number or percentage)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_unavailable: Option<String>,
    },
    /// Kill every pod before creating new ones
    Recreate,
}

impl StrategyOptions {
    /// Render as a Deployment strategy
    pub fn to_strategy(&self) -> DeploymentStrategy {
        match self {
            Self::RollingUpdate {
                max_surge,
                max_unavailable,
            } => DeploymentStrategy {
                type_: "RollingUpdate".to_string(),
                rolling_update: Some(RollingUpdateConfig {
                    max_unavailable: max_unavailable.clone(),
                    max_surge: max_surge.clone(),
                }),
            },
            Self::Recreate => DeploymentStrategy {
                type_: "Recreate".to_string(),
                rolling_update: None,
            },
        }
    }
}

/// Spread pods of an app across a topology domain
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopologySpreadOptions {
    /// Node label that defines the domain
    #[serde(default = "default_topology_key")]
    pub topology_key: String,
    /// Maximum pod count difference between domains
    #[serde(default = "default_max_skew")]
    pub max_skew: i32,
    /// `DoNotSchedule` or `ScheduleAnyway`
    #[serde(default = "default_when_unsatisfiable")]
    pub when_unsatisfiable: String,
}

fn default_topology_key() -> String {
    rigging_common::TOPOLOGY_ZONE_LABEL.to_string()
}

fn default_max_skew() -> i32 {
    1
}

fn default_when_unsatisfiable() -> String {
    "ScheduleAnyway".to_string()
}

impl Default for TopologySpreadOptions {
    fn default() -> Self {
        Self {
            topology_key: default_topology_key(),
            max_skew: default_max_skew(),
            when_unsatisfiable: default_when_unsatisfiable(),
        }
    }
}

impl TopologySpreadOptions {
    /// Build a constraint that spreads pods matching `selector`
    pub fn to_constraint(&self, selector: BTreeMap<String, String>) -> TopologySpreadConstraint {
        TopologySpreadConstraint {
            max_skew: self.max_skew,
            topology_key: self.topology_key.clone(),
            when_unsatisfiable: self.when_unsatisfiable.clone(),
            label_selector: LabelSelector {
                match_labels: selector,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_deployment() -> Deployment {
        Deployment::new(
            ObjectMeta::default(),
            DeploymentSpec {
                replicas: 1,
                selector: LabelSelector::default(),
                template: PodTemplateSpec {
                    metadata: PodMeta {
                        name: Some("pod-redis".to_string()),
                        labels: BTreeMap::new(),
                        annotations: BTreeMap::new(),
                    },
                    spec: PodSpec {
                        service_account_name: None,
                        containers: vec![],
                        volumes: vec![],
                        node_selector: BTreeMap::new(),
                        restart_policy: Some(RestartPolicy::Always),
                        termination_grace_period_seconds: Some(30),
                        topology_spread_constraints: vec![],
                    },
                },
                strategy: None,
            },
        )
    }

    #[test]
    fn test_deployment_serializes_k8s_shape() {
        let json = serde_json::to_value(sample_deployment()).unwrap();
        assert_eq!(json["apiVersion"], "apps/v1");
        assert_eq!(json["kind"], "Deployment");
        assert_eq!(json["spec"]["template"]["spec"]["restartPolicy"], "Always");
        assert_eq!(
            json["spec"]["template"]["spec"]["terminationGracePeriodSeconds"],
            30
        );
        assert!(json["spec"]["template"]["spec"].get("nodeSelector").is_none());
        assert!(json["spec"].get("strategy").is_none());
    }

    #[test]
    fn test_rolling_update_strategy() {
        let opts: StrategyOptions = serde_json::from_value(serde_json::json!({
            "type": "RollingUpdate",
            "maxSurge": "25%",
        }))
        .unwrap();
        let strategy = opts.to_strategy();
        assert_eq!(strategy.type_, "RollingUpdate");
        let rolling = strategy.rolling_update.unwrap();
        assert_eq!(rolling.max_surge.as_deref(), Some("25%"));
        assert!(rolling.max_unavailable.is_none());
    }

    #[test]
    fn test_recreate_strategy_has_no_rolling_update() {
        let opts: StrategyOptions =
            serde_json::from_value(serde_json::json!({"type": "Recreate"})).unwrap();
        let json = serde_json::to_value(opts.to_strategy()).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Recreate"}));
    }

    #[test]
    fn test_topology_spread_defaults() {
        let opts: TopologySpreadOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, TopologySpreadOptions::default());

        let constraint = opts.to_constraint(rigging_common::meta::app_selector("superset"));
        assert_eq!(constraint.max_skew, 1);
        assert_eq!(constraint.topology_key, rigging_common::TOPOLOGY_ZONE_LABEL);
        assert_eq!(constraint.when_unsatisfiable, "ScheduleAnyway");
        assert_eq!(constraint.label_selector.match_labels.len(), 1);
    }
}
