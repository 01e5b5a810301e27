//! Option records shared by every app
//!
//! Each concern (image, container, deployment, service) has its own record
//! with serde defaults, so an app definition only needs to name what it
//! changes. Fields whose default differs per app (image name, ports) are
//! optional here and resolved by the app.

use std::collections::BTreeMap;

use rigging_common::Error;
use rigging_workload::deployment::{StrategyOptions, TopologySpreadOptions};
use rigging_workload::k8s::{ImagePullPolicy, RestartPolicy, TargetPort};
use rigging_workload::service::ServiceType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_replicas() -> u32 {
    1
}

// =============================================================================
// Image
// =============================================================================

/// Container image
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    /// Repository; defaults per app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tag; defaults per app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Pull policy
    #[serde(default)]
    pub pull_policy: ImagePullPolicy,
}

impl ImageOptions {
    /// Image reference as `name:tag`
    pub fn reference(&self, default_name: &str, default_tag: &str) -> String {
        format!(
            "{}:{}",
            self.name.as_deref().unwrap_or(default_name),
            self.tag.as_deref().unwrap_or(default_tag)
        )
    }

    pub(crate) fn validate(&self, app: &str) -> Result<(), Error> {
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(Error::validation_for_field(app, "image.name", "must not be empty"));
        }
        if matches!(self.tag.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(Error::validation_for_field(app, "image.tag", "must not be empty"));
        }
        Ok(())
    }
}

// =============================================================================
// Container
// =============================================================================

/// A command line, given as one string or as a list of arguments
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(untagged)]
pub enum CommandLine {
    /// Whitespace-separated arguments
    Line(String),
    /// Explicit arguments
    Args(Vec<String>),
}

impl CommandLine {
    /// Split into arguments
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            Self::Args(args) => args.clone(),
        }
    }
}

/// Container options
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOptions {
    /// Entrypoint override (Kubernetes `command`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<CommandLine>,
    /// Command override (Kubernetes `args`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandLine>,
    /// Open the container port; defaults per app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_port: Option<bool>,
    /// Port the process listens on; defaults per app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Name of the container port; defaults per app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
    /// Host port published on Docker; defaults to the container port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<u16>,
    /// Docker: run in the background
    #[serde(default = "default_true")]
    pub detach: bool,
    /// Docker: remove the container when it exits
    #[serde(default = "default_true")]
    pub auto_remove: bool,
    /// Docker: remove an existing container with the same name first
    #[serde(default = "default_true")]
    pub remove: bool,
    /// Docker: keep stdin open
    #[serde(default = "default_true")]
    pub stdin_open: bool,
    /// Docker: allocate a pseudo-TTY
    #[serde(default = "default_true")]
    pub tty: bool,
    /// Docker container labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            entrypoint: None,
            command: None,
            open_port: None,
            port: None,
            port_name: None,
            host_port: None,
            detach: true,
            auto_remove: true,
            remove: true,
            stdin_open: true,
            tty: true,
            labels: BTreeMap::new(),
        }
    }
}

impl ContainerOptions {
    pub(crate) fn validate(&self, app: &str) -> Result<(), Error> {
        if self.port == Some(0) {
            return Err(Error::validation_for_field(app, "container.port", "must not be 0"));
        }
        if self.host_port == Some(0) {
            return Err(Error::validation_for_field(
                app,
                "container.hostPort",
                "must not be 0",
            ));
        }
        if matches!(self.port_name.as_deref(), Some(n) if !is_port_name(n)) {
            return Err(Error::validation_for_field(
                app,
                "container.portName",
                "must be 1-15 lowercase alphanumerics or '-'",
            ));
        }
        Ok(())
    }
}

fn is_port_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 15
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}

// =============================================================================
// Deployment
// =============================================================================

/// Deployment options
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOptions {
    /// Number of pods
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    /// Node selector for the pods
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    /// Restart policy
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    /// Grace period before pods are killed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_grace_period_seconds: Option<i64>,
    /// Rollout strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyOptions>,
    /// Extra labels on the Deployment
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Spread pods across a topology domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology_spread: Option<TopologySpreadOptions>,
}

impl Default for DeploymentOptions {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            node_selector: BTreeMap::new(),
            restart_policy: RestartPolicy::default(),
            termination_grace_period_seconds: None,
            strategy: None,
            labels: BTreeMap::new(),
            topology_spread: None,
        }
    }
}

impl DeploymentOptions {
    pub(crate) fn validate(&self, app: &str) -> Result<(), Error> {
        if matches!(self.termination_grace_period_seconds, Some(s) if s < 0) {
            return Err(Error::validation_for_field(
                app,
                "deployment.terminationGracePeriodSeconds",
                "must not be negative",
            ));
        }
        if let Some(spread) = &self.topology_spread {
            if spread.max_skew < 1 {
                return Err(Error::validation_for_field(
                    app,
                    "deployment.topologySpread.maxSkew",
                    "must be at least 1",
                ));
            }
            if !matches!(
                spread.when_unsatisfiable.as_str(),
                "DoNotSchedule" | "ScheduleAnyway"
            ) {
                return Err(Error::validation_for_field(
                    app,
                    "deployment.topologySpread.whenUnsatisfiable",
                    "must be DoNotSchedule or ScheduleAnyway",
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Service
// =============================================================================

/// Service options
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOptions {
    /// Service type; unset means the cluster default (ClusterIP)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    /// Port the Service exposes; defaults to the container port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Node port (NodePort and LoadBalancer only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<u16>,
    /// Port on the pods; defaults to the container port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<TargetPort>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_image_reference_defaults() {
        let image = ImageOptions::default();
        assert_eq!(image.reference("redis", "7.2"), "redis:7.2");

        let image = ImageOptions {
            tag: Some("6.2.6".to_string()),
            ..Default::default()
        };
        assert_eq!(image.reference("redis", "7.2"), "redis:6.2.6");
    }

    #[test]
    fn test_command_line_forms() {
        let line: CommandLine = serde_json::from_str("\"redis-server --appendonly yes\"").unwrap();
        assert_eq!(line.to_args(), vec!["redis-server", "--appendonly", "yes"]);

        let args: CommandLine = serde_json::from_str("[\"celery\", \"beat\"]").unwrap();
        assert_eq!(args.to_args(), vec!["celery", "beat"]);
    }

    #[test]
    fn test_container_defaults_from_empty() {
        let opts: ContainerOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, ContainerOptions::default());
        assert!(opts.detach && opts.auto_remove && opts.remove);
    }

    #[test]
    fn test_deployment_defaults_from_empty() {
        let opts: DeploymentOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, DeploymentOptions::default());
        assert_eq!(opts.replicas, 1);
        assert_eq!(opts.restart_policy, RestartPolicy::Always);
    }

    #[test]
    fn test_service_type_key() {
        let opts: ServiceOptions =
            serde_json::from_str(r#"{"type": "NodePort", "nodePort": 30001}"#).unwrap();
        assert_eq!(opts.service_type, Some(ServiceType::NodePort));
        assert_eq!(opts.node_port, Some(30001));
    }

    #[rstest]
    #[case("redis", true)]
    #[case("http-2", true)]
    #[case("", false)]
    #[case("Redis", false)]
    #[case("-redis", false)]
    #[case("a-very-long-port-name", false)]
    fn test_port_names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_port_name(name), valid);
    }

    #[test]
    fn test_validation_reports_field() {
        let opts = ContainerOptions {
            port: Some(0),
            ..Default::default()
        };
        let err = opts.validate("redis").unwrap_err();
        assert_eq!(err.field(), Some("container.port"));

        let opts = DeploymentOptions {
            topology_spread: Some(TopologySpreadOptions {
                when_unsatisfiable: "Sometimes".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = opts.validate("superset").unwrap_err();
        assert_eq!(
            err.field(),
            Some("deployment.topologySpread.whenUnsatisfiable")
        );
    }
}
