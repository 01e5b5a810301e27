//! Rigging apps
//!
//! An [`App`] turns a typed option record into either a Docker resource group
//! or a Kubernetes resource group. Apps:
//!
//! - [`redis::Redis`]: a Redis server with a data volume
//! - [`superset::SupersetScheduler`]: the Superset scheduler with a workspace mount
//!
//! App definitions can also be loaded from YAML through [`AppDefinition`].

pub mod compiler;
pub mod connection;
pub mod options;
pub mod redis;
pub mod superset;

use rigging_common::yaml::parse_yaml;
use rigging_common::Error;
use rigging_workload::{
    DockerBuildContext, DockerResourceGroup, EbsVolumeLookup, K8sBuildContext, K8sResourceGroup,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use connection::ConnectionContext;
pub use redis::{Redis, RedisOptions};
pub use superset::{SupersetScheduler, SupersetSchedulerOptions};

/// Maximum length of an app name; derived names add a prefix of up to 10
const MAX_APP_NAME_LEN: usize = 53;

/// A configurable application that compiles to backend resources.
pub trait App: Send + Sync {
    /// App name
    fn name(&self) -> &str;

    /// App version
    fn version(&self) -> &str;

    /// Whether the app builds any groups
    fn enabled(&self) -> bool;

    /// Build the Docker group, or `None` if its container cannot be built.
    fn docker_group(&self, ctx: &DockerBuildContext) -> Option<DockerResourceGroup>;

    /// Build the Kubernetes group. Resources that cannot be built are absent.
    fn k8s_group(&self, ctx: &K8sBuildContext, lookup: &dyn EbsVolumeLookup) -> K8sResourceGroup;

    /// Connection URL for clients in `ctx`, for apps that serve connections
    fn connection_url(&self, _ctx: ConnectionContext) -> Option<String> {
        None
    }

    /// Docker groups of an enabled app
    fn docker_resource_groups(&self, ctx: &DockerBuildContext) -> Vec<DockerResourceGroup> {
        if !self.enabled() {
            debug!(app = %self.name(), "app disabled, no docker groups");
            return Vec::new();
        }
        self.docker_group(ctx).into_iter().collect()
    }

    /// Kubernetes groups of an enabled app
    fn k8s_resource_groups(
        &self,
        ctx: &K8sBuildContext,
        lookup: &dyn EbsVolumeLookup,
    ) -> Vec<K8sResourceGroup> {
        if !self.enabled() {
            debug!(app = %self.name(), "app disabled, no kubernetes groups");
            return Vec::new();
        }
        vec![self.k8s_group(ctx, lookup)]
    }
}

/// Check that an app name can prefix Kubernetes object names
/// (lowercase alphanumerics and '-', starting and ending alphanumeric).
pub fn validate_app_name(name: &str) -> Result<(), Error> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_ends = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
        && name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());

    if name.is_empty() || !valid_chars || !valid_ends {
        return Err(Error::validation_for_field(
            name,
            "name",
            "must be lowercase alphanumerics or '-', starting and ending alphanumeric",
        ));
    }
    if name.len() > MAX_APP_NAME_LEN {
        return Err(Error::validation_for_field(
            name,
            "name",
            format!("must be at most {} characters", MAX_APP_NAME_LEN),
        ));
    }
    Ok(())
}

/// An app definition as written in YAML, selected by `kind`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AppDefinition {
    /// Redis server
    Redis(RedisOptions),
    /// Superset scheduler
    SupersetScheduler(SupersetSchedulerOptions),
}

impl AppDefinition {
    /// Parse a YAML app definition
    pub fn from_yaml(input: &str) -> Result<Self, Error> {
        let value = parse_yaml(input).map_err(|e| Error::serialization(e.to_string()))?;
        serde_json::from_value(value)
            .map_err(|e| Error::serialization_for_kind("AppDefinition", e.to_string()))
    }

    /// The definition's `kind`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Redis(_) => "redis",
            Self::SupersetScheduler(_) => "superset-scheduler",
        }
    }

    /// Validate the options and create the app
    pub fn into_app(self) -> Result<Box<dyn App>, Error> {
        Ok(match self {
            Self::Redis(options) => Box::new(Redis::new(options)?),
            Self::SupersetScheduler(options) => Box::new(SupersetScheduler::new(options)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("redis", true)]
    #[case("cache-1", true)]
    #[case("", false)]
    #[case("Redis", false)]
    #[case("-redis", false)]
    #[case("redis-", false)]
    #[case("redis_cache", false)]
    fn test_app_names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_app_name(name).is_ok(), valid);
    }

    #[test]
    fn test_app_name_length() {
        assert!(validate_app_name(&"a".repeat(MAX_APP_NAME_LEN)).is_ok());
        assert!(validate_app_name(&"a".repeat(MAX_APP_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn story_definition_from_yaml() {
        let def = AppDefinition::from_yaml(
            r#"
kind: redis
name: cache
env:
  MAXMEMORY: 256mb
volume:
  source:
    type: hostPath
    path: /srv/cache
service:
  type: NodePort
  nodePort: 30079
"#,
        )
        .unwrap();

        assert_eq!(def.kind(), "redis");
        let AppDefinition::Redis(opts) = &def else {
            panic!("expected redis definition");
        };
        assert_eq!(opts.name, "cache");
        assert_eq!(opts.env.env.get("MAXMEMORY"), Some(&"256mb".to_string()));
        assert_eq!(opts.service.node_port, Some(30079));

        let app = def.into_app().unwrap();
        assert_eq!(app.name(), "cache");
        assert!(app.enabled());
    }

    #[test]
    fn story_superset_definition_defaults() {
        let def = AppDefinition::from_yaml("kind: superset-scheduler\n").unwrap();
        let AppDefinition::SupersetScheduler(opts) = def else {
            panic!("expected superset definition");
        };
        assert_eq!(opts, SupersetSchedulerOptions::default());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = AppDefinition::from_yaml("kind: postgres\n").unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn test_invalid_options_fail_into_app() {
        let def = AppDefinition::from_yaml("kind: redis\nname: Bad_Name\n").unwrap();
        assert!(matches!(def.into_app(), Err(Error::Validation { .. })));
    }

    #[test]
    fn story_disabled_app_has_no_groups() {
        let app = Redis::new(RedisOptions {
            enabled: false,
            ..Default::default()
        })
        .unwrap();
        assert!(app
            .docker_resource_groups(&DockerBuildContext::default())
            .is_empty());
        assert!(app
            .k8s_resource_groups(&K8sBuildContext::default(), &rigging_workload::NoEbsLookup)
            .is_empty());
    }
}
