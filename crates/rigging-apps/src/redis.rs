//! Redis app

use std::fmt;

use rigging_common::naming::{NameOverrides, ResolvedNames};
use rigging_common::Error;
use rigging_workload::persistent_volume::PersistentVolumeOptions;
use rigging_workload::rbac::ClusterRoleBindingOptions;
use rigging_workload::{
    DockerBuildContext, DockerResourceGroup, EbsVolumeLookup, EnvOptions, K8sBuildContext,
    K8sResourceGroup, LoadedEnv, VolumeOptions,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compiler::{AppCompiler, PortPlan};
use crate::connection::{connection_url, ConnectionContext, ConnectionParts};
use crate::options::{ContainerOptions, DeploymentOptions, ImageOptions, ServiceOptions};
use crate::{validate_app_name, App};

/// Default app name
pub const DEFAULT_NAME: &str = "redis";
/// Default image repository
pub const DEFAULT_IMAGE: &str = "redis";
/// Default image tag
pub const DEFAULT_TAG: &str = "6.2.6";
/// Default Redis port
pub const DEFAULT_PORT: u16 = 6379;
/// Default container port name
pub const DEFAULT_PORT_NAME: &str = "redis";
/// Default data directory
pub const DEFAULT_DATA_PATH: &str = "/data";

/// Secrets-file key holding the password
pub const PASSWORD_KEY: &str = "REDIS_PASSWORD";
/// Secrets-file key holding the database number
pub const SCHEMA_KEY: &str = "REDIS_SCHEMA";

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_version() -> String {
    "1".to_string()
}

fn default_driver() -> String {
    "redis".to_string()
}

fn default_true() -> bool {
    true
}

/// Redis server log verbosity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RedisLogLevel {
    /// Everything
    Debug,
    /// Rarely useful detail
    Verbose,
    /// Moderately verbose
    Notice,
    /// Important messages only
    Warning,
}

impl fmt::Display for RedisLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Verbose => "verbose",
            Self::Notice => "notice",
            Self::Warning => "warning",
        })
    }
}

/// Redis options
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedisOptions {
    /// App name; resource names derive from it
    #[serde(default = "default_name")]
    pub name: String,
    /// App version
    #[serde(default = "default_version")]
    pub version: String,
    /// Build groups for this app at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Image
    #[serde(default)]
    pub image: ImageOptions,
    /// Container
    #[serde(default)]
    pub container: ContainerOptions,
    /// Environment
    #[serde(flatten)]
    pub env: EnvOptions,
    /// Data volume
    #[serde(default)]
    pub volume: VolumeOptions,
    /// Deployment
    #[serde(default)]
    pub deployment: DeploymentOptions,
    /// Service
    #[serde(default)]
    pub service: ServiceOptions,
    /// Resource name overrides
    #[serde(default)]
    pub names: NameOverrides,
    /// Password; `REDIS_PASSWORD` in the secrets file wins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Database number; `REDIS_SCHEMA` in the secrets file wins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// URL scheme
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Server log level, used when no command is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging_level: Option<RedisLogLevel>,
    /// Extra PersistentVolumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub persistent_volumes: Vec<PersistentVolumeOptions>,
    /// Extra ClusterRoleBindings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_role_bindings: Vec<ClusterRoleBindingOptions>,
}

impl Default for RedisOptions {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            enabled: true,
            image: ImageOptions::default(),
            container: ContainerOptions::default(),
            env: EnvOptions::default(),
            volume: VolumeOptions::default(),
            deployment: DeploymentOptions::default(),
            service: ServiceOptions::default(),
            names: NameOverrides::default(),
            password: None,
            schema: None,
            driver: default_driver(),
            logging_level: None,
            persistent_volumes: Vec::new(),
            cluster_role_bindings: Vec::new(),
        }
    }
}

impl RedisOptions {
    /// Check options that serde cannot
    pub fn validate(&self) -> Result<(), Error> {
        validate_app_name(&self.name)?;
        if self.driver.trim().is_empty() {
            return Err(Error::validation_for_field(&self.name, "driver", "must not be empty"));
        }
        self.image.validate(&self.name)?;
        self.container.validate(&self.name)?;
        self.deployment.validate(&self.name)?;
        Ok(())
    }
}

/// A Redis server
#[derive(Clone, Debug)]
pub struct Redis {
    options: RedisOptions,
    names: ResolvedNames,
    env: LoadedEnv,
}

impl Redis {
    /// Validate options and read the env and secrets files
    pub fn new(options: RedisOptions) -> Result<Self, Error> {
        options.validate()?;
        let names = options.names.resolve(&options.name);
        let env = LoadedEnv::load(&options.env);
        debug!(app = %options.name, "created redis app");
        Ok(Self {
            options,
            names,
            env,
        })
    }

    /// Options this app was built from
    pub fn options(&self) -> &RedisOptions {
        &self.options
    }

    /// Resolved resource names
    pub fn names(&self) -> &ResolvedNames {
        &self.names
    }

    /// Password from the secrets file, else from the options
    pub fn password(&self) -> Option<&str> {
        self.env
            .secret_value(PASSWORD_KEY)
            .or(self.options.password.as_deref())
    }

    /// Database number from the secrets file, else from the options
    pub fn schema(&self) -> Option<&str> {
        self.env
            .secret_value(SCHEMA_KEY)
            .or(self.options.schema.as_deref())
    }

    fn container_port(&self) -> u16 {
        self.options.container.port.unwrap_or(DEFAULT_PORT)
    }

    fn port_plan(&self) -> PortPlan {
        let container_port = self.container_port();
        PortPlan {
            name: self
                .options
                .container
                .port_name
                .clone()
                .unwrap_or_else(|| DEFAULT_PORT_NAME.to_string()),
            container_port,
            host_port: self.options.container.host_port.unwrap_or(container_port),
        }
    }

    /// Host a client in `ctx` connects to
    pub fn host(&self, ctx: ConnectionContext) -> &str {
        match ctx {
            ConnectionContext::Local => "localhost",
            ConnectionContext::Docker => self.names.container.as_str(),
            ConnectionContext::K8s => self.names.service.as_str(),
        }
    }

    /// Port a client in `ctx` connects to
    pub fn port(&self, ctx: ConnectionContext) -> u16 {
        match ctx {
            ConnectionContext::Local => self.port_plan().host_port,
            ConnectionContext::Docker => self.container_port(),
            ConnectionContext::K8s => self.options.service.port.unwrap_or(self.container_port()),
        }
    }

    /// `redis://` URL for a client in `ctx`
    pub fn url(&self, ctx: ConnectionContext) -> String {
        connection_url(&ConnectionParts {
            driver: &self.options.driver,
            user: None,
            password: self.password(),
            host: self.host(ctx),
            port: self.port(ctx),
            schema: self.schema(),
        })
    }

    fn command(&self) -> Option<Vec<String>> {
        if let Some(command) = &self.options.container.command {
            return Some(command.to_args());
        }
        self.options.logging_level.map(|level| {
            vec![
                "redis-server".to_string(),
                "--loglevel".to_string(),
                level.to_string(),
            ]
        })
    }

    fn compiler(&self) -> AppCompiler<'_> {
        let opts = &self.options;
        let mut compiler = AppCompiler::new(
            &opts.name,
            self.names.clone(),
            opts.image.reference(DEFAULT_IMAGE, DEFAULT_TAG),
            &opts.container,
            &opts.deployment,
            self.env.clone(),
        )
        .with_enabled(opts.enabled)
        .with_pull_policy(opts.image.pull_policy)
        .with_command(self.command())
        .with_port(self.port_plan())
        .with_service(&opts.service)
        .with_persistent_volumes(&opts.persistent_volumes)
        .with_cluster_role_bindings(&opts.cluster_role_bindings);

        if opts.volume.create {
            compiler = compiler.with_volume(
                self.names.volume.clone(),
                opts.volume
                    .mount_path
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()),
                &opts.volume.source,
            );
        }
        compiler
    }
}

impl App for Redis {
    fn name(&self) -> &str {
        &self.options.name
    }

    fn version(&self) -> &str {
        &self.options.version
    }

    fn enabled(&self) -> bool {
        self.options.enabled
    }

    fn docker_group(&self, ctx: &DockerBuildContext) -> Option<DockerResourceGroup> {
        self.compiler().docker(ctx)
    }

    fn k8s_group(&self, ctx: &K8sBuildContext, lookup: &dyn EbsVolumeLookup) -> K8sResourceGroup {
        self.compiler().k8s(ctx, lookup)
    }

    fn connection_url(&self, ctx: ConnectionContext) -> Option<String> {
        Some(self.url(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn redis(options: RedisOptions) -> Redis {
        Redis::new(options).unwrap()
    }

    #[test]
    fn story_default_connection_url() {
        let app = redis(RedisOptions {
            schema: Some("0".to_string()),
            ..Default::default()
        });
        assert_eq!(app.url(ConnectionContext::Local), "redis://localhost:6379/0");
    }

    #[rstest]
    #[case(ConnectionContext::Local, "redis://pw@localhost:16379/1")]
    #[case(ConnectionContext::Docker, "redis://pw@container-cache:6379/1")]
    #[case(ConnectionContext::K8s, "redis://pw@svc-cache:7000/1")]
    fn story_connection_url_per_context(#[case] ctx: ConnectionContext, #[case] expected: &str) {
        let app = redis(RedisOptions {
            name: "cache".to_string(),
            password: Some("pw".to_string()),
            schema: Some("1".to_string()),
            container: ContainerOptions {
                host_port: Some(16379),
                ..Default::default()
            },
            service: ServiceOptions {
                port: Some(7000),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(app.url(ctx), expected);
    }

    #[test]
    fn story_logging_level_sets_command() {
        let app = redis(RedisOptions {
            logging_level: Some(RedisLogLevel::Notice),
            ..Default::default()
        });
        assert_eq!(
            app.command(),
            Some(vec![
                "redis-server".to_string(),
                "--loglevel".to_string(),
                "notice".to_string()
            ])
        );
    }

    #[test]
    fn story_explicit_command_wins_over_logging_level() {
        let app = redis(RedisOptions {
            logging_level: Some(RedisLogLevel::Debug),
            container: ContainerOptions {
                command: Some(crate::options::CommandLine::Line(
                    "redis-server --appendonly yes".to_string(),
                )),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(app.command().unwrap()[1], "--appendonly");
    }

    #[test]
    fn test_no_volume_when_create_is_false() {
        let app = redis(RedisOptions {
            volume: VolumeOptions {
                create: false,
                ..Default::default()
            },
            ..Default::default()
        });
        let group = app.docker_group(&DockerBuildContext::default()).unwrap();
        assert!(group.container.volumes.is_empty());
    }

    #[test]
    fn test_invalid_name_rejected() {
        let err = Redis::new(RedisOptions {
            name: "Not Valid".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_options_from_empty_definition() {
        let opts: RedisOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, RedisOptions::default());
    }
}
