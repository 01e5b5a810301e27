//! AppCompiler: turns resolved app settings into resource groups
//!
//! Apps resolve their own defaults (image, ports, names, derived env) and
//! hand the result to an [`AppCompiler`], which builds either backend:
//!
//! ```rust,ignore
//! let group = AppCompiler::new(app_name, names, image, &options.container, &options.deployment, env)
//!     .with_port(port)
//!     .with_volume(volume_name, "/data", &options.volume.source)
//!     .with_service(&options.service)
//!     .k8s(&ctx, &lookup);
//! ```
//!
//! A failure while building one resource is logged and only that resource
//! is left out of the group.

use std::collections::BTreeMap;

use rigging_common::meta::{app_selector, component_labels};
use rigging_common::naming::ResolvedNames;
use rigging_common::LABEL_NAME;
use rigging_workload::deployment::{
    Deployment, DeploymentSpec, PodMeta, PodSpec, PodTemplateSpec,
};
use rigging_workload::docker::{DockerContainer, DockerNetwork};
use rigging_workload::env::{self, CompiledEnv};
use rigging_workload::k8s::{Container, ContainerPort, ImagePullPolicy, LabelSelector, TargetPort};
use rigging_workload::persistent_volume::{self, PersistentVolumeOptions};
use rigging_workload::rbac::{self, ClusterRoleBindingOptions};
use rigging_workload::service::{plan_node_port, Service, ServicePort, ServiceSpec};
use rigging_workload::volume::{resolve_docker, resolve_k8s};
use rigging_workload::{
    CompilationError, DockerBuildContext, DockerResourceGroup, EbsVolumeLookup, K8sBuildContext,
    K8sResourceGroup, LoadedEnv, VolumeSource,
};
use tracing::{debug, error, info};

use crate::options::{ContainerOptions, DeploymentOptions, ServiceOptions};

/// The port an app listens on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortPlan {
    /// Container port name
    pub name: String,
    /// Port inside the container
    pub container_port: u16,
    /// Port published on the Docker host
    pub host_port: u16,
}

#[derive(Clone, Debug)]
struct VolumePlan<'a> {
    name: String,
    mount_path: String,
    source: &'a VolumeSource,
}

/// Builds the Docker or Kubernetes group of one app
pub struct AppCompiler<'a> {
    app_name: &'a str,
    enabled: bool,
    names: ResolvedNames,
    image: String,
    pull_policy: ImagePullPolicy,
    container: &'a ContainerOptions,
    deployment: &'a DeploymentOptions,
    entrypoint: Option<Vec<String>>,
    command: Option<Vec<String>>,
    port: Option<PortPlan>,
    env: LoadedEnv,
    volumes: Vec<VolumePlan<'a>>,
    service: Option<&'a ServiceOptions>,
    persistent_volumes: &'a [PersistentVolumeOptions],
    cluster_role_bindings: &'a [ClusterRoleBindingOptions],
}

impl<'a> AppCompiler<'a> {
    /// Create a compiler with the settings every app has.
    pub fn new(
        app_name: &'a str,
        names: ResolvedNames,
        image: String,
        container: &'a ContainerOptions,
        deployment: &'a DeploymentOptions,
        env: LoadedEnv,
    ) -> Self {
        Self {
            app_name,
            enabled: true,
            names,
            image,
            pull_policy: ImagePullPolicy::default(),
            container,
            deployment,
            entrypoint: container.entrypoint.as_ref().map(|c| c.to_args()),
            command: container.command.as_ref().map(|c| c.to_args()),
            port: None,
            env,
            volumes: Vec::new(),
            service: None,
            persistent_volumes: &[],
            cluster_role_bindings: &[],
        }
    }

    /// Set the group's enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the image pull policy.
    pub fn with_pull_policy(mut self, policy: ImagePullPolicy) -> Self {
        self.pull_policy = policy;
        self
    }

    /// Replace the command (Kubernetes `args`).
    pub fn with_command(mut self, command: Option<Vec<String>>) -> Self {
        self.command = command;
        self
    }

    /// Open a container port.
    pub fn with_port(mut self, port: PortPlan) -> Self {
        self.port = Some(port);
        self
    }

    /// Mount a volume.
    pub fn with_volume(
        mut self,
        name: impl Into<String>,
        mount_path: impl Into<String>,
        source: &'a VolumeSource,
    ) -> Self {
        self.volumes.push(VolumePlan {
            name: name.into(),
            mount_path: mount_path.into(),
            source,
        });
        self
    }

    /// Expose the open port through a Service.
    pub fn with_service(mut self, service: &'a ServiceOptions) -> Self {
        self.service = Some(service);
        self
    }

    /// Emit extra PersistentVolumes with the group.
    pub fn with_persistent_volumes(mut self, volumes: &'a [PersistentVolumeOptions]) -> Self {
        self.persistent_volumes = volumes;
        self
    }

    /// Emit extra ClusterRoleBindings with the group.
    pub fn with_cluster_role_bindings(mut self, bindings: &'a [ClusterRoleBindingOptions]) -> Self {
        self.cluster_role_bindings = bindings;
        self
    }

    // =========================================================================
    // Docker
    // =========================================================================

    /// Build the Docker group.
    ///
    /// Returns `None` if the container cannot be built.
    pub fn docker(&self, ctx: &DockerBuildContext) -> Option<DockerResourceGroup> {
        debug!(app = %self.app_name, "building docker resource group");

        let container = match self.docker_container(ctx) {
            Ok(container) => container,
            Err(e) => {
                error!(
                    app = %self.app_name,
                    container = %self.names.container,
                    error = %e,
                    "skipping docker resource group"
                );
                return None;
            }
        };

        info!(app = %self.app_name, container = %container.name, "built docker resource group");
        Some(DockerResourceGroup {
            name: self.app_name.to_string(),
            enabled: self.enabled,
            network: DockerNetwork::bridge(&ctx.network),
            container,
        })
    }

    fn docker_container(&self, ctx: &DockerBuildContext) -> Result<DockerContainer, CompilationError> {
        let mut volumes = BTreeMap::new();
        for plan in &self.volumes {
            let (source, binding) = resolve_docker(&plan.name, &plan.mount_path, plan.source)?;
            volumes.insert(source, binding);
        }

        let ports = self
            .port
            .iter()
            .map(|p| (p.container_port, p.host_port))
            .collect();

        Ok(DockerContainer {
            name: self.names.container.clone(),
            image: self.image.clone(),
            entrypoint: self.entrypoint.clone(),
            command: self.command.clone(),
            detach: self.container.detach,
            auto_remove: self.container.auto_remove,
            remove: self.container.remove,
            stdin_open: self.container.stdin_open,
            tty: self.container.tty,
            environment: self.env.merged(),
            network: ctx.network.clone(),
            ports,
            volumes,
            labels: component_labels(&self.names.container, self.app_name, &self.container.labels),
        })
    }

    // =========================================================================
    // Kubernetes
    // =========================================================================

    /// Build the Kubernetes group.
    pub fn k8s(&self, ctx: &K8sBuildContext, lookup: &dyn EbsVolumeLookup) -> K8sResourceGroup {
        debug!(app = %self.app_name, "building kubernetes resource group");

        let compiled_env = env::compile(
            &self.env,
            self.app_name,
            &self.names.config_map,
            &self.names.secret,
            ctx,
        );

        let deployment = match self.k8s_deployment(ctx, lookup, &compiled_env) {
            Ok(deployment) => Some(deployment),
            Err(e) => {
                error!(
                    app = %self.app_name,
                    deployment = %self.names.deployment,
                    error = %e,
                    "skipping deployment"
                );
                None
            }
        };

        let service = match self.k8s_service(ctx) {
            Ok(service) => service,
            Err(e) => {
                error!(
                    app = %self.app_name,
                    service = %self.names.service,
                    error = %e,
                    "skipping service"
                );
                None
            }
        };

        let persistent_volumes = self
            .persistent_volumes
            .iter()
            .map(|pv| persistent_volume::build(pv, self.app_name, ctx))
            .collect();

        let cluster_role_bindings = self
            .cluster_role_bindings
            .iter()
            .filter_map(|crb| match rbac::build(crb, self.app_name, ctx) {
                Ok(binding) => Some(binding),
                Err(e) => {
                    error!(
                        app = %self.app_name,
                        binding = %crb.name,
                        error = %e,
                        "skipping cluster role binding"
                    );
                    None
                }
            })
            .collect();

        let group = K8sResourceGroup {
            name: self.app_name.to_string(),
            enabled: self.enabled,
            config_map: compiled_env.config_map,
            secret: compiled_env.secret,
            deployment,
            service,
            persistent_volumes,
            cluster_role_bindings,
        };
        info!(app = %self.app_name, resources = group.len(), "built kubernetes resource group");
        group
    }

    fn pod_labels(&self, ctx: &K8sBuildContext) -> BTreeMap<String, String> {
        let mut labels = component_labels(&self.names.pod, self.app_name, &ctx.labels);
        // the selector label must survive caller overrides
        labels.insert(LABEL_NAME.to_string(), self.app_name.to_string());
        labels
    }

    fn k8s_deployment(
        &self,
        ctx: &K8sBuildContext,
        lookup: &dyn EbsVolumeLookup,
        compiled_env: &CompiledEnv,
    ) -> Result<Deployment, CompilationError> {
        let mut node_selector = self.deployment.node_selector.clone();
        let mut volumes = Vec::new();
        let mut mounts = Vec::new();
        for plan in &self.volumes {
            let resolved = resolve_k8s(
                &plan.name,
                &plan.mount_path,
                plan.source,
                &node_selector,
                lookup,
            )?;
            node_selector = resolved.node_selector;
            volumes.push(resolved.volume);
            mounts.push(resolved.mount);
        }

        let container = Container {
            name: self.names.container.clone(),
            image: self.image.clone(),
            image_pull_policy: Some(self.pull_policy),
            command: self.entrypoint.clone(),
            args: self.command.clone(),
            env: compiled_env.env.clone(),
            env_from: compiled_env.env_from.clone(),
            ports: self
                .port
                .iter()
                .map(|p| ContainerPort {
                    name: Some(p.name.clone()),
                    container_port: p.container_port,
                    protocol: Some("TCP".to_string()),
                })
                .collect(),
            volume_mounts: mounts,
        };

        let mut metadata = ctx.meta(&self.names.deployment, self.app_name);
        metadata
            .labels
            .extend(self.deployment.labels.iter().map(|(k, v)| (k.clone(), v.clone())));

        let selector = app_selector(self.app_name);
        let topology_spread_constraints = self
            .deployment
            .topology_spread
            .iter()
            .map(|spread| spread.to_constraint(selector.clone()))
            .collect();

        Ok(Deployment::new(
            metadata,
            DeploymentSpec {
                replicas: self.deployment.replicas,
                selector: LabelSelector {
                    match_labels: selector,
                },
                template: PodTemplateSpec {
                    metadata: PodMeta {
                        name: Some(self.names.pod.clone()),
                        labels: self.pod_labels(ctx),
                        annotations: BTreeMap::new(),
                    },
                    spec: PodSpec {
                        service_account_name: ctx.service_account_name.clone(),
                        containers: vec![container],
                        volumes,
                        node_selector,
                        restart_policy: Some(self.deployment.restart_policy),
                        termination_grace_period_seconds: self
                            .deployment
                            .termination_grace_period_seconds,
                        topology_spread_constraints,
                    },
                },
                strategy: self.deployment.strategy.as_ref().map(|s| s.to_strategy()),
            },
        ))
    }

    /// `Ok(None)` when the app exposes no Service.
    fn k8s_service(&self, ctx: &K8sBuildContext) -> Result<Option<Service>, CompilationError> {
        let (Some(options), Some(port)) = (self.service, &self.port) else {
            return Ok(None);
        };

        let node_port = plan_node_port(options.service_type, options.node_port, &self.names.service)?;
        let target_port = options
            .target_port
            .clone()
            .unwrap_or_else(|| TargetPort::Name(port.name.clone()));

        Ok(Some(Service::new(
            ctx.meta(&self.names.service, self.app_name),
            ServiceSpec {
                selector: app_selector(self.app_name),
                ports: vec![ServicePort {
                    name: Some(port.name.clone()),
                    port: options.port.unwrap_or(port.container_port),
                    target_port: Some(target_port),
                    node_port,
                    protocol: Some("TCP".to_string()),
                }],
                type_: options.service_type,
            },
        )))
    }
}
