//! Shared resource build pipeline for rigging apps
//!
//! Holds the Kubernetes and Docker resource types plus the per-concern
//! compilers every app reuses:
//!
//! - [`env`]: env-file / secrets-file / inline merging, ConfigMap + Secret
//! - [`volume`]: volume kind dispatch and EBS topology selectors
//! - [`service`]: Service ports and node-port validation
//! - [`deployment`]: Deployment and pod template types
//! - [`docker`]: Docker container/network groups
//! - [`persistent_volume`], [`rbac`]: standalone cluster-scoped resources
//!
//! App crates combine these into a [`K8sResourceGroup`] or a
//! [`DockerResourceGroup`].

pub mod deployment;
pub mod docker;
pub mod env;
pub mod error;
pub mod group;
pub mod k8s;
pub mod persistent_volume;
pub mod rbac;
pub mod service;
pub mod volume;

pub use docker::{DockerBuildContext, DockerResourceGroup};
pub use env::{EnvOptions, EnvironmentMap, LoadedEnv};
pub use error::CompilationError;
pub use group::{K8sBuildContext, K8sResourceGroup};
pub use volume::{EbsVolumeLookup, EbsVolumeRef, NoEbsLookup, VolumeOptions, VolumeSource};
