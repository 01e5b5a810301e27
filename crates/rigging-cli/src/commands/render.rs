//! Render command

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use rigging_workload::{DockerBuildContext, K8sBuildContext, NoEbsLookup};
use tracing::{info, warn};

use super::{load_app, write_documents};
use crate::{Error, Result};

/// Target backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// A Docker container and its network
    Docker,
    /// Kubernetes manifests
    K8s,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// App definition file
    pub file: PathBuf,

    /// Backend to render for
    #[arg(long, value_enum, default_value_t = Backend::K8s)]
    pub backend: Backend,

    /// Namespace for namespaced Kubernetes resources
    #[arg(long)]
    pub namespace: Option<String>,

    /// Docker network name
    #[arg(long)]
    pub network: Option<String>,

    /// Service account for pods and ClusterRoleBindings
    #[arg(long)]
    pub service_account: Option<String>,
}

pub fn run(args: RenderArgs, out: &mut impl Write) -> Result<()> {
    let app = load_app(&args.file)?;
    if !app.enabled() {
        warn!(app = %app.name(), "app is disabled, nothing to render");
        return Ok(());
    }

    match args.backend {
        Backend::Docker => {
            let ctx = match args.network {
                Some(network) => DockerBuildContext::with_network(network),
                None => DockerBuildContext::default(),
            };
            let groups = app.docker_resource_groups(&ctx);
            if groups.is_empty() {
                return Err(Error::no_resources(app.name(), "docker"));
            }
            write_documents(out, &groups)?;
            info!(app = %app.name(), groups = groups.len(), "rendered docker groups");
        }
        Backend::K8s => {
            let ctx = K8sBuildContext {
                namespace: args.namespace,
                service_account_name: args.service_account,
                ..Default::default()
            };
            let mut manifests = Vec::new();
            for group in app.k8s_resource_groups(&ctx, &NoEbsLookup) {
                manifests.extend(group.manifests()?);
            }
            if manifests.is_empty() {
                return Err(Error::no_resources(app.name(), "kubernetes"));
            }
            write_documents(out, &manifests)?;
            info!(app = %app.name(), resources = manifests.len(), "rendered kubernetes manifests");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::write_definition;

    fn render(contents: &str, backend: Backend) -> Result<String> {
        let dir = tempfile::tempdir().unwrap();
        let file = write_definition(&dir, "app.yaml", contents);
        let mut out = Vec::new();
        run(
            RenderArgs {
                file,
                backend,
                namespace: Some("data".to_string()),
                network: None,
                service_account: None,
            },
            &mut out,
        )?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn documents(output: &str) -> Vec<serde_yaml::Value> {
        output
            .split("---\n")
            .filter(|doc| !doc.trim().is_empty())
            .map(|doc| serde_yaml::from_str(doc).unwrap())
            .collect()
    }

    #[test]
    fn story_render_redis_manifests() {
        let output = render("kind: redis\nname: cache\n", Backend::K8s).unwrap();
        let docs = documents(&output);

        let kinds: Vec<_> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["Deployment", "Service"]);
        assert_eq!(docs[0]["metadata"]["namespace"].as_str(), Some("data"));
        assert_eq!(docs[1]["metadata"]["name"].as_str(), Some("svc-cache"));
    }

    #[test]
    fn story_render_docker_group() {
        let output = render("kind: redis\n", Backend::Docker).unwrap();
        let docs = documents(&output);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["container"]["name"].as_str(), Some("container-redis"));
        assert_eq!(docs[0]["network"]["name"].as_str(), Some("rigging"));
    }

    #[test]
    fn story_unbuildable_docker_group_fails() {
        let err = render(
            "kind: redis\nvolume:\n  source:\n    type: hostPath\n",
            Backend::Docker,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoResources { .. }));
    }

    #[test]
    fn story_disabled_app_renders_nothing() {
        let output = render("kind: redis\nenabled: false\n", Backend::K8s).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_invalid_definition_is_an_error() {
        let err = render("kind: redis\nname: Not_Valid\n", Backend::K8s).unwrap_err();
        assert!(matches!(err, Error::App(_)));
    }
}
