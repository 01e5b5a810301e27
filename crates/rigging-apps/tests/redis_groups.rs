//! End-to-end Redis builds against both backends

use std::collections::BTreeMap;
use std::path::PathBuf;

use rigging_apps::options::ServiceOptions;
use rigging_apps::{App, AppDefinition, ConnectionContext, Redis, RedisOptions};
use rigging_common::naming::{default_name, ResourceKind};
use rigging_common::{TOPOLOGY_REGION_LABEL, TOPOLOGY_ZONE_LABEL};
use rigging_workload::service::ServiceType;
use rigging_workload::volume::{AwsEbsSource, EbsVolumeRef, HostPathSource};
use rigging_workload::{
    DockerBuildContext, EbsVolumeLookup, K8sBuildContext, NoEbsLookup, VolumeOptions, VolumeSource,
};
use rstest::rstest;

struct FixedLookup(&'static str);

impl EbsVolumeLookup for FixedLookup {
    fn volume_id(&self, _volume: &EbsVolumeRef, _region: &str) -> Option<String> {
        Some(self.0.to_string())
    }
}

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn redis(options: RedisOptions) -> Redis {
    Redis::new(options).unwrap()
}

fn k8s() -> K8sBuildContext {
    K8sBuildContext {
        namespace: Some("data".to_string()),
        ..Default::default()
    }
}

#[test]
fn story_names_derive_from_app_name() {
    let app = redis(RedisOptions {
        name: "cache".to_string(),
        ..Default::default()
    });
    let group = app.k8s_group(&k8s(), &NoEbsLookup);

    assert!(group.config_map.is_none());
    let deployment = group.deployment.unwrap();
    assert_eq!(deployment.metadata.name, "deploy-cache");
    assert_eq!(deployment.spec.template.metadata.name.as_deref(), Some("pod-cache"));
    assert_eq!(deployment.container().unwrap().name, "container-cache");
    assert_eq!(
        deployment.spec.template.spec.volumes[0].name,
        default_name(ResourceKind::Volume, "cache")
    );
    assert_eq!(group.service.unwrap().metadata.name, "svc-cache");

    // same options, same names
    let again = redis(RedisOptions {
        name: "cache".to_string(),
        ..Default::default()
    });
    assert_eq!(again.names(), app.names());
}

#[test]
fn story_env_precedence_docker() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = BTreeMap::new();
    env.insert("A".to_string(), "inline".to_string());

    let mut options = RedisOptions::default();
    options.env.env = env;
    options.env.env_file = Some(write(&dir, "env.yaml", "A: env\nB: env\nC: env\n"));
    options.env.secrets_file = Some(write(&dir, "secrets.yaml", "A: secret\nB: secret\n"));

    let group = redis(options)
        .docker_group(&DockerBuildContext::default())
        .unwrap();
    let env = &group.container.environment;
    assert_eq!(env["A"], "inline");
    assert_eq!(env["B"], "secret");
    assert_eq!(env["C"], "env");
}

#[test]
fn story_host_path_without_path_drops_workload() {
    let options = RedisOptions {
        volume: VolumeOptions {
            source: VolumeSource::HostPath(HostPathSource { path: None }),
            ..Default::default()
        },
        ..Default::default()
    };
    let app = redis(options);

    assert!(app.docker_group(&DockerBuildContext::default()).is_none());
    let group = app.k8s_group(&k8s(), &NoEbsLookup);
    assert!(group.deployment.is_none());
}

#[test]
fn story_empty_dir_always_yields_volume() {
    let app = redis(RedisOptions::default());

    let docker = app.docker_group(&DockerBuildContext::default()).unwrap();
    assert_eq!(docker.container.volumes["volume-redis"].bind, "/data");

    let group = app.k8s_group(&k8s(), &NoEbsLookup);
    let pod = group.deployment.unwrap().spec.template.spec;
    assert!(pod.volumes[0].empty_dir.is_some());
    assert_eq!(pod.containers[0].volume_mounts[0].mount_path, "/data");
}

#[rstest]
#[case(29999, false)]
#[case(30000, true)]
#[case(32767, true)]
#[case(32768, false)]
fn story_node_port_bounds(#[case] node_port: u16, #[case] has_service: bool) {
    let app = redis(RedisOptions {
        service: ServiceOptions {
            service_type: Some(ServiceType::NodePort),
            node_port: Some(node_port),
            ..Default::default()
        },
        ..Default::default()
    });
    let group = app.k8s_group(&k8s(), &NoEbsLookup);

    assert_eq!(group.service.is_some(), has_service);
    if let Some(service) = group.service {
        assert_eq!(service.spec.ports[0].node_port, Some(node_port));
    }
    // the rest of the group is unaffected
    assert!(group.deployment.is_some());
}

#[test]
fn story_secret_only_with_secrets_file_data() {
    let dir = tempfile::tempdir().unwrap();

    let group = redis(RedisOptions::default()).k8s_group(&k8s(), &NoEbsLookup);
    assert!(group.secret.is_none());

    let mut options = RedisOptions::default();
    options.env.secrets_file = Some(write(&dir, "empty.yaml", ""));
    let group = redis(options).k8s_group(&k8s(), &NoEbsLookup);
    assert!(group.secret.is_none());

    let mut options = RedisOptions::default();
    options.env.secrets_file = Some(write(&dir, "secrets.yaml", "REDIS_PASSWORD: x\n"));
    let group = redis(options).k8s_group(&k8s(), &NoEbsLookup);
    let secret = group.secret.unwrap();
    assert_eq!(secret.string_data.len(), 1);
    assert_eq!(secret.string_data["REDIS_PASSWORD"], "x");
    assert_eq!(secret.metadata.namespace.as_deref(), Some("data"));

    let container = group.deployment.unwrap().spec.template.spec.containers[0].clone();
    assert_eq!(
        container.env_from.last().unwrap().secret_ref.as_ref().unwrap().name,
        "secret-redis"
    );
}

#[test]
fn story_connection_url_normalized() {
    let app = redis(RedisOptions {
        schema: Some("0".to_string()),
        ..Default::default()
    });
    assert_eq!(app.url(ConnectionContext::Local), "redis://localhost:6379/0");
    assert_eq!(
        app.connection_url(ConnectionContext::K8s).as_deref(),
        Some("redis://svc-redis:6379/0")
    );
}

#[test]
fn story_password_from_secrets_file_in_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = RedisOptions {
        password: Some("explicit".to_string()),
        ..Default::default()
    };
    options.env.secrets_file = Some(write(
        &dir,
        "secrets.yaml",
        "REDIS_PASSWORD: filepw\nREDIS_SCHEMA: 2\n",
    ));
    let app = redis(options);
    assert_eq!(app.url(ConnectionContext::Docker), "redis://filepw@container-redis:6379/2");
}

#[test]
fn story_ebs_volume_pins_pods_to_zone() {
    let mut node_selector = BTreeMap::new();
    node_selector.insert("pool".to_string(), "storage".to_string());

    let mut options = RedisOptions {
        volume: VolumeOptions {
            source: VolumeSource::AwsEbs(AwsEbsSource {
                volume_id: None,
                volume: Some(EbsVolumeRef {
                    name: "redis-data".to_string(),
                    availability_zone: Some("us-east-1c".to_string()),
                }),
                region: Some("us-east-1".to_string()),
                availability_zone: None,
                schedule_pods_in_topology: true,
            }),
            ..Default::default()
        },
        ..Default::default()
    };
    options.deployment.node_selector = node_selector.clone();
    let app = redis(options);

    let group = app.k8s_group(&k8s(), &FixedLookup("vol-0abc"));
    let pod = group.deployment.unwrap().spec.template.spec;
    assert_eq!(
        pod.volumes[0].aws_elastic_block_store.as_ref().unwrap().volume_id,
        "vol-0abc"
    );
    assert_eq!(pod.node_selector["pool"], "storage");
    assert_eq!(pod.node_selector[TOPOLOGY_REGION_LABEL], "us-east-1");
    assert_eq!(pod.node_selector[TOPOLOGY_ZONE_LABEL], "us-east-1c");

    // the options' selector is untouched
    assert_eq!(app.options().deployment.node_selector, node_selector);

    // docker cannot mount EBS volumes
    assert!(app.docker_group(&DockerBuildContext::default()).is_none());
}

#[test]
fn story_manifests_from_definition() {
    let def = AppDefinition::from_yaml(
        r#"
kind: redis
name: cache
loggingLevel: warning
deployment:
  replicas: 2
  strategy:
    type: Recreate
"#,
    )
    .unwrap();
    let app = def.into_app().unwrap();
    let group = app.k8s_group(&K8sBuildContext::default(), &NoEbsLookup);
    let manifests = group.manifests().unwrap();

    let deployment = manifests
        .iter()
        .find(|m| m["kind"] == "Deployment")
        .unwrap();
    assert_eq!(deployment["spec"]["replicas"], 2);
    assert_eq!(deployment["spec"]["strategy"]["type"], "Recreate");
    assert_eq!(
        deployment["spec"]["template"]["spec"]["containers"][0]["args"],
        serde_json::json!(["redis-server", "--loglevel", "warning"])
    );
    assert_eq!(
        deployment["spec"]["template"]["spec"]["containers"][0]["image"],
        "redis:6.2.6"
    );
}
