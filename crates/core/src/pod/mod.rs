//! Assembly of the desired pod of a deployment unit.

mod error;
mod secret;

use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{
        Capabilities, Container as ContainerSpec, EnvVar, LocalObjectReference, Pod, PodSpec,
        Secret, SecurityContext,
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use snafu::OptionExt;
use unitsync_base::consts::{
    DEFAULT_PAUSE_IMAGE, DEFAULT_REGISTRY, HOST_NAMESPACE_MODE, HOST_NETWORK_KIND,
    PAUSE_CONTAINER_NAME, container_labels,
    k8s::{annotations, labels},
};

pub use self::{
    error::Error,
    secret::{pull_secret_name, registry_secrets},
};
use crate::{
    affinity, naming, translate,
    unit::{Container, DeploymentUnit},
};

const RESTART_POLICY_NEVER: &str = "Never";
const DNS_POLICY_DEFAULT: &str = "Default";

/// Settings of the build that do not come from the deployment unit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildOptions {
    /// Image of the sidecar that always runs first in the pod.
    pub pause_image: String,

    /// Registry URL the credentials of a unit belong to.
    pub registry: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { pause_image: DEFAULT_PAUSE_IMAGE.to_string(), registry: DEFAULT_REGISTRY.to_string() }
    }
}

/// Everything that must exist in the cluster for a deployment unit to run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DesiredPod {
    pub pod: Pod,

    /// Pull secrets referenced by the pod, created before it.
    pub pull_secrets: Vec<Secret>,
}

impl DesiredPod {
    /// Builds the pod and pull secrets of `unit`.
    ///
    /// # Errors
    ///
    /// Fails if the pod cannot be built or a pull secret cannot be encoded.
    pub fn build(unit: &DeploymentUnit, options: &BuildOptions) -> Result<Self, Error> {
        Ok(Self { pod: build_pod(unit, options)?, pull_secrets: registry_secrets(unit, options)? })
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> { self.pod.metadata.name.as_deref() }
}

/// Builds the pod that runs `unit`.
///
/// The first container is the primary container: it names the pod and
/// provides the host namespaces, host aliases and affinity.
///
/// # Errors
///
/// Returns [`Error::NoContainers`] if the unit has no container.
pub fn build_pod(unit: &DeploymentUnit, options: &BuildOptions) -> Result<Pod, Error> {
    let primary =
        unit.primary().with_context(|| error::NoContainersSnafu { unit_id: unit.id.clone() })?;

    let containers = std::iter::once(pause_container(options))
        .chain(unit.containers.iter().map(container_spec))
        .collect();

    let image_pull_secrets = unit
        .registry_credentials
        .iter()
        .map(|credential| LocalObjectReference {
            name: pull_secret_name(&options.registry, credential),
            ..LocalObjectReference::default()
        })
        .collect();

    Ok(Pod {
        metadata: ObjectMeta {
            name: Some(naming::pod_name(&primary.name, &unit.id)),
            namespace: non_empty_string(&unit.namespace),
            labels: Some(pod_labels(unit, primary)),
            annotations: Some(pod_annotations(unit, primary)),
            ..ObjectMeta::default()
        },
        spec: Some(PodSpec {
            containers,
            restart_policy: Some(RESTART_POLICY_NEVER.to_string()),
            dns_policy: Some(DNS_POLICY_DEFAULT.to_string()),
            host_network: uses_host_network(unit, primary).then_some(true),
            host_ipc: (primary.ipc_mode == HOST_NAMESPACE_MODE).then_some(true),
            host_pid: (primary.pid_mode == HOST_NAMESPACE_MODE).then_some(true),
            node_name: non_empty_string(&unit.node_name),
            affinity: affinity::build_affinity(primary, &unit.namespace),
            host_aliases: non_empty(translate::host_aliases(&primary.extra_hosts)),
            volumes: non_empty(translate::pod_volumes(&unit.containers)),
            image_pull_secrets: non_empty(image_pull_secrets),
            ..PodSpec::default()
        }),
        ..Pod::default()
    })
}

fn pause_container(options: &BuildOptions) -> ContainerSpec {
    ContainerSpec {
        name: PAUSE_CONTAINER_NAME.to_string(),
        image: Some(options.pause_image.clone()),
        ..ContainerSpec::default()
    }
}

fn container_spec(container: &Container) -> ContainerSpec {
    let env = container
        .environment
        .iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            ..EnvVar::default()
        })
        .collect();

    ContainerSpec {
        name: naming::container_name(&container.name),
        image: non_empty_string(&container.image),
        command: non_empty(container.entry_point.clone()),
        args: non_empty(container.command.clone()),
        tty: container.tty.then_some(true),
        stdin: container.stdin_open.then_some(true),
        working_dir: non_empty_string(&container.working_dir),
        env: non_empty(env),
        security_context: Some(security_context(container)),
        volume_mounts: non_empty(translate::volume_mounts(container)),
        ports: non_empty(translate::container_ports(&container.ports)),
        resources: translate::Resources::from_container(container).into_requirements(),
        ..ContainerSpec::default()
    }
}

fn security_context(container: &Container) -> SecurityContext {
    SecurityContext {
        privileged: Some(container.privileged),
        read_only_root_filesystem: Some(container.read_only),
        capabilities: Some(Capabilities {
            add: non_empty(container.cap_add.clone()),
            drop: non_empty(container.cap_drop.clone()),
        }),
        ..SecurityContext::default()
    }
}

/// The two reserved labels plus the hashed labels of the primary container.
fn pod_labels(unit: &DeploymentUnit, primary: &Container) -> BTreeMap<String, String> {
    [
        (labels::REVISION.to_string(), unit.revision.clone()),
        (labels::DEPLOYMENT_UUID.to_string(), unit.id.clone()),
    ]
    .into_iter()
    .chain(
        primary
            .labels
            .iter()
            .map(|(key, value)| (naming::derive_name(key), naming::derive_name(value))),
    )
    .collect()
}

/// The primary container name plus every `io.rancher` label of every
/// container, keyed by container.
fn pod_annotations(unit: &DeploymentUnit, primary: &Container) -> BTreeMap<String, String> {
    std::iter::once((
        annotations::PRIMARY_CONTAINER_NAME.to_string(),
        naming::container_name(&primary.name),
    ))
    .chain(unit.containers.iter().flat_map(|container| {
        container
            .labels
            .iter()
            .filter(|(key, _)| key.contains(container_labels::RANCHER_PREFIX))
            .map(|(key, value)| (naming::annotation_key(&container.name, key), value.clone()))
    }))
    .collect()
}

fn uses_host_network(unit: &DeploymentUnit, primary: &Container) -> bool {
    unit.networks
        .iter()
        .any(|network| network.id == primary.primary_network_id && network.kind == HOST_NETWORK_KIND)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> { (!items.is_empty()).then_some(items) }

fn non_empty_string(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Network, RegistryCredential, StringMap};

    fn web_unit() -> DeploymentUnit {
        DeploymentUnit {
            id: "abcdef1234567890".to_string(),
            revision: "3".to_string(),
            namespace: "stack-a".to_string(),
            containers: vec![
                Container {
                    name: "Web".to_string(),
                    image: "nginx:1.27".to_string(),
                    entry_point: vec!["/docker-entrypoint.sh".to_string()],
                    command: vec!["nginx".to_string(), "-g".to_string(), "daemon off;".to_string()],
                    environment: [("B", "2"), ("A", "1")].into_iter().collect::<StringMap>(),
                    labels: [
                        ("tier", "front"),
                        ("io.rancher.stack.name", "shop"),
                        (container_labels::HOST_AFFINITY, "zone=a"),
                    ]
                    .into_iter()
                    .collect::<StringMap>(),
                    memory: 536_870_912,
                    ports: vec!["8080:80/tcp".to_string()],
                    data_volumes: vec!["/data:/usr/share/nginx/html:ro".to_string()],
                    extra_hosts: vec!["db:10.0.0.5".to_string()],
                    cap_add: vec!["NET_ADMIN".to_string()],
                    ..Container::default()
                },
                Container {
                    name: "Sidekick".to_string(),
                    image: "busybox".to_string(),
                    labels: [("io.rancher.container.role", "helper")].into_iter().collect::<StringMap>(),
                    data_volumes: vec!["/data:/data".to_string()],
                    ..Container::default()
                },
            ],
            ..DeploymentUnit::default()
        }
    }

    fn spec(pod: &Pod) -> &PodSpec { pod.spec.as_ref().expect("pod spec") }

    #[test]
    fn test_metadata() {
        let unit = web_unit();
        let pod = build_pod(&unit, &BuildOptions::default()).expect("pod should build");

        assert_eq!(pod.metadata.name.as_deref(), Some("web-abcdef12"));
        assert_eq!(pod.metadata.namespace.as_deref(), Some("stack-a"));

        let labels = pod.metadata.labels.as_ref().expect("labels");
        assert_eq!(labels.get(labels::REVISION).map(String::as_str), Some("3"));
        assert_eq!(labels.get(labels::DEPLOYMENT_UUID).map(String::as_str), Some("abcdef1234567890"));
        assert_eq!(
            labels.get(&naming::derive_name("tier")),
            Some(&naming::derive_name("front"))
        );
        // Two reserved labels plus one per primary container label.
        assert_eq!(labels.len(), 2 + 3);
        assert!(!labels.contains_key(&naming::derive_name("io.rancher.container.role")));

        let annotations = pod.metadata.annotations.as_ref().expect("annotations");
        assert_eq!(
            annotations.get(annotations::PRIMARY_CONTAINER_NAME).map(String::as_str),
            Some("web")
        );
        assert_eq!(annotations.get("web/io.rancher.stack.name").map(String::as_str), Some("shop"));
        assert_eq!(
            annotations.get("web/io.rancher.scheduler.affinity.host_label").map(String::as_str),
            Some("zone=a")
        );
        assert_eq!(
            annotations.get("sidekick/io.rancher.container.role").map(String::as_str),
            Some("helper")
        );
        assert!(!annotations.keys().any(|key| key.ends_with("/tier")));
    }

    #[test]
    fn test_containers() {
        let options = BuildOptions { pause_image: "pause:test".to_string(), ..BuildOptions::default() };
        let pod = build_pod(&web_unit(), &options).expect("pod should build");
        let containers = &spec(&pod).containers;

        assert_eq!(containers.len(), 3);
        assert_eq!(containers[0].name, PAUSE_CONTAINER_NAME);
        assert_eq!(containers[0].image.as_deref(), Some("pause:test"));

        let web = &containers[1];
        assert_eq!(web.name, "web");
        assert_eq!(web.image.as_deref(), Some("nginx:1.27"));
        assert_eq!(web.command, Some(vec!["/docker-entrypoint.sh".to_string()]));
        assert_eq!(web.args.as_ref().map(Vec::len), Some(3));
        let env = web.env.as_ref().expect("env");
        assert_eq!(env.iter().map(|var| var.name.as_str()).collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(web.ports.as_ref().map(Vec::len), Some(1));
        let mounts = web.volume_mounts.as_ref().expect("mounts");
        assert_eq!(mounts[0].name, naming::derive_name("/data"));
        assert_eq!(mounts[0].read_only, Some(true));
        let limits = web.resources.as_ref().and_then(|r| r.limits.as_ref()).expect("limits");
        assert_eq!(limits.get("memory").map(|q| q.0.as_str()), Some("536870912"));
        let security = web.security_context.as_ref().expect("security context");
        assert_eq!(security.privileged, Some(false));
        assert_eq!(
            security.capabilities.as_ref().and_then(|c| c.add.clone()),
            Some(vec!["NET_ADMIN".to_string()])
        );

        let sidekick = &containers[2];
        assert_eq!(sidekick.name, "sidekick");
        assert!(sidekick.ports.is_none());
        assert!(sidekick.resources.is_none());
        assert!(sidekick.env.is_none());
    }

    #[test]
    fn test_pod_spec() {
        let pod = build_pod(&web_unit(), &BuildOptions::default()).expect("pod should build");
        let spec = spec(&pod);

        assert_eq!(spec.restart_policy.as_deref(), Some("Never"));
        assert_eq!(spec.dns_policy.as_deref(), Some("Default"));
        assert_eq!(spec.host_network, None);
        assert_eq!(spec.host_ipc, None);
        assert_eq!(spec.host_pid, None);
        assert_eq!(spec.node_name, None);
        // Both containers mount /data: one shared volume.
        assert_eq!(spec.volumes.as_ref().map(Vec::len), Some(1));
        let aliases = spec.host_aliases.as_ref().expect("host aliases");
        assert_eq!(aliases[0].ip, "10.0.0.5");
        assert!(spec.affinity.as_ref().and_then(|a| a.node_affinity.as_ref()).is_some());
        assert!(spec.image_pull_secrets.is_none());
    }

    #[test]
    fn test_host_namespaces_and_node() {
        let mut unit = web_unit();
        unit.node_name = "node-1".to_string();
        unit.networks = vec![
            Network { id: "managed".to_string(), kind: "bridge".to_string() },
            Network { id: "host-net".to_string(), kind: "host".to_string() },
        ];
        unit.containers[0].primary_network_id = "host-net".to_string();
        unit.containers[0].ipc_mode = "host".to_string();
        unit.containers[0].pid_mode = "container:other".to_string();

        let pod = build_pod(&unit, &BuildOptions::default()).expect("pod should build");
        let spec = spec(&pod);
        assert_eq!(spec.host_network, Some(true));
        assert_eq!(spec.host_ipc, Some(true));
        assert_eq!(spec.host_pid, None);
        assert_eq!(spec.node_name.as_deref(), Some("node-1"));
    }

    #[test]
    fn test_image_pull_secrets() {
        let mut unit = web_unit();
        unit.registry_credentials = vec![
            RegistryCredential { public_value: "u1".to_string(), secret_value: "p1".to_string() },
            RegistryCredential { public_value: "u2".to_string(), secret_value: "p2".to_string() },
        ];
        let options = BuildOptions::default();

        let pod = build_pod(&unit, &options).expect("pod should build");
        let secrets = spec(&pod).image_pull_secrets.as_ref().expect("pull secrets");
        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets[0].name, naming::secret_name(&options.registry, "u1", "p1"));
    }

    #[test]
    fn test_global_primary_has_no_affinity() {
        let mut unit = web_unit();
        unit.containers[0].labels = [
            (container_labels::GLOBAL, "true"),
            (container_labels::HOST_AFFINITY, "zone=a"),
        ]
        .into_iter()
        .collect::<StringMap>();

        let pod = build_pod(&unit, &BuildOptions::default()).expect("pod should build");
        assert!(spec(&pod).affinity.is_none());
    }

    #[test]
    fn test_desired_pod() {
        let mut unit = web_unit();
        unit.registry_credentials =
            vec![RegistryCredential { public_value: "u".to_string(), secret_value: "p".to_string() }];

        let desired = DesiredPod::build(&unit, &BuildOptions::default()).expect("pod should build");
        assert_eq!(desired.name(), Some("web-abcdef12"));
        assert_eq!(desired.pull_secrets.len(), 1);
        assert_eq!(
            desired.pull_secrets[0].metadata.name,
            spec(&desired.pod).image_pull_secrets.as_ref().map(|refs| refs[0].name.clone())
        );
    }

    #[test]
    fn test_unit_without_containers() {
        let unit = DeploymentUnit { id: "abc".to_string(), ..DeploymentUnit::default() };
        assert!(matches!(
            build_pod(&unit, &BuildOptions::default()),
            Err(Error::NoContainers { .. })
        ));
    }
}
