//! The deployment unit: the workload descriptor a pod is built from.

use std::{collections::BTreeMap, ops::Deref};

use serde::Deserialize;
use serde_json::Value;

/// A set of containers that is scheduled together as one pod.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentUnit {
    #[serde(rename = "deploymentUnitUuid")]
    pub id: String,

    #[serde(default)]
    pub revision: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub node_name: String,

    /// The first container is the primary container.
    #[serde(default)]
    pub containers: Vec<Container>,

    #[serde(default)]
    pub networks: Vec<Network>,

    #[serde(default)]
    pub registry_credentials: Vec<RegistryCredential>,
}

impl DeploymentUnit {
    /// The container that names the pod and carries its placement rules.
    #[must_use]
    pub fn primary(&self) -> Option<&Container> { self.containers.first() }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub entry_point: Vec<String>,

    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default)]
    pub tty: bool,

    #[serde(default)]
    pub stdin_open: bool,

    #[serde(default)]
    pub working_dir: String,

    #[serde(default)]
    pub environment: StringMap,

    #[serde(default)]
    pub labels: StringMap,

    #[serde(default)]
    pub cap_add: Vec<String>,

    #[serde(default)]
    pub cap_drop: Vec<String>,

    #[serde(default)]
    pub privileged: bool,

    #[serde(default)]
    pub read_only: bool,

    /// `hostname:ip` entries.
    #[serde(default)]
    pub extra_hosts: Vec<String>,

    /// Memory limit in bytes, `0` when unset.
    #[serde(default)]
    pub memory: i64,

    /// Memory request in bytes, `0` when unset.
    #[serde(default)]
    pub memory_reservation: i64,

    /// CPU request in milli-cores, `0` when unset.
    #[serde(default)]
    pub milli_cpu_reservation: i64,

    /// `hostPort:containerPort/proto` entries.
    #[serde(default)]
    pub ports: Vec<String>,

    /// `/host/path:/container/path[:mode]` entries.
    #[serde(default)]
    pub data_volumes: Vec<String>,

    /// Mount point to mount options. Only the mount points are used.
    #[serde(default)]
    pub tmpfs: BTreeMap<String, String>,

    #[serde(default)]
    pub ipc_mode: String,

    #[serde(default)]
    pub pid_mode: String,

    #[serde(default)]
    pub primary_network_id: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,

    #[serde(default)]
    pub kind: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryCredential {
    #[serde(default)]
    pub public_value: String,

    #[serde(default)]
    pub secret_value: String,
}

/// String-keyed map whose values are rendered as text.
///
/// Descriptors carry labels and environment values as arbitrary JSON scalars;
/// numbers and booleans are kept in their textual form, `null` becomes empty.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct StringMap(BTreeMap<String, String>);

impl Deref for StringMap {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl From<BTreeMap<String, Value>> for StringMap {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        Self(
            raw.into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(text) => text,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (key, value)
                })
                .collect(),
        )
    }
}

impl<K, V> FromIterator<(K, V)> for StringMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}
