use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("Failed to write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("Failed to initialize Kubernetes client configuration, error: {source}"))]
    KubeConfig { source: kube::Error },

    #[snafu(display("Failed to create tokio runtime, error: {source}"))]
    InitializeTokioRuntime { source: std::io::Error },

    #[snafu(display("Failed to read deployment unit from {}, error: {source}", file_path.display()))]
    ReadUnitFile { file_path: PathBuf, source: std::io::Error },

    #[snafu(display(
        "Failed to parse deployment unit JSON from {}, error: {source}",
        file_path.display()
    ))]
    ParseUnitJson { file_path: PathBuf, source: serde_json::Error },

    #[snafu(display(
        "Failed to parse deployment unit YAML from {}, error: {source}",
        file_path.display()
    ))]
    ParseUnitYaml { file_path: PathBuf, source: serde_yaml::Error },

    #[snafu(display("Failed to build pod of deployment unit {unit_id}, error: {source}"))]
    BuildPod { unit_id: String, source: unitsync_core::pod::Error },

    #[snafu(display("Failed to serialize manifest, error: {source}"))]
    SerializeManifest { source: serde_yaml::Error },

    #[snafu(display("Failed to list pods, error: {source}"))]
    ListPods {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to list pods in namespace {namespace}, error: {source}"))]
    ListPodsWithNamespace {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Pod watch stopped before its cache was populated"))]
    WatchPods { source: kube::runtime::reflector::store::WriterDropped },

    #[snafu(display("Operation has been cancelled"))]
    Cancelled,

    #[snafu(display("{failed} of {total} deployment units failed to sync"))]
    SyncFailed { failed: usize, total: usize },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}
