use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use snafu::ResultExt;
use tokio::io::AsyncWriteExt;
use unitsync_core::DesiredPod;

use crate::{
    cli::{
        error::{self, Error},
        unit_file,
    },
    config::Config,
};

#[derive(Args, Clone)]
pub struct RenderCommand {
    #[arg(required = true, help = "Deployment unit files (YAML or JSON) to render.")]
    pub files: Vec<PathBuf>,
}

impl RenderCommand {
    pub async fn run(self, config: Config) -> Result<(), Error> {
        let units = unit_file::load_units(&self.files).await?;
        let desired = unit_file::build_all(&units, &config.build_options())?;

        let manifests = render_manifests(&desired, &config.pod_namespace)?;
        let mut stdout = tokio::io::stdout();
        stdout.write_all(manifests.as_bytes()).await.context(error::WriteStdoutSnafu)?;
        stdout.flush().await.context(error::WriteStdoutSnafu)
    }
}

/// Multi-document YAML with the pull secrets of each unit before its pod.
///
/// Every object is placed in `namespace`, where `sync` would create it.
fn render_manifests(desired: &[DesiredPod], namespace: &str) -> Result<String, Error> {
    let mut documents = Vec::new();
    for DesiredPod { pod, pull_secrets } in desired {
        for secret in pull_secrets {
            let mut secret = secret.clone();
            secret.metadata.namespace = Some(namespace.to_string());
            documents.push(to_document(&secret)?);
        }
        let mut pod = pod.clone();
        pod.metadata.namespace = Some(namespace.to_string());
        documents.push(to_document(&pod)?);
    }
    Ok(documents.concat())
}

fn to_document<T: Serialize>(object: &T) -> Result<String, Error> {
    serde_yaml::to_string(object)
        .map(|yaml| format!("---\n{yaml}"))
        .context(error::SerializeManifestSnafu)
}
