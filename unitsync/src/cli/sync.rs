use std::{path::PathBuf, time::Duration};

use clap::Args;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    Api,
    runtime::{WatchStreamExt, reflector, watcher},
};
use snafu::ResultExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use unitsync_base::consts::k8s::labels;
use unitsync_core::{
    Reconciler,
    reconcile::{KubeClusterClient, RunReport, Throttled, WatchCache},
};

use crate::{
    cli::{
        error::{self, Error},
        unit_file,
    },
    config::Config,
    ui::table::{SyncRecord, SyncRecordsExt},
};

#[derive(Args, Clone)]
pub struct SyncCommand {
    #[arg(required = true, help = "Deployment unit files (YAML or JSON) to sync.")]
    pub files: Vec<PathBuf>,

    #[arg(
        short = 't',
        long = "timeout-seconds",
        help = "The maximum time in seconds to wait for each pod to become ready. Defaults to \
                reconcile.readyTimeoutSeconds of the configuration."
    )]
    pub timeout_secs: Option<u64>,

    #[arg(
        short = 'j',
        long = "concurrency",
        help = "Maximum number of cluster requests in flight. Every deployment unit is \
                reconciled at the same time. Defaults to reconcile.concurrency of the \
                configuration."
    )]
    pub concurrency: Option<usize>,
}

impl SyncCommand {
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let Self { files, timeout_secs, concurrency } = self;

        let units = unit_file::load_units(&files).await?;
        let desired = unit_file::build_all(&units, &config.build_options())?;

        let namespace = config.pod_namespace.clone();
        let mut reconciler_config = config.reconciler_config();
        if let Some(timeout_secs) = timeout_secs {
            reconciler_config.ready_timeout = Duration::from_secs(timeout_secs);
        }
        let concurrency = concurrency.unwrap_or(config.reconcile.concurrency).max(1);

        let cancel = CancellationToken::new();
        let ctrl_c_handle = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

        let (store, writer) = reflector::store();
        let watch = reflector(
            writer,
            watcher(
                Api::<Pod>::namespaced(kube_client.clone(), &namespace),
                watcher::Config::default().labels(labels::DEPLOYMENT_UUID),
            ),
        )
        .default_backoff()
        .applied_objects()
        .for_each(|event| {
            if let Err(err) = event {
                tracing::warn!("Error watching pods, error: {err}");
            }
            futures::future::ready(())
        });
        let watch_handle = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    () = cancel.cancelled() => {},
                    () = watch => tracing::warn!("Pod watch ended"),
                }
            }
        });

        tracing::info!("Waiting for pod cache of namespace {namespace}");
        tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            result = store.wait_until_ready() => result.context(error::WatchPodsSnafu)?,
        }

        let reconciler = Reconciler::new(
            WatchCache::new(store, &namespace),
            Throttled::new(KubeClusterClient::new(kube_client, &namespace), concurrency),
            reconciler_config,
        );
        let reports = reconciler.run_all(&desired, &cancel).await;
        let records = units
            .iter()
            .zip(&desired)
            .zip(reports)
            .map(|((unit, desired), report)| {
                sync_record(&unit.id, desired.name().unwrap_or_default(), report)
            })
            .collect::<Vec<_>>();

        cancel.cancel();
        ctrl_c_handle.abort();
        let _unused = watch_handle.await;

        let table = records.render_table();
        let mut stdout = tokio::io::stdout();
        stdout.write_all(table.as_bytes()).await.context(error::WriteStdoutSnafu)?;
        stdout.write_u8(b'\n').await.context(error::WriteStdoutSnafu)?;

        let failed = records.iter().filter(|record| !record.is_ready()).count();
        if failed == 0 {
            Ok(())
        } else {
            error::SyncFailedSnafu { failed, total: records.len() }.fail()
        }
    }
}

fn sync_record(unit_id: &str, pod_name: &str, report: RunReport) -> SyncRecord {
    let RunReport { result, elapsed } = report;
    let unit_id = unit_id.to_string();
    let pod_name = pod_name.to_string();

    match result {
        Ok(pod) => SyncRecord {
            unit_id,
            pod_name,
            node_name: pod.spec.and_then(|spec| spec.node_name),
            elapsed,
            error: None,
        },
        Err(err) => {
            tracing::warn!("Deployment unit {unit_id} did not sync, error: {err}");
            SyncRecord { unit_id, pod_name, node_name: None, elapsed, error: Some(err.to_string()) }
        }
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C, cancelling");
            cancel.cancel();
        }
        Err(err) => tracing::warn!("Failed to listen for Ctrl+C, error: {err}"),
    }
}
