//! Drives the cluster towards a [`DesiredPod`] and waits until it is ready.
//!
//! [`Reconciler::step`] performs one observe/act pass against the cluster.
//! [`Reconciler::run`] repeats it until the pod is ready, bounded by a
//! timeout and a [`CancellationToken`].

mod cluster;
mod error;

use std::{fmt, time::Duration};

use k8s_openapi::api::core::v1::{Pod, Secret};
use snafu::OptionExt;
use tokio::{
    sync::Semaphore,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

pub use self::{
    cluster::{KubeClusterClient, WatchCache},
    error::{ClientError, Error, Operation},
};
use crate::{ext::PodExt, pod::DesiredPod};

/// Read access to the observed pods of the lifecycle namespace.
pub trait PodCache {
    fn get_pod(&self, name: &str) -> Option<Pod>;
}

/// Mutations issued against the cluster.
pub trait ClusterClient {
    async fn create_pod(&self, pod: &Pod) -> Result<(), ClientError>;

    async fn delete_pod(&self, name: &str) -> Result<(), ClientError>;

    /// Creates `secret` unless a secret with the same name exists.
    async fn ensure_secret(&self, secret: &Secret) -> Result<(), ClientError>;
}

/// [`ClusterClient`] that caps the number of mutations in flight.
///
/// Only the requests are limited; a pod waiting for readiness holds no permit.
pub struct Throttled<K> {
    inner: K,
    permits: Semaphore,
}

impl<K> Throttled<K> {
    pub fn new(inner: K, limit: usize) -> Self { Self { inner, permits: Semaphore::new(limit.max(1)) } }
}

impl<K> ClusterClient for Throttled<K>
where
    K: ClusterClient,
{
    async fn create_pod(&self, pod: &Pod) -> Result<(), ClientError> {
        let _permit = self.permits.acquire().await.ok();
        self.inner.create_pod(pod).await
    }

    async fn delete_pod(&self, name: &str) -> Result<(), ClientError> {
        let _permit = self.permits.acquire().await.ok();
        self.inner.delete_pod(name).await
    }

    async fn ensure_secret(&self, secret: &Secret) -> Result<(), ClientError> {
        let _permit = self.permits.acquire().await.ok();
        self.inner.ensure_secret(secret).await
    }
}

/// Where a pod stands in its way to readiness.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReconcileState {
    Absent,
    StaleRevision,
    Creating,
    AwaitingSchedule,
    AwaitingReady,
    Ready,
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Absent => "absent",
            Self::StaleRevision => "stale revision",
            Self::Creating => "creating",
            Self::AwaitingSchedule => "awaiting schedule",
            Self::AwaitingReady => "awaiting ready",
            Self::Ready => "ready",
        })
    }
}

/// Result of one reconciliation pass.
#[derive(Debug)]
pub enum Outcome {
    /// Every container of the observed pod is ready.
    Ready(Box<Pod>),

    /// Another pass is needed.
    Pending(ReconcileState),

    /// The cluster rejected an operation permanently.
    Failed(Box<ClientError>),
}

/// Result of one pod reconciled by [`Reconciler::run_all`].
#[derive(Debug)]
pub struct RunReport {
    pub result: Result<Pod, Error>,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReconcilerConfig {
    pub poll_interval: Duration,
    pub ready_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(1), ready_timeout: Duration::from_secs(300) }
    }
}

/// Classifies the observed pod against `desired`.
#[must_use]
pub fn classify(desired: &Pod, observed: Option<&Pod>) -> ReconcileState {
    let Some(observed) = observed else {
        return ReconcileState::Absent;
    };
    // An observed pod without a revision is left alone.
    if observed.revision().is_some_and(|revision| Some(revision) != desired.revision()) {
        ReconcileState::StaleRevision
    } else if !observed.is_scheduled() {
        ReconcileState::AwaitingSchedule
    } else if !observed.all_containers_ready() {
        ReconcileState::AwaitingReady
    } else {
        ReconcileState::Ready
    }
}

pub struct Reconciler<C, K> {
    cache: C,
    client: K,
    config: ReconcilerConfig,
}

impl<C, K> Reconciler<C, K>
where
    C: PodCache,
    K: ClusterClient,
{
    pub const fn new(cache: C, client: K, config: ReconcilerConfig) -> Self {
        Self { cache, client, config }
    }

    /// Observes the pod once and issues at most one pod operation.
    ///
    /// A stale pod is only deleted here; it is created again by a later
    /// pass once the deletion has been observed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPodName`] if the desired pod has no name.
    pub async fn step(&self, desired: &DesiredPod) -> Result<Outcome, Error> {
        let pod_name = desired.name().context(error::MissingPodNameSnafu)?;
        let observed = self.cache.get_pod(pod_name);

        match classify(&desired.pod, observed.as_ref()) {
            ReconcileState::Absent => {
                for secret in &desired.pull_secrets {
                    if let Err(err) = self.client.ensure_secret(secret).await {
                        return Ok(Self::failure(ReconcileState::Absent, err));
                    }
                }
                tracing::info!("Creating pod {pod_name}");
                Ok(match self.client.create_pod(&desired.pod).await {
                    Ok(()) => Outcome::Pending(ReconcileState::Creating),
                    Err(err) => Self::failure(ReconcileState::Creating, err),
                })
            }
            ReconcileState::StaleRevision => {
                if observed.as_ref().is_some_and(PodExt::is_terminating) {
                    tracing::debug!("Pod {pod_name} with stale revision is terminating");
                    return Ok(Outcome::Pending(ReconcileState::StaleRevision));
                }
                tracing::info!("Deleting pod {pod_name} with stale revision");
                Ok(match self.client.delete_pod(pod_name).await {
                    Ok(()) => Outcome::Pending(ReconcileState::StaleRevision),
                    Err(err) => Self::failure(ReconcileState::StaleRevision, err),
                })
            }
            ReconcileState::Ready => Ok(observed
                .map_or(Outcome::Pending(ReconcileState::Absent), |pod| Outcome::Ready(Box::new(pod)))),
            state => Ok(Outcome::Pending(state)),
        }
    }

    /// Repeats [`Self::step`] until the pod is ready.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the pod is not ready within the
    /// configured timeout, [`Error::Cancelled`] when `cancel` fires first and
    /// [`Error::Rejected`] when the cluster rejects an operation permanently.
    pub async fn run(&self, desired: &DesiredPod, cancel: CancellationToken) -> Result<Pod, Error> {
        let pod_name = desired.name().context(error::MissingPodNameSnafu)?.to_string();
        let ReconcilerConfig { poll_interval, ready_timeout } = self.config;

        let mut deadline = std::pin::pin!(tokio::time::sleep(ready_timeout));
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return error::CancelledSnafu { pod_name }.fail(),
                () = &mut deadline => {
                    return error::TimeoutSnafu { pod_name, timeout: ready_timeout }.fail();
                }
                outcome = async {
                    let _unused = interval.tick().await;
                    self.step(desired).await
                } => outcome?,
            };

            match outcome {
                Outcome::Ready(pod) => {
                    tracing::info!("Pod {pod_name} is ready");
                    return Ok(*pod);
                }
                Outcome::Pending(state) => tracing::debug!("Waiting for pod {pod_name}: {state}"),
                Outcome::Failed(source) => {
                    return Err(Error::Rejected { pod_name, source });
                }
            }
        }
    }

    /// Runs every pod of `desired` at the same time, so one pod waiting for
    /// readiness never holds back another. Reports keep the input order.
    pub async fn run_all(&self, desired: &[DesiredPod], cancel: &CancellationToken) -> Vec<RunReport> {
        futures::future::join_all(desired.iter().map(|desired| async move {
            let started = Instant::now();
            let result = self.run(desired, cancel.clone()).await;
            RunReport { result, elapsed: started.elapsed() }
        }))
        .await
    }

    fn failure(state: ReconcileState, err: ClientError) -> Outcome {
        if err.is_retryable() {
            tracing::warn!("{err}, retrying");
            Outcome::Pending(state)
        } else {
            tracing::error!("{err}");
            Outcome::Failed(Box::new(err))
        }
    }
}
