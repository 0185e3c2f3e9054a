use k8s_openapi::api::core::v1::Pod;
use kube::api::ObjectList;
use unitsync_core::ext::PodExt;

/// Table rendering of pods managed by unitsync.
pub trait PodListExt {
    /// Columns: NAME, UNIT, REVISION, NAMESPACE, NODE, READY, STATUS.
    fn render_table(&self) -> String;
}

impl PodListExt for ObjectList<Pod> {
    fn render_table(&self) -> String { render_pods(&self.items) }
}

fn render_pods(pods: &[Pod]) -> String {
    let rows = pods.iter().map(pod_column).collect::<Vec<_>>();
    super::new_table()
        .set_header(vec!["NAME", "UNIT", "REVISION", "NAMESPACE", "NODE", "READY", "STATUS"])
        .add_rows(rows)
        .to_string()
}

fn pod_column(pod: &Pod) -> [String; 7] {
    [
        pod.metadata.name.clone().unwrap_or_default(),
        pod.deployment_unit_id().unwrap_or_default().to_string(),
        pod.revision().unwrap_or_default().to_string(),
        pod.metadata.namespace.clone().unwrap_or_default(),
        pod.spec.as_ref().and_then(|s| s.node_name.clone()).unwrap_or_default(),
        ready_column(pod),
        pod.status.as_ref().and_then(|s| s.phase.clone()).unwrap_or_else(|| "Unknown".to_string()),
    ]
}

/// `<ready>/<total>` over container statuses.
fn ready_column(pod: &Pod) -> String {
    let statuses =
        pod.status.as_ref().and_then(|s| s.container_statuses.as_deref()).unwrap_or_default();
    let ready = statuses.iter().filter(|status| status.ready).count();
    format!("{ready}/{}", statuses.len())
}
