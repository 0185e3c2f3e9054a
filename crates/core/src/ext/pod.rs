use k8s_openapi::{Metadata, api::core::v1::Pod};
use unitsync_base::consts::k8s::labels;

pub trait PodExt {
    /// Value of the revision label, if any.
    fn revision(&self) -> Option<&str>;

    /// Value of the deployment unit label, if any.
    fn deployment_unit_id(&self) -> Option<&str>;

    /// Whether the pod has been assigned to a node.
    fn is_scheduled(&self) -> bool;

    /// Whether the pod reports container statuses and every one of them is
    /// ready.
    ///
    /// An empty status list is not ready: it means the kubelet has not
    /// reported yet, not that there is nothing to wait for.
    fn all_containers_ready(&self) -> bool;

    /// Whether deletion of the pod has been requested.
    fn is_terminating(&self) -> bool;
}

impl PodExt for Pod {
    fn revision(&self) -> Option<&str> { label(self, labels::REVISION) }

    fn deployment_unit_id(&self) -> Option<&str> { label(self, labels::DEPLOYMENT_UUID) }

    fn is_scheduled(&self) -> bool {
        self.spec.as_ref().and_then(|spec| spec.node_name.as_deref()).is_some_and(|n| !n.is_empty())
    }

    fn all_containers_ready(&self) -> bool {
        match self.status.as_ref().and_then(|status| status.container_statuses.as_deref()) {
            Some(statuses) if !statuses.is_empty() => statuses.iter().all(|status| status.ready),
            _ => false,
        }
    }

    fn is_terminating(&self) -> bool { self.metadata().deletion_timestamp.is_some() }
}

fn label<'a>(pod: &'a Pod, key: &str) -> Option<&'a str> {
    pod.metadata().labels.as_ref().and_then(|labels| labels.get(key)).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use k8s_openapi::{
        api::core::v1::{ContainerStatus, PodSpec, PodStatus},
        apimachinery::pkg::apis::meta::v1::ObjectMeta,
    };

    use super::*;

    fn status(ready: &[bool]) -> PodStatus {
        PodStatus {
            container_statuses: Some(
                ready
                    .iter()
                    .map(|&ready| ContainerStatus { ready, ..ContainerStatus::default() })
                    .collect(),
            ),
            ..PodStatus::default()
        }
    }

    #[test]
    fn test_labels() {
        let pod = Pod {
            metadata: ObjectMeta {
                labels: Some(
                    [(labels::REVISION.to_string(), "7".to_string())].into_iter().collect(),
                ),
                ..ObjectMeta::default()
            },
            ..Pod::default()
        };
        assert_eq!(pod.revision(), Some("7"));
        assert_eq!(pod.deployment_unit_id(), None);
        assert_eq!(Pod::default().revision(), None);
    }

    #[test]
    fn test_is_scheduled() {
        let mut pod = Pod::default();
        assert!(!pod.is_scheduled());

        pod.spec = Some(PodSpec { node_name: Some(String::new()), ..PodSpec::default() });
        assert!(!pod.is_scheduled());

        pod.spec = Some(PodSpec { node_name: Some("node-1".to_string()), ..PodSpec::default() });
        assert!(pod.is_scheduled());
    }

    #[test]
    fn test_all_containers_ready() {
        let mut pod = Pod::default();
        assert!(!pod.all_containers_ready());

        pod.status = Some(status(&[]));
        assert!(!pod.all_containers_ready());

        pod.status = Some(status(&[true, false]));
        assert!(!pod.all_containers_ready());

        pod.status = Some(status(&[true, true]));
        assert!(pod.all_containers_ready());
    }

    #[test]
    fn test_is_terminating() {
        let mut pod = Pod::default();
        assert!(!pod.is_terminating());

        pod.metadata.deletion_timestamp =
            Some(serde_json::from_str("\"2026-01-01T00:00:00Z\"").expect("valid timestamp"));
        assert!(pod.is_terminating());
    }
}
