use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::{
    Api, Client,
    api::{DeleteParams, PostParams},
    runtime::reflector::{ObjectRef, Store},
};

use super::{ClientError, ClusterClient, Operation, PodCache};

/// [`PodCache`] over a reflector store of the lifecycle namespace.
#[derive(Clone)]
pub struct WatchCache {
    store: Store<Pod>,
    namespace: String,
}

impl WatchCache {
    pub fn new(store: Store<Pod>, namespace: impl Into<String>) -> Self {
        Self { store, namespace: namespace.into() }
    }
}

impl PodCache for WatchCache {
    fn get_pod(&self, name: &str) -> Option<Pod> {
        self.store
            .get(&ObjectRef::new(name).within(&self.namespace))
            .map(|pod| Pod::clone(&pod))
    }
}

/// [`ClusterClient`] issuing requests in a single namespace.
///
/// Objects are always created in that namespace, whatever namespace their
/// metadata names.
#[derive(Clone)]
pub struct KubeClusterClient {
    pods: Api<Pod>,
    secrets: Api<Secret>,
    namespace: String,
}

impl KubeClusterClient {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            pods: Api::namespaced(client.clone(), &namespace),
            secrets: Api::namespaced(client, &namespace),
            namespace,
        }
    }
}

impl ClusterClient for KubeClusterClient {
    async fn create_pod(&self, pod: &Pod) -> Result<(), ClientError> {
        let mut pod = pod.clone();
        pod.metadata.namespace = Some(self.namespace.clone());
        let name = pod.metadata.name.clone().unwrap_or_default();

        let _unused = self
            .pods
            .create(&PostParams::default(), &pod)
            .await
            .map_err(|err| ClientError::from_kube(Operation::CreatePod, &name, err))?;
        Ok(())
    }

    async fn delete_pod(&self, name: &str) -> Result<(), ClientError> {
        let _unused = self
            .pods
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|err| ClientError::from_kube(Operation::DeletePod, name, err))?;
        Ok(())
    }

    async fn ensure_secret(&self, secret: &Secret) -> Result<(), ClientError> {
        let mut secret = secret.clone();
        secret.metadata.namespace = Some(self.namespace.clone());
        let name = secret.metadata.name.clone().unwrap_or_default();

        match self.secrets.create(&PostParams::default(), &secret).await {
            Ok(_) => {
                tracing::info!("Created secret {name} in namespace {}", self.namespace);
                Ok(())
            }
            Err(kube::Error::Api(response)) if response.code == 409 => {
                tracing::debug!("Secret {name} already exists in namespace {}", self.namespace);
                Ok(())
            }
            Err(err) => Err(ClientError::from_kube(Operation::EnsureSecret, &name, err)),
        }
    }
}
