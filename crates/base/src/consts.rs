//! Label and annotation keys shared by the builder, the reconciler and the
//! CLI.

/// Name of the platform sidecar that is always the first container of a pod.
pub const PAUSE_CONTAINER_NAME: &str = "rancher-pause";

/// Image of the platform sidecar unless overridden by configuration.
pub const DEFAULT_PAUSE_IMAGE: &str = "gcr.io/google_containers/pause-amd64:3.0";

/// Registry URL used to name pull secrets unless overridden by configuration.
pub const DEFAULT_REGISTRY: &str = "https://index.docker.io/v1/";

/// Namespace in which pods are created and deleted.
pub const DEFAULT_POD_NAMESPACE: &str = "default";

/// Topology key that scopes pod-level constraints to a single host.
pub const HOSTNAME_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";

/// Network kind that puts a pod into the host network namespace.
pub const HOST_NETWORK_KIND: &str = "host";

/// IPC and PID mode value that shares the host namespace.
pub const HOST_NAMESPACE_MODE: &str = "host";

pub mod k8s {
    pub mod labels {
        //! Pod labels written by unitsync.

        /// Revision of the deployment unit the pod was built from.
        pub const REVISION: &str = "io.rancher.revision";

        /// Identifier of the deployment unit the pod was built from.
        pub const DEPLOYMENT_UUID: &str = "io.rancher.deployment.uuid";
    }

    pub mod annotations {
        //! Pod annotations written by unitsync.

        /// Lowercased name of the primary container.
        pub const PRIMARY_CONTAINER_NAME: &str = "io.rancher.container.primary";
    }

    pub mod secrets {
        /// Type of the registry pull secrets.
        pub const DOCKER_CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";

        /// Data key of the registry pull secrets.
        pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";
    }
}

pub mod container_labels {
    //! Container label keys understood by the pod builder.

    /// Labels carrying this prefix are copied onto the pod as annotations.
    pub const RANCHER_PREFIX: &str = "io.rancher";

    /// Labels carrying this prefix have `:` rewritten to `.` in annotation keys.
    pub const SCHEDULER_PREFIX: &str = "io.rancher.scheduler";

    /// Set to `true` on workloads that run everywhere and ignore constraints.
    pub const GLOBAL: &str = "io.rancher.scheduler.global";

    pub const HOST_AFFINITY: &str = "io.rancher.scheduler.affinity:host_label";
    pub const HOST_ANTI_AFFINITY: &str = "io.rancher.scheduler.affinity:host_label_ne";
    pub const HOST_SOFT_AFFINITY: &str = "io.rancher.scheduler.affinity:host_label_soft";
    pub const HOST_SOFT_ANTI_AFFINITY: &str = "io.rancher.scheduler.affinity:host_label_soft_ne";

    pub const CONTAINER_AFFINITY: &str = "io.rancher.scheduler.affinity:container_label";
    pub const CONTAINER_ANTI_AFFINITY: &str = "io.rancher.scheduler.affinity:container_label_ne";
    pub const CONTAINER_SOFT_AFFINITY: &str = "io.rancher.scheduler.affinity:container_label_soft";
    pub const CONTAINER_SOFT_ANTI_AFFINITY: &str =
        "io.rancher.scheduler.affinity:container_label_soft_ne";
}
