//! Extensions to Kubernetes API types.
//!
//! Read-only helpers over `k8s_openapi` objects observed in the cluster.

mod pod;

pub use self::pod::PodExt;
