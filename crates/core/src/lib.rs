//! Translation of deployment units into Kubernetes pods and reconciliation
//! of those pods against a cluster.

pub mod affinity;
pub mod ext;
pub mod labels;
pub mod naming;
pub mod pod;
pub mod reconcile;
pub mod translate;
pub mod unit;

pub use self::{
    pod::{BuildOptions, DesiredPod, build_pod},
    reconcile::{Reconciler, ReconcilerConfig},
    unit::DeploymentUnit,
};
