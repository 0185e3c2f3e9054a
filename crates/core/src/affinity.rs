//! Placement rules derived from scheduling labels.
//!
//! Eight labels are recognized: {hard, soft} x {affinity, anti-affinity} x
//! {node, pod}. Every `key=value` pair of a label becomes one requirement;
//! all requirements of the same strength and scope are ANDed in a single term.
//! Pod-level keys and values are hashed because pod labels are written hashed
//! by the pod builder.

use k8s_openapi::{
    api::core::v1::{
        Affinity, NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm,
        PodAffinity, PodAffinityTerm, PreferredSchedulingTerm, WeightedPodAffinityTerm,
    },
    apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement},
};
use unitsync_base::consts::{HOSTNAME_TOPOLOGY_KEY, container_labels};

use crate::{labels::LabelSet, naming, unit::Container};

/// Weight of every preferred term.
pub const PREFERRED_WEIGHT: i32 = 100;

const GLOBAL_VALUE: &str = "true";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Matched against node labels.
    Node,
    /// Matched against labels of pods in the same namespace on the same host.
    Pod,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strength {
    Hard,
    Soft,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Polarity {
    Affinity,
    AntiAffinity,
}

impl Polarity {
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Affinity => "In",
            Self::AntiAffinity => "NotIn",
        }
    }
}

/// A container label key that encodes placement constraints.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConstraintLabel {
    pub key: &'static str,
    pub scope: Scope,
    pub strength: Strength,
    pub polarity: Polarity,
}

impl ConstraintLabel {
    const fn new(key: &'static str, scope: Scope, strength: Strength, polarity: Polarity) -> Self {
        Self { key, scope, strength, polarity }
    }
}

pub const CONSTRAINT_LABELS: [ConstraintLabel; 8] = [
    ConstraintLabel::new(
        container_labels::HOST_AFFINITY,
        Scope::Node,
        Strength::Hard,
        Polarity::Affinity,
    ),
    ConstraintLabel::new(
        container_labels::HOST_ANTI_AFFINITY,
        Scope::Node,
        Strength::Hard,
        Polarity::AntiAffinity,
    ),
    ConstraintLabel::new(
        container_labels::HOST_SOFT_AFFINITY,
        Scope::Node,
        Strength::Soft,
        Polarity::Affinity,
    ),
    ConstraintLabel::new(
        container_labels::HOST_SOFT_ANTI_AFFINITY,
        Scope::Node,
        Strength::Soft,
        Polarity::AntiAffinity,
    ),
    ConstraintLabel::new(
        container_labels::CONTAINER_AFFINITY,
        Scope::Pod,
        Strength::Hard,
        Polarity::Affinity,
    ),
    ConstraintLabel::new(
        container_labels::CONTAINER_ANTI_AFFINITY,
        Scope::Pod,
        Strength::Hard,
        Polarity::AntiAffinity,
    ),
    ConstraintLabel::new(
        container_labels::CONTAINER_SOFT_AFFINITY,
        Scope::Pod,
        Strength::Soft,
        Polarity::Affinity,
    ),
    ConstraintLabel::new(
        container_labels::CONTAINER_SOFT_ANTI_AFFINITY,
        Scope::Pod,
        Strength::Soft,
        Polarity::AntiAffinity,
    ),
];

#[derive(Default)]
struct Requirements {
    hard_node: Vec<NodeSelectorRequirement>,
    soft_node: Vec<NodeSelectorRequirement>,
    hard_pod: Vec<LabelSelectorRequirement>,
    soft_pod: Vec<LabelSelectorRequirement>,
}

impl Requirements {
    fn add(&mut self, label: ConstraintLabel, pairs: LabelSet) {
        let operator = label.polarity.operator();
        match label.scope {
            Scope::Node => {
                let requirements = pairs.into_iter().map(|(key, value)| NodeSelectorRequirement {
                    key,
                    operator: operator.to_string(),
                    values: Some(vec![value]),
                    ..NodeSelectorRequirement::default()
                });
                match label.strength {
                    Strength::Hard => self.hard_node.extend(requirements),
                    Strength::Soft => self.soft_node.extend(requirements),
                }
            }
            Scope::Pod => {
                let requirements = pairs.into_iter().map(|(key, value)| LabelSelectorRequirement {
                    key: naming::derive_name(&key),
                    operator: operator.to_string(),
                    values: Some(vec![naming::derive_name(&value)]),
                    ..LabelSelectorRequirement::default()
                });
                match label.strength {
                    Strength::Hard => self.hard_pod.extend(requirements),
                    Strength::Soft => self.soft_pod.extend(requirements),
                }
            }
        }
    }

    fn into_affinity(self, namespace: &str) -> Option<Affinity> {
        let Self { hard_node, soft_node, hard_pod, soft_pod } = self;

        let node_affinity = (!hard_node.is_empty() || !soft_node.is_empty()).then(|| NodeAffinity {
            required_during_scheduling_ignored_during_execution: (!hard_node.is_empty()).then(
                || NodeSelector { node_selector_terms: vec![node_selector_term(hard_node)] },
            ),
            preferred_during_scheduling_ignored_during_execution: (!soft_node.is_empty()).then(
                || {
                    vec![PreferredSchedulingTerm {
                        preference: node_selector_term(soft_node),
                        weight: PREFERRED_WEIGHT,
                    }]
                },
            ),
        });

        let pod_affinity = (!hard_pod.is_empty() || !soft_pod.is_empty()).then(|| PodAffinity {
            required_during_scheduling_ignored_during_execution: (!hard_pod.is_empty())
                .then(|| vec![pod_affinity_term(hard_pod, namespace)]),
            preferred_during_scheduling_ignored_during_execution: (!soft_pod.is_empty()).then(
                || {
                    vec![WeightedPodAffinityTerm {
                        pod_affinity_term: pod_affinity_term(soft_pod, namespace),
                        weight: PREFERRED_WEIGHT,
                    }]
                },
            ),
        });

        (node_affinity.is_some() || pod_affinity.is_some()).then(|| Affinity {
            node_affinity,
            pod_affinity,
            ..Affinity::default()
        })
    }
}

fn node_selector_term(requirements: Vec<NodeSelectorRequirement>) -> NodeSelectorTerm {
    NodeSelectorTerm { match_expressions: Some(requirements), ..NodeSelectorTerm::default() }
}

fn pod_affinity_term(
    requirements: Vec<LabelSelectorRequirement>,
    namespace: &str,
) -> PodAffinityTerm {
    PodAffinityTerm {
        label_selector: Some(LabelSelector {
            match_expressions: Some(requirements),
            ..LabelSelector::default()
        }),
        // Only pods of the deployment unit's own namespace are matched.
        namespaces: (!namespace.is_empty()).then(|| vec![namespace.to_string()]),
        topology_key: HOSTNAME_TOPOLOGY_KEY.to_string(),
        ..PodAffinityTerm::default()
    }
}

/// Whether the container runs on every host regardless of constraints.
#[must_use]
pub fn is_global(container: &Container) -> bool {
    container.labels.get(container_labels::GLOBAL).is_some_and(|value| value == GLOBAL_VALUE)
}

/// Builds the affinity of a pod from the scheduling labels of `container`.
///
/// Returns `None` for global containers and when no label yields a
/// requirement.
#[must_use]
pub fn build_affinity(container: &Container, namespace: &str) -> Option<Affinity> {
    if is_global(container) {
        return None;
    }

    let mut requirements = Requirements::default();
    for label in CONSTRAINT_LABELS {
        if let Some(value) = container.labels.get(label.key) {
            requirements.add(label, LabelSet::parse(value));
        }
    }
    requirements.into_affinity(namespace)
}
