use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::ResourceRequirements, apimachinery::pkg::api::resource::Quantity,
};

use super::{Translated, error::NegativeQuantitySnafu, quantity::parse_quantity};
use crate::unit::Container;

const MEMORY: &str = "memory";
const CPU: &str = "cpu";

/// Memory and CPU settings of one container, each translated on its own.
///
/// There is no CPU limit: descriptors only carry a CPU reservation.
#[derive(Clone, Debug, PartialEq)]
pub struct Resources {
    pub memory_limit: Translated<Quantity>,
    pub memory_request: Translated<Quantity>,
    pub cpu_request: Translated<Quantity>,
}

impl Resources {
    #[must_use]
    pub fn from_container(container: &Container) -> Self {
        Self {
            memory_limit: translate(container.memory, |bytes| bytes.to_string()),
            memory_request: translate(container.memory_reservation, |bytes| bytes.to_string()),
            cpu_request: translate(container.milli_cpu_reservation, |millis| format!("{millis}m")),
        }
    }

    /// Builds the container's resource requirements, or `None` when neither
    /// limits nor requests remain.
    #[must_use]
    pub fn into_requirements(self) -> Option<ResourceRequirements> {
        let Self { memory_limit, memory_request, cpu_request } = self;

        let limits = memory_limit
            .into_value("memory limit")
            .map(|quantity| (MEMORY.to_string(), quantity))
            .into_iter()
            .collect::<BTreeMap<_, _>>();
        let requests = [
            memory_request.into_value("memory request").map(|quantity| (MEMORY, quantity)),
            cpu_request.into_value("cpu request").map(|quantity| (CPU, quantity)),
        ]
        .into_iter()
        .flatten()
        .map(|(name, quantity)| (name.to_string(), quantity))
        .collect::<BTreeMap<_, _>>();

        if limits.is_empty() && requests.is_empty() {
            return None;
        }
        Some(ResourceRequirements {
            limits: (!limits.is_empty()).then_some(limits),
            requests: (!requests.is_empty()).then_some(requests),
            ..ResourceRequirements::default()
        })
    }
}

fn translate(amount: i64, render: impl FnOnce(i64) -> String) -> Translated<Quantity> {
    if amount == 0 {
        return Translated::Unset;
    }
    let value = render(amount);
    if amount < 0 {
        return Translated::Omitted(NegativeQuantitySnafu { value }.build());
    }
    parse_quantity(&value).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::Error;

    #[test]
    fn test_zero_values_are_unset() {
        let resources = Resources::from_container(&Container::default());
        assert_eq!(resources.memory_limit, Translated::Unset);
        assert_eq!(resources.memory_request, Translated::Unset);
        assert_eq!(resources.cpu_request, Translated::Unset);
        assert!(resources.into_requirements().is_none());
    }

    #[test]
    fn test_memory_limit() {
        let container = Container { memory: 536_870_912, ..Container::default() };
        let requirements = Resources::from_container(&container)
            .into_requirements()
            .expect("requirements should be present");

        let limits = requirements.limits.expect("limits should be present");
        assert_eq!(limits.get(MEMORY), Some(&Quantity("536870912".to_string())));
        assert!(requirements.requests.is_none());
    }

    #[test]
    fn test_requests_and_cpu_milli_suffix() {
        let container = Container {
            memory_reservation: 1024,
            milli_cpu_reservation: 250,
            ..Container::default()
        };
        let requirements = Resources::from_container(&container)
            .into_requirements()
            .expect("requirements should be present");

        assert!(requirements.limits.is_none());
        let requests = requirements.requests.expect("requests should be present");
        assert_eq!(requests.get(MEMORY), Some(&Quantity("1024".to_string())));
        assert_eq!(requests.get(CPU), Some(&Quantity("250m".to_string())));
        assert!(!requests.contains_key("cpu-limit"));
    }

    #[test]
    fn test_negative_value_is_omitted_not_fatal() {
        let container = Container { memory: -5, milli_cpu_reservation: 100, ..Container::default() };
        let resources = Resources::from_container(&container);
        assert!(matches!(resources.memory_limit, Translated::Omitted(Error::NegativeQuantity { .. })));
        assert!(resources.cpu_request.is_value());

        let requirements = resources.into_requirements().expect("cpu request remains");
        assert!(requirements.limits.is_none());
        assert!(requirements.requests.is_some());
    }

    #[test]
    fn test_clone_keeps_omission_reason() {
        let container = Container { memory: -5, memory_reservation: 64, ..Container::default() };
        let resources = Resources::from_container(&container);
        let copy = resources.clone();
        assert_eq!(copy, resources);
        assert_eq!(
            copy.memory_limit,
            Translated::Omitted(Error::NegativeQuantity { value: "-5".to_string() })
        );
        assert_eq!(copy.memory_request, Translated::Value(Quantity("64".to_string())));
    }
}
