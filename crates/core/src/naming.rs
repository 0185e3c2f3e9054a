//! Deterministic names that satisfy Kubernetes naming rules.
//!
//! [`derive_name`] is a one-way transform: the first 40 hex digits (160 bits)
//! of the SHA-256 digest of its input. The result is lowercase alphanumeric,
//! which is valid as a DNS label, a label key, a label value and a volume
//! name. Distinct inputs are assumed never to collide; a collision would merge
//! two volumes or two selector keys.

use sha2::{Digest, Sha256};
use unitsync_base::consts::container_labels;

const DERIVED_NAME_LENGTH: usize = 40;
const POD_NAME_ID_LENGTH: usize = 8;

/// Derives a constraint-safe identifier from arbitrary text.
#[must_use]
pub fn derive_name(input: &str) -> String {
    let mut name = format!("{:x}", Sha256::digest(input.as_bytes()));
    name.truncate(DERIVED_NAME_LENGTH);
    name
}

#[inline]
#[must_use]
pub fn container_name(name: &str) -> String { name.to_lowercase() }

/// `<lowercased primary container name>-<first 8 characters of the unit id>`.
#[must_use]
pub fn pod_name(primary_container_name: &str, deployment_unit_id: &str) -> String {
    let id = deployment_unit_id.chars().take(POD_NAME_ID_LENGTH).collect::<String>();
    format!("{}-{id}", container_name(primary_container_name))
}

/// Name of the pull secret holding one registry credential.
#[must_use]
pub fn secret_name(registry: &str, public_value: &str, secret_value: &str) -> String {
    derive_name(&format!("{registry}\n{public_value}\n{secret_value}"))
}

/// Annotation key for a container label: `<container>/<label>`.
///
/// Scheduler labels contain `:`, which annotation keys reject, so it is
/// replaced by `.` for them.
#[must_use]
pub fn annotation_key(container: &str, label: &str) -> String {
    let label = if label.contains(container_labels::SCHEDULER_PREFIX) {
        label.replace(':', ".")
    } else {
        label.to_string()
    };
    format!("{}/{label}", container_name(container))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_name() {
        assert_eq!(pod_name("Web", "abcdef1234567890"), "web-abcdef12");
    }

    #[test]
    fn test_pod_name_with_short_id() {
        assert_eq!(pod_name("db", "abc"), "db-abc");
    }

    #[test]
    fn test_derive_name_is_stable_and_safe() {
        let name = derive_name("/var/lib/data");
        assert_eq!(name, derive_name("/var/lib/data"));
        assert_eq!(name.len(), 40);
        assert!(name.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(name, derive_name("/var/lib/data2"));
    }

    #[test]
    fn test_derive_name_of_sha256_prefix() {
        // sha256("abc") = ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad
        assert_eq!(derive_name("abc"), "ba7816bf8f01cfea414140de5dae2223b00361a3");
    }

    #[test]
    fn test_secret_name_depends_on_every_part() {
        let name = secret_name("registry", "user", "pass");
        assert_ne!(name, secret_name("registry", "user", "other"));
        assert_ne!(name, secret_name("other", "user", "pass"));
        assert_ne!(secret_name("r", "ab", "c"), secret_name("r", "a", "bc"));
    }

    #[test]
    fn test_annotation_key() {
        assert_eq!(
            annotation_key("Web", "io.rancher.scheduler.affinity:host_label"),
            "web/io.rancher.scheduler.affinity.host_label"
        );
        assert_eq!(annotation_key("Web", "io.rancher.stack.name"), "web/io.rancher.stack.name");
    }
}
