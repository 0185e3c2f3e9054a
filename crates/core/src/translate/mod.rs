//! Translation of container descriptor fields into Kubernetes types.
//!
//! Every field is translated on its own. Entries that cannot be translated are
//! reported as [`Translated::Omitted`] and logged; they never fail a build.

mod error;
mod hosts;
mod ports;
mod quantity;
mod resources;
mod volumes;

pub use self::{
    error::Error,
    hosts::{ExtraHost, host_aliases},
    ports::{PortBinding, Protocol, container_ports},
    quantity::parse_quantity,
    resources::Resources,
    volumes::{DataVolume, pod_volumes, volume_mounts},
};

/// Outcome of translating one optional field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Translated<T> {
    /// The source field is unset (zero or empty).
    Unset,
    Value(T),
    /// The source field is set but cannot be translated.
    Omitted(Error),
}

impl<T> Translated<T> {
    /// Keeps the value, logging the reason when the field was omitted.
    pub fn into_value(self, field: &str) -> Option<T> {
        match self {
            Self::Unset => None,
            Self::Value(value) => Some(value),
            Self::Omitted(err) => {
                tracing::warn!("Omitting {field}: {err}");
                None
            }
        }
    }

    #[must_use]
    pub const fn is_value(&self) -> bool { matches!(self, Self::Value(_)) }
}

impl<T> From<Result<T, Error>> for Translated<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(err) => Self::Omitted(err),
        }
    }
}
