use snafu::Snafu;

/// Reasons an entry of a container descriptor cannot be translated.
///
/// None of these abort a build: the offending entry is left out of the pod.
#[derive(Clone, Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Invalid quantity '{value}'"))]
    InvalidQuantity { value: String },

    #[snafu(display("Negative quantity '{value}' cannot be requested"))]
    NegativeQuantity { value: String },

    #[snafu(display("Port '{input}' does not end in /tcp or /udp"))]
    UnknownProtocol { input: String },

    #[snafu(display("Invalid format: expected 'HOST_PORT:CONTAINER_PORT/PROTO', got '{input}'"))]
    InvalidPortFormat { input: String },

    #[snafu(display("Invalid port value '{value}': {source}"))]
    InvalidPort { value: String, source: std::num::ParseIntError },

    #[snafu(display("Container port of '{input}' must not be 0"))]
    ZeroContainerPort { input: String },

    #[snafu(display("Invalid format: expected 'HOST_PATH:CONTAINER_PATH[:MODE]', got '{input}'"))]
    InvalidVolumeFormat { input: String },

    #[snafu(display("Host path '{host_path}' of volume '{input}' is not absolute"))]
    RelativeHostPath { input: String, host_path: String },

    #[snafu(display("Invalid format: expected 'HOSTNAME:IP', got '{input}'"))]
    InvalidExtraHost { input: String },
}
