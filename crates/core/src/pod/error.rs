use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Deployment unit {unit_id} has no containers"))]
    NoContainers { unit_id: String },

    #[snafu(display("Failed to serialize registry credentials for {registry}, error: {source}"))]
    SerializeDockerConfig { registry: String, source: serde_json::Error },
}
