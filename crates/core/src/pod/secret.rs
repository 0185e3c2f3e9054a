use std::collections::BTreeMap;

use base64::{Engine, prelude::BASE64_STANDARD};
use k8s_openapi::{ByteString, api::core::v1::Secret, apimachinery::pkg::apis::meta::v1::ObjectMeta};
use serde::Serialize;
use snafu::ResultExt;
use unitsync_base::consts::k8s::{labels, secrets};

use super::{BuildOptions, error, error::Error};
use crate::{
    naming,
    unit::{DeploymentUnit, RegistryCredential},
};

/// Content of a `.dockerconfigjson` secret.
#[derive(Serialize)]
struct DockerConfig {
    auths: BTreeMap<String, DockerAuth>,
}

#[derive(Serialize)]
struct DockerAuth {
    username: String,
    password: String,
    auth: String,
}

/// Name of the pull secret referenced by pods for `credential`.
#[must_use]
pub fn pull_secret_name(registry: &str, credential: &RegistryCredential) -> String {
    naming::secret_name(registry, &credential.public_value, &credential.secret_value)
}

/// Pull secrets for every registry credential of `unit`.
///
/// The secrets carry no namespace; they are created next to the pod.
///
/// # Errors
///
/// Returns [`Error::SerializeDockerConfig`] if the credentials cannot be
/// encoded.
pub fn registry_secrets(unit: &DeploymentUnit, options: &BuildOptions) -> Result<Vec<Secret>, Error> {
    unit.registry_credentials
        .iter()
        .map(|credential| registry_secret(&unit.id, &options.registry, credential))
        .collect()
}

fn registry_secret(
    unit_id: &str,
    registry: &str,
    credential: &RegistryCredential,
) -> Result<Secret, Error> {
    let RegistryCredential { public_value, secret_value } = credential;
    let config = DockerConfig {
        auths: BTreeMap::from([(
            registry.to_string(),
            DockerAuth {
                username: public_value.clone(),
                password: secret_value.clone(),
                auth: BASE64_STANDARD.encode(format!("{public_value}:{secret_value}")),
            },
        )]),
    };
    let data = serde_json::to_vec(&config)
        .context(error::SerializeDockerConfigSnafu { registry: registry.to_string() })?;

    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(pull_secret_name(registry, credential)),
            labels: Some(BTreeMap::from([(
                labels::DEPLOYMENT_UUID.to_string(),
                unit_id.to_string(),
            )])),
            ..ObjectMeta::default()
        },
        type_: Some(secrets::DOCKER_CONFIG_JSON_TYPE.to_string()),
        data: Some(BTreeMap::from([(
            secrets::DOCKER_CONFIG_JSON_KEY.to_string(),
            ByteString(data),
        )])),
        ..Secret::default()
    })
}
