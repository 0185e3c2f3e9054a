//! Loading of deployment unit descriptors.
//!
//! Files ending in `.json` are read as JSON, everything else as YAML.

use std::path::{Path, PathBuf};

use snafu::ResultExt;
use unitsync_core::{BuildOptions, DeploymentUnit, DesiredPod};

use crate::cli::{Error, error};

pub async fn load_units(files: &[PathBuf]) -> Result<Vec<DeploymentUnit>, Error> {
    let mut units = Vec::with_capacity(files.len());
    for file_path in files {
        let data = tokio::fs::read(file_path)
            .await
            .with_context(|_| error::ReadUnitFileSnafu { file_path: file_path.clone() })?;
        units.push(parse_unit(file_path, &data)?);
    }
    Ok(units)
}

/// Builds the desired pod of every unit, failing on the first unit that
/// cannot be built.
pub fn build_all(
    units: &[DeploymentUnit],
    options: &BuildOptions,
) -> Result<Vec<DesiredPod>, Error> {
    units
        .iter()
        .map(|unit| {
            DesiredPod::build(unit, options)
                .with_context(|_| error::BuildPodSnafu { unit_id: unit.id.clone() })
        })
        .collect()
}

fn parse_unit(file_path: &Path, data: &[u8]) -> Result<DeploymentUnit, Error> {
    if file_path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        serde_json::from_slice(data)
            .with_context(|_| error::ParseUnitJsonSnafu { file_path: file_path.to_path_buf() })
    } else {
        serde_yaml::from_slice(data)
            .with_context(|_| error::ParseUnitYamlSnafu { file_path: file_path.to_path_buf() })
    }
}
