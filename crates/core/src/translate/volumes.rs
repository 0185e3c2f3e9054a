use std::{collections::BTreeSet, path::Path, str::FromStr};

use k8s_openapi::api::core::v1::{
    EmptyDirVolumeSource, HostPathVolumeSource, Volume, VolumeMount,
};

use super::error::{Error, InvalidVolumeFormatSnafu, RelativeHostPathSnafu};
use crate::{naming, unit::Container};

const MEMORY_MEDIUM: &str = "Memory";
const READ_ONLY_MODE: &str = "ro";

/// A `/host/path:/container/path[:mode]` entry.
///
/// Named volumes (entries whose first segment is not an absolute path) are
/// provisioned elsewhere and rejected here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataVolume {
    pub host_path: String,

    pub container_path: String,

    pub read_only: bool,
}

impl DataVolume {
    /// Name shared by the pod volume and every mount of this host path.
    #[must_use]
    pub fn volume_name(&self) -> String { naming::derive_name(&self.host_path) }
}

impl FromStr for DataVolume {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut segments = input.split(':');
        let (Some(host_path), Some(container_path)) = (segments.next(), segments.next()) else {
            return InvalidVolumeFormatSnafu { input }.fail();
        };
        if container_path.is_empty() {
            return InvalidVolumeFormatSnafu { input }.fail();
        }
        if !Path::new(host_path).is_absolute() {
            return RelativeHostPathSnafu { input, host_path }.fail();
        }
        let read_only =
            segments.next().is_some_and(|mode| mode.split(',').any(|flag| flag == READ_ONLY_MODE));

        Ok(Self {
            host_path: host_path.to_string(),
            container_path: container_path.to_string(),
            read_only,
        })
    }
}

fn data_volumes(container: &Container) -> impl Iterator<Item = DataVolume> + '_ {
    container.data_volumes.iter().filter_map(|entry| match entry.parse::<DataVolume>() {
        Ok(volume) => Some(volume),
        Err(err) => {
            tracing::debug!("Skipping data volume of container {}: {err}", container.name);
            None
        }
    })
}

/// Host-path volumes for every data volume and memory-backed volumes for every
/// tmpfs mount point of every container.
///
/// Containers sharing a path share one volume. A tmpfs mount point that is
/// also a data-volume host path resolves to the host-path volume.
#[must_use]
pub fn pod_volumes(containers: &[Container]) -> Vec<Volume> {
    let mut seen = BTreeSet::new();
    let mut volumes = containers
        .iter()
        .flat_map(data_volumes)
        .map(|volume| Volume {
            name: volume.volume_name(),
            host_path: Some(HostPathVolumeSource {
                path: volume.host_path,
                ..HostPathVolumeSource::default()
            }),
            ..Volume::default()
        })
        .filter(|volume| seen.insert(volume.name.clone()))
        .collect::<Vec<_>>();
    let host_path_names = seen.clone();

    let tmpfs = containers.iter().flat_map(|container| container.tmpfs.keys()).filter_map(|path| {
        let name = naming::derive_name(path);
        if host_path_names.contains(&name) {
            tracing::warn!(
                "Tmpfs mount point {path} is also a data volume host path, using the host path"
            );
            return None;
        }
        seen.insert(name.clone()).then(|| Volume {
            name,
            empty_dir: Some(EmptyDirVolumeSource {
                medium: Some(MEMORY_MEDIUM.to_string()),
                ..EmptyDirVolumeSource::default()
            }),
            ..Volume::default()
        })
    });
    volumes.extend(tmpfs);
    volumes
}

/// Mounts of one container, named after the volumes of [`pod_volumes`].
#[must_use]
pub fn volume_mounts(container: &Container) -> Vec<VolumeMount> {
    let data = data_volumes(container).map(|volume| VolumeMount {
        name: volume.volume_name(),
        mount_path: volume.container_path,
        read_only: volume.read_only.then_some(true),
        ..VolumeMount::default()
    });
    let tmpfs = container.tmpfs.keys().map(|path| VolumeMount {
        name: naming::derive_name(path),
        mount_path: path.clone(),
        ..VolumeMount::default()
    });
    data.chain(tmpfs).collect()
}
