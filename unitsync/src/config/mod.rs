mod error;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use snafu::ResultExt;
use unitsync_base::consts::{DEFAULT_PAUSE_IMAGE, DEFAULT_POD_NAMESPACE, DEFAULT_REGISTRY};
use unitsync_cli::config::LogConfig;
use unitsync_core::{BuildOptions, ReconcilerConfig};

pub use self::error::Error;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Namespace pods and pull secrets are created in.
    #[serde(default = "default_pod_namespace")]
    pub pod_namespace: String,

    #[serde(default = "default_pause_image")]
    pub pause_image: String,

    /// Registry the credentials of deployment units belong to.
    #[serde(default = "default_registry")]
    pub registry: String,

    #[serde(default)]
    pub reconcile: ReconcileConfig,

    #[serde(default = "LogConfig::default")]
    pub log: LogConfig,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileConfig {
    #[serde(rename = "pollIntervalMillis", default = "default_poll_interval")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub poll_interval: Duration,

    #[serde(rename = "readyTimeoutSeconds", default = "default_ready_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub ready_timeout: Duration,

    /// Maximum number of cluster requests in flight across all deployment units.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pod_namespace: default_pod_namespace(),
            pause_image: default_pause_image(),
            registry: default_registry(),
            reconcile: ReconcileConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            ready_timeout: default_ready_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

impl Config {
    pub fn search_config_file_path() -> PathBuf {
        let paths = vec![Self::default_path()]
            .into_iter()
            .chain(unitsync_base::fallback_project_config_directories().into_iter().map(
                |mut path| {
                    path.push(unitsync_base::CLI_CONFIG_NAME);
                    path
                },
            ))
            .collect::<Vec<_>>();
        for path in paths {
            let Ok(exists) = path.try_exists() else {
                continue;
            };
            if exists {
                return path;
            }
        }
        Self::default_path()
    }

    #[inline]
    pub fn default_path() -> PathBuf {
        [unitsync_base::PROJECT_CONFIG_DIR.to_path_buf(), PathBuf::from(unitsync_base::CLI_CONFIG_NAME)]
            .into_iter()
            .collect()
    }

    /// Loads the configuration at `path`, or the defaults if it does not
    /// exist.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path
            .as_ref()
            .try_resolve()
            .map(|path| path.to_path_buf())
            .with_context(|_| error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() })?;
        if !path.try_exists().unwrap_or(false) {
            tracing::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
        let mut config = Self::parse(&data).context(error::ParseConfigSnafu { filename: path })?;

        config.log.file_path = match config.log.file_path.map(|path| {
            path.try_resolve()
                .map(|path| path.to_path_buf())
                .with_context(|_| error::ResolveFilePathSnafu { file_path: path.clone() })
        }) {
            Some(Ok(path)) => Some(path),
            Some(Err(err)) => return Err(err),
            None => None,
        };

        Ok(config)
    }

    fn parse(data: &[u8]) -> Result<Self, serde_yaml::Error> { serde_yaml::from_slice(data) }

    /// The default configuration as YAML.
    pub fn template_basic() -> Vec<u8> {
        serde_yaml::to_string(&Self::default()).map(String::into_bytes).unwrap_or_default()
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions { pause_image: self.pause_image.clone(), registry: self.registry.clone() }
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            poll_interval: self.reconcile.poll_interval,
            ready_timeout: self.reconcile.ready_timeout,
        }
    }
}

fn default_pod_namespace() -> String { DEFAULT_POD_NAMESPACE.to_string() }

fn default_pause_image() -> String { DEFAULT_PAUSE_IMAGE.to_string() }

fn default_registry() -> String { DEFAULT_REGISTRY.to_string() }

const fn default_poll_interval() -> Duration { Duration::from_secs(1) }

const fn default_ready_timeout() -> Duration { Duration::from_secs(300) }

const fn default_concurrency() -> usize { 4 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_basic_parses_back() {
        let config = Config::parse(&Config::template_basic()).expect("template should parse");

        assert_eq!(config.pod_namespace, DEFAULT_POD_NAMESPACE);
        assert_eq!(config.pause_image, DEFAULT_PAUSE_IMAGE);
        assert_eq!(config.registry, DEFAULT_REGISTRY);
        assert_eq!(config.reconcile.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.reconcile.ready_timeout, Duration::from_secs(300));
        assert_eq!(config.reconcile.concurrency, 4);
    }

    #[test]
    fn test_partial_config() {
        let yaml = "podNamespace: units\nreconcile:\n  pollIntervalMillis: 250\n";
        let config = Config::parse(yaml.as_bytes()).expect("config should parse");

        assert_eq!(config.pod_namespace, "units");
        assert_eq!(config.registry, DEFAULT_REGISTRY);
        assert_eq!(config.reconcile.poll_interval, Duration::from_millis(250));
        assert_eq!(config.reconcile.ready_timeout, Duration::from_secs(300));

        let options = config.build_options();
        assert_eq!(options.pause_image, DEFAULT_PAUSE_IMAGE);
        assert_eq!(config.reconciler_config().poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_empty_reconcile_section() {
        let config = Config::parse(b"reconcile: {}\n").expect("config should parse");
        assert_eq!(config.reconcile.concurrency, 4);
    }
}
