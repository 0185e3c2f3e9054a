//! Logging configuration shared by the unitsync binaries.
//!
//! `LogConfig` describes where log records go (stdout, stderr, journald, a
//! file), how they are formatted and the minimum level. `registry` turns it
//! into the global `tracing` subscriber.
use std::{fmt, fs::OpenOptions, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use tracing_subscriber::{
    Layer, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

/// Logging preferences, usually read from the `log` section of the
/// configuration file.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Append log records to this file as well.
    #[serde(default = "LogConfig::default_file_path")]
    pub file_path: Option<PathBuf>,

    #[serde(default = "LogConfig::default_emit_journald")]
    pub emit_journald: bool,

    #[serde(default = "LogConfig::default_emit_stdout")]
    pub emit_stdout: bool,

    #[serde(default = "LogConfig::default_emit_stderr")]
    pub emit_stderr: bool,

    /// Layout of the records written to stdout, stderr and the log file.
    #[serde(default)]
    #[serde_as(as = "DisplayFromStr")]
    pub format: LogFormat,

    /// Records below this level are dropped.
    #[serde(default = "LogConfig::default_log_level")]
    #[serde_as(as = "DisplayFromStr")]
    pub level: tracing::Level,
}

impl Default for LogConfig {
    /// `INFO` records on stderr in the compact format.
    ///
    /// stdout stays free for the command output (rendered manifests, tables).
    fn default() -> Self {
        Self {
            file_path: Self::default_file_path(),
            emit_journald: Self::default_emit_journald(),
            emit_stdout: Self::default_emit_stdout(),
            emit_stderr: Self::default_emit_stderr(),
            format: LogFormat::default(),
            level: Self::default_log_level(),
        }
    }
}

impl LogConfig {
    #[inline]
    #[must_use]
    pub const fn default_log_level() -> tracing::Level { tracing::Level::INFO }

    #[inline]
    #[must_use]
    pub const fn default_file_path() -> Option<PathBuf> { None }

    #[inline]
    #[must_use]
    pub const fn default_emit_journald() -> bool { false }

    #[inline]
    #[must_use]
    pub const fn default_emit_stdout() -> bool { false }

    #[inline]
    #[must_use]
    pub const fn default_emit_stderr() -> bool { true }

    /// Installs the global `tracing` subscriber described by this config.
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been installed.
    pub fn registry(&self) {
        let Self { emit_journald, file_path, emit_stdout, emit_stderr, format, level } = self;

        let filter_layer = tracing_subscriber::filter::LevelFilter::from_level(*level);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(emit_journald.then(|| LogDriver::Journald.layer(*format)))
            .with(file_path.clone().map(|path| LogDriver::File(path).layer(*format)))
            .with(emit_stdout.then(|| LogDriver::Stdout.layer(*format)))
            .with(emit_stderr.then(|| LogDriver::Stderr.layer(*format)))
            .init();
    }
}

/// Layout of formatted log records.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// One line per record.
    #[default]
    Compact,
    /// Multi-line records with thread information.
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(format!("'{value}' is not a valid log format")),
        }
    }
}

#[derive(Clone, Debug)]
enum LogDriver {
    Stdout,
    Stderr,
    Journald,
    File(PathBuf),
}

impl LogDriver {
    /// Builds the layer for this destination, or `None` when the destination
    /// cannot be opened (unwritable file, no journald socket).
    #[allow(clippy::type_repetition_in_bounds)]
    fn layer<S>(self, format: LogFormat) -> Option<Box<dyn Layer<S> + Send + Sync + 'static>>
    where
        S: tracing::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        let fmt = tracing_subscriber::fmt::layer().with_target(true);

        match (self, format) {
            (Self::Journald, _) => Some(Box::new(tracing_journald::layer().ok()?)),
            (Self::Stdout, LogFormat::Compact) => {
                Some(Box::new(fmt.compact().with_writer(std::io::stdout)))
            }
            (Self::Stdout, LogFormat::Pretty) => Some(Box::new(
                fmt.pretty().with_thread_ids(true).with_thread_names(true).with_writer(std::io::stdout),
            )),
            (Self::Stderr, LogFormat::Compact) => {
                Some(Box::new(fmt.compact().with_writer(std::io::stderr)))
            }
            (Self::Stderr, LogFormat::Pretty) => Some(Box::new(
                fmt.pretty().with_thread_ids(true).with_thread_names(true).with_writer(std::io::stderr),
            )),
            (Self::File(path), format) => {
                let file = OpenOptions::new().create(true).append(true).open(path).ok()?;
                let fmt = fmt.with_ansi(false);
                match format {
                    LogFormat::Compact => Some(Box::new(fmt.compact().with_writer(file))),
                    LogFormat::Pretty => Some(Box::new(fmt.pretty().with_writer(file))),
                }
            }
        }
    }
}
