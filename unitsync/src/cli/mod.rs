//! The `unitsync` command line interface.
//!
//! # Examples
//!
//! ```bash
//! # Print the pods and pull secrets built from deployment units
//! unitsync render unit-a.yaml unit-b.json
//!
//! # Create or replace the pods and wait until they are ready
//! unitsync sync --timeout-seconds 120 unit-a.yaml unit-b.json
//!
//! # List pods of deployment units
//! unitsync list
//! ```

pub mod error;
mod list;
mod render;
mod sync;
mod unit_file;

use std::{io::Write, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use snafu::ResultExt;
use tokio::runtime::Runtime;
use unitsync_base::CLI_PROGRAM_NAME;

pub use self::error::Error;
use self::{list::ListCommand, render::RenderCommand, sync::SyncCommand};
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    about = "Unitsync: run deployment units as Kubernetes pods.",
    long_about = "Unitsync translates deployment units (containers, networks, volumes and \
                  registry credentials) into Kubernetes pods, including placement rules \
                  encoded in scheduler labels, and reconciles the cluster until every pod \
                  is ready.",
    color = clap::ColorChoice::Always
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[clap(
        long = "config",
        short = 'c',
        env = "UNITSYNC_CONFIG_FILE_PATH",
        help = "Specify a configuration file. Defaults to ~/.config/unitsync/config.yaml or \
                UNITSYNC_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    #[clap(
        long = "log-level",
        env = "UNITSYNC_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Display client and server version information")]
    Version {
        #[clap(long = "client", help = "If true, shows client version only (no server required).")]
        client: bool,
    },

    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,

    #[command(alias = "r", about = "Print the pods and pull secrets built from deployment units")]
    Render(RenderCommand),

    #[command(
        alias = "s",
        about = "Create or replace the pods of deployment units and wait until they are ready"
    )]
    Sync(SyncCommand),

    #[command(alias = "l", about = "List pods of deployment units")]
    List(ListCommand),
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    /// Loads the configuration; `--log-level` overrides the configured level.
    fn load_config(&self) -> Result<Config, Error> {
        let mut config =
            Config::load(self.config_file.clone().unwrap_or_else(Config::search_config_file_path))?;

        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }

        Ok(config)
    }

    /// Runs the parsed command and returns the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, the runtime or
    /// the Kubernetes client cannot be created, or the command fails.
    pub fn run(self) -> Result<i32, Error> {
        let client_version = Self::command().get_version().unwrap_or_default().to_string();
        match self.commands {
            Some(Commands::Version { client }) if client => {
                std::io::stdout()
                    .write_all(format!("Client Version: {client_version}\n").as_bytes())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                std::io::stdout()
                    .write_all(Config::template_basic().as_slice())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            _ => {}
        }

        let config = self.load_config()?;
        config.log.registry();

        let fut = async move {
            match self.commands {
                Some(Commands::Version { .. }) => {
                    let kube_client = kube_client().await?;
                    let server_version = kube_client.apiserver_version().await.map_or_else(
                        |_| "unknown".to_string(),
                        |info| format!("{}.{}", info.major, info.minor),
                    );
                    let info = format!(
                        "Client Version: {client_version}\nServer Version: {server_version}\n",
                    );
                    std::io::stdout().write_all(info.as_bytes()).context(error::WriteStdoutSnafu)?;
                }
                Some(Commands::Render(cmd)) => cmd.run(config).await?,
                Some(Commands::Sync(cmd)) => cmd.run(kube_client().await?, config).await?,
                Some(Commands::List(cmd)) => cmd.run(kube_client().await?, config).await?,
                _ => {
                    let help = Self::command().render_long_help().ansi().to_string();
                    std::io::stderr().write_all(help.as_bytes()).context(error::WriteStdoutSnafu)?;
                    return Ok(-1);
                }
            }

            Ok(0)
        };

        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(fut)
    }
}

async fn kube_client() -> Result<kube::Client, Error> {
    kube::Client::try_default().await.context(error::KubeConfigSnafu)
}
