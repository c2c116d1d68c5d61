//! CLI for the FarmKonnect API client.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use farmkonnect_core::client::Method;
use farmkonnect_core::config::{self, ClientConfig};
use std::path::PathBuf;

use commands::{run_backoff, run_call, run_config};

/// Top-level CLI for the FarmKonnect API client.
#[derive(Debug, Parser)]
#[command(name = "farmkonnect")]
#[command(about = "FarmKonnect: call farm-management API procedures with retry and backoff", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/farmkonnect/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the API base URL from the config file.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Call a tRPC procedure (e.g. farms.list) and print the JSON response.
    Call {
        /// Procedure name, e.g. `crops.getAnalytics`.
        procedure: String,

        /// HTTP method (GET, POST, PUT, PATCH, DELETE).
        #[arg(long, short = 'X', default_value = "GET")]
        method: Method,

        /// Query parameter as key=value; repeatable.
        #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// JSON request body.
        #[arg(long, short = 'd', value_name = "JSON")]
        data: Option<String>,
    },

    /// Show the backoff schedule of the effective retry policy.
    Backoff {
        /// Number of retries to show (default: all the policy allows).
        #[arg(long, value_name = "N")]
        attempts: Option<u32>,
    },

    /// Show the config file path and effective settings.
    Config,
}

impl Cli {
    /// Load config from `--config` or the XDG location, then apply overrides.
    pub fn load_config(&self) -> Result<ClientConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        if let Some(url) = &self.base_url {
            cfg.base_url = url.clone();
        }
        Ok(cfg)
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = cli.load_config()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Call {
                procedure,
                method,
                params,
                data,
            } => run_call(&cfg, &procedure, method, &params, data.as_deref()).await?,
            CliCommand::Backoff { attempts } => run_backoff(&cfg, attempts)?,
            CliCommand::Config => run_config(&cfg, cli.config.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
