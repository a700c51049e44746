//! Command line arguments.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "certcheck",
    about = "Run compliance checks against a target environment and record claim results",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every registered check group
    Run(RunArgs),
    /// List the bundled checks
    List,
    /// Print build information
    Version,
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct RunArgs {
    /// Load configuration from a TOML file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Target environment snapshot (JSON)
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Extra catalog entries (JSON) merged over the built-in catalog
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Label expression selecting checks (accepted, not evaluated yet)
    #[arg(long)]
    pub label_filter: Option<String>,

    /// Global timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Grace period in milliseconds for an aborted group to stop
    #[arg(long)]
    pub grace_period: Option<u64>,

    /// Write claim results to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl RunArgs {
    /// Overlay flags that were given onto `config`.
    pub fn apply(&self, config: &mut crate::config::EngineConfig) {
        if let Some(target) = &self.target {
            config.target = Some(target.clone());
        }
        if let Some(catalog) = &self.catalog {
            config.catalog = Some(catalog.clone());
        }
        if let Some(label_filter) = &self.label_filter {
            config.label_filter = label_filter.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(grace_period) = self.grace_period {
            config.grace_period_ms = grace_period;
        }
        if let Some(output) = &self.output {
            config.claim_output = Some(output.clone());
        }
        config.no_color |= self.no_color;
        config.log_json |= self.log_json;
    }
}
