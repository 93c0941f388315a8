//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use dev_compose::output::OutputConfig;

/// dev-compose - Assemble a multi-repo docker-compose environment
#[derive(Parser, Debug)]
#[command(name = "dev-compose")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the manifest graph and assemble the aggregate compose file
    Assemble(commands::assemble::AssembleArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .init();
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Assemble(args) => commands::assemble::execute(args, &output),
        }
    }
}
