//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;

/// Provision Kubernetes clusters for e2e testing with terraform and ansible
#[derive(Parser)]
#[command(
    name = "kubetest2-tf",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Log at debug level (overridden by `RUST_LOG`)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
#[allow(clippy::large_enum_variant)]
pub enum Command {
    /// Provision infrastructure and install Kubernetes
    Up(commands::up::UpArgs),

    /// Destroy the cluster's infrastructure
    Down(commands::down::DownArgs),

    /// Compile Kubernetes for the target platform
    Build(commands::build::BuildCmdArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            verbose: _,
            command,
        } = self;
        let app = AppContext::new(&OutputFlags { no_color, quiet });
        match command {
            Command::Up(args) => commands::up::run(args, &app).await,
            Command::Down(args) => commands::down::run(args, &app).await,
            Command::Build(args) => commands::build::run(args, &app).await,
            Command::Version => {
                commands::version::run();
                Ok(())
            }
        }
    }
}
