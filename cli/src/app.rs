//! Application context: unified state passed to every command handler.
//!
//! Holds the terminal output context and wires the production adapters into a
//! [`Deployer`]. Adding a cross-cutting concern requires only one field change
//! here; command signatures stay the same.

use crate::application::Deployer;
use crate::domain::{CommonVars, DeployerConfig, ProviderVars};
use crate::infra::{
    AnsibleRunner, LocalHost, MakeBuilder, TerraformDriver, TokioCommandRunner,
};
use crate::output::{OutputContext, TerminalReporter};

/// The deployer wired to real subprocesses and the local filesystem.
pub type ProductionDeployer = Deployer<
    TerraformDriver<TokioCommandRunner>,
    AnsibleRunner<TokioCommandRunner>,
    MakeBuilder<TokioCommandRunner>,
    LocalHost,
>;

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
}

impl AppContext {
    #[must_use]
    pub fn new(flags: &OutputFlags) -> Self {
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
        }
    }

    /// Progress reporter that prints through this context.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Construct the production deployer.
    #[must_use]
    pub fn deployer(
        &self,
        config: DeployerConfig,
        common: CommonVars,
        provider: ProviderVars,
    ) -> ProductionDeployer {
        Deployer::new(
            config,
            common,
            provider,
            TerraformDriver::new(TokioCommandRunner::new()),
            AnsibleRunner::new(TokioCommandRunner::new()),
            MakeBuilder::new(TokioCommandRunner::new()),
            LocalHost,
        )
    }
}
