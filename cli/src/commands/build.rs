//! `kubetest2-tf build`: compile Kubernetes for the target platform.

use anyhow::Result;
use clap::Args;

use super::{BuildArgs, DeployArgs, DeployParts};
use crate::app::AppContext;

/// Arguments for the build command.
#[derive(Args, Debug, Clone)]
pub struct BuildCmdArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    #[command(flatten)]
    pub deploy: DeployArgs,
}

/// Run `kubetest2-tf build`.
///
/// # Errors
///
/// Returns an error if a required tool or the repo root is missing, or the
/// build fails.
pub async fn run(args: BuildCmdArgs, app: &AppContext) -> Result<()> {
    let DeployParts {
        config,
        common,
        provider,
    } = args.deploy.into_parts(Some(args.build.to_config()));
    let deployer = app.deployer(config, common, provider);
    deployer.build(&app.terminal_reporter()).await
}
