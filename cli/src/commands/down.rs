//! `kubetest2-tf down`: destroy the cluster's infrastructure.

use anyhow::Result;
use clap::Args;

use super::{DeployArgs, DeployParts};
use crate::app::AppContext;

/// Arguments for the down command.
#[derive(Args, Debug, Clone)]
pub struct DownArgs {
    #[command(flatten)]
    pub deploy: DeployArgs,
}

/// Run `kubetest2-tf down`.
///
/// # Errors
///
/// Returns an error if the workspace cannot be initialized, or if destroy
/// fails and `--ignore-destroy-errors` is not set.
pub async fn run(args: DownArgs, app: &AppContext) -> Result<()> {
    let DeployParts {
        config,
        common,
        provider,
    } = args.deploy.into_parts(None);
    let deployer = app.deployer(config, common, provider);
    deployer.down(&app.terminal_reporter()).await
}
