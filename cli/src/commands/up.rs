//! `kubetest2-tf up`: provision infrastructure and install Kubernetes.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{BuildArgs, DeployArgs, DeployParts};
use crate::app::AppContext;
use crate::application::UpOutcome;
use crate::domain::inventory::Role;
use crate::domain::kubeconfig::KUBECONFIG_ENV;
use crate::output::OutputContext;

/// Arguments for the up command.
#[derive(Args, Debug, Clone)]
pub struct UpArgs {
    /// Compile Kubernetes before provisioning
    #[arg(long)]
    pub build: bool,

    /// Destroy the infrastructure once up finishes (whether it succeeded or not)
    #[arg(long)]
    pub down: bool,

    #[command(flatten)]
    pub build_args: BuildArgs,

    #[command(flatten)]
    pub deploy: DeployArgs,
}

/// Run `kubetest2-tf up`.
///
/// # Errors
///
/// Returns an error if the build, provisioning, install, or (with `--down`)
/// teardown fails. The up error wins when both fail.
pub async fn run(args: UpArgs, app: &AppContext) -> Result<()> {
    let build = args.build.then(|| args.build_args.to_config());
    let DeployParts {
        config,
        common,
        provider,
    } = args.deploy.into_parts(build);
    let deployer = app.deployer(config, common, provider);
    let reporter = app.terminal_reporter();

    let up = async {
        if args.build {
            deployer.build(&reporter).await?;
        }
        deployer.up(&reporter).await
    }
    .await;

    if let Ok(outcome) = &up {
        print_summary(outcome, &app.output);
        if let Some(path) = &outcome.kubeconfig {
            export_kubeconfig(path);
            println!("KUBECONFIG set to: {}", path.display());
        }
    }

    if args.down {
        let down = deployer.down(&reporter).await;
        up?;
        return down;
    }
    up.map(|_| ())
}

/// Point `KUBECONFIG` at `path` for the rest of this process and its children.
pub fn export_kubeconfig(path: &Path) {
    info!(kubeconfig = %path.display(), "exporting {KUBECONFIG_ENV}");
    // SAFETY: the binary runs a current-thread runtime and no other thread
    // reads or writes the environment while this runs.
    #[allow(unsafe_code)]
    unsafe {
        std::env::set_var(KUBECONFIG_ENV, path);
    }
}

fn print_summary(outcome: &UpOutcome, ctx: &OutputContext) {
    if ctx.quiet {
        return;
    }
    ctx.header("Cluster is up.");
    ctx.kv("Workspace", &outcome.workspace.display().to_string());
    ctx.kv("Masters", &outcome.inventory.hosts(Role::Masters).join(", "));
    ctx.kv("Workers", &outcome.inventory.hosts(Role::Workers).join(", "));
    ctx.kv("Apply attempts", &outcome.apply_attempts.to_string());
}
