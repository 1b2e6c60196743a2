//! `InfraDriver` backed by the terraform CLI.

use std::path::Path;
use std::process::{ExitStatus, Output};

use anyhow::Result;

use crate::application::ports::{CommandRunner, InfraDriver, TerraformRun};

/// Terraform executable name.
pub const TERRAFORM_BIN: &str = "terraform";

/// Drives `terraform` through a [`CommandRunner`].
///
/// `init`, `apply` and `destroy` stream to the terminal; `output` is captured
/// because its stdout is parsed.
pub struct TerraformDriver<R> {
    runner: R,
}

impl<R: CommandRunner> TerraformDriver<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn run_lifecycle(&self, verb: &str, run: &TerraformRun<'_>) -> Result<ExitStatus> {
        let args = lifecycle_args(verb, run);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner.run_status(TERRAFORM_BIN, &args).await
    }
}

/// Arguments for `apply`/`destroy`: `<verb> [-var-file=..]* -state=.. [-auto-approve] <dir>`.
#[must_use]
pub fn lifecycle_args(verb: &str, run: &TerraformRun<'_>) -> Vec<String> {
    let mut args = vec![verb.to_string()];
    args.extend(
        run.var_files
            .iter()
            .map(|file| format!("-var-file={}", file.display())),
    );
    args.push(format!("-state={}", run.state.display()));
    if run.auto_approve {
        args.push("-auto-approve".to_string());
    }
    args.push(run.dir.display().to_string());
    args
}

/// Arguments for `output`: `output -state=.. [-json name]`.
///
/// The unnamed listing stays in human form so terraform redacts sensitive
/// values.
#[must_use]
pub fn output_args(state: &Path, name: Option<&str>) -> Vec<String> {
    let mut args = vec!["output".to_string(), format!("-state={}", state.display())];
    if let Some(name) = name {
        args.push("-json".to_string());
        args.push(name.to_string());
    }
    args
}

impl<R: CommandRunner> InfraDriver for TerraformDriver<R> {
    async fn init(&self, dir: &Path) -> Result<ExitStatus> {
        let dir = dir.display().to_string();
        self.runner.run_status(TERRAFORM_BIN, &["init", &dir]).await
    }

    async fn apply(&self, run: &TerraformRun<'_>) -> Result<ExitStatus> {
        self.run_lifecycle("apply", run).await
    }

    async fn destroy(&self, run: &TerraformRun<'_>) -> Result<ExitStatus> {
        self.run_lifecycle("destroy", run).await
    }

    async fn output(&self, state: &Path, name: Option<&str>) -> Result<Output> {
        let args = output_args(state, name);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner.run(TERRAFORM_BIN, &args).await
    }
}
