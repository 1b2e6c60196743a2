//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

use anyhow::Result;

// ── Value Types ───────────────────────────────────────────────────────────────

/// Parameters for a terraform `apply` or `destroy` run.
pub struct TerraformRun<'a> {
    /// Workspace holding the terraform module, state and variable files.
    pub dir: &'a Path,
    /// Variable files passed as `-var-file`, in order.
    pub var_files: &'a [PathBuf],
    /// State file, passed as `-state`.
    pub state: &'a Path,
    /// Skip terraform's interactive approval prompt.
    pub auto_approve: bool,
}

/// Parameters for an ansible-playbook run.
pub struct PlaybookSpec<'a> {
    /// Inventory file, passed as `--inventory=`.
    pub inventory: &'a Path,
    /// JSON object passed as `--extra-vars=`.
    pub extra_vars: &'a str,
    /// Playbook file, passed positionally.
    pub playbook: &'a Path,
}

/// Parameters for compiling Kubernetes.
pub struct BuildSpec<'a> {
    /// Kubernetes source tree; `make` runs here.
    pub repo_root: &'a Path,
    /// `KUBE_BUILD_PLATFORMS`, e.g. `linux/ppc64le`.
    pub target_platform: &'a str,
    /// Platform of the machine running the tests, e.g. `linux/amd64`.
    pub host_platform: &'a str,
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
///
/// No method applies a timeout: provisioning runs until the tool exits.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its stdout and stderr.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with inherited stdio and return its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
    /// Like `run_status`, with `dir` as the working directory.
    async fn run_status_in(&self, dir: &Path, program: &str, args: &[&str])
    -> Result<ExitStatus>;
}

// ── Tool Ports ────────────────────────────────────────────────────────────────

/// The infrastructure-as-code tool (terraform).
///
/// `Err` means the process could not be run at all; a non-zero exit is
/// reported through the returned status.
#[allow(async_fn_in_trait)]
pub trait InfraDriver {
    /// Initialise providers and modules in the workspace.
    async fn init(&self, dir: &Path) -> Result<ExitStatus>;
    /// Create or update the infrastructure.
    async fn apply(&self, run: &TerraformRun<'_>) -> Result<ExitStatus>;
    /// Tear the infrastructure down.
    async fn destroy(&self, run: &TerraformRun<'_>) -> Result<ExitStatus>;
    /// Read one output as JSON. `None` lists every output in human form,
    /// with sensitive values redacted.
    async fn output(&self, state: &Path, name: Option<&str>) -> Result<Output>;
}

/// The configuration-management tool (ansible-playbook).
#[allow(async_fn_in_trait)]
pub trait PlaybookRunner {
    /// Run a playbook against an inventory.
    async fn run_playbook(&self, spec: &PlaybookSpec<'_>) -> Result<ExitStatus>;
}

/// Compiles cluster binaries.
#[allow(async_fn_in_trait)]
pub trait BinaryBuilder {
    /// Build release binaries (and test binaries when cross-compiling).
    async fn build(&self, spec: &BuildSpec<'_>) -> Result<()>;
}

// ── Host Ports ────────────────────────────────────────────────────────────────

/// Finds executables on the search path.
pub trait ToolLocator {
    /// Absolute path of `tool`, or `None` when it is not installed.
    fn locate(&self, tool: &str) -> Option<PathBuf>;
}

/// Abstracts the local filesystem operations the deployer needs.
pub trait LocalFs {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;
    /// Create a single directory (parent must exist).
    fn create_dir(&self, path: &Path) -> Result<()>;
    /// Write `content` to `path`, replacing it.
    fn write(&self, path: &Path, content: &str) -> Result<()>;
    /// Read a file into a string.
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Absolute form of `path`.
    fn absolute(&self, path: &Path) -> Result<PathBuf>;
    /// The process working directory.
    fn current_dir(&self) -> Result<PathBuf>;
}

/// Abstracts extraction of embedded terraform modules and playbooks.
pub trait AssetExtractor {
    /// Copy embedded resource `resource` (a directory) into `dest`.
    fn unpack(&self, dest: &Path, resource: &str) -> Result<()>;
}

/// Composite trait: everything the deployer needs from the local machine.
pub trait Host: ToolLocator + LocalFs + AssetExtractor {}

/// Blanket implementation: any type implementing all three sub-traits is a `Host`.
impl<T> Host for T where T: ToolLocator + LocalFs + AssetExtractor {}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
