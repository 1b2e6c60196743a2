//! Deployer configuration.
//!
//! Pure data, built once by the command layer and handed to the deployer's
//! constructor. Nothing here reads the environment.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default ansible playbook run against the inventory.
pub const DEFAULT_PLAYBOOK: &str = "install-k8s.yml";

/// Default number of extra `terraform apply` attempts.
pub const DEFAULT_APPLY_RETRIES: u32 = 1;

/// Everything the deployer needs to know that is not a terraform variable.
#[derive(Debug, Clone)]
pub struct DeployerConfig {
    /// Directory the workspace is created in (the workspace itself is
    /// `<workspace_root>/<cluster-name>`).
    pub workspace_root: PathBuf,
    /// Extra apply attempts after the first one fails.
    pub apply_retries: u32,
    /// Pass `-auto-approve` to apply and destroy.
    pub auto_approve: bool,
    /// Reuse an existing workspace directory instead of refusing.
    pub ignore_cluster_dir: bool,
    /// Exit the process when apply retries are exhausted.
    pub break_on_apply_failure: bool,
    /// Log destroy failures instead of returning them.
    pub ignore_destroy_errors: bool,
    /// User overrides merged over the common variables for ansible.
    pub extra_vars: BTreeMap<String, String>,
    /// Playbook file name, relative to the workspace.
    pub playbook: String,
    /// Point the kubeconfig at the first control-plane node after install.
    pub rewrite_kubeconfig: bool,
    /// Present when cluster binaries are built before provisioning.
    pub build: Option<BuildConfig>,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            apply_retries: DEFAULT_APPLY_RETRIES,
            auto_approve: false,
            ignore_cluster_dir: false,
            break_on_apply_failure: false,
            ignore_destroy_errors: false,
            extra_vars: BTreeMap::new(),
            playbook: DEFAULT_PLAYBOOK.to_string(),
            rewrite_kubeconfig: true,
            build: None,
        }
    }
}

/// Inputs for compiling Kubernetes before provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Kubernetes source tree. `None` means the current directory.
    pub repo_root: Option<PathBuf>,
    /// `KUBE_BUILD_PLATFORMS` value, e.g. `linux/ppc64le`.
    pub target_platform: String,
}

/// Go-style `os/arch` platform string of the host, e.g. `linux/amd64`.
#[must_use]
pub fn host_platform() -> String {
    format!("{}/{}", std::env::consts::OS, go_arch(std::env::consts::ARCH))
}

/// Map a Rust target arch name onto the Go/Kubernetes name.
#[must_use]
pub fn go_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "x86" => "386",
        other => other,
    }
}

/// Parse one `key=value` pair as accepted by `--extra-vars`.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn parse_key_value(pair: &str) -> Result<(String, String), String> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid key=value pair: '{pair}'")),
    }
}
