//! Cluster workspace types and pure naming helpers.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::PreconditionError;
use crate::domain::inventory::INVENTORY_FILE;

/// Cluster names double as directory names and DNS labels.
pub static CLUSTER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern, cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z]([a-z0-9-]{0,61}[a-z0-9])?$").expect("valid regex")
});

/// Terraform state file kept inside the workspace.
pub const STATE_FILE: &str = "terraform.tfstate";

/// Initialization progress of the per-process workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// The working directory of a single provisioning attempt.
///
/// Holds terraform state, variable files, unpacked assets and the generated
/// inventory. Created once per process, never deleted by this tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterWorkspace {
    name: String,
    path: PathBuf,
}

impl ClusterWorkspace {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the workspace.
    #[must_use]
    pub fn join(&self, file: impl AsRef<Path>) -> PathBuf {
        self.path.join(file)
    }

    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.join(STATE_FILE)
    }

    #[must_use]
    pub fn inventory_file(&self) -> PathBuf {
        self.join(INVENTORY_FILE)
    }
}

/// Validates a cluster name.
///
/// # Errors
///
/// Returns an error if the name is not a lowercase DNS label starting with a letter.
pub fn validate_cluster_name(name: &str) -> Result<(), PreconditionError> {
    if CLUSTER_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(PreconditionError::InvalidClusterName(name.to_string()))
    }
}

/// Generate a cluster name: `k8s-` followed by 8 lowercase hex characters.
#[must_use]
pub fn generate_cluster_name() -> String {
    format!("k8s-{}", &random_hex()[..8])
}

/// Generate a kubeadm bootstrap token (`[a-z0-9]{6}.[a-z0-9]{16}`).
///
/// Entropy sources: nanosecond timestamp and independent `RandomState` hashes.
/// Not cryptographically strong; the token only lives until the cluster joins.
#[must_use]
pub fn generate_bootstrap_token() -> String {
    let id = random_hex();
    let secret = format!("{}{}", random_hex(), random_hex());
    format!("{}.{}", &id[..6], &secret[..16])
}

fn random_hex() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
    );
    hasher.write_u64(RandomState::new().build_hasher().finish());
    hasher.write_u64(RandomState::new().build_hasher().finish());
    format!("{:016x}", hasher.finish())
}
