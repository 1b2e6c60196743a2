//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Precondition errors ───────────────────────────────────────────────────────

/// Fatal, never-retried failures detected before any tool does real work.
///
/// `Clone` so the one-shot initialization outcome can be replayed to every
/// caller that observes it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("required tool '{tool}' not found in PATH")]
    MissingTool { tool: String },

    #[error(
        "directory named {} already exists, please choose a different cluster-name",
        .path.display()
    )]
    WorkspaceExists { path: PathBuf },

    #[error("failed to create workspace directory {}: {reason}", .path.display())]
    CreateWorkspace { path: PathBuf, reason: String },

    #[error("repository root {} does not exist", .path.display())]
    RepoRootMissing { path: PathBuf },

    #[error("cannot determine repository root: {0}")]
    RepoRootUnresolved(String),

    #[error("inventory has no control-plane address in role '{role}'")]
    NoControlPlane { role: String },

    #[error("invalid cluster name '{0}': must match ^[a-z]([a-z0-9-]{{0,61}}[a-z0-9])?$")]
    InvalidClusterName(String),
}

// ── Infrastructure apply / destroy ────────────────────────────────────────────

/// Apply failures surviving the retry loop.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("terraform init failed with exit code {}", fmt_code(.exit_code))]
    Init { exit_code: Option<i32> },

    #[error(
        "terraform apply failed after {attempts} attempt(s), last exit code {}",
        fmt_code(.exit_code)
    )]
    Exhausted {
        attempts: u32,
        exit_code: Option<i32>,
    },
}

/// Destroy failures. Never retried.
#[derive(Debug, Error)]
pub enum DestroyError {
    #[error("terraform destroy failed with exit code {}", fmt_code(.exit_code))]
    Failed { exit_code: Option<i32> },
}

// ── Inventory ─────────────────────────────────────────────────────────────────

/// Malformed structured output from `terraform output -json <role>`.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("terraform output for '{role}' failed with exit code {}", fmt_code(.exit_code))]
    OutputFailed { role: String, exit_code: Option<i32> },

    #[error("failed to unmarshal terraform output for '{role}': {reason}")]
    Malformed { role: String, reason: String },

    #[error("terraform output for '{role}' has non-string entry at index {index}")]
    NonStringEntry { role: String, index: usize },
}

// ── Configuration run ─────────────────────────────────────────────────────────

/// ansible-playbook failures.
#[derive(Debug, Error)]
pub enum PlaybookError {
    #[error("ansible playbook {playbook} failed with exit code {}", fmt_code(.exit_code))]
    Failed {
        playbook: String,
        exit_code: Option<i32>,
    },
}

// ── Kubeconfig rewriting ──────────────────────────────────────────────────────

/// Errors while pointing a kubeconfig at the new control plane.
#[derive(Debug, Error)]
pub enum KubeconfigError {
    #[error("failed to locate the kubeconfig file {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to parse kubeconfig: {0}")]
    Parse(String),

    #[error("cluster '{cluster}' has no server URL")]
    MissingServer { cluster: String },

    #[error("failed while parsing the URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("server URL {url} has no port")]
    MissingPort { url: String },
}

// ── Build ─────────────────────────────────────────────────────────────────────

/// Binary build failures.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("make {target} failed with exit code {}", fmt_code(.exit_code))]
    Failed {
        target: String,
        exit_code: Option<i32>,
    },
}

fn fmt_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none (terminated by signal)".to_string(), |c| c.to_string())
}
