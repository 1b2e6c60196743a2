//! Terraform apply retry loop and inventory collection.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::ports::{InfraDriver, ProgressReporter, TerraformRun};
use crate::domain::error::InventoryError;
use crate::domain::inventory::{self, Inventory, Role};

/// Result of the bounded apply loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Apply succeeded on attempt number `attempts` (1-based).
    Applied { attempts: u32 },
    /// Every attempt failed; `exit_code` is from the last one.
    Exhausted {
        attempts: u32,
        exit_code: Option<i32>,
    },
}

/// Run `terraform apply`, retrying up to `retries` more times on failure.
///
/// Retries re-run apply immediately on the same state; terraform is expected
/// to converge on re-apply. After every attempt the current outputs are
/// queried and logged for diagnostics only.
pub async fn apply_with_retry(
    tf: &impl InfraDriver,
    run: &TerraformRun<'_>,
    retries: u32,
    reporter: &impl ProgressReporter,
) -> ApplyOutcome {
    let total = retries.saturating_add(1);
    let mut exit_code = None;

    for attempt in 1..=total {
        reporter.step(&format!("applying infrastructure (attempt {attempt}/{total})..."));
        let result = tf.apply(run).await;
        log_outputs(tf, run.state, attempt).await;

        match result {
            Ok(status) if status.success() => return ApplyOutcome::Applied { attempts: attempt },
            Ok(status) => {
                exit_code = status.code();
                warn!(attempt, exit_code, "terraform apply failed");
            }
            Err(e) => {
                exit_code = None;
                warn!(attempt, error = %format!("{e:#}"), "terraform apply could not be run");
            }
        }
        if attempt < total {
            reporter.warn("terraform apply failed, retrying");
        }
    }

    ApplyOutcome::Exhausted {
        attempts: total,
        exit_code,
    }
}

async fn log_outputs(tf: &impl InfraDriver, state: &Path, attempt: u32) {
    match tf.output(state, None).await {
        Ok(out) => info!(
            attempt,
            stdout = %String::from_utf8_lossy(&out.stdout).trim(),
            stderr = %String::from_utf8_lossy(&out.stderr).trim(),
            "terraform output"
        ),
        Err(e) => info!(attempt, error = %format!("{e:#}"), "terraform output unavailable"),
    }
}

/// Query `terraform output -json <role>` for every role and build the inventory.
///
/// # Errors
///
/// Returns an error if any query fails to run, exits non-zero, or returns
/// something other than a list of address strings.
pub async fn collect_inventory(tf: &impl InfraDriver, state: &Path) -> Result<Inventory> {
    let mut inventory = Inventory::new();
    for role in Role::ALL {
        let output = tf
            .output(state, Some(role.as_str()))
            .await
            .with_context(|| format!("terraform output {role} failed"))?;
        if !output.status.success() {
            return Err(InventoryError::OutputFailed {
                role: role.to_string(),
                exit_code: output.status.code(),
            }
            .into());
        }
        let hosts = inventory::parse_role_output(role, &output.stdout)?;
        info!(%role, ?hosts, "discovered machines");
        inventory.extend(role, hosts);
    }
    Ok(inventory)
}
