//! Embedded terraform modules and ansible playbooks.
//!
//! At compile time, `include_dir!` embeds everything under `.build/assets/`.
//! Each top-level directory is one resource:
//!   - `powervs/`: terraform module for IBM Cloud `PowerVS`
//!   - `vpc/`: terraform module for IBM Cloud VPC
//!   - `k8s-ansible/`: playbooks that install Kubernetes

use std::path::Path;

use anyhow::{Context, Result};
use include_dir::{Dir, include_dir};

use crate::application::ports::AssetExtractor;
use crate::infra::fs::LocalHost;

static EMBEDDED_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../.build/assets");

/// Copy the contents of embedded directory `resource` into `dest`.
///
/// Files land directly under `dest` (the resource name is not repeated) and
/// existing files are overwritten.
///
/// # Errors
///
/// Returns an error if the resource does not exist or a file cannot be written.
pub fn unpack(dest: &Path, resource: &str) -> Result<()> {
    let dir = EMBEDDED_ASSETS
        .get_dir(resource)
        .ok_or_else(|| anyhow::anyhow!("embedded asset not found: {resource}"))?;
    write_tree(dir, dir.path(), dest)
}

fn write_tree(dir: &Dir<'_>, root: &Path, dest: &Path) -> Result<()> {
    for file in dir.files() {
        let relative = file.path().strip_prefix(root).unwrap_or(file.path());
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        std::fs::write(&target, file.contents())
            .with_context(|| format!("writing asset {}", target.display()))?;
    }
    for sub in dir.dirs() {
        write_tree(sub, root, dest)?;
    }
    Ok(())
}

impl AssetExtractor for LocalHost {
    fn unpack(&self, dest: &Path, resource: &str) -> Result<()> {
        unpack(dest, resource)
    }
}
