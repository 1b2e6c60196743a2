//! Filesystem infrastructure: the production `Host` and its `LocalFs` impl.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// The machine the deployer runs on.
///
/// Implements every `Host` sub-trait: filesystem access here, tool lookup in
/// `infra::tools`, embedded asset extraction in `infra::assets`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalHost;

impl crate::application::ports::LocalFs for LocalHost {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir(path).with_context(|| format!("creating directory {}", path.display()))
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content).with_context(|| format!("writing file {}", path.display()))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading file {}", path.display()))
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        std::path::absolute(path)
            .with_context(|| format!("resolving absolute path of {}", path.display()))
    }

    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().context("reading current directory")
    }
}
