//! `ToolLocator` over the process `PATH`.

use std::path::PathBuf;

use crate::application::ports::ToolLocator;
use crate::infra::fs::LocalHost;

impl ToolLocator for LocalHost {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        which::which(tool).ok()
    }
}
