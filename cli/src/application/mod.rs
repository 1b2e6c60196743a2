//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain` and never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{
    AssetExtractor, BinaryBuilder, BuildSpec, CommandRunner, Host, InfraDriver, LocalFs,
    PlaybookRunner, PlaybookSpec, ProgressReporter, TerraformRun, ToolLocator,
};
pub use services::deployer::{Deployer, UpOutcome};
