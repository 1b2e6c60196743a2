//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! terraform, ansible and make adapters, filesystem access, tool lookup, and
//! asset extraction.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod ansible;
pub mod assets;
pub mod command_runner;
pub mod fs;
pub mod make;
pub mod terraform;
pub mod tools;

pub use ansible::AnsibleRunner;
pub use command_runner::TokioCommandRunner;
pub use fs::LocalHost;
pub use make::MakeBuilder;
pub use terraform::TerraformDriver;
