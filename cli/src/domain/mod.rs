//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod inventory;
pub mod kubeconfig;
pub mod vars;
pub mod workspace;

pub use config::{BuildConfig, DeployerConfig};
pub use error::{
    ApplyError, BuildError, DestroyError, InventoryError, KubeconfigError, PlaybookError,
    PreconditionError,
};
pub use inventory::{Inventory, Role};
pub use vars::{CommonVars, PowerVsVars, ProviderVars, VariableSet, VpcVars};
pub use workspace::{ClusterWorkspace, InitState};
