//! Cluster lifecycle orchestration: initialize, up, down, build.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::provision::{self, ApplyOutcome};
use crate::application::ports::{
    BinaryBuilder, BuildSpec, Host, InfraDriver, PlaybookRunner, PlaybookSpec, ProgressReporter,
    TerraformRun,
};
use crate::domain::config::{BuildConfig, DeployerConfig, host_platform};
use crate::domain::error::{
    ApplyError, DestroyError, KubeconfigError, PlaybookError, PreconditionError,
};
use crate::domain::inventory::{Inventory, Role};
use crate::domain::kubeconfig;
use crate::domain::vars::{self, CommonVars, ProviderVars, VariableSet};
use crate::domain::workspace::{ClusterWorkspace, InitState, validate_cluster_name};

/// Embedded resource holding the ansible playbooks.
pub const ANSIBLE_ASSETS: &str = "k8s-ansible";

const TERRAFORM: &str = "terraform";
const ANSIBLE_PLAYBOOK: &str = "ansible-playbook";
const MAKE: &str = "make";

/// What a successful `up` produced.
#[derive(Debug, Clone)]
pub struct UpOutcome {
    pub workspace: PathBuf,
    pub inventory: Inventory,
    /// Number of apply attempts it took (1 = first try).
    pub apply_attempts: u32,
    /// Absolute kubeconfig path, when endpoint rewriting is enabled.
    pub kubeconfig: Option<PathBuf>,
}

/// Provisions one cluster by driving terraform and ansible.
///
/// The workspace is created lazily by whichever operation runs first and
/// cached for the lifetime of the deployer, including a failed outcome.
pub struct Deployer<I, A, B, H> {
    config: DeployerConfig,
    common: CommonVars,
    provider: ProviderVars,
    infra: I,
    playbook: A,
    builder: B,
    host: H,
    workspace: OnceCell<Result<ClusterWorkspace, PreconditionError>>,
    init_state: Mutex<InitState>,
}

impl<I, A, B, H> Deployer<I, A, B, H>
where
    I: InfraDriver,
    A: PlaybookRunner,
    B: BinaryBuilder,
    H: Host,
{
    #[must_use]
    pub fn new(
        config: DeployerConfig,
        common: CommonVars,
        provider: ProviderVars,
        infra: I,
        playbook: A,
        builder: B,
        host: H,
    ) -> Self {
        Self {
            config,
            common,
            provider,
            infra,
            playbook,
            builder,
            host,
            workspace: OnceCell::new(),
            init_state: Mutex::new(InitState::Uninitialized),
        }
    }

    /// Current initialization progress.
    #[must_use]
    pub fn init_state(&self) -> InitState {
        self.init_state
            .lock()
            .map_or(InitState::Failed, |state| *state)
    }

    fn set_init_state(&self, state: InitState) {
        if let Ok(mut current) = self.init_state.lock() {
            *current = state;
        }
    }

    /// The workspace, initializing it on first use.
    ///
    /// Initialization runs at most once; every later call (including
    /// concurrent ones) observes the same outcome.
    ///
    /// # Errors
    ///
    /// Returns the precondition that failed during initialization.
    pub async fn workspace(&self) -> Result<&ClusterWorkspace, PreconditionError> {
        self.workspace
            .get_or_init(|| async { self.initialize() })
            .await
            .as_ref()
            .map_err(Clone::clone)
    }

    fn initialize(&self) -> Result<ClusterWorkspace, PreconditionError> {
        self.set_init_state(InitState::Initializing);
        let result = self.prepare_workspace();
        match &result {
            Ok(ws) => {
                info!(workspace = %ws.path().display(), "workspace ready");
                self.set_init_state(InitState::Ready);
            }
            Err(e) => {
                error!(error = %e, "initialization failed");
                self.set_init_state(InitState::Failed);
            }
        }
        result
    }

    fn prepare_workspace(&self) -> Result<ClusterWorkspace, PreconditionError> {
        validate_cluster_name(&self.common.cluster_name)?;

        for tool in self.required_tools() {
            let path = self
                .host
                .locate(tool)
                .ok_or_else(|| PreconditionError::MissingTool {
                    tool: tool.to_string(),
                })?;
            debug!(tool, path = %path.display(), "found tool");
        }

        if let Some(build) = &self.config.build {
            self.resolve_repo_root(build)?;
        }

        let name = self.common.cluster_name.clone();
        let path = self.config.workspace_root.join(&name);
        if self.host.exists(&path) {
            if !self.config.ignore_cluster_dir {
                return Err(PreconditionError::WorkspaceExists { path });
            }
            warn!(workspace = %path.display(), "reusing existing workspace directory");
        } else {
            self.host
                .create_dir(&path)
                .map_err(|e| PreconditionError::CreateWorkspace {
                    path: path.clone(),
                    reason: format!("{e:#}"),
                })?;
        }
        Ok(ClusterWorkspace::new(name, path))
    }

    fn required_tools(&self) -> Vec<&'static str> {
        let mut tools = vec![TERRAFORM, ANSIBLE_PLAYBOOK];
        if self.config.build.is_some() {
            tools.push(MAKE);
        }
        tools
    }

    fn resolve_repo_root(&self, build: &BuildConfig) -> Result<PathBuf, PreconditionError> {
        let root = match &build.repo_root {
            Some(root) => root.clone(),
            None => {
                let cwd = self
                    .host
                    .current_dir()
                    .map_err(|e| PreconditionError::RepoRootUnresolved(format!("{e:#}")))?;
                debug!(repo_root = %cwd.display(), "defaulting repo root to the current directory");
                cwd
            }
        };
        if !self.host.exists(&root) {
            return Err(PreconditionError::RepoRootMissing { path: root });
        }
        Ok(root)
    }

    // ── Up ────────────────────────────────────────────────────────────────────

    /// Provision infrastructure, install Kubernetes, and point the kubeconfig
    /// at the new control plane.
    ///
    /// When apply retries are exhausted and `break_on_apply_failure` is set,
    /// this does not return: the process exits with status 1 so the
    /// half-applied infrastructure is left for inspection.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization, terraform, inventory collection,
    /// the playbook, or the kubeconfig rewrite fails.
    pub async fn up(&self, reporter: &impl ProgressReporter) -> Result<UpOutcome> {
        let ws = self.workspace().await.context("up failed to init")?;

        let var_files = self.dump_vars(ws)?;
        self.host
            .unpack(ws.path(), self.provider.name())
            .with_context(|| format!("unpacking the {} terraform module", self.provider.name()))?;

        reporter.step("initialising terraform...");
        let status = self
            .infra
            .init(ws.path())
            .await
            .context("running terraform init")?;
        if !status.success() {
            return Err(ApplyError::Init {
                exit_code: status.code(),
            }
            .into());
        }

        let state = ws.state_file();
        let run = TerraformRun {
            dir: ws.path(),
            var_files: &var_files,
            state: &state,
            auto_approve: self.config.auto_approve,
        };
        let apply_attempts = match provision::apply_with_retry(
            &self.infra,
            &run,
            self.config.apply_retries,
            reporter,
        )
        .await
        {
            ApplyOutcome::Applied { attempts } => attempts,
            ApplyOutcome::Exhausted {
                attempts,
                exit_code,
            } => {
                if self.config.break_on_apply_failure {
                    abandon(attempts, exit_code, &state);
                }
                return Err(ApplyError::Exhausted {
                    attempts,
                    exit_code,
                }
                .into());
            }
        };
        reporter.success(&format!(
            "infrastructure applied, terraform state at {}",
            state.display()
        ));

        let inventory = provision::collect_inventory(&self.infra, &state).await?;
        let hosts_file = ws.inventory_file();
        self.host
            .write(&hosts_file, &inventory.render())
            .context("failed to create inventory file")?;
        info!(inventory = %hosts_file.display(), "inventory written");

        let master = inventory
            .first_master()
            .map(str::to_string)
            .ok_or_else(|| PreconditionError::NoControlPlane {
                role: Role::Masters.to_string(),
            })?;

        let mut common = self.common.clone();
        common.extra_cert = inventory.hosts(Role::Masters).join(",");
        let payload = vars::extra_vars_payload(&common, &self.config.extra_vars)
            .context("failed to marshal common variables into JSON")?;
        debug!(
            overrides = ?self.config.extra_vars.keys().collect::<Vec<_>>(),
            "extra-vars payload prepared"
        );

        self.host
            .unpack(ws.path(), ANSIBLE_ASSETS)
            .context("failed to unpack the ansible code")?;
        let playbook = ws.join(&self.config.playbook);
        reporter.step(&format!("running playbook {}...", self.config.playbook));
        let status = self
            .playbook
            .run_playbook(&PlaybookSpec {
                inventory: &hosts_file,
                extra_vars: &payload,
                playbook: &playbook,
            })
            .await
            .context("failed to run ansible playbook")?;
        if !status.success() {
            return Err(PlaybookError::Failed {
                playbook: self.config.playbook.clone(),
                exit_code: status.code(),
            }
            .into());
        }
        reporter.success("kubernetes installed");

        let kubeconfig = if self.config.rewrite_kubeconfig {
            let path = self
                .rewrite_kubeconfig(&master)
                .context("failed to set kubeconfig")?;
            reporter.success(&format!("kubeconfig points at {master}"));
            Some(path)
        } else {
            None
        };

        Ok(UpOutcome {
            workspace: ws.path().to_path_buf(),
            inventory,
            apply_attempts,
            kubeconfig,
        })
    }

    fn dump_vars(&self, ws: &ClusterWorkspace) -> Result<Vec<PathBuf>> {
        Ok(vec![
            self.write_var_set(ws, &self.common)
                .context("failed to dump common flags")?,
            self.write_var_set(ws, &self.provider)
                .with_context(|| format!("failed to dump {} flags", self.provider.name()))?,
        ])
    }

    fn write_var_set(&self, ws: &ClusterWorkspace, set: &impl VariableSet) -> Result<PathBuf> {
        let path = ws.join(set.file_name());
        let json = set
            .to_tfvars_json()
            .context("converting variables to json")?;
        self.host.write(&path, &json)?;
        debug!(file = %path.display(), "variables written");
        Ok(path)
    }

    fn rewrite_kubeconfig(&self, host: &str) -> Result<PathBuf> {
        let path = PathBuf::from(&self.common.kubeconfig_path);
        if !self.host.exists(&path) {
            return Err(KubeconfigError::NotFound { path }.into());
        }
        let raw = self.host.read_to_string(&path)?;
        let (document, rewritten) = kubeconfig::rewrite_servers(&raw, host)?;
        self.host.write(&path, &document)?;
        info!(rewritten, host, kubeconfig = %path.display(), "kubeconfig servers rewritten");
        self.host
            .absolute(&path)
            .context("failed to create absolute path for the kubeconfig file")
    }

    // ── Down ──────────────────────────────────────────────────────────────────

    /// Destroy the infrastructure. Never retried.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails, or if destroy fails and
    /// `ignore_destroy_errors` is not set.
    pub async fn down(&self, reporter: &impl ProgressReporter) -> Result<()> {
        let ws = self.workspace().await.context("down failed to init")?;

        let var_files: Vec<PathBuf> = [self.common.file_name(), self.provider.file_name()]
            .into_iter()
            .map(|file| ws.join(file))
            .filter(|path| self.host.exists(path))
            .collect();
        let state = ws.state_file();
        let run = TerraformRun {
            dir: ws.path(),
            var_files: &var_files,
            state: &state,
            auto_approve: self.config.auto_approve,
        };

        reporter.step("destroying infrastructure...");
        let failure: Option<anyhow::Error> = match self.infra.destroy(&run).await {
            Ok(status) if status.success() => None,
            Ok(status) => Some(
                DestroyError::Failed {
                    exit_code: status.code(),
                }
                .into(),
            ),
            Err(e) => Some(e.context("running terraform destroy")),
        };

        match failure {
            None => {
                reporter.success("infrastructure destroyed");
                Ok(())
            }
            Some(err) if self.config.ignore_destroy_errors => {
                warn!(error = %format!("{err:#}"), "terraform destroy failed, ignoring");
                reporter.warn("terraform destroy failed, ignoring");
                Ok(())
            }
            Some(err) => Err(err.context("terraform destroy failed")),
        }
    }

    // ── Build ─────────────────────────────────────────────────────────────────

    /// Compile cluster binaries from the configured Kubernetes tree.
    ///
    /// Does not touch the workspace, so a standalone build leaves no cluster
    /// directory behind.
    ///
    /// # Errors
    ///
    /// Returns an error if no build is configured, `make` or the repo root is
    /// missing, or the build fails.
    pub async fn build(&self, reporter: &impl ProgressReporter) -> Result<()> {
        let build = self
            .config
            .build
            .as_ref()
            .context("build requested without a build configuration")?;
        if self.host.locate(MAKE).is_none() {
            return Err(PreconditionError::MissingTool {
                tool: MAKE.to_string(),
            }
            .into());
        }

        let repo_root = self.resolve_repo_root(build)?;
        let host = host_platform();
        reporter.step(&format!(
            "building kubernetes for {} in {}...",
            build.target_platform,
            repo_root.display()
        ));
        self.builder
            .build(&BuildSpec {
                repo_root: &repo_root,
                target_platform: &build.target_platform,
                host_platform: &host,
            })
            .await
            .context("build failed")?;
        reporter.success("build complete");
        Ok(())
    }
}

/// Leave the half-applied infrastructure in place and stop the process.
fn abandon(attempts: u32, exit_code: Option<i32>, state: &Path) -> ! {
    error!(
        attempts,
        exit_code,
        state = %state.display(),
        "terraform apply failed, look into it and delete the resources"
    );
    std::process::exit(1)
}
