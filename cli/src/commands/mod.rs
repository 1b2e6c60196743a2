//! Command implementations and the flags they share.

pub mod build;
pub mod down;
pub mod up;
pub mod version;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::domain::config::{
    BuildConfig, DEFAULT_APPLY_RETRIES, DEFAULT_PLAYBOOK, DeployerConfig, host_platform,
    parse_key_value,
};
use crate::domain::vars::{CommonVars, PowerVsVars, ProviderVars, VpcVars};
use crate::domain::workspace::{generate_bootstrap_token, generate_cluster_name};

/// Kubeconfig file name inside the workspace, used when no path is given.
pub const DEFAULT_KUBECONFIG_NAME: &str = "kubeconfig";

/// Infrastructure backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// IBM Cloud Power Virtual Server
    #[default]
    Powervs,
    /// IBM Cloud VPC
    Vpc,
}

/// Flags shared by `up`, `down` and `build`.
#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Infrastructure backend to provision on
    #[arg(long, value_enum, default_value_t = Provider::Powervs, env = "KUBETEST2_TF_PROVIDER")]
    pub provider: Provider,

    /// Directory the cluster workspace is created in
    #[arg(long, default_value = ".")]
    pub workspace_root: PathBuf,

    /// Extra terraform apply attempts after a failure
    #[arg(long, default_value_t = DEFAULT_APPLY_RETRIES)]
    pub retry_on_tf_failure: u32,

    /// Terraform auto approve
    #[arg(long)]
    pub auto_approve: bool,

    /// Ignore the cluster folder if it exists
    #[arg(long, hide = true)]
    pub ignore_cluster_dir: bool,

    /// Exit the process when terraform apply keeps failing
    #[arg(long)]
    pub break_kubetest_on_upfail: bool,

    /// Log terraform destroy failures instead of failing
    #[arg(long)]
    pub ignore_destroy_errors: bool,

    /// Extra vars for the ansible playbook (key=value, comma separated)
    #[arg(long, value_parser = parse_key_value, value_delimiter = ',')]
    pub extra_vars: Vec<(String, String)>,

    /// Name of the ansible playbook to run
    #[arg(long, default_value = DEFAULT_PLAYBOOK)]
    pub playbook: String,

    /// Leave the kubeconfig untouched after install
    #[arg(long)]
    pub no_kubeconfig_rewrite: bool,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub powervs: PowerVsArgs,

    #[command(flatten)]
    pub vpc: VpcArgs,
}

/// Variables shared by every backend.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Cluster and workspace name (generated when empty)
    #[arg(long, env = "CLUSTER_NAME", default_value = "")]
    pub cluster_name: String,

    /// Kubernetes release marker to install
    #[arg(long, default_value = "ci/latest")]
    pub release_marker: String,

    /// Kubernetes build version to install
    #[arg(long, default_value = "")]
    pub build_version: String,

    /// API server port
    #[arg(long, default_value_t = 6443)]
    pub apiserver_port: u16,

    /// Number of worker nodes
    #[arg(long, default_value_t = 1)]
    pub workers_count: u32,

    /// kubeadm bootstrap token (generated when empty)
    #[arg(long, env = "BOOTSTRAP_TOKEN", default_value = "", hide_env_values = true)]
    pub bootstrap_token: String,

    /// Kubeconfig written by the playbook (default: <workspace>/kubeconfig)
    #[arg(long)]
    pub kubeconfig_path: Option<PathBuf>,

    /// SSH private key used to reach the nodes
    #[arg(long, default_value = "")]
    pub ssh_private_key: String,

    /// Container runtime
    #[arg(long, default_value = "containerd")]
    pub runtime: String,
}

/// IBM Cloud Power Virtual Server variables.
#[derive(Args, Debug, Clone)]
pub struct PowerVsArgs {
    /// IBM Cloud resource group name (command: ibmcloud resource groups)
    #[arg(long, default_value = "Default")]
    pub powervs_resource_group: String,

    /// IBM Cloud DNS name (command: ibmcloud dns instances)
    #[arg(long, default_value = "")]
    pub powervs_dns: String,

    /// IBM Cloud DNS zone name (command: ibmcloud dns zones)
    #[arg(long, default_value = "")]
    pub powervs_dns_zone: String,

    /// IBM Cloud API key used for accessing the APIs
    #[arg(long, env = "POWERVS_API_KEY", default_value = "", hide_env_values = true)]
    pub powervs_api_key: String,

    /// IBM Cloud `PowerVS` region name
    #[arg(long, default_value = "")]
    pub powervs_region: String,

    /// IBM Cloud `PowerVS` zone name
    #[arg(long, default_value = "")]
    pub powervs_zone: String,

    /// `PowerVS` service instance ID (command: ibmcloud resource service-instances --long)
    #[arg(long, default_value = "")]
    pub powervs_service_id: String,

    /// Network name (command: ibmcloud pi subnet ls)
    #[arg(long, default_value = "")]
    pub powervs_network_name: String,

    /// Image name (command: ibmcloud pi img ls)
    #[arg(long, default_value = "")]
    pub powervs_image_name: String,

    /// Memory in GBs
    #[arg(long, default_value_t = 8.0)]
    pub powervs_memory: f64,

    /// Processor units
    #[arg(long, default_value_t = 0.5)]
    pub powervs_processors: f64,

    /// SSH key to authenticate LPARs
    #[arg(long, default_value = "")]
    pub powervs_ssh_key: String,
}

/// IBM Cloud VPC variables.
#[derive(Args, Debug, Clone)]
pub struct VpcArgs {
    /// IBM Cloud VPC name
    #[arg(long, default_value = "")]
    pub vpc_name: String,

    /// IBM Cloud VPC subnet
    #[arg(long, default_value = "")]
    pub vpc_subnet: String,

    /// IBM Cloud API key used for accessing the APIs
    #[arg(long, env = "VPC_API_KEY", default_value = "", hide_env_values = true)]
    pub vpc_api_key: String,

    /// SSH key to authenticate VSIs
    #[arg(long, default_value = "")]
    pub vpc_ssh_key: String,

    /// IBM Cloud VPC region name
    #[arg(long, default_value = "")]
    pub vpc_region: String,

    /// IBM Cloud VPC zone name
    #[arg(long, default_value = "")]
    pub vpc_zone: String,

    /// IBM Cloud resource group name (command: ibmcloud resource groups)
    #[arg(long, default_value = "Default")]
    pub vpc_resource_group: String,

    /// Image name (command: ibmcloud is images)
    #[arg(long, default_value = "")]
    pub vpc_node_image_name: String,

    /// Instance profile for the virtual servers (command: ibmcloud is instance-profiles)
    #[arg(long, default_value = "")]
    pub vpc_node_profile: String,
}

/// Flags for compiling Kubernetes.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Kubernetes source tree (default: current directory)
    #[arg(long)]
    pub repo_root: Option<PathBuf>,

    /// Platform to build for, e.g. linux/ppc64le (default: host platform)
    #[arg(long)]
    pub target_build_arch: Option<String>,
}

impl BuildArgs {
    #[must_use]
    pub fn to_config(&self) -> BuildConfig {
        BuildConfig {
            repo_root: self.repo_root.clone(),
            target_platform: self
                .target_build_arch
                .clone()
                .unwrap_or_else(host_platform),
        }
    }
}

/// Everything a deployer is constructed from.
pub struct DeployParts {
    pub config: DeployerConfig,
    pub common: CommonVars,
    pub provider: ProviderVars,
}

impl DeployArgs {
    /// Map flags onto the deployer's configuration and variable sets.
    ///
    /// Fills in a generated cluster name and bootstrap token when absent.
    #[must_use]
    pub fn into_parts(self, build: Option<BuildConfig>) -> DeployParts {
        let cluster_name = non_empty_or(self.common.cluster_name, generate_cluster_name);
        let bootstrap_token = non_empty_or(self.common.bootstrap_token, generate_bootstrap_token);
        let kubeconfig_path = self.common.kubeconfig_path.unwrap_or_else(|| {
            self.workspace_root
                .join(&cluster_name)
                .join(DEFAULT_KUBECONFIG_NAME)
        });

        let common = CommonVars {
            release_marker: self.common.release_marker,
            build_version: self.common.build_version,
            cluster_name,
            api_server_port: self.common.apiserver_port,
            workers_count: self.common.workers_count,
            bootstrap_token,
            kubeconfig_path: kubeconfig_path.display().to_string(),
            ssh_private_key: self.common.ssh_private_key,
            runtime: self.common.runtime,
            extra_cert: String::new(),
        };

        let provider = match self.provider {
            Provider::Powervs => ProviderVars::PowerVs(self.powervs.into_vars()),
            Provider::Vpc => ProviderVars::Vpc(self.vpc.into_vars()),
        };

        let config = DeployerConfig {
            workspace_root: self.workspace_root,
            apply_retries: self.retry_on_tf_failure,
            auto_approve: self.auto_approve,
            ignore_cluster_dir: self.ignore_cluster_dir,
            break_on_apply_failure: self.break_kubetest_on_upfail,
            ignore_destroy_errors: self.ignore_destroy_errors,
            extra_vars: self.extra_vars.into_iter().collect::<BTreeMap<_, _>>(),
            playbook: self.playbook,
            rewrite_kubeconfig: !self.no_kubeconfig_rewrite,
            build,
        };

        DeployParts {
            config,
            common,
            provider,
        }
    }
}

impl PowerVsArgs {
    fn into_vars(self) -> PowerVsVars {
        PowerVsVars {
            resource_group: self.powervs_resource_group,
            dns_name: self.powervs_dns,
            dns_zone: self.powervs_dns_zone,
            api_key: api_key_or_fallback(self.powervs_api_key),
            region: self.powervs_region,
            zone: self.powervs_zone,
            service_id: self.powervs_service_id,
            network_name: self.powervs_network_name,
            image_name: self.powervs_image_name,
            memory: self.powervs_memory,
            processors: self.powervs_processors,
            ssh_key: self.powervs_ssh_key,
        }
    }
}

impl VpcArgs {
    fn into_vars(self) -> VpcVars {
        VpcVars {
            vpc_name: self.vpc_name,
            subnet_name: self.vpc_subnet,
            api_key: api_key_or_fallback(self.vpc_api_key),
            ssh_key: self.vpc_ssh_key,
            region: self.vpc_region,
            zone: self.vpc_zone,
            resource_group: self.vpc_resource_group,
            node_image_name: self.vpc_node_image_name,
            node_profile: self.vpc_node_profile,
        }
    }
}

/// Environment variable consulted when no provider-specific API key is set.
pub const IBMCLOUD_API_KEY_ENV: &str = "IBMCLOUD_API_KEY";

fn api_key_or_fallback(key: String) -> String {
    if key.is_empty() {
        std::env::var(IBMCLOUD_API_KEY_ENV).unwrap_or_default()
    } else {
        key
    }
}

fn non_empty_or(value: String, generate: impl FnOnce() -> String) -> String {
    if value.is_empty() { generate() } else { value }
}
