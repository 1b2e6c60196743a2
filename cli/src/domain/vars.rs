//! Terraform variable sets and the ansible `--extra-vars` payload.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Suffix terraform uses to auto-load a JSON variable file.
pub const TFVARS_SUFFIX: &str = ".auto.tfvars.json";

/// Name of the shared variable set's file stem.
pub const COMMON_VARS_NAME: &str = "common";

// ── Variable sets ────────────────────────────────────────────────────────────

/// A typed variable set destined for one `<name>.auto.tfvars.json` file.
pub trait VariableSet: Serialize {
    /// File stem, e.g. `"powervs"`.
    fn name(&self) -> &str;

    /// File name terraform picks up, e.g. `"powervs.auto.tfvars.json"`.
    fn file_name(&self) -> String {
        format!("{}{TFVARS_SUFFIX}", self.name())
    }

    /// Indented JSON contents of the variable file.
    ///
    /// # Errors
    ///
    /// Returns an error if the set cannot be serialized.
    fn to_tfvars_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Variables shared by every provider and handed to the ansible playbook.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommonVars {
    pub release_marker: String,
    pub build_version: String,
    pub cluster_name: String,
    #[serde(rename = "apiserver_port")]
    pub api_server_port: u16,
    pub workers_count: u32,
    pub bootstrap_token: String,
    pub kubeconfig_path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ssh_private_key: String,
    pub runtime: String,
    /// Comma-separated control-plane addresses added as API server SANs.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extra_cert: String,
}

impl Default for CommonVars {
    fn default() -> Self {
        Self {
            release_marker: "ci/latest".to_string(),
            build_version: String::new(),
            cluster_name: String::new(),
            api_server_port: 6443,
            workers_count: 1,
            bootstrap_token: String::new(),
            kubeconfig_path: String::new(),
            ssh_private_key: String::new(),
            runtime: "containerd".to_string(),
            extra_cert: String::new(),
        }
    }
}

impl VariableSet for CommonVars {
    fn name(&self) -> &str {
        COMMON_VARS_NAME
    }
}

/// IBM Cloud Power Virtual Server variables.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PowerVsVars {
    #[serde(rename = "powervs_resource_group")]
    pub resource_group: String,
    #[serde(rename = "powervs_dns")]
    pub dns_name: String,
    #[serde(rename = "powervs_dns_zone")]
    pub dns_zone: String,
    #[serde(rename = "powervs_api_key", skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    #[serde(rename = "powervs_region")]
    pub region: String,
    #[serde(rename = "powervs_zone")]
    pub zone: String,
    #[serde(rename = "powervs_service_id")]
    pub service_id: String,
    #[serde(rename = "powervs_network_name")]
    pub network_name: String,
    #[serde(rename = "powervs_image_name")]
    pub image_name: String,
    /// Memory in GB.
    #[serde(rename = "powervs_memory")]
    pub memory: f64,
    /// Processor units (fractional).
    #[serde(rename = "powervs_processors")]
    pub processors: f64,
    #[serde(rename = "powervs_ssh_key")]
    pub ssh_key: String,
}

impl Default for PowerVsVars {
    fn default() -> Self {
        Self {
            resource_group: "Default".to_string(),
            dns_name: String::new(),
            dns_zone: String::new(),
            api_key: String::new(),
            region: String::new(),
            zone: String::new(),
            service_id: String::new(),
            network_name: String::new(),
            image_name: String::new(),
            memory: 8.0,
            processors: 0.5,
            ssh_key: String::new(),
        }
    }
}

/// IBM Cloud VPC variables.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VpcVars {
    pub vpc_name: String,
    #[serde(rename = "vpc_subnet_name")]
    pub subnet_name: String,
    #[serde(rename = "vpc_api_key", skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    #[serde(rename = "vpc_ssh_key")]
    pub ssh_key: String,
    #[serde(rename = "vpc_region")]
    pub region: String,
    #[serde(rename = "vpc_zone")]
    pub zone: String,
    #[serde(rename = "vpc_resource_group")]
    pub resource_group: String,
    #[serde(rename = "node_image")]
    pub node_image_name: String,
    #[serde(rename = "node_profile")]
    pub node_profile: String,
}

impl Default for VpcVars {
    fn default() -> Self {
        Self {
            vpc_name: String::new(),
            subnet_name: String::new(),
            api_key: String::new(),
            ssh_key: String::new(),
            region: String::new(),
            zone: String::new(),
            resource_group: "Default".to_string(),
            node_image_name: String::new(),
            node_profile: String::new(),
        }
    }
}

/// Backend-specific variable set. Serializes as the inner struct.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ProviderVars {
    PowerVs(PowerVsVars),
    Vpc(VpcVars),
}

impl VariableSet for ProviderVars {
    fn name(&self) -> &str {
        match self {
            Self::PowerVs(_) => "powervs",
            Self::Vpc(_) => "vpc",
        }
    }
}

// ── Extra-vars merge ─────────────────────────────────────────────────────────

/// Serialize `base` into a JSON object and overlay `extra` on top of it.
///
/// Last write wins per key: a user-supplied key always replaces a generated
/// one of the same name. Keys not present in `extra` are kept untouched.
///
/// # Errors
///
/// Returns an error if `base` cannot be serialized or is not a JSON object.
pub fn merge_extra_vars<T: Serialize>(
    base: &T,
    extra: &BTreeMap<String, String>,
) -> serde_json::Result<Map<String, Value>> {
    let mut merged = match serde_json::to_value(base)? {
        Value::Object(map) => map,
        other => {
            return Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "variable set must serialize to a JSON object, got {other}"
            )));
        }
    };
    for (key, value) in extra {
        merged.insert(key.clone(), Value::String(value.clone()));
    }
    Ok(merged)
}

/// Render the merged payload as the single-line JSON passed to `--extra-vars`.
///
/// # Errors
///
/// Returns an error if the merge or final serialization fails.
pub fn extra_vars_payload<T: Serialize>(
    base: &T,
    extra: &BTreeMap<String, String>,
) -> serde_json::Result<String> {
    serde_json::to_string(&merge_extra_vars(base, extra)?)
}
