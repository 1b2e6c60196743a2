//! Kubeconfig server endpoint rewriting.
//!
//! Pure functions only: no I/O, no async, no filesystem access. The document
//! is handled as a generic YAML tree so fields this module does not touch
//! (users, contexts, certificate data) survive the round trip.

use serde_yaml::Value;
use url::Url;

use crate::domain::error::KubeconfigError;

/// Environment variable downstream tooling reads to locate the kubeconfig.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Replace the host of a `scheme://host:port` URL, keeping scheme, port,
/// userinfo and path exactly as written.
///
/// IPv6 replacement hosts are bracketed.
///
/// # Errors
///
/// Returns an error if `raw` does not parse as a URL or carries no explicit port.
pub fn rewrite_server_url(raw: &str, host: &str) -> Result<String, KubeconfigError> {
    Url::parse(raw).map_err(|e| KubeconfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    let authority_start = raw
        .find("://")
        .map(|i| i + 3)
        .ok_or_else(|| KubeconfigError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing authority".to_string(),
        })?;
    let rest = &raw[authority_start..];
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_len];
    let host_start = authority.rfind('@').map_or(0, |i| i + 1);

    let port = split_port(&authority[host_start..]).ok_or_else(|| KubeconfigError::MissingPort {
        url: raw.to_string(),
    })?;

    Ok(format!(
        "{}{}{}{}",
        &raw[..authority_start],
        &authority[..host_start],
        join_host_port(host, port),
        &rest[authority_len..]
    ))
}

/// Port component of `host:port` or `[v6]:port`.
fn split_port(host_port: &str) -> Option<&str> {
    let port = if let Some(bracketed) = host_port.strip_prefix('[') {
        let (_, after) = bracketed.split_once(']')?;
        after.strip_prefix(':')?
    } else {
        let (host, port) = host_port.rsplit_once(':')?;
        if host.contains(':') {
            return None;
        }
        port
    };
    (!port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())).then_some(port)
}

fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Point every cluster entry of a kubeconfig document at `host`.
///
/// Returns the re-serialized document and the number of servers rewritten.
///
/// # Errors
///
/// Returns an error if the document is not YAML, a cluster entry has no
/// server, or any server URL cannot be rewritten.
pub fn rewrite_servers(document: &str, host: &str) -> Result<(String, usize), KubeconfigError> {
    let mut root: Value =
        serde_yaml::from_str(document).map_err(|e| KubeconfigError::Parse(e.to_string()))?;

    let mut rewritten = 0;
    if let Some(clusters) = root.get_mut("clusters").and_then(Value::as_sequence_mut) {
        for entry in clusters {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>")
                .to_string();
            let server = entry
                .get_mut("cluster")
                .and_then(|c| c.get_mut("server"))
                .ok_or_else(|| KubeconfigError::MissingServer {
                    cluster: name.clone(),
                })?;
            let current = server
                .as_str()
                .ok_or(KubeconfigError::MissingServer { cluster: name })?;
            let updated = rewrite_server_url(current, host)?;
            *server = Value::String(updated);
            rewritten += 1;
        }
    }

    let out = serde_yaml::to_string(&root).map_err(|e| KubeconfigError::Parse(e.to_string()))?;
    Ok((out, rewritten))
}
