//! Ansible host inventory built from terraform outputs.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::fmt;

use serde_json::Value;

use crate::domain::error::InventoryError;

/// File name of the rendered inventory inside the workspace.
pub const INVENTORY_FILE: &str = "hosts";

/// Machine role, in the order roles appear in the inventory document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Masters,
    Workers,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 2] = [Role::Masters, Role::Workers];

    /// Name used both as the terraform output key and as the inventory section.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Masters => "masters",
            Role::Workers => "workers",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provisioned machine addresses partitioned by role, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    masters: Vec<String>,
    workers: Vec<String>,
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an address to the given role.
    pub fn add_machine(&mut self, role: Role, address: impl Into<String>) {
        self.hosts_mut(role).push(address.into());
    }

    /// Append every address to the given role, keeping order.
    pub fn extend(&mut self, role: Role, addresses: impl IntoIterator<Item = String>) {
        self.hosts_mut(role).extend(addresses);
    }

    /// Addresses recorded for `role`.
    #[must_use]
    pub fn hosts(&self, role: Role) -> &[String] {
        match role {
            Role::Masters => &self.masters,
            Role::Workers => &self.workers,
        }
    }

    /// First control-plane address, if any was discovered.
    #[must_use]
    pub fn first_master(&self) -> Option<&str> {
        self.masters.first().map(String::as_str)
    }

    fn hosts_mut(&mut self, role: Role) -> &mut Vec<String> {
        match role {
            Role::Masters => &mut self.masters,
            Role::Workers => &mut self.workers,
        }
    }

    /// Render the two-section inventory document.
    ///
    /// Each section is `[role]`, one address per line, then a blank line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, role) in Role::ALL.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push('[');
            out.push_str(role.as_str());
            out.push_str("]\n");
            for host in self.hosts(*role) {
                out.push_str(host);
                out.push('\n');
            }
        }
        out.push('\n');
        out
    }
}

/// Parse `terraform output -json <role>` stdout into a list of addresses.
///
/// The value must be a JSON array of strings. `null` (output declared but
/// empty) is treated as an empty list.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON, not an array, or contain a
/// non-string entry.
pub fn parse_role_output(role: Role, stdout: &[u8]) -> Result<Vec<String>, InventoryError> {
    let value: Value =
        serde_json::from_slice(stdout).map_err(|e| InventoryError::Malformed {
            role: role.to_string(),
            reason: e.to_string(),
        })?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(InventoryError::Malformed {
                role: role.to_string(),
                reason: format!("expected a list of addresses, got {other}"),
            });
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(s) => Ok(s),
            _ => Err(InventoryError::NonStringEntry {
                role: role.to_string(),
                index,
            }),
        })
        .collect()
}
