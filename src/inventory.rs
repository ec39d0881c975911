// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Upstream role inventory types and the inventory query collaborator.
//!
//! The inventory answers "which server roles exist and what is their
//! status". It is external, racy state: hosts appear, disappear, and change
//! status between passes. Reconciliation treats the returned role list as
//! read-only.
//!
//! The production source shells out to `szradm queryenv --format=json
//! list-roles` and decodes its JSON output. Everything else in the crate
//! depends only on the [`InventorySource`] trait so tests can substitute a
//! fake.

use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::constants::{RUNNING_STATUS, SZRADM_BINARY};
use crate::errors::InventoryError;

/// Lifecycle status of one upstream host.
///
/// Only `Running` hosts are eligible backend servers. Any other status the
/// registry reports is preserved verbatim for log messages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum HostStatus {
    /// Host is up and may receive traffic
    Running,
    /// Any other lifecycle state (pending, terminated, ...)
    Other(String),
}

impl From<String> for HostStatus {
    fn from(raw: String) -> Self {
        if raw == RUNNING_STATUS {
            Self::Running
        } else {
            Self::Other(raw)
        }
    }
}

impl HostStatus {
    /// Whether this host is eligible to receive traffic.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// One discovered server inside a role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamHost {
    /// Position of the host within its role; unique per role
    pub index: u64,
    /// Address backend traffic is sent to
    #[serde(rename = "internal-ip")]
    pub internal_ip: String,
    /// Current lifecycle status
    pub status: HostStatus,
}

/// One discovered role: a named group of servers performing the same function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamRole {
    /// Join key matched against `ProxyRule.upstream.alias`
    pub alias: String,
    /// Opaque registry identifier; emitted as a number or string depending
    /// on the registry version, never interpreted here
    #[serde(default)]
    pub id: serde_json::Value,
    /// Discovered hosts, in registry order
    #[serde(default)]
    pub hosts: Vec<UpstreamHost>,
}

/// Wire shape of the collaborator's `list-roles` response.
#[derive(Debug, Deserialize)]
pub struct RoleList {
    /// All discovered roles
    #[serde(default)]
    pub roles: Vec<UpstreamRole>,
}

/// Source of the live upstream role inventory.
pub trait InventorySource {
    /// List all discovered roles and their hosts.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] if the collaborator cannot be reached,
    /// reports failure, or produces an undecodable role list. All of these
    /// are fatal to the pass; reconciliation cannot proceed without
    /// inventory.
    fn list_roles(&self) -> Result<Vec<UpstreamRole>, InventoryError>;
}

/// Inventory source backed by the `szradm` agent binary.
#[derive(Debug, Clone)]
pub struct SzradmInventory {
    binary: PathBuf,
}

impl SzradmInventory {
    /// Create an inventory source invoking the given binary.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command_label(&self) -> String {
        self.binary.display().to_string()
    }
}

impl Default for SzradmInventory {
    fn default() -> Self {
        Self::new(SZRADM_BINARY)
    }
}

impl InventorySource for SzradmInventory {
    fn list_roles(&self) -> Result<Vec<UpstreamRole>, InventoryError> {
        debug!(command = %self.command_label(), "querying live role inventory");

        let output = Command::new(&self.binary)
            .args(["queryenv", "--format=json", "list-roles"])
            .output()
            .map_err(|source| InventoryError::Spawn {
                command: self.command_label(),
                source,
            })?;

        if !output.status.success() {
            return Err(InventoryError::Query {
                command: self.command_label(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let parsed: RoleList =
            serde_json::from_slice(&output.stdout).map_err(|source| InventoryError::Decode {
                command: self.command_label(),
                source,
            })?;

        debug!(roles = parsed.roles.len(), "inventory query complete");
        Ok(parsed.roles)
    }
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod inventory_tests;
