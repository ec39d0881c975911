// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for haproxy-sync.
//!
//! This module provides specialized error types for:
//! - Loading and validating the declared rule set
//! - Querying the upstream role inventory
//! - Persisting, validating, and activating a rendered configuration
//!
//! Per-rule resolution problems (missing alias, ambiguous alias, no running
//! servers) are deliberately NOT errors: they are warnings logged during
//! reconciliation, and the pass continues with the remaining rules.

use std::path::PathBuf;

use thiserror::Error;

use crate::activate::ServiceAction;
use crate::constants::{EXIT_ACTIVATION_FAILED, EXIT_BAD_RULE_SET, EXIT_INVENTORY_FAILED};

/// Errors raised while loading and validating the declared rule set.
///
/// All of these are fatal configuration errors: the pass aborts before any
/// inventory query or file mutation takes place.
#[derive(Error, Debug)]
pub enum RuleSetError {
    /// The environment variable holding the rule set is absent.
    #[error("no proxy configuration found in ${variable}")]
    Missing {
        /// Name of the environment variable that was consulted
        variable: String,
    },

    /// The rule set is present but is not valid JSON of the expected shape.
    #[error("malformed proxy configuration: {reason}")]
    Malformed {
        /// Decoder message explaining what failed to parse
        reason: String,
    },

    /// A rule declares an empty name.
    ///
    /// Generated block identifiers are derived from the rule name, so an
    /// empty name cannot produce a usable frontend/backend pair.
    #[error("rule at position {position} has an empty name")]
    EmptyName {
        /// Zero-based position of the offending rule in the declared sequence
        position: usize,
    },

    /// A listen or upstream port is outside the valid range.
    #[error("rule '{rule}' declares invalid port {port}")]
    InvalidPort {
        /// Name of the offending rule
        rule: String,
        /// The rejected port value
        port: u16,
    },

    /// Two rule names collapse to the same generated block identifier.
    #[error("rules '{first}' and '{second}' collide on generated name '{slug}'")]
    NameCollision {
        /// Name of the rule that claimed the identifier first
        first: String,
        /// Name of the rule that collided with it
        second: String,
        /// The shared slug both names reduce to
        slug: String,
    },
}

/// Errors raised while querying the upstream role inventory.
///
/// Reconciliation cannot proceed without inventory, so all of these abort
/// the pass before any rendering or file mutation.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The inventory command could not be spawned at all.
    #[error("failed to invoke {command}: {source}")]
    Spawn {
        /// The command that could not be started
        command: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The inventory command ran but reported failure.
    #[error("{command} exited with {status}: {stderr}")]
    Query {
        /// The command that failed
        command: String,
        /// Exit status as reported by the OS
        status: String,
        /// Captured standard error output
        stderr: String,
    },

    /// The role list returned by the collaborator could not be decoded.
    #[error("unparseable role list from {command}: {source}")]
    Decode {
        /// The command whose output failed to decode
        command: String,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while persisting or activating a rendered configuration.
///
/// These occur after reconciliation succeeded. Validation failures happen
/// with the document already durably written (so the failure is diagnosable
/// on disk) but before any service signal is sent.
#[derive(Error, Debug)]
pub enum ActivationError {
    /// Copying the previous configuration aside failed.
    #[error("failed to back up {path}: {source}")]
    Backup {
        /// The canonical configuration path being backed up
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Persisting the rendered document failed.
    #[error("failed to write configuration to {path}: {source}")]
    Persist {
        /// The canonical configuration path
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The proxy engine rejected the rendered document.
    #[error("configuration {path} failed validation: {detail}")]
    Validation {
        /// Path of the document that failed the syntax check
        path: PathBuf,
        /// Validator exit status and captured output
        detail: String,
    },

    /// The service transition command failed.
    #[error("service {action} failed: {detail}")]
    Service {
        /// The transition that was attempted
        action: ServiceAction,
        /// Service-manager exit status and captured output
        detail: String,
    },
}

/// Composite error type for a reconciliation pass.
///
/// This is the error returned by the pipeline entry point; each category
/// maps to a distinct process exit code.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Declared rule set missing or malformed
    #[error(transparent)]
    RuleSet(#[from] RuleSetError),

    /// Inventory query failure
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Persistence, validation, or service-transition failure
    #[error(transparent)]
    Activation(#[from] ActivationError),
}

impl SyncError {
    /// Process exit code for this error category.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RuleSet(_) => EXIT_BAD_RULE_SET,
            Self::Inventory(_) => EXIT_INVENTORY_FAILED,
            Self::Activation(_) => EXIT_ACTIVATION_FAILED,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
