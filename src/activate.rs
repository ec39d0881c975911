// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration persistence and proxy activation.
//!
//! The canonical configuration file is a single-writer resource. Persistence
//! writes the rendered document to a temporary file in the same directory
//! and renames it over the canonical path, so the proxy engine's validation
//! step and any concurrent reload never observe a partially written
//! document. The previous document, when present, is copied aside first.
//!
//! Service interaction goes through the [`ServiceController`] trait:
//! a syntax check of the written file, a liveness probe, and the
//! start-or-reload transition. The production implementation shells out to
//! the `haproxy` binary and the system service manager.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::constants::{BACKUP_EXTENSION, HAPROXY_BINARY, HAPROXY_SERVICE, SERVICE_BINARY};
use crate::errors::ActivationError;

/// Service lifecycle transition applied after a validated persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    /// Launch the proxy process fresh (it is not currently running)
    Start,
    /// Re-read configuration into the already-running proxy process
    Reload,
}

impl ServiceAction {
    /// The service-manager verb for this transition.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Reload => "reload",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control surface of the target proxy engine.
pub trait ServiceController {
    /// Syntax-check the written document with the target engine.
    ///
    /// Must fail loudly before any service signal is sent; an invalid
    /// configuration is never activated.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError::Validation`] when the engine rejects the
    /// document or the validator cannot be invoked.
    fn validate(&self, path: &Path) -> Result<(), ActivationError>;

    /// Whether the proxy process is currently active.
    fn is_active(&self) -> bool;

    /// Apply a lifecycle transition.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError::Service`] when the transition command
    /// fails or cannot be invoked.
    fn apply(&self, action: ServiceAction) -> Result<(), ActivationError>;
}

/// Controller driving a system-managed HAProxy instance.
#[derive(Debug, Clone)]
pub struct HaproxyController {
    haproxy: PathBuf,
    service: PathBuf,
    unit: String,
}

impl HaproxyController {
    /// Create a controller from collaborator binaries and the service unit.
    #[must_use]
    pub fn new(haproxy: impl Into<PathBuf>, service: impl Into<PathBuf>, unit: impl Into<String>) -> Self {
        Self {
            haproxy: haproxy.into(),
            service: service.into(),
            unit: unit.into(),
        }
    }
}

impl Default for HaproxyController {
    fn default() -> Self {
        Self::new(HAPROXY_BINARY, SERVICE_BINARY, HAPROXY_SERVICE)
    }
}

impl ServiceController for HaproxyController {
    fn validate(&self, path: &Path) -> Result<(), ActivationError> {
        debug!(path = %path.display(), "checking configuration syntax");

        let output = Command::new(&self.haproxy)
            .arg("-f")
            .arg(path)
            .arg("-c")
            .output()
            .map_err(|source| ActivationError::Validation {
                path: path.to_path_buf(),
                detail: source.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ActivationError::Validation {
                path: path.to_path_buf(),
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }

    fn is_active(&self) -> bool {
        Command::new(&self.service)
            .arg(&self.unit)
            .arg("status")
            .output()
            .map_or(false, |output| output.status.success())
    }

    fn apply(&self, action: ServiceAction) -> Result<(), ActivationError> {
        info!(service = %self.unit, action = %action, "applying service transition");

        let output = Command::new(&self.service)
            .arg(&self.unit)
            .arg(action.as_str())
            .output()
            .map_err(|source| ActivationError::Service {
                action,
                detail: source.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ActivationError::Service {
                action,
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}

/// Atomically persist the rendered document at the canonical path.
///
/// An existing document is first copied to `<path>.bak`. The new content is
/// written to a temporary file in the same directory and renamed over the
/// canonical path, which keeps the replacement atomic on the same
/// filesystem.
///
/// # Errors
///
/// Returns [`ActivationError::Backup`] or [`ActivationError::Persist`] on
/// I/O failure.
pub fn persist_config(path: &Path, contents: &str) -> Result<(), ActivationError> {
    if path.exists() {
        let backup = backup_path(path);
        debug!(path = %path.display(), backup = %backup.display(), "backing up previous configuration");
        fs::copy(path, &backup).map_err(|source| ActivationError::Backup {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| ActivationError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.write_all(contents.as_bytes())
        .map_err(|source| ActivationError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
    tmp.persist(path).map_err(|e| ActivationError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    debug!(path = %path.display(), bytes = contents.len(), "configuration persisted");
    Ok(())
}

/// Path the previous document is copied to before replacement.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(BACKUP_EXTENSION);
    PathBuf::from(raw)
}

/// SHA-256 digest of a rendered document, as lowercase hex.
#[must_use]
pub fn content_digest(contents: &str) -> String {
    format!("{:x}", Sha256::digest(contents.as_bytes()))
}

/// Digest of the currently persisted document, if one exists and is readable.
#[must_use]
pub fn persisted_digest(path: &Path) -> Option<String> {
    fs::read(path)
        .ok()
        .map(|bytes| format!("{:x}", Sha256::digest(&bytes)))
}

#[cfg(test)]
#[path = "activate_tests.rs"]
mod activate_tests;
