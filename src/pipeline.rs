// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The reconciliation pipeline: one synchronous pass from declared rules to
//! an activated configuration.
//!
//! A pass runs start-to-finish with no internal concurrency:
//!
//! 1. Query the inventory collaborator for the live role list.
//! 2. Resolve each declared rule against it ([`crate::reconcile`]).
//! 3. If nothing resolved, stop; no file is written, nothing is signaled.
//! 4. Render the document ([`crate::render`]) and compare its digest with
//!    the persisted one; byte-identical content skips the rewrite and the
//!    service signal.
//! 5. Persist atomically, validate the written file, then start or reload
//!    the proxy depending on whether it is currently active.
//!
//! A pass either completes or fails outright; there is no mid-pass abort
//! and resume, and no retry. Callers must guarantee at most one pipeline
//! instance runs at a time: the canonical file is a single-writer resource
//! and no locking is performed here.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::activate::{
    content_digest, persist_config, persisted_digest, ServiceAction, ServiceController,
};
use crate::constants::{BASE_CONFIG, HAPROXY_CONFIG_PATH};
use crate::errors::SyncError;
use crate::inventory::InventorySource;
use crate::reconcile::{needs_reload, resolve};
use crate::render::render;
use crate::rules::ProxyRule;

/// Explicit pipeline configuration; no hidden global state.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Canonical path of the generated configuration file
    pub config_path: PathBuf,
    /// Preamble emitted ahead of the generated stanzas
    pub preamble: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(HAPROXY_CONFIG_PATH),
            preamble: BASE_CONFIG.to_string(),
        }
    }
}

/// How a completed pass left the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassDisposition {
    /// No rule resolved to running servers; nothing written, nothing signaled
    NoEligibleRules,
    /// Rendered content matched the persisted document; nothing signaled
    Unchanged,
    /// A new document was persisted, validated, and the transition applied
    Applied(ServiceAction),
}

/// Summary of one completed reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    /// Rules that resolved to at least one running server
    pub resolved: usize,
    /// Rules skipped with a warning
    pub skipped: usize,
    /// What the pass did with the rendered document
    pub disposition: PassDisposition,
}

/// One-shot reconciliation pipeline over pluggable collaborators.
pub struct Pipeline<I, C> {
    settings: Settings,
    inventory: I,
    controller: C,
}

impl<I, C> Pipeline<I, C>
where
    I: InventorySource,
    C: ServiceController,
{
    /// Build a pipeline from explicit settings and collaborators.
    pub fn new(settings: Settings, inventory: I, controller: C) -> Self {
        Self {
            settings,
            inventory,
            controller,
        }
    }

    /// Run one reconciliation pass over the given declared rules.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] on inventory query failure, persistence
    /// failure, syntax validation failure, or a failed service transition.
    /// Per-rule resolution problems are warnings, not errors.
    pub fn run(&self, rules: &[ProxyRule]) -> Result<PassOutcome, SyncError> {
        let roles = self.inventory.list_roles()?;

        let resolved = resolve(rules, &roles);
        let skipped = rules.len() - resolved.len();

        if !needs_reload(&resolved) {
            info!("no rules resolved to running servers, nothing to do");
            return Ok(PassOutcome {
                resolved: 0,
                skipped,
                disposition: PassDisposition::NoEligibleRules,
            });
        }

        let rendered = render(&self.settings.preamble, &resolved);
        let digest = content_digest(&rendered);

        if persisted_digest(&self.settings.config_path).as_deref() == Some(digest.as_str()) {
            info!(
                path = %self.settings.config_path.display(),
                "rendered configuration matches the persisted document, skipping reload"
            );
            return Ok(PassOutcome {
                resolved: resolved.len(),
                skipped,
                disposition: PassDisposition::Unchanged,
            });
        }

        debug!(digest = %digest, "persisting rendered configuration");
        persist_config(&self.settings.config_path, &rendered)?;

        // Validation must precede any service signal so an invalid document
        // is never activated. It runs against the durably written file,
        // which leaves a failed document on disk for diagnosis.
        self.controller.validate(&self.settings.config_path)?;

        let action = if self.controller.is_active() {
            ServiceAction::Reload
        } else {
            ServiceAction::Start
        };
        self.controller.apply(action)?;

        info!(
            action = %action,
            resolved = resolved.len(),
            skipped,
            "configuration activated"
        );
        Ok(PassOutcome {
            resolved: resolved.len(),
            skipped,
            disposition: PassDisposition::Applied(action),
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod pipeline_tests;
