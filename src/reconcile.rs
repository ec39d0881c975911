// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of declared rules against live inventory.
//!
//! For each declared rule this module resolves the upstream role by alias,
//! filters its hosts to the ones actually running, and decides whether the
//! rule contributes to the rendered configuration. Partial success is the
//! normal mode: a rule that cannot be resolved is skipped with a warning and
//! never aborts the remaining rules.

use tracing::{info, warn};

use crate::inventory::{UpstreamHost, UpstreamRole};
use crate::rules::ProxyRule;

/// A declared rule joined with the running servers of its upstream role.
///
/// Derived, transient state: produced during one reconciliation pass and
/// never persisted. `servers` is non-empty and preserves registry order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRule {
    /// The declared rule
    pub rule: ProxyRule,
    /// Running hosts of the matched role, in original relative order
    pub servers: Vec<UpstreamHost>,
}

/// Resolve each declared rule against the discovered role list.
///
/// Rules are skipped (with a warning) when their alias matches no role,
/// when it matches more than one role (an ambiguous lookup is never
/// silently resolved to one of the candidates), or when the matched role
/// has no running hosts. Input order is preserved in the output.
#[must_use]
pub fn resolve(rules: &[ProxyRule], roles: &[UpstreamRole]) -> Vec<ResolvedRule> {
    let mut resolved = Vec::with_capacity(rules.len());

    for rule in rules {
        info!(rule = %rule.name, "processing rule");

        let matches: Vec<&UpstreamRole> = roles
            .iter()
            .filter(|role| role.alias == rule.upstream.alias)
            .collect();

        let role = match matches.as_slice() {
            [] => {
                warn!(
                    rule = %rule.name,
                    alias = %rule.upstream.alias,
                    "no role matches upstream alias, skipping rule"
                );
                continue;
            }
            [role] => *role,
            _ => {
                warn!(
                    rule = %rule.name,
                    alias = %rule.upstream.alias,
                    candidates = matches.len(),
                    "upstream alias is ambiguous, skipping rule"
                );
                continue;
            }
        };

        let servers: Vec<UpstreamHost> = role
            .hosts
            .iter()
            .filter(|host| host.status.is_running())
            .cloned()
            .collect();

        if servers.is_empty() {
            warn!(
                rule = %rule.name,
                alias = %rule.upstream.alias,
                "no running upstream servers, skipping rule"
            );
            continue;
        }

        resolved.push(ResolvedRule {
            rule: rule.clone(),
            servers,
        });
    }

    resolved
}

/// Whether a pass that produced this resolution requires activating a new
/// configuration.
///
/// Intentionally coarse: any pass that resolved at least one rule is a
/// candidate for a rewrite-and-reload cycle. The pipeline additionally
/// short-circuits on byte-identical content before signaling the service;
/// see [`crate::pipeline`].
#[must_use]
pub fn needs_reload(resolved: &[ResolvedRule]) -> bool {
    !resolved.is_empty()
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod reconcile_tests;
