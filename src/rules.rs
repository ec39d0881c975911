// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Declared proxy rule types and rule-set validation.
//!
//! A rule set is a JSON array of records shaped like:
//!
//! ```json
//! [
//!   {
//!     "name": "my-app",
//!     "listen": { "bind": "*", "port": 80 },
//!     "upstream": { "alias": "my-app-role", "port": 8080 }
//!   }
//! ]
//! ```
//!
//! Rules are declared by the operator and immutable within one
//! reconciliation pass. Shape validation happens here, up front; resolving
//! rules against live inventory is the job of [`crate::reconcile`].

use std::collections::HashMap;

use serde::Deserialize;

use crate::constants::{BACKEND_SUFFIX, FRONTEND_SUFFIX};
use crate::errors::RuleSetError;

/// One declared proxy rule: a listen address and the upstream it forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyRule {
    /// Unique, non-empty rule name; generated block identifiers derive from it
    pub name: String,
    /// Where the frontend accepts client connections
    pub listen: ListenSpec,
    /// Which discovered role the backend forwards to
    pub upstream: UpstreamSpec,
}

/// Frontend bind address for a rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenSpec {
    /// Bind address (`*` for all interfaces)
    pub bind: String,
    /// Listen port, 1..=65535
    pub port: u16,
}

/// Upstream join key and port for a rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamSpec {
    /// Alias joining this rule to a discovered role
    pub alias: String,
    /// Port the upstream servers listen on, 1..=65535
    pub port: u16,
}

impl ProxyRule {
    /// Generated frontend block identifier (`<slug>-in`).
    #[must_use]
    pub fn frontend_name(&self) -> String {
        format!("{}{}", slug(&self.name), FRONTEND_SUFFIX)
    }

    /// Generated backend block identifier (`<slug>-out`).
    #[must_use]
    pub fn backend_name(&self) -> String {
        format!("{}{}", slug(&self.name), BACKEND_SUFFIX)
    }

    /// Generated server line identifier for the host with the given index.
    ///
    /// The host index is unique within a role, which keeps server names
    /// unique within a backend block.
    #[must_use]
    pub fn server_name(&self, index: u64) -> String {
        format!("{}-{}", slug(&self.name), index)
    }
}

/// Reduce a rule name to the form used in generated block identifiers.
///
/// ASCII letters are lowercased; every other character maps to `-`. The
/// transformation is injective over a validated rule set because
/// [`parse_rules`] rejects sets whose names collide after slugging.
#[must_use]
pub fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Parse and validate a declared rule set from its JSON representation.
///
/// # Errors
///
/// Returns [`RuleSetError`] if the document is not a JSON array of the
/// expected shape, a rule name is empty, a port is out of range, or two
/// rule names collide after the slug transformation.
pub fn parse_rules(raw: &str) -> Result<Vec<ProxyRule>, RuleSetError> {
    let rules: Vec<ProxyRule> =
        serde_json::from_str(raw).map_err(|e| RuleSetError::Malformed {
            reason: e.to_string(),
        })?;
    validate_rules(&rules)?;
    Ok(rules)
}

/// Validate an already-decoded rule set.
///
/// # Errors
///
/// Returns [`RuleSetError`] on an empty name, a zero port, or a slug
/// collision between two rule names.
pub fn validate_rules(rules: &[ProxyRule]) -> Result<(), RuleSetError> {
    let mut seen: HashMap<String, String> = HashMap::new();

    for (position, rule) in rules.iter().enumerate() {
        if rule.name.is_empty() {
            return Err(RuleSetError::EmptyName { position });
        }

        // Ports above 65535 are already rejected by the u16 decode; zero is
        // the one in-range value that is not a legal port.
        if rule.listen.port == 0 {
            return Err(RuleSetError::InvalidPort {
                rule: rule.name.clone(),
                port: rule.listen.port,
            });
        }
        if rule.upstream.port == 0 {
            return Err(RuleSetError::InvalidPort {
                rule: rule.name.clone(),
                port: rule.upstream.port,
            });
        }

        let slugged = slug(&rule.name);
        if let Some(first) = seen.insert(slugged.clone(), rule.name.clone()) {
            return Err(RuleSetError::NameCollision {
                first,
                second: rule.name.clone(),
                slug: slugged,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod rules_tests;
