// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deterministic rendering of resolved rules into an HAProxy document.
//!
//! Rendering is pure: the same resolved sequence in the same order always
//! produces byte-identical output. No reordering, sorting, or deduplication
//! happens here, so operators can reason about rule precedence from the
//! declared order alone.

use crate::reconcile::ResolvedRule;

/// Render the full configuration document.
///
/// The fixed preamble comes first, then one frontend and one backend block
/// per resolved rule, in input order. A resolved entry with no servers is
/// excluded entirely; an empty backend block is never emitted.
#[must_use]
pub fn render(preamble: &str, resolved: &[ResolvedRule]) -> String {
    let mut out = String::with_capacity(preamble.len() + 256 * resolved.len() + 2);

    out.push_str(preamble);
    out.push('\n');

    for entry in resolved {
        if entry.servers.is_empty() {
            continue;
        }
        frontend_block(&mut out, entry);
        backend_block(&mut out, entry);
    }

    out
}

/// Emit the frontend stanza for one rule.
fn frontend_block(out: &mut String, entry: &ResolvedRule) {
    let rule = &entry.rule;
    out.push_str(&format!("frontend {}\n", rule.frontend_name()));
    out.push_str(&format!("  bind {}:{}\n", rule.listen.bind, rule.listen.port));
    out.push_str(&format!("  default_backend {}\n", rule.backend_name()));
}

/// Emit the backend stanza for one rule, one server line per running host.
fn backend_block(out: &mut String, entry: &ResolvedRule) {
    let rule = &entry.rule;
    out.push_str(&format!("backend {}\n", rule.backend_name()));
    for host in &entry.servers {
        out.push_str(&format!(
            "  server {} {}:{}\n",
            rule.server_name(host.index),
            host.internal_ip,
            rule.upstream.port
        ));
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod render_tests;
