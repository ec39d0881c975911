// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # haproxy-sync - declarative HAProxy reconciliation
//!
//! haproxy-sync reconciles a declarative load-balancer configuration
//! against live upstream server inventory and regenerates the HAProxy
//! configuration file, reloading the proxy only when content actually
//! changed.
//!
//! ## Overview
//!
//! One pass maps declared proxy rules to discovered, healthy backend
//! servers, renders a deterministic configuration document, and decides
//! whether a reload is required:
//!
//! - [`rules`] - Declared proxy rule types and rule-set validation
//! - [`inventory`] - Upstream role types and the inventory query collaborator
//! - [`reconcile`] - Resolution of rules against live inventory
//! - [`render`] - Deterministic rendering of the configuration document
//! - [`activate`] - Atomic persistence, syntax validation, service control
//! - [`pipeline`] - The synchronous pass tying the stages together
//! - [`errors`] - Typed errors with distinct process exit codes
//!
//! ## Example
//!
//! ```rust,no_run
//! use haproxy_sync::activate::HaproxyController;
//! use haproxy_sync::inventory::SzradmInventory;
//! use haproxy_sync::pipeline::{Pipeline, Settings};
//! use haproxy_sync::rules::parse_rules;
//!
//! # fn main() -> Result<(), haproxy_sync::errors::SyncError> {
//! let rules = parse_rules(
//!     r#"[{"name": "my-app",
//!          "listen": {"bind": "*", "port": 80},
//!          "upstream": {"alias": "my-app-role", "port": 8080}}]"#,
//! )?;
//!
//! let pipeline = Pipeline::new(
//!     Settings::default(),
//!     SzradmInventory::default(),
//!     HaproxyController::default(),
//! );
//! let outcome = pipeline.run(&rules)?;
//! println!("resolved {} rule(s)", outcome.resolved);
//! # Ok(())
//! # }
//! ```
//!
//! Rules a pass cannot resolve (unknown alias, ambiguous alias, no running
//! servers) are skipped with a warning; partial results are the expected
//! steady state, not a failure.

pub mod activate;
pub mod constants;
pub mod errors;
pub mod inventory;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod rules;
