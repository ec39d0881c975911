// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end reconciliation scenarios against the public API.
//!
//! Each scenario runs the whole pipeline (rule-set parse, inventory
//! decode, resolution, rendering, persistence) with the stock preamble
//! and faked external collaborators.

mod common;

use common::{FakeInventory, RecordingController};
use haproxy_sync::activate::ServiceAction;
use haproxy_sync::constants::BASE_CONFIG;
use haproxy_sync::errors::SyncError;
use haproxy_sync::pipeline::{PassDisposition, Pipeline, Settings};
use haproxy_sync::rules::parse_rules;
use tempfile::TempDir;

const DECLARED_RULES: &str = r#"[
  {
    "name": "app",
    "listen": {"bind": "*", "port": 80},
    "upstream": {"alias": "app-role", "port": 8080}
  }
]"#;

fn settings(dir: &TempDir) -> Settings {
    Settings {
        config_path: dir.path().join("haproxy.cfg"),
        preamble: BASE_CONFIG.to_string(),
    }
}

#[test]
fn test_running_host_is_rendered_and_activated() {
    let dir = TempDir::new().expect("temp dir");
    let inventory = FakeInventory::from_wire(
        r#"{"roles": [{"alias": "app-role", "id": 1, "hosts": [
             {"index": 1, "internal-ip": "10.0.0.1", "status": "Running"}
           ]}]}"#,
    );
    let (controller, calls) = RecordingController::new(true);

    let rules = parse_rules(DECLARED_RULES).expect("rules parse");
    let outcome = Pipeline::new(settings(&dir), inventory, controller)
        .run(&rules)
        .expect("pass completes");

    assert_eq!(
        outcome.disposition,
        PassDisposition::Applied(ServiceAction::Reload)
    );

    let doc = std::fs::read_to_string(dir.path().join("haproxy.cfg")).expect("read");
    assert!(doc.starts_with("global\n"), "stock preamble leads the document");
    assert!(doc.contains("frontend app-in"));
    assert!(doc.contains("  bind *:80"));
    assert!(doc.contains("default_backend app-out"));
    assert!(doc.contains("backend app-out"));
    assert!(doc.contains("  server app-1 10.0.0.1:8080"));

    assert_eq!(*calls.borrow(), vec!["validate", "status", "apply reload"]);
}

#[test]
fn test_pending_host_yields_no_configuration() {
    let dir = TempDir::new().expect("temp dir");
    let inventory = FakeInventory::from_wire(
        r#"{"roles": [{"alias": "app-role", "id": 1, "hosts": [
             {"index": 1, "internal-ip": "10.0.0.1", "status": "Pending"}
           ]}]}"#,
    );
    let (controller, calls) = RecordingController::new(true);

    let rules = parse_rules(DECLARED_RULES).expect("rules parse");
    let outcome = Pipeline::new(settings(&dir), inventory, controller)
        .run(&rules)
        .expect("pass completes");

    assert_eq!(outcome.disposition, PassDisposition::NoEligibleRules);
    assert!(!dir.path().join("haproxy.cfg").exists(), "no file written");
    assert!(calls.borrow().is_empty(), "no service interaction");
}

#[test]
fn test_inventory_failure_aborts_the_pass() {
    let dir = TempDir::new().expect("temp dir");
    let (controller, calls) = RecordingController::new(true);

    let rules = parse_rules(DECLARED_RULES).expect("rules parse");
    let err = Pipeline::new(settings(&dir), FakeInventory::failing(), controller)
        .run(&rules)
        .unwrap_err();

    assert!(matches!(err, SyncError::Inventory(_)));
    assert_ne!(err.exit_code(), 0);
    assert!(!dir.path().join("haproxy.cfg").exists(), "nothing rendered");
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_second_identical_pass_reloads_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let wire = r#"{"roles": [{"alias": "app-role", "id": 1, "hosts": [
         {"index": 1, "internal-ip": "10.0.0.1", "status": "Running"}
       ]}]}"#;
    let rules = parse_rules(DECLARED_RULES).expect("rules parse");

    let (first, _) = RecordingController::new(true);
    Pipeline::new(settings(&dir), FakeInventory::from_wire(wire), first)
        .run(&rules)
        .expect("first pass");

    let (second, calls) = RecordingController::new(true);
    let outcome = Pipeline::new(settings(&dir), FakeInventory::from_wire(wire), second)
        .run(&rules)
        .expect("second pass");

    assert_eq!(outcome.disposition, PassDisposition::Unchanged);
    assert!(calls.borrow().is_empty(), "byte-identical content, no signal");
}
