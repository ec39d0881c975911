// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `activate.rs`

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::activate::{
    backup_path, content_digest, persist_config, persisted_digest, ServiceAction,
};

#[test]
fn test_service_action_verbs() {
    assert_eq!(ServiceAction::Start.as_str(), "start");
    assert_eq!(ServiceAction::Reload.as_str(), "reload");
    assert_eq!(ServiceAction::Reload.to_string(), "reload");
}

#[test]
fn test_backup_path_appends_extension() {
    let backup = backup_path(Path::new("/etc/haproxy/haproxy.cfg"));
    assert_eq!(backup, Path::new("/etc/haproxy/haproxy.cfg.bak"));
}

#[test]
fn test_persist_writes_content() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("haproxy.cfg");

    persist_config(&path, "frontend app-in\n").expect("persist");

    assert_eq!(fs::read_to_string(&path).expect("read back"), "frontend app-in\n");
}

#[test]
fn test_persist_replaces_existing_content() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("haproxy.cfg");

    persist_config(&path, "old document\n").expect("first persist");
    persist_config(&path, "new document\n").expect("second persist");

    assert_eq!(fs::read_to_string(&path).expect("read back"), "new document\n");
}

#[test]
fn test_persist_backs_up_previous_document() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("haproxy.cfg");

    persist_config(&path, "old document\n").expect("first persist");
    persist_config(&path, "new document\n").expect("second persist");

    let backup = backup_path(&path);
    assert_eq!(fs::read_to_string(backup).expect("backup"), "old document\n");
}

#[test]
fn test_persist_skips_backup_without_previous_document() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("haproxy.cfg");

    persist_config(&path, "first document\n").expect("persist");

    assert!(!backup_path(&path).exists());
}

#[test]
fn test_content_digest_is_stable_and_distinct() {
    assert_eq!(content_digest("document"), content_digest("document"));
    assert_ne!(content_digest("document"), content_digest("document\n"));
}

#[test]
fn test_persisted_digest_missing_file() {
    let dir = TempDir::new().expect("temp dir");
    assert_eq!(persisted_digest(&dir.path().join("absent.cfg")), None);
}

#[test]
fn test_persisted_digest_matches_content_digest() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("haproxy.cfg");

    persist_config(&path, "frontend app-in\n").expect("persist");

    assert_eq!(
        persisted_digest(&path),
        Some(content_digest("frontend app-in\n"))
    );
}
