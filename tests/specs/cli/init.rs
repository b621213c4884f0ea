// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the `sb init` command.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sb() -> Command {
    cargo_bin_cmd!("sb")
}

#[test]
fn creates_syllabus_directory() {
    let temp = TempDir::new().unwrap();

    sb().arg("init")
        .arg("--url")
        .arg("http://catalog.local:8080")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized syllabus at"));

    assert!(temp.path().join(".syllabus/config.toml").exists());
    assert!(temp.path().join(".syllabus/state").is_dir());
    let config = std::fs::read_to_string(temp.path().join(".syllabus/config.toml")).unwrap();
    assert!(config.contains("url = \"http://catalog.local:8080\""));
}

#[test]
fn default_url_is_localhost() {
    let temp = TempDir::new().unwrap();

    sb().arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Server: http://localhost:3000"));
}

#[test]
fn fails_if_already_initialized() {
    let temp = TempDir::new().unwrap();

    sb().arg("init").current_dir(temp.path()).assert().success();
    sb().arg("init")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn rejects_non_http_url() {
    let temp = TempDir::new().unwrap();

    sb().arg("init")
        .arg("--url")
        .arg("ftp://catalog")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid server URL"));

    assert!(!temp.path().join(".syllabus").exists());
}

#[test]
fn path_option_initializes_elsewhere() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("nested");
    std::fs::create_dir_all(&target).unwrap();

    sb().arg("init").arg("--path").arg(&target).current_dir(temp.path()).assert().success();

    assert!(target.join(".syllabus/config.toml").exists());
    assert!(!temp.path().join(".syllabus").exists());
}

#[test]
fn commands_require_init() {
    let temp = TempDir::new().unwrap();

    sb().arg("pending")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("run 'sb init' first"));
}

#[test]
fn subdirectories_find_the_work_dir() {
    let temp = TempDir::new().unwrap();
    sb().arg("init").current_dir(temp.path()).assert().success();
    let sub = temp.path().join("a/b");
    std::fs::create_dir_all(&sub).unwrap();

    sb().arg("pending")
        .current_dir(&sub)
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending changes"));
}

#[test]
fn directory_flag() {
    let temp = TempDir::new().unwrap();
    sb().arg("init").current_dir(temp.path()).assert().success();

    sb().arg("-C")
        .arg(temp.path())
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending changes"));
}
