// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for working without the catalog server: queuing changes,
//! reading the local copy and replaying once the server is back.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn sb() -> Command {
    cargo_bin_cmd!("sb")
}

fn init_with(url: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    sb().arg("init").arg("--url").arg(url).current_dir(temp.path()).assert().success();
    temp
}

/// A URL nothing listens on.
fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn run_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    sb().args(args).current_dir(dir).assert()
}

// =============================================================================
// Minimal catalog server
// =============================================================================

/// Serves `/health` and the `/api/courses` collection from memory, one
/// request per connection.
struct CatalogServer {
    url: String,
    courses: Arc<Mutex<Vec<Value>>>,
}

impl CatalogServer {
    fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let courses = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::clone(&courses);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { return };
                handle(stream, &state);
            }
        });
        CatalogServer { url, courses }
    }

    fn titles(&self) -> Vec<String> {
        self.courses
            .lock()
            .unwrap()
            .iter()
            .map(|c| c["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

fn handle(stream: TcpStream, courses: &Mutex<Vec<Value>>) {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0; content_length];
    let _ = reader.read_exact(&mut body);

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();
    let (status, response) = route(method, path, &body, courses);

    let mut stream = reader.into_inner();
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(response.as_bytes());
}

fn route(method: &str, path: &str, body: &[u8], courses: &Mutex<Vec<Value>>) -> (&'static str, String) {
    let mut courses = courses.lock().unwrap();
    let collection = path.split('?').next().unwrap_or_default();
    match (method, collection) {
        ("GET", "/health") => ("200 OK", "{\"ok\":true}".to_string()),
        ("GET", "/api/courses") => ("200 OK", Value::Array(courses.clone()).to_string()),
        ("POST", "/api/courses") => {
            let mut record: Value = serde_json::from_slice(body).unwrap_or_else(|_| json!({}));
            record["id"] = json!(courses.len() + 1);
            courses.push(record.clone());
            ("201 Created", record.to_string())
        }
        _ => ("404 Not Found", "{\"message\":\"no such route\"}".to_string()),
    }
}

// =============================================================================
// Server unreachable
// =============================================================================

#[test]
fn add_is_queued_when_server_unreachable() {
    let temp = init_with(&closed_url());

    run_in(temp.path(), &["add", "--title", "Algebra"])
        .success()
        .stdout(predicate::str::starts_with("Queued local:"))
        .stdout(predicate::str::contains("Algebra"));

    run_in(temp.path(), &["pending"])
        .success()
        .stdout(predicate::str::contains("1 pending change(s)"))
        .stdout(predicate::str::contains("add"));
}

#[test]
fn list_shows_local_copy_with_queued_changes() {
    let temp = init_with(&closed_url());
    run_in(temp.path(), &["add", "--title", "Algebra"]).success();

    run_in(temp.path(), &["list"])
        .success()
        .stdout(predicate::str::contains("Algebra (not synced)"))
        .stdout(predicate::str::contains("server unreachable; showing local copy"));
}

#[test]
fn status_reports_unreachable_server() {
    let temp = init_with(&closed_url());
    run_in(temp.path(), &["add", "--title", "Algebra"]).success();

    run_in(temp.path(), &["status"])
        .success()
        .stdout(predicate::str::contains("Status: server unreachable"))
        .stdout(predicate::str::contains("Pending changes: 1"));
}

#[test]
fn sync_fails_while_server_unreachable() {
    let temp = init_with(&closed_url());
    run_in(temp.path(), &["add", "--title", "Algebra"]).success();

    run_in(temp.path(), &["sync"])
        .failure()
        .stderr(predicate::str::contains("server unreachable"))
        .stderr(predicate::str::contains("1 change(s) remain queued"));

    run_in(temp.path(), &["reconnect"]).failure().stderr(predicate::str::contains("server unreachable"));
}

#[test]
fn offline_flag_reports_offline() {
    let temp = init_with(&closed_url());

    run_in(temp.path(), &["--offline", "status"]).success().stdout(predicate::str::contains("Status: offline"));
}

#[test]
fn update_requires_a_change() {
    let temp = init_with(&closed_url());

    run_in(temp.path(), &["update", "1"]).failure().stderr(predicate::str::contains("nothing to update"));
}

#[test]
fn add_requires_title() {
    let temp = init_with(&closed_url());

    run_in(temp.path(), &["add", "--field", "credits=3"])
        .failure()
        .stderr(predicate::str::contains("needs a title"));
    run_in(temp.path(), &["pending"]).success().stdout(predicate::str::contains("No pending changes"));
}

// =============================================================================
// Server back
// =============================================================================

#[test]
fn queued_changes_replay_on_sync() {
    let server = CatalogServer::start();
    let temp = init_with(&server.url);

    run_in(temp.path(), &["--offline", "add", "--title", "Algebra"]).success();
    run_in(temp.path(), &["--offline", "add", "--title", "Biology", "-f", "credits=4"]).success();
    assert!(server.titles().is_empty());

    run_in(temp.path(), &["sync"]).success().stdout(predicate::str::contains("Synced 2 change(s)"));

    assert_eq!(server.titles(), vec!["Algebra", "Biology"]);
    assert_eq!(server.courses.lock().unwrap()[1]["credits"], 4);
    run_in(temp.path(), &["pending"]).success().stdout(predicate::str::contains("No pending changes"));
    run_in(temp.path(), &["list"])
        .success()
        .stdout(predicate::str::contains("- 1: Algebra"))
        .stdout(predicate::str::contains("- 2: Biology"))
        .stdout(predicate::str::contains("not synced").not());
}

#[test]
fn any_command_replays_once_server_answers() {
    let server = CatalogServer::start();
    let temp = init_with(&server.url);
    run_in(temp.path(), &["--offline", "add", "--title", "Algebra"]).success();

    run_in(temp.path(), &["status"])
        .success()
        .stdout(predicate::str::contains("Status: online"))
        .stdout(predicate::str::contains("Pending changes: 0"));

    assert_eq!(server.titles(), vec!["Algebra"]);
}

#[test]
fn add_goes_straight_to_server_when_online() {
    let server = CatalogServer::start();
    let temp = init_with(&server.url);

    run_in(temp.path(), &["add", "--title", "Chemistry"]).success().stdout("Added 1: Chemistry\n");

    assert_eq!(server.titles(), vec!["Chemistry"]);
    run_in(temp.path(), &["pending"]).success().stdout(predicate::str::contains("No pending changes"));
}

#[test]
fn reconnect_replays_queue() {
    let server = CatalogServer::start();
    let temp = init_with(&server.url);
    run_in(temp.path(), &["--offline", "add", "--title", "Algebra"]).success();

    run_in(temp.path(), &["reconnect"])
        .success()
        .stdout(predicate::str::contains("Connected to"))
        .stdout(predicate::str::contains("Synced 1 change(s)"));
}
