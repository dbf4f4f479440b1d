//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use beadgraph::domain::Issue;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Fixed reference time for time-relative assertions.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Builds one issue as it appears on a JSONL line.
#[derive(Debug, Clone)]
pub struct IssueLine {
    value: Value,
}

impl IssueLine {
    /// Open P2 task updated a day before [`now`].
    pub fn new(id: &str) -> Self {
        let at = (now() - Duration::days(1)).to_rfc3339();
        Self {
            value: json!({
                "id": id,
                "title": format!("Issue {id}"),
                "status": "open",
                "priority": 2,
                "issue_type": "task",
                "created_at": at,
                "updated_at": at,
                "labels": [],
                "dependencies": [],
            }),
        }
    }

    pub fn status(mut self, status: &str) -> Self {
        self.value["status"] = json!(status);
        if status == "closed" {
            self.value["closed_at"] = self.value["updated_at"].clone();
        }
        self
    }

    pub fn title(mut self, title: &str, description: &str) -> Self {
        self.value["title"] = json!(title);
        self.value["description"] = json!(description);
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.value["priority"] = json!(priority);
        self
    }

    pub fn labels(mut self, labels: &[&str]) -> Self {
        self.value["labels"] = json!(labels);
        self
    }

    pub fn blocked_by(mut self, blockers: &[&str]) -> Self {
        let id = self.value["id"].clone();
        let deps: Vec<Value> = blockers
            .iter()
            .map(|b| json!({"issue_id": id, "depends_on_id": b, "type": "blocks"}))
            .collect();
        self.value["dependencies"] = json!(deps);
        self
    }

    pub fn updated_days_ago(mut self, days: i64) -> Self {
        let at = (now() - Duration::days(days)).to_rfc3339();
        self.value["created_at"] = json!(at);
        self.value["updated_at"] = json!(at);
        self
    }

    pub fn line(&self) -> String {
        self.value.to_string()
    }

    pub fn issue(&self) -> Issue {
        serde_json::from_value(self.value.clone()).unwrap()
    }
}

/// Parses every line into an [`Issue`].
pub fn issues(lines: &[IssueLine]) -> Vec<Issue> {
    lines.iter().map(IssueLine::issue).collect()
}

/// `ids[0]` blocks `ids[1]` blocks `ids[2]` ...
pub fn chain(ids: &[&str]) -> Vec<IssueLine> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            let line = IssueLine::new(id);
            if i == 0 { line } else { line.blocked_by(&[ids[i - 1]]) }
        })
        .collect()
}

/// A temp directory containing `.beads/beads.jsonl` with `lines`.
pub fn beads_repo(lines: &[IssueLine]) -> TempDir {
    let body: String = lines.iter().map(|l| l.line() + "\n").collect();
    beads_repo_raw(&body)
}

/// A temp directory containing `.beads/beads.jsonl` with raw `body`.
pub fn beads_repo_raw(body: &str) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let beads = temp.path().join(".beads");
    std::fs::create_dir(&beads).unwrap();
    std::fs::write(beads.join("beads.jsonl"), body).unwrap();
    temp
}

/// Path of the binary under test, built by cargo for integration tests.
pub fn beadgraph_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_beadgraph"))
}

/// Run the beadgraph binary in `dir` with colors disabled.
pub fn run_beadgraph_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(beadgraph_binary())
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute beadgraph binary")
}

/// Runs with `--json` and parses stdout.
pub fn run_json(dir: &Path, args: &[&str]) -> Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = run_beadgraph_in_dir(dir, &full);
    assert!(
        output.status.success(),
        "beadgraph {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}
