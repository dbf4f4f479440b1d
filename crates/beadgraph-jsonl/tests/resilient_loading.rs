//! End-to-end tests for resilient file loading.
//!
//! These exercise the readers against real files on disk, covering corrupted
//! lines, blank lines, byte-order marks, validation, and issue file discovery.

use beadgraph_jsonl::{
    Error, Warning, find_issue_file, read_jsonl_resilient, read_jsonl_validated,
};
use serde::Deserialize;
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Record {
    id: String,
    #[serde(default)]
    labels: Vec<String>,
}

fn write_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn loads_all_valid_records() {
    let file = write_file(b"{\"id\":\"a\"}\n{\"id\":\"b\",\"labels\":[\"api\"]}\n");

    let (records, warnings) = read_jsonl_resilient::<Record, _>(file.path())
        .await
        .unwrap();

    assert!(warnings.is_empty());
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].labels, vec!["api".to_string()]);
}

#[tokio::test]
async fn empty_file_yields_nothing() {
    let file = write_file(b"");
    let (records, warnings) = read_jsonl_resilient::<Record, _>(file.path())
        .await
        .unwrap();
    assert!(records.is_empty());
    assert!(warnings.is_empty());
}

#[tokio::test]
async fn missing_trailing_newline_is_fine() {
    let file = write_file(b"{\"id\":\"a\"}\n{\"id\":\"b\"}");
    let (records, _) = read_jsonl_resilient::<Record, _>(file.path())
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

// =============================================================================
// Corruption Handling
// =============================================================================

#[tokio::test]
async fn corrupted_lines_become_warnings() {
    let file = write_file(
        b"{\"id\":\"a\"}\n{\"id\":\n\n   \n{\"id\":\"c\"}\n{\"labels\":[]}\n",
    );

    let (records, warnings) = read_jsonl_resilient::<Record, _>(file.path())
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);

    let lines: Vec<usize> = warnings.iter().map(Warning::line_number).collect();
    assert_eq!(lines, vec![2, 6]);
    assert!(warnings.iter().all(|w| w.kind() == "malformed_json"));
}

#[tokio::test]
async fn bom_prefixed_file_parses_first_line() {
    let mut contents = "\u{feff}".as_bytes().to_vec();
    contents.extend_from_slice(b"{\"id\":\"first\"}\n");
    let file = write_file(&contents);

    let (records, warnings) = read_jsonl_resilient::<Record, _>(file.path())
        .await
        .unwrap();

    assert!(warnings.is_empty());
    assert_eq!(records[0].id, "first");
}

#[tokio::test]
async fn sparse_errors_in_large_file() {
    let mut contents = String::new();
    for i in 0..2_000 {
        if i % 250 == 0 {
            contents.push_str("{broken\n");
        } else {
            contents.push_str(&format!("{{\"id\":\"bd-{i}\"}}\n"));
        }
    }
    let file = write_file(contents.as_bytes());

    let (records, warnings) = read_jsonl_resilient::<Record, _>(file.path())
        .await
        .unwrap();

    assert_eq!(records.len(), 1_992);
    assert_eq!(warnings.len(), 8);
    assert_eq!(warnings[0].line_number(), 1);
    assert_eq!(warnings[1].line_number(), 251);
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let result = read_jsonl_resilient::<Record, _>("/nonexistent/beads.jsonl").await;
    assert!(matches!(result, Err(Error::Io(_))));
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn rejected_records_keep_their_line_numbers() {
    let file = write_file(b"{\"id\":\"a\"}\nnot json\n{\"id\":\"\"}\n{\"id\":\"d\"}\n");

    let (records, warnings) = read_jsonl_validated::<Record, _, _>(file.path(), |r: &Record| {
        if r.id.is_empty() {
            Err("empty id".to_string())
        } else {
            Ok(())
        }
    })
    .await
    .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "d"]);

    let kinds: Vec<(usize, &str)> = warnings.iter().map(|w| (w.line_number(), w.kind())).collect();
    assert_eq!(kinds, vec![(2, "malformed_json"), (3, "skipped_line")]);
    assert!(warnings[1].description().contains("empty id"));
}

// =============================================================================
// Discovery
// =============================================================================

#[tokio::test]
async fn discovery_skips_backups_and_prefers_issues_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("beads.jsonl.backup"), "{}\n").unwrap();
    std::fs::write(dir.path().join("deletions.jsonl"), "{}\n").unwrap();
    std::fs::write(dir.path().join("issues.jsonl"), "{}\n").unwrap();
    std::fs::write(dir.path().join("other.jsonl"), "{}\n").unwrap();

    let found = find_issue_file(dir.path()).await.unwrap();
    assert_eq!(found, Some(dir.path().join("issues.jsonl")));
}
