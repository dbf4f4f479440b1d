//! Locating and loading a beads issue file.
//!
//! The analysis engine takes a plain list of issues; this module produces
//! that list from disk. A `.beads/` directory is found by walking up from the
//! working directory, its issue file is picked by
//! [`beadgraph_jsonl::find_issue_file`], and the file is read resiliently:
//! malformed lines and issues failing [`Issue::validate`] are skipped and
//! reported as warnings.

use crate::domain::Issue;
use crate::error::{Error, Result};
use beadgraph_jsonl::{Warning, find_issue_file, read_jsonl_validated};
use std::path::{Path, PathBuf};

/// Name of the beads directory.
pub const BEADS_DIR_NAME: &str = ".beads";

/// Maximum number of parent directories to climb when looking for `.beads/`.
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Finds the nearest `.beads/` directory at or above `start_dir`.
///
/// Returns the path of the `.beads` directory itself, or `None` if the
/// filesystem root or the depth limit is reached first.
#[must_use]
pub fn find_beads_dir(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        let candidate = current.join(BEADS_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

/// Issues read from one file, plus everything that was skipped.
#[derive(Debug, Clone)]
pub struct LoadedIssues {
    /// File the issues came from
    pub path: PathBuf,
    /// Valid issues in file order
    pub issues: Vec<Issue>,
    /// Lines that were skipped
    pub warnings: Vec<Warning>,
}

/// Reads `path`, keeping every issue that parses and validates.
///
/// # Errors
///
/// Fails only if the file cannot be opened.
pub async fn load_issues_from_file(path: &Path) -> Result<LoadedIssues> {
    let (issues, warnings) = read_jsonl_validated::<Issue, _, _>(path, Issue::validate).await?;

    if !warnings.is_empty() {
        tracing::warn!(
            path = %path.display(),
            skipped = warnings.len(),
            "Some issue lines were skipped"
        );
    }
    tracing::debug!(path = %path.display(), issues = issues.len(), "Issues loaded");

    Ok(LoadedIssues {
        path: path.to_path_buf(),
        issues,
        warnings,
    })
}

/// Finds and reads the issue file inside `beads_dir`.
///
/// # Errors
///
/// Returns [`Error::NoIssueFile`] if the directory holds no usable JSONL
/// file, and propagates IO failures.
pub async fn load_issues_from_dir(beads_dir: &Path) -> Result<LoadedIssues> {
    let path = find_issue_file(beads_dir)
        .await?
        .ok_or_else(|| Error::NoIssueFile(beads_dir.to_path_buf()))?;
    load_issues_from_file(&path).await
}

/// Walks up from `working_dir` to the nearest `.beads/` and loads its issues.
///
/// # Errors
///
/// Returns [`Error::BeadsDirNotFound`] if no `.beads/` directory exists above
/// `working_dir`, otherwise as [`load_issues_from_dir`].
pub async fn load_issues(working_dir: &Path) -> Result<LoadedIssues> {
    let beads_dir =
        find_beads_dir(working_dir).ok_or_else(|| Error::BeadsDirNotFound(working_dir.to_path_buf()))?;
    load_issues_from_dir(&beads_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALID: &str = r#"{"id":"bv-1","title":"First","status":"open","priority":1,"created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-02T00:00:00Z"}"#;
    const BLOCKED: &str = r#"{"id":"bv-2","title":"Second","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z","dependencies":[{"depends_on_id":"bv-1","type":"blocks"}]}"#;
    const NO_TITLE: &str = r#"{"id":"bv-3","title":"  ","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z"}"#;

    #[test]
    fn find_beads_dir_walks_up() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(BEADS_DIR_NAME)).unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_beads_dir(&nested).unwrap();
        assert_eq!(found, temp.path().join(BEADS_DIR_NAME));
    }

    #[test]
    fn find_beads_dir_ignores_plain_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(BEADS_DIR_NAME), "").unwrap();
        let found = find_beads_dir(temp.path());
        assert_ne!(found, Some(temp.path().join(BEADS_DIR_NAME)));
    }

    #[tokio::test]
    async fn load_skips_malformed_and_invalid_lines() {
        let temp = TempDir::new().unwrap();
        let beads = temp.path().join(BEADS_DIR_NAME);
        std::fs::create_dir(&beads).unwrap();
        let content = format!("{VALID}\n{{broken\n\n{NO_TITLE}\n{BLOCKED}\n");
        std::fs::write(beads.join("beads.jsonl"), content).unwrap();

        let loaded = load_issues(temp.path()).await.unwrap();
        let ids: Vec<&str> = loaded.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["bv-1", "bv-2"]);
        assert_eq!(loaded.warnings.len(), 2);
        assert_eq!(loaded.warnings[0].kind(), "malformed_json");
        assert_eq!(loaded.warnings[1].line_number(), 4);
        assert_eq!(loaded.issues[1].blocking_dependencies().count(), 1);
    }

    #[tokio::test]
    async fn empty_beads_dir_has_no_issue_file() {
        let temp = TempDir::new().unwrap();
        let err = load_issues_from_dir(temp.path()).await.unwrap_err();
        assert!(matches!(err, Error::NoIssueFile(_)));
    }
}
