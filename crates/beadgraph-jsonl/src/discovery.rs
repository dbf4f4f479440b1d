//! Locating the issue file inside a beads directory.
//!
//! A `.beads/` directory can hold several JSONL files: the live database,
//! merge leftovers, backups, and a deletions log. Only one of them is the
//! issue list.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Issue file names in order of preference.
pub const PREFERRED_FILE_NAMES: [&str; 3] = ["beads.jsonl", "beads.base.jsonl", "issues.jsonl"];

/// File name of the deletions log, which never holds issues.
const DELETIONS_FILE_NAME: &str = "deletions.jsonl";

/// Returns `true` for JSONL files that are backups or merge artifacts.
fn is_artifact(name: &str) -> bool {
    name == DELETIONS_FILE_NAME
        || name.contains(".backup")
        || name.contains(".orig")
        || name.contains(".merge")
}

/// Finds the issue file in `dir`.
///
/// Preferred names win in the order given by [`PREFERRED_FILE_NAMES`]. Failing
/// those, the alphabetically first non-empty `*.jsonl` that is not a backup,
/// merge artifact, or deletions log is chosen. Returns `Ok(None)` if nothing
/// qualifies.
///
/// # Errors
///
/// Returns [`Error::NotADirectory`] if `dir` is not a directory, or an IO
/// error if it cannot be listed.
pub async fn find_issue_file(dir: &Path) -> Result<Option<PathBuf>> {
    let metadata = tokio::fs::metadata(dir).await?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }

    for name in PREFERRED_FILE_NAMES {
        let candidate = dir.join(name);
        if tokio::fs::try_exists(&candidate).await? {
            tracing::debug!(path = %candidate.display(), "Using preferred issue file");
            return Ok(Some(candidate));
        }
    }

    let mut fallback = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".jsonl") || is_artifact(&name) {
            continue;
        }
        let meta = entry.metadata().await?;
        if meta.is_file() && meta.len() > 0 {
            fallback.push(entry.path());
        }
    }
    fallback.sort();

    Ok(fallback.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::deletions("deletions.jsonl", true)]
    #[case::backup("beads.jsonl.backup-1", true)]
    #[case::orig("beads.orig.jsonl", true)]
    #[case::merge("beads.merge.jsonl", true)]
    #[case::live("team.jsonl", false)]
    fn artifact_detection(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_artifact(name), expected);
    }

    #[tokio::test]
    async fn prefers_beads_jsonl() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("issues.jsonl"), "{}\n").unwrap();
        std::fs::write(dir.path().join("beads.jsonl"), "{}\n").unwrap();

        let found = find_issue_file(dir.path()).await.unwrap();
        assert_eq!(found, Some(dir.path().join("beads.jsonl")));
    }

    #[tokio::test]
    async fn falls_back_to_first_non_empty_jsonl() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.jsonl"), "").unwrap();
        std::fs::write(dir.path().join("deletions.jsonl"), "{}\n").unwrap();
        std::fs::write(dir.path().join("c.jsonl"), "{}\n").unwrap();
        std::fs::write(dir.path().join("b.jsonl"), "{}\n").unwrap();

        let found = find_issue_file(dir.path()).await.unwrap();
        assert_eq!(found, Some(dir.path().join("b.jsonl")));
    }

    #[tokio::test]
    async fn empty_directory_finds_nothing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_issue_file(dir.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_file_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("beads.jsonl");
        std::fs::write(&file, "{}\n").unwrap();

        assert!(matches!(
            find_issue_file(&file).await,
            Err(Error::NotADirectory(_))
        ));
    }
}
