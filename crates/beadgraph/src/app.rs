//! Application context for CLI command execution.
//!
//! [`App`] resolves where the issues live, loads them and the analysis
//! configuration once, and hands both to the commands.
//!
//! # Example
//!
//! ```no_run
//! use beadgraph::app::{App, Source};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::load(&Source::discover(Path::new("."))).await?;
//!     let stats = app.analyze();
//!     println!("{} issues, {} actionable", stats.node_count(), stats.actionable_count());
//!     Ok(())
//! }
//! ```

use crate::analysis::{Analyzer, GraphStats};
use crate::config::{AnalysisConfig, CONFIG_FILE_NAME};
use crate::domain::Issue;
use crate::error::{Error, Result};
use crate::loader::{LoadedIssues, find_beads_dir, load_issues_from_dir, load_issues_from_file};
use beadgraph_jsonl::Warning;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where to read issues and configuration from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Directory to start the `.beads/` search from
    pub working_dir: PathBuf,
    /// Explicit beads directory, skipping the search
    pub beads_dir: Option<PathBuf>,
    /// Explicit issue file, skipping discovery inside the beads directory
    pub file: Option<PathBuf>,
    /// Explicit configuration file
    pub config: Option<PathBuf>,
}

impl Source {
    /// Search upward from `working_dir` with no overrides.
    #[must_use]
    pub fn discover(working_dir: &Path) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            beads_dir: None,
            file: None,
            config: None,
        }
    }
}

/// Loaded issues plus the configuration to analyse them with.
#[derive(Debug)]
pub struct App {
    issues: Vec<Issue>,
    warnings: Vec<Warning>,
    issue_file: PathBuf,
    beads_dir: Option<PathBuf>,
    config: AnalysisConfig,
}

impl App {
    /// Resolves `source`, then loads the issues and configuration.
    ///
    /// Resolution order for issues: `file`, then `beads_dir`, then a search
    /// upward from `working_dir`. The configuration comes from `config` if
    /// given, else `beadgraph.yaml` in the beads directory, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if no issue file can be found or read, or if the
    /// configuration file exists but is invalid.
    pub async fn load(source: &Source) -> Result<Self> {
        let beads_dir = match (&source.beads_dir, &source.file) {
            (Some(dir), _) => Some(dir.clone()),
            (None, Some(file)) => file.parent().map(Path::to_path_buf),
            (None, None) => Some(
                find_beads_dir(&source.working_dir)
                    .ok_or_else(|| Error::BeadsDirNotFound(source.working_dir.clone()))?,
            ),
        };

        let LoadedIssues {
            path,
            issues,
            warnings,
        } = match (&source.file, &beads_dir) {
            (Some(file), _) => load_issues_from_file(file).await?,
            (None, Some(dir)) => load_issues_from_dir(dir).await?,
            (None, None) => return Err(Error::BeadsDirNotFound(source.working_dir.clone())),
        };

        let config = match (&source.config, &beads_dir) {
            (Some(path), _) => AnalysisConfig::load(path).await?,
            (None, Some(dir)) => AnalysisConfig::load_or_default(&dir.join(CONFIG_FILE_NAME)).await?,
            (None, None) => AnalysisConfig::default(),
        };

        tracing::debug!(
            file = %path.display(),
            issues = issues.len(),
            warnings = warnings.len(),
            "Application context ready"
        );

        Ok(Self {
            issues,
            warnings,
            issue_file: path,
            beads_dir,
            config,
        })
    }

    /// Wraps an in-memory issue set.
    #[must_use]
    pub fn from_issues(issues: Vec<Issue>, config: AnalysisConfig) -> Self {
        Self {
            issues,
            warnings: Vec::new(),
            issue_file: PathBuf::new(),
            beads_dir: None,
            config,
        }
    }

    /// The loaded issues, in file order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Lines skipped while loading.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// The file the issues came from (empty for in-memory sets).
    #[must_use]
    pub fn issue_file(&self) -> &Path {
        &self.issue_file
    }

    /// The beads directory, if one was resolved.
    #[must_use]
    pub fn beads_dir(&self) -> Option<&Path> {
        self.beads_dir.as_deref()
    }

    /// Analysis configuration.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Runs Phase-1 now and starts Phase-2 in the background.
    #[must_use]
    pub fn analyze(&self) -> Arc<GraphStats> {
        Analyzer::new(&self.issues, &self.config.centrality).analyze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::BEADS_DIR_NAME;
    use tempfile::TempDir;

    const ISSUE: &str = r#"{"id":"bv-1","title":"One","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z"}"#;

    fn beads_repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        let beads = temp.path().join(BEADS_DIR_NAME);
        std::fs::create_dir(&beads).unwrap();
        std::fs::write(beads.join("beads.jsonl"), format!("{ISSUE}\n")).unwrap();
        temp
    }

    #[tokio::test]
    async fn loads_from_subdirectory() {
        let temp = beads_repo();
        let sub = temp.path().join("src").join("lib");
        std::fs::create_dir_all(&sub).unwrap();

        let app = App::load(&Source::discover(&sub)).await.unwrap();
        assert_eq!(app.issues().len(), 1);
        assert!(app.beads_dir().unwrap().ends_with(BEADS_DIR_NAME));
        assert!(app.issue_file().ends_with("beads.jsonl"));
        assert_eq!(app.config(), &AnalysisConfig::default());
    }

    #[tokio::test]
    async fn reads_config_from_beads_dir() {
        let temp = beads_repo();
        std::fs::write(
            temp.path().join(BEADS_DIR_NAME).join(CONFIG_FILE_NAME),
            "triage:\n  top_n: 3\n",
        )
        .unwrap();

        let app = App::load(&Source::discover(temp.path())).await.unwrap();
        assert_eq!(app.config().triage.top_n, 3);
    }

    #[tokio::test]
    async fn explicit_file_wins() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("elsewhere.jsonl");
        std::fs::write(&file, format!("{ISSUE}\n")).unwrap();

        let source = Source {
            file: Some(file.clone()),
            ..Source::discover(Path::new("/nonexistent"))
        };
        let app = App::load(&source).await.unwrap();
        assert_eq!(app.issue_file(), file.as_path());
    }

    #[tokio::test]
    async fn missing_repository_is_reported() {
        let temp = TempDir::new().unwrap();
        let err = App::load(&Source::discover(temp.path())).await.unwrap_err();
        assert!(err.to_string().contains("Not a beads repository"));
    }
}
