//! Error types for beadgraph.
//!
//! The analysis engine itself never fails; these errors come from the edges
//! of the system: locating and loading issue files, reading configuration,
//! and reading or writing snapshots.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for beadgraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The issue file could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] beadgraph_jsonl::Error),

    /// No `.beads` directory above the working directory.
    #[error("Not a beads repository (no .beads directory found from {})", .0.display())]
    BeadsDirNotFound(PathBuf),

    /// The beads directory contains no issue file.
    #[error("No issue file found in {}", .0.display())]
    NoIssueFile(PathBuf),

    /// An issue ID was requested that is not in the loaded set.
    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    /// A label was requested that no issue carries.
    #[error("Label not found: {0}")]
    LabelNotFound(String),

    /// A snapshot file was unreadable or of an unsupported shape.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// A specialized Result type for beadgraph operations.
pub type Result<T> = std::result::Result<T, Error>;
