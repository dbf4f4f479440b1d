//! Error types for beadgraph-jsonl operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while loading JSONL data.
///
/// Per-line problems are not errors; they become [`crate::Warning`]s.
#[derive(Debug, Error)]
pub enum Error {
    /// The file or directory could not be read.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A record failed to parse in strict mode.
    #[error("JSON error on line {line_number}: {source}")]
    Json {
        /// 1-based line number of the offending record.
        line_number: usize,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Discovery was pointed at something that is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// A specialized Result type for beadgraph-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
