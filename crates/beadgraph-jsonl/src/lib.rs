//! Resilient JSONL loading for beads issue files.
//!
//! Beads stores one JSON object per line. Files are edited by hand, merged by
//! git, and occasionally truncated, so this crate reads them line by line and
//! keeps going past bad lines, reporting each one as a [`Warning`] instead of
//! failing the whole load.
//!
//! # Example
//!
//! ```no_run
//! use beadgraph_jsonl::read_jsonl_resilient;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Record {
//!     id: String,
//! }
//!
//! # async fn example() -> beadgraph_jsonl::Result<()> {
//! let (records, warnings) = read_jsonl_resilient::<Record, _>(".beads/beads.jsonl").await?;
//! for warning in &warnings {
//!     eprintln!("{warning}");
//! }
//! println!("loaded {} records", records.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod discovery;
pub mod error;
pub mod reader;
pub mod warning;

pub use discovery::find_issue_file;
pub use error::{Error, Result};
pub use reader::JsonlReader;
pub use warning::{Warning, WarningCollector};

use futures::stream::StreamExt;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Reads every parseable record from a JSONL file.
///
/// Blank lines are skipped silently. Lines that fail to parse are skipped and
/// reported in the returned warning list with their 1-based line number.
///
/// # Errors
///
/// Returns an error only when the file itself cannot be opened.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = tokio::fs::File::open(path).await?;
    let (stream, collector) = JsonlReader::new(file).stream_resilient::<T>();
    let records: Vec<T> = stream.collect().await;
    let warnings = collector.into_warnings();

    tracing::debug!(
        path = %path.display(),
        records = records.len(),
        warnings = warnings.len(),
        "Loaded JSONL file"
    );

    Ok((records, warnings))
}

/// Reads every parseable record that `validate` accepts.
///
/// Rejected records are reported as [`Warning::SkippedLine`] carrying the
/// line number and the reason returned by `validate`.
///
/// # Errors
///
/// Returns an error only when the file itself cannot be opened.
pub async fn read_jsonl_validated<T, P, F>(path: P, validate: F) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
    F: Fn(&T) -> std::result::Result<(), String> + Clone,
{
    let path = path.as_ref();
    let file = tokio::fs::File::open(path).await?;
    let (stream, collector) = JsonlReader::new(file).stream_validated(validate);
    let records: Vec<T> = stream.collect().await;
    let warnings = collector.into_warnings();

    tracing::debug!(
        path = %path.display(),
        records = records.len(),
        warnings = warnings.len(),
        "Loaded and validated JSONL file"
    );

    Ok((records, warnings))
}
