//! Non-fatal problems found while loading JSONL data.
//!
//! A resilient load never fails because of a single bad line. Each skipped
//! line becomes a [`Warning`], gathered by a shared [`WarningCollector`] so
//! the caller can report them once loading finishes.
//!
//! ```
//! use beadgraph_jsonl::warning::{Warning, WarningCollector};
//!
//! let collector = WarningCollector::new();
//! collector.add(Warning::MalformedJson {
//!     line_number: 5,
//!     error: "unexpected end of input".to_string(),
//! });
//! assert_eq!(collector.into_warnings().len(), 1);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// A line that was skipped during a resilient load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The line was not valid JSON for the target type.
    MalformedJson {
        /// 1-based line number.
        line_number: usize,
        /// Parser error text.
        error: String,
    },

    /// The line was skipped for a non-syntax reason (encoding, validation).
    SkippedLine {
        /// 1-based line number.
        line_number: usize,
        /// Why the line was dropped.
        reason: String,
    },
}

impl Warning {
    /// Returns the 1-based line number this warning refers to.
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedJson { line_number, .. } | Self::SkippedLine { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Returns a human-readable description including the line number.
    ///
    /// ```
    /// use beadgraph_jsonl::warning::Warning;
    ///
    /// let warning = Warning::SkippedLine {
    ///     line_number: 3,
    ///     reason: "missing title".to_string(),
    /// };
    /// assert_eq!(warning.description(), "line 3: skipped: missing title");
    /// ```
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MalformedJson { line_number, error } => {
                format!("line {line_number}: malformed JSON: {error}")
            }
            Self::SkippedLine {
                line_number,
                reason,
            } => format!("line {line_number}: skipped: {reason}"),
        }
    }

    /// Returns a stable identifier for the warning kind, for grouping and JSON output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::SkippedLine { .. } => "skipped_line",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl std::error::Error for Warning {}

/// Thread-safe, cloneable accumulator of [`Warning`]s.
///
/// Clones share the same underlying list, so one handle can be moved into a
/// stream while the caller keeps another to read results afterwards. A
/// poisoned lock is recovered rather than propagated: the list only ever
/// grows, so a panic mid-push cannot leave it inconsistent.
#[derive(Debug, Clone, Default)]
pub struct WarningCollector {
    warnings: Arc<Mutex<Vec<Warning>>>,
}

impl WarningCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn add(&self, warning: Warning) {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning);
    }

    /// Number of warnings recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies out the current warnings without consuming the collector.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consumes the collector and returns its warnings in insertion order.
    ///
    /// If other clones are still alive the list is copied instead of moved.
    #[must_use]
    pub fn into_warnings(self) -> Vec<Warning> {
        match Arc::try_unwrap(self.warnings) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}
