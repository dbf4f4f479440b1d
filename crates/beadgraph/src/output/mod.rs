//! Output formatting for CLI commands.
//!
//! Every command result can be printed as human-readable text or as
//! pretty-printed JSON for programmatic use. Text rendering lives in
//! [`report`]; this module owns the configuration and the dispatch.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons, bars)
//! - [`report`]: Text renderers, one per command
//! - [`tree`]: Tree rendering with ASCII/Unicode connectors

pub mod color;
pub mod report;
pub mod tree;

use crate::analysis::ExecutionPlan;
use crate::insights::Insights;
use crate::labels::{AttentionResult, CrossLabelFlow, LabelAnalysisResult, ScopedAnalysis};
use crate::snapshot::SnapshotDiff;
use crate::triage::{ProjectHealth, Recommendation, SuggestionReport, TriageResult};
use serde::Serialize;
use std::env;
use std::io::{self, StdoutLock, Write};

pub use color::{error, success, warning};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 100;

/// Configuration for text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    #[must_use]
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `BEADGRAPH_MAX_WIDTH`: Maximum content width (default: 100)
    /// - `BEADGRAPH_ASCII`: "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `BEADGRAPH_COLOR`: "0" or "false" to disable colors (default: true)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_width = match lookup("BEADGRAPH_MAX_WIDTH") {
            Some(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    env_var = "BEADGRAPH_MAX_WIDTH",
                    value = %s,
                    default = DEFAULT_MAX_CONTENT_WIDTH,
                    "Invalid value, using default"
                );
                DEFAULT_MAX_CONTENT_WIDTH
            }),
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("BEADGRAPH_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "BEADGRAPH_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // https://no-color.org/
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("BEADGRAPH_COLOR")
                .is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Usable width: the terminal width capped at `max_width`.
    #[must_use]
    pub fn content_width(&self) -> usize {
        get_terminal_width().min(self.max_width)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| w.0)
        .into()
}

/// Wraps `text` to `max_width` columns, keeping explicit line breaks.
pub(crate) fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    textwrap::wrap(text, max_width.max(10))
        .into_iter()
        .map(std::borrow::Cow::into_owned)
        .collect()
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Dispatch
// ============================================================================

/// Writes `value` as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// Fails if serialization or the write fails.
pub fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(w, "{json}")
}

fn emit<T, F>(value: &T, mode: OutputMode, text: F) -> io::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut StdoutLock<'static>, &OutputConfig) -> io::Result<()>,
{
    let mut handle = io::stdout().lock();
    match mode {
        OutputMode::Text => text(&mut handle, &OutputConfig::from_env()),
        OutputMode::Json => write_json(&mut handle, value),
    }
}

/// Print the full triage report.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_triage(result: &TriageResult, mode: OutputMode) -> io::Result<()> {
    emit(result, mode, |w, c| report::write_triage(w, result, c))
}

/// Print the single best recommendation.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_next(top: Option<&Recommendation>, mode: OutputMode) -> io::Result<()> {
    emit(&top, mode, |w, c| report::write_next(w, top, c))
}

/// Print a ranked recommendation list.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_priority(recommendations: &[Recommendation], mode: OutputMode) -> io::Result<()> {
    emit(recommendations, mode, |w, c| {
        report::write_priority(w, recommendations, c)
    })
}

/// Print priority and dependency suggestions.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_suggestions(report: &SuggestionReport, mode: OutputMode) -> io::Result<()> {
    emit(report, mode, |w, c| report::write_suggestions(w, report, c))
}

/// Print graph insights.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_insights(insights: &Insights, mode: OutputMode) -> io::Result<()> {
    emit(insights, mode, |w, c| report::write_insights(w, insights, c))
}

/// Print the execution plan.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_plan(plan: &ExecutionPlan, mode: OutputMode) -> io::Result<()> {
    emit(plan, mode, |w, c| report::write_plan(w, plan, c))
}

/// Print health for every label.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_label_health(result: &LabelAnalysisResult, mode: OutputMode) -> io::Result<()> {
    emit(result, mode, |w, c| report::write_label_health(w, result, c))
}

/// Print cross-label blocking flow.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_label_flow(flow: &CrossLabelFlow, mode: OutputMode) -> io::Result<()> {
    emit(flow, mode, |w, c| report::write_label_flow(w, flow, c))
}

/// Print the label attention ranking, capped at `limit` in text mode.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_label_attention(
    result: &AttentionResult,
    limit: usize,
    mode: OutputMode,
) -> io::Result<()> {
    emit(result, mode, |w, c| {
        report::write_label_attention(w, result, limit, c)
    })
}

/// Print the analysis scoped to one label.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_scoped(analysis: &ScopedAnalysis, limit: usize, mode: OutputMode) -> io::Result<()> {
    emit(analysis, mode, |w, c| report::write_scoped(w, analysis, limit, c))
}

/// Print a snapshot diff.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_diff(diff: &SnapshotDiff, mode: OutputMode) -> io::Result<()> {
    emit(diff, mode, |w, c| report::write_diff(w, diff, c))
}

/// Summary printed by the `stats` command.
#[derive(Debug, Serialize)]
pub struct StatsReport<'a> {
    /// Issue file that was analysed
    pub source: String,
    /// Lines skipped while loading
    pub skipped_lines: Vec<String>,
    /// Counts, graph shape, and velocity
    pub health: &'a ProjectHealth,
}

/// Print project statistics.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_stats(stats: &StatsReport<'_>, mode: OutputMode) -> io::Result<()> {
    emit(stats, mode, |w, c| report::write_stats(w, stats, c))
}

/// Print a one-line message in text mode, or `{"message": ...}` in JSON mode.
///
/// # Errors
///
/// Fails if stdout cannot be written.
pub fn print_message(msg: &str, mode: OutputMode) -> io::Result<()> {
    let value = serde_json::json!({ "message": msg });
    emit(&value, mode, |w, _| writeln!(w, "{msg}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> OutputConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        OutputConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn output_config_defaults() {
        assert_eq!(config_from(&[]), OutputConfig::default());
    }

    #[test]
    fn output_config_reads_environment() {
        let config = config_from(&[
            ("BEADGRAPH_MAX_WIDTH", "60"),
            ("BEADGRAPH_ASCII", "true"),
            ("NO_COLOR", "1"),
        ]);
        assert_eq!(config, OutputConfig::new(60, true, false));
    }

    #[test]
    fn output_config_ignores_bad_values() {
        let config = config_from(&[
            ("BEADGRAPH_MAX_WIDTH", "wide"),
            ("BEADGRAPH_ASCII", "maybe"),
            ("BEADGRAPH_COLOR", "false"),
        ]);
        assert_eq!(config.max_width, DEFAULT_MAX_CONTENT_WIDTH);
        assert!(!config.use_ascii);
        assert!(!config.use_colors);
    }

    #[test]
    fn color_switch_accepts_zero() {
        assert!(!config_from(&[("BEADGRAPH_COLOR", "0")]).use_colors);
        assert!(config_from(&[("BEADGRAPH_COLOR", "1")]).use_colors);
    }

    #[test]
    fn wrap_text_respects_width_and_newlines() {
        let lines = wrap_text("alpha beta gamma delta\nepsilon", 12);
        assert_eq!(lines, vec!["alpha beta", "gamma delta", "epsilon"]);
    }

    #[test]
    fn json_is_pretty_with_trailing_newline() {
        let mut buf = Vec::new();
        write_json(&mut buf, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
