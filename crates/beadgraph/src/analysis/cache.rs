//! Content fingerprinting and Phase-2 reuse across reloads.
//!
//! The cache is explicit: callers hand the previous [`GraphStats`] to
//! [`CachedAnalyzer::new`]. When the new issue set has the same fingerprint
//! (and the centrality settings are unchanged) the previous Phase-2 batch is
//! shared instead of recomputed. Phase-1 is always recomputed; it is cheap.

use super::stats::GraphStats;
use super::{Analyzer, stats::Phase2Cell};
use crate::config::CentralityConfig;
use crate::domain::Issue;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Fingerprint of an empty issue set.
pub const EMPTY_FINGERPRINT: &str = "empty";

const FIELD_SEP: u8 = 0;
const ISSUE_SEP: u8 = 1;

/// Stable content hash of an issue set.
///
/// Independent of input order: issues are hashed sorted by ID, and labels and
/// dependencies sorted within each issue. Every field the engine reads takes
/// part, so any change that could alter a metric changes the fingerprint.
/// Returns the first 16 hex digits of a SHA-256 digest.
#[must_use]
pub fn fingerprint(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return EMPTY_FINGERPRINT.to_string();
    }

    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut hasher = Sha256::new();
    for issue in sorted {
        let mut labels: Vec<&str> = issue.labels.iter().map(String::as_str).collect();
        labels.sort_unstable();
        let mut deps: Vec<String> = issue
            .dependencies
            .iter()
            .map(|d| format!("{}:{}", d.depends_on_id, d.dep_type.as_str()))
            .collect();
        deps.sort_unstable();

        let fields = [
            issue.id.as_str().to_string(),
            issue.title.clone(),
            issue.status.as_str().to_string(),
            issue.priority.to_string(),
            issue.issue_type.as_str().to_string(),
            issue.assignee.clone().unwrap_or_default(),
            issue
                .estimated_minutes
                .map(|m| m.to_string())
                .unwrap_or_default(),
            issue.created_at.to_rfc3339(),
            issue.updated_at.to_rfc3339(),
            issue.closed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            labels.join(","),
            deps.join(","),
        ];
        for field in &fields {
            hasher.update(field.as_bytes());
            hasher.update([FIELD_SEP]);
        }
        hasher.update([ISSUE_SEP]);
    }

    let digest = hasher.finalize();
    digest
        .iter()
        .take(8)
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// An [`Analyzer`] that reuses Phase-2 results from a previous analysis when
/// the issue set has not changed.
#[derive(Debug)]
pub struct CachedAnalyzer<'a> {
    analyzer: Analyzer<'a>,
    fingerprint: String,
    reuse: Option<Arc<Phase2Cell>>,
}

impl<'a> CachedAnalyzer<'a> {
    /// Prepares an analysis of `issues`, matching against `previous`.
    ///
    /// Fingerprinting is pure, so this is safe to call while the previous
    /// analysis's Phase-2 task is still running; a hit shares its pending cell.
    #[must_use]
    pub fn new(
        issues: &'a [Issue],
        config: &CentralityConfig,
        previous: Option<&Arc<GraphStats>>,
    ) -> Self {
        let fingerprint = fingerprint(issues);
        let reuse = previous
            .filter(|prev| {
                prev.fingerprint() == fingerprint && prev.centrality_config() == config
            })
            .map(|prev| Arc::clone(prev.phase2_cell()));

        if reuse.is_some() {
            tracing::debug!(fingerprint = %fingerprint, "Analysis cache hit, reusing Phase-2");
        } else {
            tracing::debug!(fingerprint = %fingerprint, "Analysis cache miss");
        }

        Self {
            analyzer: Analyzer::new(issues, config),
            fingerprint,
            reuse,
        }
    }

    /// Whether Phase-2 will be reused rather than recomputed.
    #[must_use]
    pub fn was_cache_hit(&self) -> bool {
        self.reuse.is_some()
    }

    /// Fingerprint of the issue set being analysed.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Runs Phase-1 and either shares the cached Phase-2 cell or dispatches a
    /// fresh Phase-2 task.
    #[must_use]
    pub fn analyze(&self) -> Arc<GraphStats> {
        self.analyzer
            .analyze_with(self.fingerprint.clone(), self.reuse.clone())
    }
}
