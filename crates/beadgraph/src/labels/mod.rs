//! Label-scoped analysis.
//!
//! Labels partition the issue set into overlapping topics. This module and
//! its children answer per-topic questions:
//!
//! - [`extract_labels`]: which labels exist and how their issues are spread
//! - [`subgraph`]: the dependency neighbourhood of one label, with PageRank
//!   and critical path recomputed inside it
//! - [`flow`]: how work blocks across label boundaries
//! - [`health`]: velocity, freshness, flow, and criticality per label
//! - [`attention`]: which labels most need someone to look at them

pub mod attention;
pub mod flow;
pub mod health;
pub mod subgraph;

pub use attention::{AttentionResult, LabelAttention, compute_label_attention};
pub use flow::{BlockingPair, CrossLabelFlow, LabelDependency, compute_cross_label_flow};
pub use health::{
    CriticalityMetrics, FlowMetrics, FreshnessMetrics, LabelAnalysisResult, LabelHealth,
    LabelSummary, Trend, VelocityMetrics, compute_all_label_health, compute_label_health,
};
pub use subgraph::{LabelPageRank, LabelSubgraph, RankedIssue, ScopedAnalysis};

use crate::domain::{Issue, IssueStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// How many labels [`LabelExtraction::top_labels`] keeps.
pub const TOP_LABELS: usize = 10;

/// Issue counts for one label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelStats {
    /// The label
    pub label: String,
    /// Occurrences across issues (a label repeated on one issue counts twice)
    pub total: usize,
    /// Open issues
    pub open: usize,
    /// In-progress issues
    pub in_progress: usize,
    /// Explicitly blocked issues
    pub blocked: usize,
    /// Closed issues
    pub closed: usize,
}

/// Every label in an issue set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelExtraction {
    /// Distinct labels, sorted
    pub labels: Vec<String>,
    /// `labels.len()`
    pub label_count: usize,
    /// Issues scanned
    pub issue_count: usize,
    /// Per-label counts
    pub stats: BTreeMap<String, LabelStats>,
    /// Issues with no (non-empty) label
    pub unlabeled_count: usize,
    /// Labels by occurrence count descending, then name, capped at [`TOP_LABELS`]
    pub top_labels: Vec<String>,
}

/// Collects labels and per-label counts. Empty label strings are ignored.
#[must_use]
pub fn extract_labels(issues: &[Issue]) -> LabelExtraction {
    let mut stats: BTreeMap<String, LabelStats> = BTreeMap::new();
    let mut unlabeled_count = 0;

    for issue in issues {
        let mut labelled = false;
        for label in issue.labels.iter().filter(|l| !l.is_empty()) {
            labelled = true;
            let entry = stats.entry(label.clone()).or_insert_with(|| LabelStats {
                label: label.clone(),
                ..LabelStats::default()
            });
            entry.total += 1;
            match issue.status {
                IssueStatus::Open => entry.open += 1,
                IssueStatus::InProgress => entry.in_progress += 1,
                IssueStatus::Blocked => entry.blocked += 1,
                IssueStatus::Closed => entry.closed += 1,
            }
        }
        if !labelled {
            unlabeled_count += 1;
        }
    }

    let labels: Vec<String> = stats.keys().cloned().collect();
    let mut top_labels = labels.clone();
    top_labels.sort_by(|a, b| stats[b].total.cmp(&stats[a].total).then_with(|| a.cmp(b)));
    top_labels.truncate(TOP_LABELS);

    LabelExtraction {
        label_count: labels.len(),
        labels,
        issue_count: issues.len(),
        stats,
        unlabeled_count,
        top_labels,
    }
}

/// Issues carrying `label`.
#[must_use]
pub fn label_issues<'a>(issues: &'a [Issue], label: &str) -> Vec<&'a Issue> {
    if label.is_empty() {
        return Vec::new();
    }
    issues.iter().filter(|i| i.has_label(label)).collect()
}

/// Distinct, sorted, non-empty labels of one issue.
pub(crate) fn distinct_labels(issue: &Issue) -> Vec<&str> {
    let mut labels: Vec<&str> = issue
        .labels
        .iter()
        .map(String::as_str)
        .filter(|l| !l.is_empty())
        .collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}
