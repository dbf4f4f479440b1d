//! Point-in-time captures of an issue set and the differences between two
//! of them.
//!
//! A [`Snapshot`] keeps only what change detection needs: per-issue status,
//! priority, title, labels, update time, and blockers, plus headline graph
//! metrics and the cycle list. [`compare_snapshots`] turns two captures into
//! a [`SnapshotDiff`].

use crate::analysis::{Analyzer, GraphStats};
use crate::config::CentralityConfig;
use crate::domain::{Issue, IssueId, IssueStatus};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// ============================================================================
// Snapshot
// ============================================================================

/// The tracked fields of one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotIssue {
    /// Issue ID
    pub id: IssueId,
    /// Title
    pub title: String,
    /// Status
    pub status: IssueStatus,
    /// Priority (0 = most urgent)
    pub priority: u8,
    /// Labels, sorted and deduplicated
    #[serde(default)]
    pub labels: Vec<String>,
    /// Last update
    pub updated_at: DateTime<Utc>,
    /// IDs this issue depends on via blocking edges, sorted
    #[serde(default)]
    pub blocked_by: Vec<IssueId>,
}

impl From<&Issue> for SnapshotIssue {
    fn from(issue: &Issue) -> Self {
        let labels: BTreeSet<String> = issue
            .labels
            .iter()
            .filter(|l| !l.is_empty())
            .cloned()
            .collect();
        let blocked_by: BTreeSet<IssueId> = issue.blocking_dependencies().cloned().collect();
        Self {
            id: issue.id.clone(),
            title: issue.title.clone(),
            status: issue.status,
            priority: issue.priority,
            labels: labels.into_iter().collect(),
            updated_at: issue.updated_at,
            blocked_by: blocked_by.into_iter().collect(),
        }
    }
}

/// Headline counts at capture time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    /// Issues captured
    pub total_issues: usize,
    /// Non-closed issues
    pub open_issues: usize,
    /// Closed issues
    pub closed_issues: usize,
    /// Non-closed issues waiting on an open blocker
    pub blocked_issues: usize,
    /// Issues ready to work on
    pub actionable_issues: usize,
    /// Cycles detected
    pub cycle_count: usize,
    /// Blocking edges
    pub edge_count: usize,
}

/// A point-in-time capture of an issue set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Capture time
    pub taken_at: DateTime<Utc>,
    /// Free-form revision tag (commit, tag, file name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Content fingerprint of the issue set
    pub fingerprint: String,
    /// Captured issues, sorted by ID
    pub issues: Vec<SnapshotIssue>,
    /// Cycles in the blocking graph
    #[serde(default)]
    pub cycles: Vec<Vec<IssueId>>,
    /// Headline counts
    pub metrics: SnapshotMetrics,
}

impl Snapshot {
    /// Captures `issues`, running a full analysis to find cycles.
    #[must_use]
    pub fn new(issues: &[Issue], taken_at: DateTime<Utc>) -> Self {
        let stats = Analyzer::new(issues, &CentralityConfig::default()).analyze_blocking();
        Self::from_stats(issues, &stats, taken_at)
    }

    /// Captures `issues` reusing an existing analysis of the same set.
    ///
    /// Cycles are only recorded when Phase-2 has completed on `stats`.
    #[must_use]
    pub fn from_stats(issues: &[Issue], stats: &GraphStats, taken_at: DateTime<Utc>) -> Self {
        let mut by_id: BTreeMap<&IssueId, SnapshotIssue> = BTreeMap::new();
        for issue in issues {
            by_id.entry(&issue.id).or_insert_with(|| issue.into());
        }
        let captured: Vec<SnapshotIssue> = by_id.into_values().collect();

        let closed = captured.iter().filter(|i| i.status.is_closed()).count();
        let cycles = stats.cycles().to_vec();
        let metrics = SnapshotMetrics {
            total_issues: captured.len(),
            open_issues: captured.len() - closed,
            closed_issues: closed,
            blocked_issues: stats.phase1().blocked_count,
            actionable_issues: stats.actionable_count(),
            cycle_count: cycles.len(),
            edge_count: stats.edge_count(),
        };

        Self {
            taken_at,
            revision: None,
            fingerprint: stats.fingerprint().to_string(),
            issues: captured,
            cycles,
            metrics,
        }
    }

    /// Sets the revision tag.
    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Looks up a captured issue.
    #[must_use]
    pub fn get(&self, id: &IssueId) -> Option<&SnapshotIssue> {
        self.issues
            .binary_search_by(|i| i.id.cmp(id))
            .ok()
            .map(|idx| &self.issues[idx])
    }

    /// Writes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        tracing::debug!(path = %path.display(), issues = self.issues.len(), "Snapshot saved");
        Ok(())
    }

    /// Reads a snapshot written by [`Snapshot::save`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Snapshot`] if it is not a snapshot.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mut snapshot: Self = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Snapshot(format!("{}: {e}", path.display())))?;
        snapshot.issues.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.issues.dedup_by(|a, b| a.id == b.id);
        Ok(snapshot)
    }
}

// ============================================================================
// Diff
// ============================================================================

/// Minimal identity of an issue named in a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRef {
    /// Issue ID
    pub id: IssueId,
    /// Title in the later snapshot (earlier one for removed issues)
    pub title: String,
    /// Priority
    pub priority: u8,
    /// Status
    pub status: IssueStatus,
}

impl From<&SnapshotIssue> for IssueRef {
    fn from(issue: &SnapshotIssue) -> Self {
        Self {
            id: issue.id.clone(),
            title: issue.title.clone(),
            priority: issue.priority,
            status: issue.status,
        }
    }
}

/// One changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    /// Field name
    pub field: String,
    /// Rendered earlier value
    pub old_value: String,
    /// Rendered later value
    pub new_value: String,
}

/// An issue present in both snapshots whose tracked fields changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedIssue {
    /// Issue ID
    pub issue_id: IssueId,
    /// Title in the later snapshot
    pub title: String,
    /// Changes in field order
    pub changes: Vec<FieldChange>,
}

/// Signed change in headline counts, later minus earlier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricDeltas {
    /// Issues
    pub total_issues: i64,
    /// Non-closed issues
    pub open_issues: i64,
    /// Closed issues
    pub closed_issues: i64,
    /// Blocked issues
    pub blocked_issues: i64,
    /// Actionable issues
    pub actionable_issues: i64,
    /// Cycles
    pub cycle_count: i64,
    /// Blocking edges
    pub edge_count: i64,
}

/// Overall direction of a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTrend {
    /// More closed, fewer blocked or cyclic
    Improving,
    /// No net movement
    #[default]
    Stable,
    /// More blocked or cyclic work
    Degrading,
}

impl HealthTrend {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Degrading => "degrading",
        }
    }
}

/// Counts for quick display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// New issues
    pub issues_added: usize,
    /// Newly closed issues
    pub issues_closed: usize,
    /// Issues only in the earlier snapshot
    pub issues_removed: usize,
    /// Closed issues opened again
    pub issues_reopened: usize,
    /// Issues with field changes
    pub issues_modified: usize,
    /// Cycles only in the later snapshot
    pub cycles_introduced: usize,
    /// Cycles only in the earlier snapshot
    pub cycles_resolved: usize,
    /// Overall direction
    pub health_trend: HealthTrend,
}

/// Differences between two snapshots. Every list is sorted by ID.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotDiff {
    /// Earlier capture time
    pub from_taken_at: DateTime<Utc>,
    /// Later capture time
    pub to_taken_at: DateTime<Utc>,
    /// Earlier revision tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_revision: Option<String>,
    /// Later revision tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_revision: Option<String>,
    /// Only in the later snapshot
    pub new_issues: Vec<IssueRef>,
    /// Open before, closed now
    pub closed_issues: Vec<IssueRef>,
    /// Closed before, open now
    pub reopened_issues: Vec<IssueRef>,
    /// Only in the earlier snapshot
    pub removed_issues: Vec<IssueRef>,
    /// Field-level changes that are not a close or reopen
    pub modified_issues: Vec<ModifiedIssue>,
    /// Cycles only in the later snapshot
    pub new_cycles: Vec<Vec<IssueId>>,
    /// Cycles only in the earlier snapshot
    pub resolved_cycles: Vec<Vec<IssueId>>,
    /// Headline count changes
    pub metric_deltas: MetricDeltas,
    /// Counts
    pub summary: DiffSummary,
}

impl SnapshotDiff {
    /// Returns `true` when nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_issues.is_empty()
            && self.closed_issues.is_empty()
            && self.reopened_issues.is_empty()
            && self.removed_issues.is_empty()
            && self.modified_issues.is_empty()
            && self.new_cycles.is_empty()
            && self.resolved_cycles.is_empty()
    }
}

fn join_ids(ids: &[IssueId]) -> String {
    ids.iter().map(IssueId::as_str).collect::<Vec<_>>().join(", ")
}

fn field_changes(from: &SnapshotIssue, to: &SnapshotIssue) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut push = |field: &str, old: String, new: String| {
        changes.push(FieldChange {
            field: field.to_string(),
            old_value: old,
            new_value: new,
        });
    };

    if from.title != to.title {
        push("title", from.title.clone(), to.title.clone());
    }
    if from.status != to.status {
        push("status", from.status.as_str().into(), to.status.as_str().into());
    }
    if from.priority != to.priority {
        push("priority", format!("P{}", from.priority), format!("P{}", to.priority));
    }
    if from.labels != to.labels {
        push("labels", from.labels.join(", "), to.labels.join(", "));
    }
    if from.blocked_by != to.blocked_by {
        push("blocked_by", join_ids(&from.blocked_by), join_ids(&to.blocked_by));
    }
    if from.updated_at != to.updated_at {
        push("updated_at", from.updated_at.to_rfc3339(), to.updated_at.to_rfc3339());
    }
    changes
}

fn delta(from: usize, to: usize) -> i64 {
    i64::try_from(to).unwrap_or(i64::MAX) - i64::try_from(from).unwrap_or(i64::MAX)
}

/// Net signal: closures and resolved cycles count for, blocked work and new
/// cycles against.
fn health_trend(summary: &DiffSummary, deltas: &MetricDeltas) -> HealthTrend {
    let closed = i64::try_from(summary.issues_closed).unwrap_or(i64::MAX);
    let reopened = i64::try_from(summary.issues_reopened).unwrap_or(i64::MAX);
    let signal = closed - reopened - deltas.blocked_issues - 2 * deltas.cycle_count;
    match signal {
        s if s > 0 => HealthTrend::Improving,
        s if s < 0 => HealthTrend::Degrading,
        _ => HealthTrend::Stable,
    }
}

/// Compares an earlier snapshot with a later one.
///
/// An issue moving to closed is reported only as closed and one leaving
/// closed only as reopened, even if other fields changed too.
#[must_use]
pub fn compare_snapshots(from: &Snapshot, to: &Snapshot) -> SnapshotDiff {
    let before: BTreeMap<&IssueId, &SnapshotIssue> = from.issues.iter().map(|i| (&i.id, i)).collect();
    let after: BTreeMap<&IssueId, &SnapshotIssue> = to.issues.iter().map(|i| (&i.id, i)).collect();

    let mut new_issues = Vec::new();
    let mut closed_issues = Vec::new();
    let mut reopened_issues = Vec::new();
    let mut modified_issues = Vec::new();

    for (id, now) in &after {
        let Some(then) = before.get(id) else {
            new_issues.push(IssueRef::from(*now));
            continue;
        };
        match (then.status.is_closed(), now.status.is_closed()) {
            (false, true) => closed_issues.push(IssueRef::from(*now)),
            (true, false) => reopened_issues.push(IssueRef::from(*now)),
            _ => {
                let changes = field_changes(then, now);
                if !changes.is_empty() {
                    modified_issues.push(ModifiedIssue {
                        issue_id: now.id.clone(),
                        title: now.title.clone(),
                        changes,
                    });
                }
            }
        }
    }

    let removed_issues: Vec<IssueRef> = before
        .iter()
        .filter(|(id, _)| !after.contains_key(*id))
        .map(|(_, then)| IssueRef::from(*then))
        .collect();

    let old_cycles: BTreeSet<&Vec<IssueId>> = from.cycles.iter().collect();
    let new_cycle_set: BTreeSet<&Vec<IssueId>> = to.cycles.iter().collect();
    let new_cycles: Vec<Vec<IssueId>> = new_cycle_set
        .difference(&old_cycles)
        .map(|c| (*c).clone())
        .collect();
    let resolved_cycles: Vec<Vec<IssueId>> = old_cycles
        .difference(&new_cycle_set)
        .map(|c| (*c).clone())
        .collect();

    let (a, b) = (&from.metrics, &to.metrics);
    let metric_deltas = MetricDeltas {
        total_issues: delta(a.total_issues, b.total_issues),
        open_issues: delta(a.open_issues, b.open_issues),
        closed_issues: delta(a.closed_issues, b.closed_issues),
        blocked_issues: delta(a.blocked_issues, b.blocked_issues),
        actionable_issues: delta(a.actionable_issues, b.actionable_issues),
        cycle_count: delta(a.cycle_count, b.cycle_count),
        edge_count: delta(a.edge_count, b.edge_count),
    };

    let mut summary = DiffSummary {
        issues_added: new_issues.len(),
        issues_closed: closed_issues.len(),
        issues_removed: removed_issues.len(),
        issues_reopened: reopened_issues.len(),
        issues_modified: modified_issues.len(),
        cycles_introduced: new_cycles.len(),
        cycles_resolved: resolved_cycles.len(),
        health_trend: HealthTrend::Stable,
    };
    summary.health_trend = health_trend(&summary, &metric_deltas);

    tracing::debug!(
        added = summary.issues_added,
        closed = summary.issues_closed,
        modified = summary.issues_modified,
        trend = summary.health_trend.as_str(),
        "Snapshots compared"
    );

    SnapshotDiff {
        from_taken_at: from.taken_at,
        to_taken_at: to.taken_at,
        from_revision: from.revision.clone(),
        to_revision: to.revision.clone(),
        new_issues,
        closed_issues,
        reopened_issues,
        removed_issues,
        modified_issues,
        new_cycles,
        resolved_cycles,
        metric_deltas,
        summary,
    }
}
