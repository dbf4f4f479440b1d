//! Triage: what should be worked on next, and why.
//!
//! [`compute_triage`] layers three things over a [`GraphStats`]:
//!
//! - a per-issue triage score (impact plus unblock and quick-win boosts)
//!   with reasons and an action hint,
//! - derived views: quick wins, blockers to clear, top picks,
//! - a project summary: counts, graph health, closure velocity.
//!
//! [`compute_suggestions`] sits beside it: priority changes backed by the
//! same impact scores, and dependencies that look missing.
//!
//! Everything is a pure function of its inputs and the supplied `now`.

pub mod impact;
pub mod missing_deps;
pub mod reasons;
pub mod suggest;
pub mod velocity;

pub use impact::{ImpactScore, ScoreBreakdown, compute_impact_scores};
pub use missing_deps::{DependencySuggestion, detect_missing_dependencies, extract_keywords};
pub use reasons::{ReasonContext, TriageReasons, format_unblock_list, generate_reasons};
pub use suggest::{
    Direction, PriorityRecommendation, WhatIfDelta, compute_priority_recommendations, what_if,
};
pub use velocity::{Velocity, VelocityWeek, compute_velocity};

use crate::analysis::GraphStats;
use crate::config::{SuggestionConfig, TriageConfig};
use crate::domain::{HIGH_PRIORITY_MAX, Issue, IssueId, IssueStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

/// Version tag carried in [`TriageMeta`].
pub const TRIAGE_VERSION: &str = "1.0.0";

/// Group key for issues that are not in any execution-plan track.
pub const UNGROUPED_TRACK: &str = "ungrouped";

/// Group key for issues without labels.
pub const UNLABELED: &str = "unlabeled";

/// How recommendations are grouped, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// By execution-plan track
    Track,
    /// By first label
    Label,
}

/// Knobs that are per-call rather than per-project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriageOptions {
    /// Optional grouping of recommendations
    pub group_by: Option<GroupBy>,
    /// Block until Phase-2 lands so centrality feeds the scores
    pub wait_for_phase2: bool,
}

impl Default for TriageOptions {
    fn default() -> Self {
        Self {
            group_by: None,
            wait_for_phase2: true,
        }
    }
}

/// The boosts layered on top of the impact score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriageFactors {
    /// `impact * base_weight`
    pub base: f64,
    /// Boost for freeing downstream work
    pub unblock_boost: f64,
    /// Boost for shallow, ready work
    pub quick_win_boost: f64,
}

/// One ranked issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Issue ID
    pub id: IssueId,
    /// Issue title
    pub title: String,
    /// Current status
    pub status: IssueStatus,
    /// Priority
    pub priority: u8,
    /// Labels
    pub labels: Vec<String>,
    /// Triage score
    pub score: f64,
    /// Underlying impact score
    pub impact_score: f64,
    /// Impact components
    pub breakdown: ScoreBreakdown,
    /// Boosts
    pub factors: TriageFactors,
    /// Ordered reasons
    pub reasons: Vec<String>,
    /// Most important reason
    pub primary_reason: String,
    /// Suggested next action
    pub action: String,
    /// Issues that become actionable once this closes
    pub unblocks: Vec<IssueId>,
    /// Open blockers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<IssueId>,
    /// Ready to start now
    pub is_actionable: bool,
    /// Quick-win boost cleared its threshold
    pub is_quick_win: bool,
    /// Command that claims the issue
    pub claim_command: String,
    /// Command that shows the issue
    pub show_command: String,
}

/// A ready issue that is cheap to land.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickWin {
    /// Issue ID
    pub id: IssueId,
    /// Issue title
    pub title: String,
    /// Quick-win score
    pub score: f64,
    /// Short explanation
    pub reason: String,
    /// Issues freed by closing it
    pub unblocks: Vec<IssueId>,
}

/// An issue holding up other work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockerItem {
    /// Issue ID
    pub id: IssueId,
    /// Issue title
    pub title: String,
    /// `unblocks.len()`
    pub unblocks_count: usize,
    /// Issues freed by closing it
    pub unblocks: Vec<IssueId>,
    /// Whether it can be started now
    pub actionable: bool,
    /// Its own open blockers, when not actionable
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<IssueId>,
}

/// A condensed recommendation for the quick reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPick {
    /// Issue ID
    pub id: IssueId,
    /// Issue title
    pub title: String,
    /// Triage score
    pub score: f64,
    /// Ordered reasons
    pub reasons: Vec<String>,
    /// How many issues it frees
    pub unblocks: usize,
}

/// At-a-glance numbers plus the top picks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickRef {
    /// Non-closed issues
    pub open_count: usize,
    /// Actionable issues
    pub actionable_count: usize,
    /// Non-closed issues waiting on a blocker
    pub blocked_count: usize,
    /// Issues in progress
    pub in_progress_count: usize,
    /// Best few recommendations
    pub top_picks: Vec<TopPick>,
}

/// Issue counts by state, type, and priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Distinct issues
    pub total: usize,
    /// Non-closed issues
    pub open: usize,
    /// Closed issues
    pub closed: usize,
    /// Actionable issues
    pub actionable: usize,
    /// Non-closed, not actionable
    pub blocked: usize,
    /// Per status
    pub by_status: BTreeMap<String, usize>,
    /// Per issue type
    pub by_type: BTreeMap<String, usize>,
    /// Per priority
    pub by_priority: BTreeMap<u8, usize>,
}

/// Structural summary of the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphHealth {
    /// Issues in the graph
    pub node_count: usize,
    /// Blocking edges
    pub edge_count: usize,
    /// Edge density
    pub density: f64,
    /// Any blocking cycle present
    pub has_cycles: bool,
    /// Cycles reported
    pub cycle_count: usize,
    /// Whether cycle data and centrality were available
    pub phase2_ready: bool,
}

/// Project-wide health.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectHealth {
    /// Counts
    pub counts: StatusCounts,
    /// Graph summary
    pub graph: GraphHealth,
    /// Closure velocity
    pub velocity: Velocity,
}

/// Ready-to-paste commands for the tracker CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageCommands {
    /// Claim the top pick
    pub claim_top: String,
    /// Show the top pick
    pub show_top: String,
    /// List ready work
    pub list_ready: String,
    /// List blocked work
    pub list_blocked: String,
    /// Regenerate this report
    pub refresh_triage: String,
}

/// Recommendations sharing a track or label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationGroup {
    /// Track ID or label
    pub key: String,
    /// Track reason; empty for labels
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Members, best first
    pub recommendations: Vec<Recommendation>,
    /// Best member
    pub top_pick: Option<IssueId>,
    /// Command claiming the best member
    pub claim_command: String,
    /// Sum of unblock counts over members
    pub total_unblocks: usize,
}

/// Report metadata for staleness detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageMeta {
    /// [`TRIAGE_VERSION`]
    pub version: String,
    /// The `now` the report was computed for
    pub generated_at: DateTime<Utc>,
    /// Whether Phase-2 values fed the scores
    pub phase2_ready: bool,
    /// Distinct issues considered
    pub issue_count: usize,
    /// Wall time spent
    pub compute_time_ms: u64,
}

/// Full triage report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageResult {
    /// Metadata
    pub meta: TriageMeta,
    /// Quick reference
    pub quick_ref: QuickRef,
    /// Ranked recommendations, capped at `top_n`
    pub recommendations: Vec<Recommendation>,
    /// Cheap ready work
    pub quick_wins: Vec<QuickWin>,
    /// Issues holding up the most work
    pub blockers_to_clear: Vec<BlockerItem>,
    /// Project summary
    pub project_health: ProjectHealth,
    /// Suggested commands
    pub commands: TriageCommands,
    /// Recommendations grouped by track
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_track: Option<Vec<RecommendationGroup>>,
    /// Recommendations grouped by label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_label: Option<Vec<RecommendationGroup>>,
}

impl TriageResult {
    /// The best recommendation, if any.
    #[must_use]
    pub fn top(&self) -> Option<&Recommendation> {
        self.recommendations.first()
    }
}

fn claim_command(id: &IssueId) -> String {
    format!("bd update {id} --status=in_progress")
}

fn show_command(id: &IssueId) -> String {
    format!("bd show {id}")
}

/// First occurrence of each ID.
fn distinct(issues: &[Issue]) -> Vec<&Issue> {
    let mut seen = HashSet::new();
    issues.iter().filter(|i| seen.insert(&i.id)).collect()
}

// ============================================================================
// Scoring
// ============================================================================

/// Unblock and quick-win boosts for one issue.
fn factors(
    impact: &ImpactScore,
    stats: &GraphStats,
    config: &TriageConfig,
    max_unblocks: usize,
) -> TriageFactors {
    let base = impact.score * config.base_weight;

    let n = stats.phase1().unblocks(&impact.id).len();
    let unblock_boost = if n > 0 {
        let denom = max_unblocks.max(config.unblock_floor).max(1) as f64;
        (n as f64 / denom).min(1.0) * config.unblock_weight
    } else {
        0.0
    };

    // Explicitly blocked issues are never quick wins, even with no open blockers.
    let eligible = !matches!(impact.status, IssueStatus::InProgress | IssueStatus::Blocked);
    let quick_win_boost = match stats.phase1().blocker_depth(&impact.id) {
        Some(depth) if eligible && depth <= config.quick_win_max_depth =>
        {
            let shallowness = 1.0 - depth as f64 / (config.quick_win_max_depth + 1) as f64;
            (shallowness * impact.score * config.quick_win_weight).min(config.quick_win_weight)
        }
        _ => 0.0,
    };

    TriageFactors {
        base,
        unblock_boost,
        quick_win_boost,
    }
}

fn recommendations(
    issues: &[&Issue],
    stats: &GraphStats,
    config: &TriageConfig,
    label_health: Option<&BTreeMap<String, f64>>,
    impacts: Vec<ImpactScore>,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    let by_id: HashMap<&IssueId, &Issue> = issues.iter().map(|i| (&i.id, *i)).collect();
    let phase1 = stats.phase1();
    let max_unblocks = impacts
        .iter()
        .map(|s| phase1.unblocks(&s.id).len())
        .max()
        .unwrap_or(0);

    let mut recs: Vec<Recommendation> = impacts
        .into_iter()
        .filter_map(|impact| {
            let issue = by_id.get(&impact.id)?;
            let factors = factors(&impact, stats, config, max_unblocks);
            let score = factors.base + factors.unblock_boost + factors.quick_win_boost;
            let is_quick_win = factors.quick_win_boost > config.quick_win_threshold;
            let unblocks = phase1.unblocks(&impact.id).to_vec();
            let blocked_by = phase1.open_blockers(&impact.id).to_vec();

            let reasons = generate_reasons(&ReasonContext {
                issue,
                breakdown: Some(&impact.breakdown),
                unblocks: &unblocks,
                blocked_by: &blocked_by,
                days_since_update: issue.days_since_update(now),
                stale_days: config.stale_days,
                is_quick_win,
                label_health,
            });

            Some(Recommendation {
                claim_command: claim_command(&impact.id),
                show_command: show_command(&impact.id),
                is_actionable: phase1.is_actionable(&impact.id),
                id: impact.id,
                title: impact.title,
                status: impact.status,
                priority: impact.priority,
                labels: issue.labels.clone(),
                score,
                impact_score: impact.score,
                breakdown: impact.breakdown,
                factors,
                reasons: reasons.all,
                primary_reason: reasons.primary,
                action: reasons.action_hint,
                unblocks,
                blocked_by,
                is_quick_win,
            })
        })
        .collect();

    recs.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.priority.cmp(&b.priority))
            .then_with(|| a.id.cmp(&b.id))
    });
    recs
}

// ============================================================================
// Derived views
// ============================================================================

fn quick_wins(recs: &[Recommendation], limit: usize) -> Vec<QuickWin> {
    let mut wins: Vec<QuickWin> = recs
        .iter()
        .filter(|r| r.is_actionable)
        .map(|r| {
            let n = r.unblocks.len();
            let simplicity = match r.breakdown.blocker_ratio_norm {
                x if x < 0.2 => 1.0,
                x if x < 0.4 => 0.5,
                _ => 0.0,
            };
            let urgent = if r.priority <= HIGH_PRIORITY_MAX { 0.5 } else { 0.0 };
            let score = (n as f64 + 1.0).log2() * 0.4 + simplicity * 0.4 + urgent * 0.2;

            let mut reason = if n > 0 {
                format!("Unblocks {n} items")
            } else {
                "Low complexity".to_string()
            };
            if r.priority <= HIGH_PRIORITY_MAX {
                reason.push_str(", high priority");
            }

            QuickWin {
                id: r.id.clone(),
                title: r.title.clone(),
                score,
                reason,
                unblocks: r.unblocks.clone(),
            }
        })
        .collect();

    wins.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    wins.truncate(limit);
    wins
}

fn blockers_to_clear(recs: &[Recommendation], threshold: usize, limit: usize) -> Vec<BlockerItem> {
    let mut blockers: Vec<BlockerItem> = recs
        .iter()
        .filter(|r| r.unblocks.len() > threshold)
        .map(|r| BlockerItem {
            id: r.id.clone(),
            title: r.title.clone(),
            unblocks_count: r.unblocks.len(),
            unblocks: r.unblocks.clone(),
            actionable: r.is_actionable,
            blocked_by: if r.is_actionable {
                Vec::new()
            } else {
                r.blocked_by.clone()
            },
        })
        .collect();

    blockers.sort_by(|a, b| {
        b.unblocks_count
            .cmp(&a.unblocks_count)
            .then_with(|| a.id.cmp(&b.id))
    });
    blockers.truncate(limit);
    blockers
}

fn counts(issues: &[&Issue], stats: &GraphStats) -> StatusCounts {
    let mut counts = StatusCounts {
        total: issues.len(),
        actionable: stats.actionable_count(),
        ..StatusCounts::default()
    };
    for issue in issues {
        if issue.status.is_closed() {
            counts.closed += 1;
        } else {
            counts.open += 1;
            if !stats.phase1().is_actionable(&issue.id) {
                counts.blocked += 1;
            }
        }
        *counts
            .by_status
            .entry(issue.status.as_str().to_string())
            .or_default() += 1;
        *counts
            .by_type
            .entry(issue.issue_type.as_str().to_string())
            .or_default() += 1;
        *counts.by_priority.entry(issue.priority).or_default() += 1;
    }
    counts
}

fn group(
    key: String,
    reason: String,
    recommendations: Vec<Recommendation>,
) -> RecommendationGroup {
    let top_pick = recommendations.first().map(|r| r.id.clone());
    RecommendationGroup {
        claim_command: top_pick.as_ref().map(claim_command).unwrap_or_default(),
        total_unblocks: recommendations.iter().map(|r| r.unblocks.len()).sum(),
        key,
        reason,
        recommendations,
        top_pick,
    }
}

/// Numeric part of `track-N`; anything else sorts last.
fn track_order(key: &str) -> usize {
    key.strip_prefix("track-")
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

fn group_by_track(recs: &[Recommendation], stats: &GraphStats) -> Vec<RecommendationGroup> {
    let plan = stats.execution_plan();
    let mut track_of: HashMap<&IssueId, &str> = HashMap::new();
    let mut reasons: HashMap<&str, &str> = HashMap::new();
    for track in &plan.tracks {
        reasons.insert(&track.track_id, &track.reason);
        for item in &track.items {
            track_of.insert(&item.id, &track.track_id);
        }
    }

    let mut groups: BTreeMap<(usize, String), Vec<Recommendation>> = BTreeMap::new();
    for rec in recs {
        let key = track_of.get(&rec.id).copied().unwrap_or(UNGROUPED_TRACK);
        groups
            .entry((track_order(key), key.to_string()))
            .or_default()
            .push(rec.clone());
    }

    groups
        .into_iter()
        .map(|((_, key), members)| {
            let reason = reasons
                .get(key.as_str())
                .map_or("Issues not in actionable plan", |r| *r)
                .to_string();
            group(key, reason, members)
        })
        .collect()
}

fn group_by_label(recs: &[Recommendation]) -> Vec<RecommendationGroup> {
    let mut groups: BTreeMap<(bool, String), Vec<Recommendation>> = BTreeMap::new();
    for rec in recs {
        let key = match rec.labels.first() {
            Some(label) => (false, label.clone()),
            None => (true, UNLABELED.to_string()),
        };
        groups.entry(key).or_default().push(rec.clone());
    }
    groups
        .into_iter()
        .map(|((_, key), members)| group(key, String::new(), members))
        .collect()
}

// ============================================================================
// Entry point
// ============================================================================

/// Computes the full triage report.
///
/// `label_health` maps label to health score (0-100) and enables the
/// unhealthy-label reason. Unless `options.wait_for_phase2` is off, this
/// blocks until Phase-2 has landed.
#[must_use]
pub fn compute_triage(
    issues: &[Issue],
    stats: &GraphStats,
    config: &TriageConfig,
    label_health: Option<&BTreeMap<String, f64>>,
    options: &TriageOptions,
    now: DateTime<Utc>,
) -> TriageResult {
    let start = Instant::now();
    if options.wait_for_phase2 {
        stats.wait_for_phase2();
    }
    let phase2_ready = stats.is_phase2_ready();
    let issues = distinct(issues);
    let owned: Vec<Issue> = issues.iter().map(|i| (*i).clone()).collect();

    let impacts =
        compute_impact_scores(&owned, stats, &config.weights, config.staleness_horizon_days, now);
    let all = recommendations(&issues, stats, config, label_health, impacts, now);

    let counts = counts(&issues, stats);
    let in_progress_count = issues
        .iter()
        .filter(|i| i.status == IssueStatus::InProgress)
        .count();

    let top_picks = all
        .iter()
        .take(config.top_picks_n)
        .map(|r| TopPick {
            id: r.id.clone(),
            title: r.title.clone(),
            score: r.score,
            reasons: r.reasons.clone(),
            unblocks: r.unblocks.len(),
        })
        .collect();

    let commands = match all.first() {
        Some(top) => TriageCommands {
            claim_top: claim_command(&top.id),
            show_top: show_command(&top.id),
            list_ready: "bd ready".to_string(),
            list_blocked: "bd blocked".to_string(),
            refresh_triage: "beadgraph triage".to_string(),
        },
        None => TriageCommands {
            claim_top: "bd ready  # No top pick available".to_string(),
            show_top: String::new(),
            list_ready: "bd ready".to_string(),
            list_blocked: "bd blocked".to_string(),
            refresh_triage: "beadgraph triage".to_string(),
        },
    };

    let (by_track, by_label) = match options.group_by {
        Some(GroupBy::Track) => (Some(group_by_track(&all, stats)), None),
        Some(GroupBy::Label) => (None, Some(group_by_label(&all))),
        None => (None, None),
    };

    let graph = GraphHealth {
        node_count: stats.node_count(),
        edge_count: stats.edge_count(),
        density: stats.density(),
        has_cycles: stats.has_cycle(),
        cycle_count: stats.phase2().map_or(0, |m| m.cycle_count),
        phase2_ready,
    };

    let quick_ref = QuickRef {
        open_count: counts.open,
        actionable_count: counts.actionable,
        blocked_count: counts.blocked,
        in_progress_count,
        top_picks,
    };

    let quick_wins = quick_wins(&all, config.quick_wins_n);
    let blockers_to_clear = blockers_to_clear(&all, config.blocker_threshold, config.blockers_n);
    let velocity = compute_velocity(&owned, now, velocity::DEFAULT_WEEKS);

    let mut recommendations = all;
    recommendations.truncate(config.top_n);

    let compute_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::debug!(
        issues = issues.len(),
        recommendations = recommendations.len(),
        phase2_ready,
        compute_time_ms,
        "Triage computed"
    );

    TriageResult {
        meta: TriageMeta {
            version: TRIAGE_VERSION.to_string(),
            generated_at: now,
            phase2_ready,
            issue_count: issues.len(),
            compute_time_ms,
        },
        quick_ref,
        recommendations,
        quick_wins,
        blockers_to_clear,
        project_health: ProjectHealth {
            counts,
            graph,
            velocity,
        },
        commands,
        by_track,
        by_label,
    }
}

/// Priority changes and missing dependencies worth a look.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionReport {
    /// The `now` the report was computed for
    pub generated_at: DateTime<Utc>,
    /// Priority changes, most confident first
    pub priority: Vec<PriorityRecommendation>,
    /// Likely missing dependencies, most confident first
    pub dependencies: Vec<DependencySuggestion>,
}

/// Computes priority recommendations and missing-dependency suggestions.
///
/// Blocks until Phase-2 has landed so centrality feeds the impact scores.
#[must_use]
pub fn compute_suggestions(
    issues: &[Issue],
    stats: &GraphStats,
    triage: &TriageConfig,
    config: &SuggestionConfig,
    now: DateTime<Utc>,
) -> SuggestionReport {
    stats.wait_for_phase2();
    let owned: Vec<Issue> = distinct(issues).into_iter().cloned().collect();
    let impacts = compute_impact_scores(
        &owned,
        stats,
        &triage.weights,
        triage.staleness_horizon_days,
        now,
    );
    SuggestionReport {
        generated_at: now,
        priority: compute_priority_recommendations(
            &owned,
            stats,
            &impacts,
            &config.priority,
            triage.staleness_horizon_days,
        ),
        dependencies: detect_missing_dependencies(&owned, &config.dependencies),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::config::CentralityConfig;
    use crate::test_support::{
        blocked_by, chain, issue, now, stale_for, with_labels, with_priority, with_status,
    };

    fn triage(issues: &[Issue], options: &TriageOptions) -> TriageResult {
        let stats = Analyzer::new(issues, &CentralityConfig::default()).analyze();
        compute_triage(issues, &stats, &TriageConfig::default(), None, options, now())
    }

    fn ids(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn empty_project() {
        let result = triage(&[], &TriageOptions::default());
        assert!(result.recommendations.is_empty());
        assert!(result.top().is_none());
        assert_eq!(result.commands.claim_top, "bd ready  # No top pick available");
        assert_eq!(result.meta.version, TRIAGE_VERSION);
        assert_eq!(result.meta.issue_count, 0);
        assert!(result.meta.phase2_ready);
    }

    #[test]
    fn blocker_of_many_ranks_first() {
        let issues = vec![
            issue("root"),
            blocked_by(issue("a"), &["root"]),
            blocked_by(issue("b"), &["root"]),
            blocked_by(issue("c"), &["root"]),
            issue("loner"),
        ];
        let result = triage(&issues, &TriageOptions::default());

        let top = result.top().unwrap();
        assert_eq!(top.id.as_str(), "root");
        assert_eq!(top.unblocks.len(), 3);
        assert!(top.is_actionable);
        assert!(top.primary_reason.starts_with("Completing this unblocks 3"));
        assert_eq!(result.commands.claim_top, "bd update root --status=in_progress");
        assert_eq!(result.commands.show_top, "bd show root");

        assert_eq!(result.blockers_to_clear.len(), 1);
        assert_eq!(result.blockers_to_clear[0].unblocks_count, 3);
        assert!(result.blockers_to_clear[0].actionable);
    }

    #[test]
    fn ties_break_by_priority_then_id() {
        let issues = vec![
            issue("c"),
            issue("b"),
            issue("a"),
        ];
        let result = triage(&issues, &TriageOptions::default());
        assert_eq!(ids(&result.recommendations), vec!["a", "b", "c"]);
    }

    #[test]
    fn closed_issues_are_counted_not_recommended() {
        let issues = vec![
            with_status(issue("done"), IssueStatus::Closed),
            issue("open"),
            blocked_by(issue("waiting"), &["open"]),
        ];
        let result = triage(&issues, &TriageOptions::default());

        assert_eq!(ids(&result.recommendations).len(), 2);
        let counts = &result.project_health.counts;
        assert_eq!(counts.total, 3);
        assert_eq!(counts.closed, 1);
        assert_eq!(counts.open, 2);
        assert_eq!(counts.actionable, 1);
        assert_eq!(counts.blocked, 1);
        assert_eq!(counts.by_status.get("closed"), Some(&1));
        assert_eq!(counts.by_priority.get(&2), Some(&3));
        assert_eq!(result.quick_ref.blocked_count, 1);

        let waiting = result
            .recommendations
            .iter()
            .find(|r| r.id.as_str() == "waiting")
            .unwrap();
        assert_eq!(waiting.action, "Work on open first to unblock this");
    }

    #[test]
    fn quick_wins_are_ready_work_only() {
        let issues = vec![
            with_priority(issue("urgent"), 0),
            issue("plain"),
            blocked_by(issue("behind"), &["plain"]),
        ];
        let result = triage(&issues, &TriageOptions::default());

        let win_ids: Vec<&str> = result.quick_wins.iter().map(|w| w.id.as_str()).collect();
        assert!(!win_ids.contains(&"behind"));
        assert!(win_ids.contains(&"urgent"));
        let urgent = result.quick_wins.iter().find(|w| w.id.as_str() == "urgent").unwrap();
        assert_eq!(urgent.reason, "Low complexity, high priority");
    }

    #[test]
    fn in_progress_work_gets_no_quick_win_boost() {
        let issues = vec![with_status(issue("busy"), IssueStatus::InProgress)];
        let result = triage(&issues, &TriageOptions::default());
        let rec = &result.recommendations[0];
        assert!(rec.factors.quick_win_boost.abs() < f64::EPSILON);
        assert_eq!(result.quick_ref.in_progress_count, 1);
    }

    #[test]
    fn explicitly_blocked_issue_is_not_a_quick_win() {
        let mut issues = vec![stale_for(
            with_status(with_priority(issue("x"), 0), IssueStatus::Blocked),
            60,
        )];
        for id in ["a", "b", "c"] {
            issues.push(blocked_by(issue(id), &["x"]));
        }
        let result = triage(&issues, &TriageOptions::default());

        let x = result
            .recommendations
            .iter()
            .find(|r| r.id.as_str() == "x")
            .unwrap();
        assert!(!x.is_actionable);
        assert!(x.factors.quick_win_boost.abs() < f64::EPSILON);
        assert!(!x.is_quick_win);
        assert!(!x.reasons.iter().any(|r| r.starts_with("Low effort")));
        assert_eq!(x.action, "Find out what this is waiting on before starting");
        assert!(result.quick_wins.iter().all(|w| w.id.as_str() != "x"));
    }

    #[test]
    fn grouping_by_track_puts_ready_work_first() {
        let issues = chain(&["a", "b", "c"]);
        let result = triage(
            &issues,
            &TriageOptions {
                group_by: Some(GroupBy::Track),
                ..TriageOptions::default()
            },
        );
        let groups = result.by_track.unwrap();
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["track-1", "track-2", "track-3"]);
        assert_eq!(groups[0].top_pick.as_ref().unwrap().as_str(), "a");
        assert_eq!(groups[0].total_unblocks, 1);
        assert!(result.by_label.is_none());
    }

    #[test]
    fn grouping_by_label_puts_unlabeled_last() {
        let issues = vec![
            with_labels(issue("a"), &["ui", "api"]),
            issue("b"),
            with_labels(issue("c"), &["api"]),
        ];
        let result = triage(
            &issues,
            &TriageOptions {
                group_by: Some(GroupBy::Label),
                ..TriageOptions::default()
            },
        );
        let groups = result.by_label.unwrap();
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["api", "ui", UNLABELED]);
    }

    #[test]
    fn recommendations_are_capped_but_views_see_everything() {
        let issues: Vec<Issue> = (0..15).map(|n| issue(&format!("i{n:02}"))).collect();
        let result = triage(&issues, &TriageOptions::default());
        assert_eq!(result.recommendations.len(), TriageConfig::default().top_n);
        assert_eq!(result.quick_ref.top_picks.len(), 3);
        assert_eq!(result.quick_ref.open_count, 15);
    }

    #[test]
    fn suggestions_combine_priority_and_dependency_hints() {
        let mut schema = with_priority(issue("schema"), 4);
        schema.title = "Database schema migration".to_string();
        schema.description = "postgres tables indexes".to_string();
        let mut rollback = issue("rollback");
        rollback.title = "Schema migration rollback".to_string();
        rollback.description = "postgres tables indexes".to_string();
        let issues = vec![
            schema,
            blocked_by(issue("a"), &["schema"]),
            blocked_by(issue("b"), &["schema"]),
            blocked_by(issue("c"), &["schema"]),
            rollback,
        ];
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze();
        let report = compute_suggestions(
            &issues,
            &stats,
            &TriageConfig::default(),
            &SuggestionConfig::default(),
            now(),
        );

        assert_eq!(report.generated_at, now());
        let hub = report.priority.iter().find(|r| r.id.as_str() == "schema").unwrap();
        assert_eq!(hub.direction, Direction::Increase);
        assert!(hub.what_if.is_some());
        assert_eq!(report.dependencies.len(), 1);
        let pair = [report.dependencies[0].from.as_str(), report.dependencies[0].to.as_str()];
        assert!(pair.contains(&"schema") && pair.contains(&"rollback"));
    }
}
