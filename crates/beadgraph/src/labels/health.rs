//! Per-label health: velocity, freshness, flow, and criticality sub-scores
//! (each 0-100) blended into one composite score and level.

use super::flow::{CrossLabelFlow, compute_cross_label_flow};
use super::{extract_labels, label_issues};
use crate::analysis::GraphStats;
use crate::config::{HealthCutoffs, HealthWeights, LabelHealthConfig};
use crate::domain::{HealthLevel, Issue, IssueId, IssueStatus, index_by_id};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Staleness threshold used when the configured one is not positive.
pub const DEFAULT_STALE_DAYS: i64 = 14;

/// Week-over-week change below this many percent counts as stable.
const TREND_DEADBAND_PERCENT: f64 = 10.0;

/// Normalized betweenness above which an issue counts as a bottleneck.
const BOTTLENECK_THRESHOLD: f64 = 0.5;

fn days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    (later - earlier).num_seconds() as f64 / 86_400.0
}

// ============================================================================
// Velocity
// ============================================================================

/// Direction of closure velocity compared with the prior week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// More closures than the prior week
    Improving,
    /// Within the dead band
    #[default]
    Stable,
    /// Fewer closures than the prior week
    Declining,
}

/// Closure activity for one label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VelocityMetrics {
    /// Closed within the last 7 days
    pub closed_last_7_days: usize,
    /// Closed within the last 30 days
    pub closed_last_30_days: usize,
    /// Mean days from creation to closure
    pub avg_days_to_close: f64,
    /// Last 7 days against the 7 before
    pub trend: Trend,
    /// Percent change behind `trend`
    pub trend_percent: f64,
    /// `closed_last_30_days` against the target, 0-100
    pub velocity_score: f64,
}

/// Closure velocity over `issues`. Missing `closed_at` falls back to `updated_at`.
#[must_use]
pub fn compute_velocity_metrics(
    issues: &[&Issue],
    now: DateTime<Utc>,
    target_per_30_days: f64,
) -> VelocityMetrics {
    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);
    let month_ago = now - Duration::days(30);

    let mut m = VelocityMetrics::default();
    let mut prior_week = 0usize;
    let mut close_days = 0.0;
    let mut samples = 0usize;

    for issue in issues.iter().filter(|i| i.status.is_closed()) {
        let closed_at = issue.closed_at.unwrap_or(issue.updated_at);
        if closed_at > week_ago {
            m.closed_last_7_days += 1;
        } else if closed_at > two_weeks_ago {
            prior_week += 1;
        }
        if closed_at > month_ago {
            m.closed_last_30_days += 1;
        }
        close_days += days_between(closed_at, issue.created_at).max(0.0);
        samples += 1;
    }

    if samples > 0 {
        m.avg_days_to_close = close_days / samples as f64;
    }

    let current = m.closed_last_7_days as f64;
    m.trend_percent = if prior_week > 0 {
        (current - prior_week as f64) / prior_week as f64 * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    };
    m.trend = if m.trend_percent > TREND_DEADBAND_PERCENT {
        Trend::Improving
    } else if m.trend_percent < -TREND_DEADBAND_PERCENT {
        Trend::Declining
    } else {
        Trend::Stable
    };

    if target_per_30_days > 0.0 {
        m.velocity_score = (m.closed_last_30_days as f64 / target_per_30_days * 100.0).min(100.0);
    }
    m
}

// ============================================================================
// Freshness
// ============================================================================

/// How recently a label's open work was touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreshnessMetrics {
    /// Mean days since update over open issues
    pub avg_days_since_update: f64,
    /// Open issues untouched for longer than the threshold
    pub stale_count: usize,
    /// Threshold in days
    pub stale_threshold_days: i64,
    /// Creation time of the oldest open issue
    pub oldest_open: Option<DateTime<Utc>>,
    /// Latest update across all issues
    pub most_recent_update: Option<DateTime<Utc>>,
    /// 100 when everything is fresh, 0 at twice the threshold
    pub freshness_score: f64,
}

impl FreshnessMetrics {
    fn empty(stale_threshold_days: i64) -> Self {
        Self {
            avg_days_since_update: 0.0,
            stale_count: 0,
            stale_threshold_days,
            oldest_open: None,
            most_recent_update: None,
            freshness_score: 100.0,
        }
    }
}

/// Freshness over `issues`. A non-positive threshold uses [`DEFAULT_STALE_DAYS`].
#[must_use]
pub fn compute_freshness_metrics(
    issues: &[&Issue],
    now: DateTime<Utc>,
    stale_threshold_days: i64,
) -> FreshnessMetrics {
    let threshold = if stale_threshold_days > 0 {
        stale_threshold_days
    } else {
        DEFAULT_STALE_DAYS
    };
    let mut m = FreshnessMetrics::empty(threshold);
    m.most_recent_update = issues.iter().map(|i| i.updated_at).max();

    let open: Vec<&&Issue> = issues.iter().filter(|i| !i.status.is_closed()).collect();
    if open.is_empty() {
        return m;
    }

    let mut total_days = 0.0;
    for issue in &open {
        let days = days_between(now, issue.updated_at).max(0.0);
        total_days += days;
        if days > threshold as f64 {
            m.stale_count += 1;
        }
    }
    m.avg_days_since_update = total_days / open.len() as f64;
    m.oldest_open = open.iter().map(|i| i.created_at).min();
    m.freshness_score =
        (100.0 * (1.0 - m.avg_days_since_update / (2.0 * threshold as f64))).clamp(0.0, 100.0);
    m
}

// ============================================================================
// Flow
// ============================================================================

/// How a label's work blocks and is blocked by other labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowMetrics {
    /// Cross-label edges into this label
    pub incoming_deps: usize,
    /// Cross-label edges out of this label
    pub outgoing_deps: usize,
    /// Labels blocking this one, sorted
    pub incoming_labels: Vec<String>,
    /// Labels this one blocks, sorted
    pub outgoing_labels: Vec<String>,
    /// Open issues waiting on an open issue without this label
    pub blocked_by_external: usize,
    /// Open issues holding up an open issue without this label
    pub blocking_external: usize,
    /// 100 minus the share of open issues blocked from outside
    pub flow_score: f64,
}

/// Issue lookups shared by every label's health computation.
struct IssueLookup<'a> {
    by_id: HashMap<&'a IssueId, &'a Issue>,
    /// Non-closed issues waiting on each blocker ID
    open_dependents: HashMap<&'a IssueId, Vec<&'a Issue>>,
}

impl<'a> IssueLookup<'a> {
    fn new(issues: &'a [Issue]) -> Self {
        let by_id = index_by_id(issues);
        let mut open_dependents: HashMap<&'a IssueId, Vec<&'a Issue>> = HashMap::new();
        for &issue in by_id.values() {
            if issue.status.is_closed() {
                continue;
            }
            for blocker in issue.blocking_dependencies() {
                open_dependents.entry(blocker).or_default().push(issue);
            }
        }
        Self {
            by_id,
            open_dependents,
        }
    }
}

fn compute_flow_metrics(
    label: &str,
    members: &[&Issue],
    lookup: &IssueLookup<'_>,
    flow: &CrossLabelFlow,
) -> FlowMetrics {
    let mut incoming_labels = BTreeSet::new();
    let mut outgoing_labels = BTreeSet::new();
    for dep in &flow.dependencies {
        if dep.to_label == label {
            incoming_labels.insert(dep.from_label.clone());
        }
        if dep.from_label == label {
            outgoing_labels.insert(dep.to_label.clone());
        }
    }

    let external_open = |id: &IssueId| {
        lookup
            .by_id
            .get(id)
            .is_some_and(|i| !i.status.is_closed() && !i.has_label(label))
    };

    let open: Vec<&&Issue> = members.iter().filter(|i| !i.status.is_closed()).collect();
    let blocked_by_external = open
        .iter()
        .filter(|i| i.blocking_dependencies().any(|b| external_open(b)))
        .count();
    let blocking_external = open
        .iter()
        .filter(|member| {
            lookup
                .open_dependents
                .get(&member.id)
                .is_some_and(|waiting| waiting.iter().any(|w| !w.has_label(label)))
        })
        .count();

    let flow_score = if open.is_empty() {
        100.0
    } else {
        100.0 * (1.0 - blocked_by_external as f64 / open.len() as f64)
    };

    FlowMetrics {
        incoming_deps: flow.incoming(label),
        outgoing_deps: flow.outgoing(label),
        incoming_labels: incoming_labels.into_iter().collect(),
        outgoing_labels: outgoing_labels.into_iter().collect(),
        blocked_by_external,
        blocking_external,
        flow_score,
    }
}

// ============================================================================
// Criticality
// ============================================================================

/// Graph importance of a label's issues, available once Phase-2 has landed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalityMetrics {
    /// Mean global PageRank
    pub avg_pagerank: f64,
    /// Mean global betweenness
    pub avg_betweenness: f64,
    /// Largest global betweenness
    pub max_betweenness: f64,
    /// Issues heading a downstream chain
    pub critical_path_count: usize,
    /// Issues with normalized betweenness above one half
    pub bottleneck_count: usize,
    /// 100 minus the bottleneck share
    pub criticality_score: f64,
}

fn compute_criticality(members: &[&Issue], stats: &GraphStats) -> Option<CriticalityMetrics> {
    let phase2 = stats.phase2()?;
    if members.is_empty() {
        return None;
    }
    let global_max_bw = phase2.betweenness.values().copied().fold(0.0, f64::max);

    let n = members.len() as f64;
    let mut m = CriticalityMetrics {
        avg_pagerank: 0.0,
        avg_betweenness: 0.0,
        max_betweenness: 0.0,
        critical_path_count: 0,
        bottleneck_count: 0,
        criticality_score: 100.0,
    };
    for issue in members {
        let bw = stats.betweenness_score(&issue.id);
        m.avg_pagerank += stats.page_rank_score(&issue.id) / n;
        m.avg_betweenness += bw / n;
        m.max_betweenness = m.max_betweenness.max(bw);
        if stats.critical_path_score(&issue.id) > 0 {
            m.critical_path_count += 1;
        }
        if global_max_bw > 0.0 && bw / global_max_bw > BOTTLENECK_THRESHOLD {
            m.bottleneck_count += 1;
        }
    }
    m.criticality_score = 100.0 * (1.0 - m.bottleneck_count as f64 / n);
    Some(m)
}

// ============================================================================
// Composite
// ============================================================================

/// Weighted mean of the present sub-scores, renormalized over their weights.
#[must_use]
pub fn compute_composite_health(
    velocity: f64,
    freshness: f64,
    flow: f64,
    criticality: Option<f64>,
    weights: &HealthWeights,
) -> f64 {
    let mut parts = vec![
        (velocity, weights.velocity),
        (freshness, weights.freshness),
        (flow, weights.flow),
    ];
    if let Some(c) = criticality {
        parts.push((c, weights.criticality));
    }
    let total_weight: f64 = parts.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let score = parts.iter().map(|(s, w)| s * w).sum::<f64>() / total_weight;
    score.clamp(0.0, 100.0)
}

/// Health of one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelHealth {
    /// The label
    pub label: String,
    /// Issues carrying it
    pub issue_count: usize,
    /// Non-closed issues
    pub open_count: usize,
    /// Closed issues
    pub closed_count: usize,
    /// Non-closed issues that are marked blocked or wait on an open blocker
    pub blocked_count: usize,
    /// Composite score, 0-100
    pub health: f64,
    /// Classification of `health`
    pub health_level: HealthLevel,
    /// Velocity
    pub velocity: VelocityMetrics,
    /// Freshness
    pub freshness: FreshnessMetrics,
    /// Cross-label flow
    pub flow: FlowMetrics,
    /// Graph importance, when Phase-2 results were available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criticality: Option<CriticalityMetrics>,
}

impl LabelHealth {
    /// A label with no evidence against it.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            issue_count: 0,
            open_count: 0,
            closed_count: 0,
            blocked_count: 0,
            health: 100.0,
            health_level: HealthLevel::Healthy,
            velocity: VelocityMetrics::default(),
            freshness: FreshnessMetrics::empty(DEFAULT_STALE_DAYS),
            flow: FlowMetrics {
                incoming_deps: 0,
                outgoing_deps: 0,
                incoming_labels: Vec::new(),
                outgoing_labels: Vec::new(),
                blocked_by_external: 0,
                blocking_external: 0,
                flow_score: 100.0,
            },
            criticality: None,
        }
    }

    /// Returns `true` below the healthy cutoff.
    #[must_use]
    pub fn needs_attention(&self, cutoffs: &HealthCutoffs) -> bool {
        self.health < cutoffs.healthy
    }
}

fn health_for(
    label: &str,
    issues: &[Issue],
    lookup: &IssueLookup<'_>,
    flow: &CrossLabelFlow,
    stats: Option<&GraphStats>,
    config: &LabelHealthConfig,
    now: DateTime<Utc>,
) -> LabelHealth {
    let members = label_issues(issues, label);
    let mut h = LabelHealth::new(label);
    if members.is_empty() {
        return h;
    }

    h.issue_count = members.len();
    h.closed_count = members.iter().filter(|i| i.status.is_closed()).count();
    h.open_count = h.issue_count - h.closed_count;
    h.blocked_count = members
        .iter()
        .filter(|i| !i.status.is_closed())
        .filter(|i| {
            i.status == IssueStatus::Blocked
                || i.blocking_dependencies()
                    .any(|b| lookup.by_id.get(b).is_some_and(|x| !x.status.is_closed()))
        })
        .count();

    h.velocity = compute_velocity_metrics(&members, now, config.velocity_target);
    h.freshness = compute_freshness_metrics(&members, now, config.stale_days);
    h.flow = compute_flow_metrics(label, &members, lookup, flow);
    h.criticality = stats.and_then(|s| compute_criticality(&members, s));

    h.health = compute_composite_health(
        h.velocity.velocity_score,
        h.freshness.freshness_score,
        h.flow.flow_score,
        h.criticality.as_ref().map(|c| c.criticality_score),
        &config.weights,
    );
    h.health_level =
        HealthLevel::from_score(h.health, config.cutoffs.healthy, config.cutoffs.warning);
    h
}

/// Health of a single label.
#[must_use]
pub fn compute_label_health(
    issues: &[Issue],
    label: &str,
    stats: Option<&GraphStats>,
    config: &LabelHealthConfig,
    now: DateTime<Utc>,
) -> LabelHealth {
    let lookup = IssueLookup::new(issues);
    let flow = compute_cross_label_flow(issues);
    health_for(label, issues, &lookup, &flow, stats, config, now)
}

/// Condensed per-label line for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSummary {
    /// The label
    pub label: String,
    /// Issues carrying it
    pub issue_count: usize,
    /// Non-closed issues
    pub open_count: usize,
    /// Composite score
    pub health: f64,
    /// Classification
    pub health_level: HealthLevel,
    /// Below the healthy cutoff
    pub needs_attention: bool,
}

/// Health of every label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelAnalysisResult {
    /// Labels analysed
    pub total_labels: usize,
    /// Labels at or above the healthy cutoff
    pub healthy_count: usize,
    /// Labels between the cutoffs
    pub warning_count: usize,
    /// Labels below the warning cutoff
    pub critical_count: usize,
    /// Labels below the healthy cutoff, worst first
    pub attention_needed: Vec<String>,
    /// Full per-label health, worst first
    pub labels: Vec<LabelHealth>,
    /// One line per label, worst first
    pub summaries: Vec<LabelSummary>,
    /// The flow the health scores were built from
    pub cross_label_flow: CrossLabelFlow,
}

impl LabelAnalysisResult {
    /// Label to health score, for triage reasons.
    #[must_use]
    pub fn health_scores(&self) -> BTreeMap<String, f64> {
        self.labels
            .iter()
            .map(|h| (h.label.clone(), h.health))
            .collect()
    }

    /// Health of one label, if present.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&LabelHealth> {
        self.labels.iter().find(|h| h.label == label)
    }
}

/// Health of every label, worst first (ties by name).
///
/// Pass `stats` with Phase-2 ready to include the criticality sub-score.
#[must_use]
pub fn compute_all_label_health(
    issues: &[Issue],
    stats: Option<&GraphStats>,
    config: &LabelHealthConfig,
    now: DateTime<Utc>,
) -> LabelAnalysisResult {
    let lookup = IssueLookup::new(issues);
    let flow = compute_cross_label_flow(issues);
    let extraction = extract_labels(issues);

    let mut labels: Vec<LabelHealth> = extraction
        .labels
        .iter()
        .map(|label| health_for(label, issues, &lookup, &flow, stats, config, now))
        .collect();
    labels.sort_by(|a, b| a.health.total_cmp(&b.health).then_with(|| a.label.cmp(&b.label)));

    let count = |level: HealthLevel| labels.iter().filter(|h| h.health_level == level).count();
    let healthy_count = count(HealthLevel::Healthy);
    let warning_count = count(HealthLevel::Warning);
    let critical_count = count(HealthLevel::Critical);

    let summaries: Vec<LabelSummary> = labels
        .iter()
        .map(|h| LabelSummary {
            label: h.label.clone(),
            issue_count: h.issue_count,
            open_count: h.open_count,
            health: h.health,
            health_level: h.health_level,
            needs_attention: h.needs_attention(&config.cutoffs),
        })
        .collect();
    let attention_needed = summaries
        .iter()
        .filter(|s| s.needs_attention)
        .map(|s| s.label.clone())
        .collect();

    tracing::debug!(
        labels = labels.len(),
        healthy = healthy_count,
        warning = warning_count,
        critical = critical_count,
        "Label health computed"
    );

    LabelAnalysisResult {
        total_labels: labels.len(),
        healthy_count,
        warning_count,
        critical_count,
        attention_needed,
        labels,
        summaries,
        cross_label_flow: flow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::config::CentralityConfig;
    use crate::test_support::{
        blocked_by, closed_days_ago, issue, now, stale_for, with_labels, with_status,
    };

    fn refs(issues: &[Issue]) -> Vec<&Issue> {
        issues.iter().collect()
    }

    #[test]
    fn composite_renormalizes_over_present_scores() {
        let w = HealthWeights::default();
        assert!((compute_composite_health(100.0, 100.0, 100.0, Some(100.0), &w) - 100.0).abs() < 1e-9);
        assert!(compute_composite_health(0.0, 0.0, 0.0, Some(0.0), &w).abs() < 1e-9);
        assert!((compute_composite_health(100.0, 0.0, 100.0, Some(0.0), &w) - 50.0).abs() < 1e-9);
        assert!((compute_composite_health(60.0, 60.0, 60.0, None, &w) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn new_label_is_healthy() {
        let h = LabelHealth::new("test-label");
        assert!((h.health - 100.0).abs() < f64::EPSILON);
        assert_eq!(h.health_level, HealthLevel::Healthy);
        assert_eq!(h.velocity.trend, Trend::Stable);
        assert_eq!(h.freshness.stale_threshold_days, DEFAULT_STALE_DAYS);
    }

    #[test]
    fn attention_below_healthy_cutoff() {
        let cutoffs = HealthCutoffs::default();
        let mut h = LabelHealth::new("x");
        h.health = 80.0;
        assert!(!h.needs_attention(&cutoffs));
        h.health = 50.0;
        assert!(h.needs_attention(&cutoffs));
    }

    #[test]
    fn velocity_windows_and_score() {
        let issues = vec![
            closed_days_ago(issue("1"), 3, 17),
            closed_days_ago(issue("2"), 10, 10),
            closed_days_ago(issue("3"), 20, 0),
            issue("4"),
        ];
        let v = compute_velocity_metrics(&refs(&issues), now(), 10.0);
        assert_eq!(v.closed_last_7_days, 1);
        assert_eq!(v.closed_last_30_days, 3);
        assert!((v.velocity_score - 30.0).abs() < 1e-9);
        assert!((v.avg_days_to_close - 9.0).abs() < 1e-9);
    }

    #[test]
    fn velocity_trend_directions() {
        let improving: Vec<Issue> = (1..=5)
            .map(|d| closed_days_ago(issue(&format!("c{d}")), d, 30))
            .chain((8..=9).map(|d| closed_days_ago(issue(&format!("p{d}")), d, 30)))
            .collect();
        let v = compute_velocity_metrics(&refs(&improving), now(), 10.0);
        assert_eq!(v.trend, Trend::Improving);
        assert!(v.trend_percent > 0.0);

        let declining: Vec<Issue> = std::iter::once(closed_days_ago(issue("c"), 2, 30))
            .chain((8..=12).map(|d| closed_days_ago(issue(&format!("p{d}")), d, 30)))
            .collect();
        let v = compute_velocity_metrics(&refs(&declining), now(), 10.0);
        assert_eq!(v.trend, Trend::Declining);
        assert!(v.trend_percent < 0.0);

        let v = compute_velocity_metrics(&[], now(), 10.0);
        assert_eq!(v.trend, Trend::Stable);
        assert!(v.velocity_score.abs() < f64::EPSILON);
    }

    #[test]
    fn freshness_counts_stale_open_work() {
        let issues = vec![
            stale_for(issue("1"), 1),
            stale_for(issue("2"), 10),
            stale_for(issue("3"), 20),
            with_status(stale_for(issue("4"), 40), IssueStatus::Closed),
        ];
        let f = compute_freshness_metrics(&refs(&issues), now(), 14);
        assert_eq!(f.stale_count, 1);
        assert_eq!(f.most_recent_update, Some(issues[0].updated_at));
        assert_eq!(f.oldest_open, Some(issues[2].created_at));
        assert!(f.freshness_score > 0.0 && f.freshness_score < 100.0);
    }

    #[test]
    fn freshness_threshold_and_bounds() {
        assert_eq!(compute_freshness_metrics(&[], now(), 0).stale_threshold_days, DEFAULT_STALE_DAYS);
        assert_eq!(compute_freshness_metrics(&[], now(), -5).stale_threshold_days, DEFAULT_STALE_DAYS);

        let fresh = vec![stale_for(issue("1"), 0)];
        assert!(compute_freshness_metrics(&refs(&fresh), now(), 14).freshness_score > 99.0);
        let old = vec![stale_for(issue("1"), 60)];
        assert!(compute_freshness_metrics(&refs(&old), now(), 14).freshness_score.abs() < f64::EPSILON);
    }

    #[test]
    fn flow_metrics_see_external_blockers() {
        let issues = vec![
            with_labels(issue("a"), &["core"]),
            blocked_by(with_labels(issue("b"), &["api"]), &["a"]),
            blocked_by(with_labels(issue("c"), &["api"]), &["b"]),
            blocked_by(with_labels(issue("d"), &["ui"]), &["c"]),
        ];
        let h = compute_label_health(&issues, "api", None, &LabelHealthConfig::default(), now());

        assert_eq!(h.flow.incoming_deps, 1);
        assert_eq!(h.flow.outgoing_deps, 1);
        assert_eq!(h.flow.incoming_labels, vec!["core"]);
        assert_eq!(h.flow.outgoing_labels, vec!["ui"]);
        assert_eq!(h.flow.blocked_by_external, 1);
        assert_eq!(h.flow.blocking_external, 1);
        assert!((h.flow.flow_score - 50.0).abs() < 1e-9);
        assert_eq!(h.blocked_count, 2);
        assert!(h.criticality.is_none());
    }

    #[test]
    fn blocking_external_ignores_closed_and_same_label_dependents() {
        let issues = vec![
            with_labels(issue("a"), &["api"]),
            with_labels(issue("b"), &["api"]),
            blocked_by(with_labels(issue("c"), &["api"]), &["a"]),
            with_status(blocked_by(with_labels(issue("d"), &["ui"]), &["a"]), IssueStatus::Closed),
            blocked_by(with_labels(issue("e"), &["ui"]), &["b", "b"]),
        ];
        let all = compute_all_label_health(&issues, None, &LabelHealthConfig::default(), now());

        let api = all.get("api").unwrap();
        assert_eq!(api.flow.blocking_external, 1);
        let single = compute_label_health(&issues, "api", None, &LabelHealthConfig::default(), now());
        assert_eq!(single.flow, api.flow);
        assert_eq!(all.get("ui").unwrap().flow.blocking_external, 0);
    }

    #[test]
    fn criticality_needs_phase2() {
        let issues = vec![
            with_labels(issue("a"), &["api"]),
            blocked_by(with_labels(issue("b"), &["api"]), &["a"]),
            blocked_by(issue("c"), &["b"]),
        ];
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze_blocking();
        let h = compute_label_health(&issues, "api", Some(&*stats), &LabelHealthConfig::default(), now());

        let c = h.criticality.unwrap();
        assert_eq!(c.critical_path_count, 2);
        assert_eq!(c.bottleneck_count, 1);
        assert!((c.criticality_score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn all_labels_sorted_worst_first() {
        let issues = vec![
            with_labels(issue("bv-1"), &["healthy"]),
            closed_days_ago(with_labels(issue("bv-2"), &["healthy"]), 0, 2),
            with_labels(stale_for(issue("bv-3"), 30), &["warning"]),
            with_labels(issue("bv-4"), &["warning"]),
            with_status(
                blocked_by(with_labels(stale_for(issue("bv-5"), 30), &["critical"]), &["bv-6"]),
                IssueStatus::Blocked,
            ),
            with_labels(stale_for(issue("bv-6"), 30), &["critical"]),
        ];
        let result = compute_all_label_health(&issues, None, &LabelHealthConfig::default(), now());

        assert_eq!(result.total_labels, 3);
        assert_eq!(result.summaries.len(), 3);
        assert_eq!(result.cross_label_flow.labels.len(), 3);
        assert_eq!(
            result.healthy_count + result.warning_count + result.critical_count,
            3
        );
        assert_eq!(result.labels[0].label, "critical");
        assert_eq!(result.labels[2].label, "healthy");
        assert_eq!(result.get("critical").unwrap().health_level, HealthLevel::Critical);
        assert!(result.get("healthy").unwrap().health > result.get("warning").unwrap().health);
        assert!(result.attention_needed.contains(&"critical".to_string()));
        assert!(result.health_scores().contains_key("warning"));
        assert!(result
            .labels
            .windows(2)
            .all(|w| w[0].health <= w[1].health));
    }
}
