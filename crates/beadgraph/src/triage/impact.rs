//! Composite impact score per open issue.
//!
//! Seven normalized signals (each in `[0, 1]`) are blended with the weights
//! from [`ImpactWeights`]. The breakdown keeps both the raw normalized values
//! and their weighted contributions so that reasons can be explained later.

use crate::analysis::GraphStats;
use crate::config::ImpactWeights;
use crate::domain::{Issue, IssueId, IssueStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Estimate used when no issue carries one.
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 60;

/// Depth at which the time-to-impact depth factor saturates.
pub(crate) const MAX_CRITICAL_PATH_DEPTH: f64 = 10.0;

/// One working day; estimates at or above this earn no speed credit.
const WORKDAY_MINUTES: f64 = 480.0;

/// Days over which age-based urgency approaches its maximum.
const URGENCY_DECAY_DAYS: f64 = 7.0;

/// Urgency label fragments in match order, with their weight.
const URGENCY_LABELS: [(&str, f64); 5] = [
    ("urgent", 0.8),
    ("critical", 1.0),
    ("blocker", 1.0),
    ("hotfix", 0.8),
    ("asap", 0.6),
];

/// Per-component values behind an impact score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Weighted PageRank contribution
    pub pagerank: f64,
    /// Weighted betweenness contribution
    pub betweenness: f64,
    /// Weighted blocker-ratio contribution
    pub blocker_ratio: f64,
    /// Weighted staleness contribution
    pub staleness: f64,
    /// Weighted priority contribution
    pub priority_boost: f64,
    /// Weighted time-to-impact contribution
    pub time_to_impact: f64,
    /// Weighted urgency contribution
    pub urgency: f64,

    /// PageRank / max PageRank
    pub pagerank_norm: f64,
    /// Betweenness / max betweenness
    pub betweenness_norm: f64,
    /// Issues directly blocked / max over all issues
    pub blocker_ratio_norm: f64,
    /// Days since update / staleness horizon, capped at 1
    pub staleness_norm: f64,
    /// P0 1.0, P1 0.75, P2 0.5, P3 0.25, otherwise 0
    pub priority_boost_norm: f64,
    /// Depth and effort blend
    pub time_to_impact_norm: f64,
    /// Label urgency plus age pressure, capped at 1
    pub urgency_norm: f64,

    /// How the time-to-impact value came about
    #[serde(skip_serializing_if = "String::is_empty")]
    pub time_to_impact_explanation: String,
    /// How the urgency value came about
    #[serde(skip_serializing_if = "String::is_empty")]
    pub urgency_explanation: String,
}

impl ScoreBreakdown {
    /// Sum of the weighted contributions.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.pagerank
            + self.betweenness
            + self.blocker_ratio
            + self.staleness
            + self.priority_boost
            + self.time_to_impact
            + self.urgency
    }
}

/// Impact score of one non-closed issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactScore {
    /// Issue ID
    pub id: IssueId,
    /// Issue title
    pub title: String,
    /// Composite score
    pub score: f64,
    /// Components
    pub breakdown: ScoreBreakdown,
    /// Issue priority
    pub priority: u8,
    /// Issue status
    pub status: IssueStatus,
}

fn ratio(value: f64, max: f64) -> f64 {
    if max > 0.0 { value / max } else { 0.0 }
}

/// Priority boost: P0 1.0, P1 0.75, P2 0.5, P3 0.25, P4 and beyond 0.
#[must_use]
pub fn priority_boost(priority: u8) -> f64 {
    match priority {
        0 => 1.0,
        1 => 0.75,
        2 => 0.5,
        3 => 0.25,
        _ => 0.0,
    }
}

/// Days since update relative to `horizon_days`, clamped to `[0, 1]`.
#[must_use]
pub fn staleness(issue: &Issue, now: DateTime<Utc>, horizon_days: i64) -> f64 {
    if horizon_days <= 0 {
        return 0.0;
    }
    let days = (now - issue.updated_at).num_seconds() as f64 / 86_400.0;
    (days / horizon_days as f64).clamp(0.0, 1.0)
}

/// Median positive estimate across `issues`, or [`DEFAULT_ESTIMATED_MINUTES`].
#[must_use]
pub fn median_estimate(issues: &[Issue]) -> u32 {
    let mut estimates: Vec<u32> = issues
        .iter()
        .filter_map(|i| i.estimated_minutes)
        .filter(|m| *m > 0)
        .collect();
    if estimates.is_empty() {
        return DEFAULT_ESTIMATED_MINUTES;
    }
    estimates.sort_unstable();
    let mid = estimates.len() / 2;
    if estimates.len() % 2 == 0 {
        u32::midpoint(estimates[mid - 1], estimates[mid])
    } else {
        estimates[mid]
    }
}

/// Blend of downstream depth (70%) and how quickly the work can be done (30%).
#[must_use]
pub fn time_to_impact(depth: usize, estimate: Option<u32>, median: u32) -> (f64, String) {
    let (minutes, source) = match estimate {
        Some(m) if m > 0 => (m, "explicit"),
        _ => (median, "median"),
    };
    let depth_f = depth as f64;
    let depth_norm = (depth_f / MAX_CRITICAL_PATH_DEPTH).min(1.0);
    let speed = (1.0 - f64::from(minutes) / WORKDAY_MINUTES).clamp(0.0, 1.0);
    let score = depth_norm * 0.7 + speed * 0.3;

    let explanation = match depth {
        0 => format!("Leaf node, {source} estimate {minutes}m"),
        1 | 2 => format!("On dependency chain (depth {depth}), {source} estimate {minutes}m"),
        _ => format!("Deep in critical path (depth {depth}), {source} estimate {minutes}m"),
    };
    (score, explanation)
}

/// Urgency from labels (first matching label wins) plus age pressure, capped at 1.
#[must_use]
pub fn urgency(issue: &Issue, now: DateTime<Utc>) -> (f64, String) {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    let matched = issue.labels.iter().find_map(|label| {
        let lower = label.to_lowercase();
        URGENCY_LABELS
            .iter()
            .find(|(fragment, _)| lower.contains(fragment))
            .map(|(_, weight)| (label, *weight))
    });
    if let Some((label, weight)) = matched {
        score += weight;
        reasons.push(format!("has '{label}' label"));
    }

    let age_days = (now - issue.created_at).num_seconds() as f64 / 86_400.0;
    if age_days > 0.0 {
        score += 0.5 * (1.0 - (-age_days / URGENCY_DECAY_DAYS).exp());
        if age_days >= 14.0 {
            reasons.push(format!("aging ({age_days:.0} days)"));
        }
    }

    let score = score.min(1.0);
    let explanation = if !reasons.is_empty() {
        reasons.join(", ")
    } else if score > 0.1 {
        "moderate time pressure".to_string()
    } else {
        String::new()
    };
    (score, explanation)
}

/// Impact scores for every non-closed issue, sorted by score descending then ID.
///
/// Phase-2 values read as zero if the batch has not landed yet.
#[must_use]
pub fn compute_impact_scores(
    issues: &[Issue],
    stats: &GraphStats,
    weights: &ImpactWeights,
    staleness_horizon_days: i64,
    now: DateTime<Utc>,
) -> Vec<ImpactScore> {
    if issues.is_empty() {
        return Vec::new();
    }

    let (max_pr, max_bw) = stats.phase2().map_or((0.0, 0.0), |m| {
        (
            m.pagerank.values().copied().fold(0.0, f64::max),
            m.betweenness.values().copied().fold(0.0, f64::max),
        )
    });
    let blocks = &stats.phase1().out_degree;
    let max_blocks = blocks.values().copied().max().unwrap_or(0) as f64;
    let median = median_estimate(issues);

    let mut seen = std::collections::HashSet::new();
    let mut scores: Vec<ImpactScore> = issues
        .iter()
        .filter(|i| !i.status.is_closed() && seen.insert(&i.id))
        .map(|issue| {
            let pagerank_norm = ratio(stats.page_rank_score(&issue.id), max_pr);
            let betweenness_norm = ratio(stats.betweenness_score(&issue.id), max_bw);
            let blocker_ratio_norm =
                ratio(blocks.get(&issue.id).copied().unwrap_or(0) as f64, max_blocks);
            let staleness_norm = staleness(issue, now, staleness_horizon_days);
            let priority_boost_norm = priority_boost(issue.priority);
            let (time_to_impact_norm, time_to_impact_explanation) = time_to_impact(
                stats.critical_path_score(&issue.id),
                issue.estimated_minutes,
                median,
            );
            let (urgency_norm, urgency_explanation) = urgency(issue, now);

            let breakdown = ScoreBreakdown {
                pagerank: pagerank_norm * weights.pagerank,
                betweenness: betweenness_norm * weights.betweenness,
                blocker_ratio: blocker_ratio_norm * weights.blocker_ratio,
                staleness: staleness_norm * weights.staleness,
                priority_boost: priority_boost_norm * weights.priority,
                time_to_impact: time_to_impact_norm * weights.time_to_impact,
                urgency: urgency_norm * weights.urgency,
                pagerank_norm,
                betweenness_norm,
                blocker_ratio_norm,
                staleness_norm,
                priority_boost_norm,
                time_to_impact_norm,
                urgency_norm,
                time_to_impact_explanation,
                urgency_explanation,
            };

            ImpactScore {
                id: issue.id.clone(),
                title: issue.title.clone(),
                score: breakdown.total(),
                breakdown,
                priority: issue.priority,
                status: issue.status,
            }
        })
        .collect();

    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    scores
}
