//! Priority adjustments and the downstream effect of finishing an issue.
//!
//! An issue earns a [`PriorityRecommendation`] when its impact score maps to
//! a different priority bucket than the one it carries and at least one
//! structural or temporal signal backs the move. Each recommendation carries
//! a [`WhatIfDelta`] describing what closing the issue would free up.

use super::impact::{DEFAULT_ESTIMATED_MINUTES, ImpactScore, MAX_CRITICAL_PATH_DEPTH};
use crate::analysis::GraphStats;
use crate::config::RecommendationThresholds;
use crate::domain::{Issue, IssueId, IssueStatus, index_by_id};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Unblocked IDs listed in a [`WhatIfDelta`].
pub const MAX_UNBLOCKED_IDS_SHOWN: usize = 10;

/// Reasons kept per recommendation.
const MAX_REASONS: usize = 3;

/// Kinds of signal [`recommend`] looks at.
const SIGNAL_KINDS: f64 = 6.0;

const WORKDAY_MINUTES: f64 = 480.0;

/// Which way the priority should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward P0
    Increase,
    /// Toward P4
    Decrease,
}

/// What closing an issue would change downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfDelta {
    /// Issues whose only open blocker is this one
    pub direct_unblocks: usize,
    /// Direct unblocks plus everything they in turn free
    pub transitive_unblocks: usize,
    /// Direct unblocks currently marked `blocked`
    pub blocked_reduction: usize,
    /// Downstream depth relative to the saturation depth, capped at 1
    pub depth_reduction: f64,
    /// Work-days of freed work, unestimated issues counting the default estimate
    pub estimated_days_saved: f64,
    /// Direct unblocks, capped at [`MAX_UNBLOCKED_IDS_SHOWN`]
    pub unblocked_issue_ids: Vec<IssueId>,
    /// Net change in ready work: one issue done, `direct_unblocks` freed
    pub parallelization_gain: i64,
    /// One-line summary
    pub explanation: String,
}

/// A suggested priority change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityRecommendation {
    /// Issue ID
    pub id: IssueId,
    /// Issue title
    pub title: String,
    /// Priority it carries now
    pub current_priority: u8,
    /// Priority its impact score maps to
    pub suggested_priority: u8,
    /// Impact score
    pub impact_score: f64,
    /// How sure the suggestion is, in `[0, 1]`
    pub confidence: f64,
    /// Up to three supporting signals, in the order they were checked
    pub reasoning: Vec<String>,
    /// Which way to move
    pub direction: Direction,
    /// Effect of closing it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what_if: Option<WhatIfDelta>,
}

/// Priority bucket for an impact score.
#[must_use]
pub fn score_to_priority(score: f64) -> u8 {
    match score {
        s if s >= 0.7 => 0,
        s if s >= 0.5 => 1,
        s if s >= 0.3 => 2,
        s if s >= 0.15 => 3,
        _ => 4,
    }
}

/// Impact score a priority is expected to have.
#[must_use]
pub fn priority_to_score(priority: u8) -> f64 {
    match priority {
        0 => 0.8,
        1 => 0.6,
        2 => 0.4,
        3 => 0.2,
        _ => 0.1,
    }
}

/// Signal count, signal strength and the score mismatch blended into `[0, 1]`.
#[must_use]
pub fn confidence(
    signals: usize,
    strength: f64,
    score_delta: f64,
    thresholds: &RecommendationThresholds,
) -> f64 {
    let from_signals = (signals as f64 / SIGNAL_KINDS).min(1.0);
    let from_strength = (strength / 2.0).min(0.3);
    let from_delta = if score_delta >= thresholds.significant_delta {
        0.2
    } else {
        0.0
    };
    (from_signals + from_strength + from_delta).min(1.0)
}

/// Recommendation for one scored issue, without its what-if delta.
///
/// `None` when no signal fires or the score maps to the current priority.
/// Confidence is not filtered here.
#[must_use]
pub fn recommend(
    impact: &ImpactScore,
    unblocks: usize,
    thresholds: &RecommendationThresholds,
    staleness_horizon_days: i64,
) -> Option<PriorityRecommendation> {
    let b = &impact.breakdown;
    let mut reasoning = Vec::new();
    let mut strength = 0.0;

    if b.pagerank_norm > thresholds.high_pagerank {
        reasoning.push("High centrality in dependency graph".to_string());
        strength += b.pagerank_norm;
    }
    if b.betweenness_norm > thresholds.high_betweenness {
        reasoning.push("Critical path bottleneck".to_string());
        strength += b.betweenness_norm;
    }
    match unblocks {
        0 => {}
        1 => {
            reasoning.push("Blocks 1 other item".to_string());
            strength += 0.2;
        }
        2 => {
            reasoning.push("Blocks 2 other items".to_string());
            strength += 0.3;
        }
        n => {
            reasoning.push(format!("Blocks {n} other items"));
            strength += 0.5 + n as f64 / 10.0;
        }
    }
    if staleness_horizon_days > 0 {
        let horizon = staleness_horizon_days as f64;
        if b.staleness_norm >= thresholds.staleness_days as f64 / horizon {
            let days = (b.staleness_norm * horizon) as i64;
            reasoning.push(format!("Stale for {days}+ days"));
            strength += 0.2;
        }
    }
    if b.time_to_impact_norm > 0.5 {
        reasoning.push(if b.time_to_impact_explanation.is_empty() {
            "High time-to-impact score".to_string()
        } else {
            b.time_to_impact_explanation.clone()
        });
        strength += b.time_to_impact_norm;
    }
    if b.urgency_norm > 0.3 {
        reasoning.push(if b.urgency_explanation.is_empty() {
            "Elevated urgency".to_string()
        } else {
            b.urgency_explanation.clone()
        });
        strength += b.urgency_norm;
    }

    if reasoning.is_empty() {
        return None;
    }
    let suggested = score_to_priority(impact.score);
    if suggested == impact.priority {
        return None;
    }

    let delta = (impact.score - priority_to_score(impact.priority)).abs();
    let confidence = confidence(reasoning.len(), strength, delta, thresholds);
    reasoning.truncate(MAX_REASONS);

    Some(PriorityRecommendation {
        id: impact.id.clone(),
        title: impact.title.clone(),
        current_priority: impact.priority,
        suggested_priority: suggested,
        impact_score: impact.score,
        confidence,
        reasoning,
        direction: if suggested < impact.priority {
            Direction::Increase
        } else {
            Direction::Decrease
        },
        what_if: None,
    })
}

/// Downstream effect of closing `id`.
#[must_use]
pub fn what_if(id: &IssueId, by_id: &HashMap<&IssueId, &Issue>, stats: &GraphStats) -> WhatIfDelta {
    let phase1 = stats.phase1();
    let direct = phase1.unblocks(id);

    // Each issue has at most one sole blocker, so the cascade is a forest;
    // `seen` only guards against blocking cycles.
    let mut seen: HashSet<&IssueId> = HashSet::from([id]);
    let mut stack: Vec<&IssueId> = vec![id];
    let mut transitive = 0;
    while let Some(current) = stack.pop() {
        for next in phase1.unblocks(current) {
            if seen.insert(next) {
                transitive += 1;
                stack.push(next);
            }
        }
    }

    let freed: Vec<&Issue> = direct.iter().filter_map(|d| by_id.get(d).copied()).collect();
    let blocked_reduction = freed
        .iter()
        .filter(|i| i.status == IssueStatus::Blocked)
        .count();
    let minutes: u64 = freed
        .iter()
        .map(|i| match i.estimated_minutes {
            Some(m) if m > 0 => u64::from(m),
            _ => u64::from(DEFAULT_ESTIMATED_MINUTES),
        })
        .sum();
    let estimated_days_saved = minutes as f64 / WORKDAY_MINUTES;
    let depth_reduction =
        (stats.critical_path_score(id) as f64 / MAX_CRITICAL_PATH_DEPTH).min(1.0);

    WhatIfDelta {
        direct_unblocks: direct.len(),
        transitive_unblocks: transitive,
        blocked_reduction,
        depth_reduction,
        estimated_days_saved,
        unblocked_issue_ids: direct.iter().take(MAX_UNBLOCKED_IDS_SHOWN).cloned().collect(),
        parallelization_gain: direct.len() as i64 - 1,
        explanation: what_if_explanation(
            direct.len(),
            transitive,
            blocked_reduction,
            estimated_days_saved,
        ),
    }
}

fn what_if_explanation(direct: usize, transitive: usize, blocked: usize, days: f64) -> String {
    if direct == 0 {
        return "No immediate downstream impact".to_string();
    }
    let plural = if direct == 1 { "" } else { "s" };
    let mut text = format!("Completing this directly unblocks {direct} item{plural}");
    if transitive > direct {
        text.push_str(&format!(" ({transitive} total including cascades)"));
    }
    if blocked > 0 {
        text.push_str(&format!(", clears {blocked} blocked"));
    }
    if days >= 0.5 {
        text.push_str(&format!(", enabling ~{days:.1} days of work"));
    }
    text
}

/// Priority recommendations over `impacts` that clear `min_confidence`.
///
/// Sorted by confidence, then impact score (both descending), then ID.
#[must_use]
pub fn compute_priority_recommendations(
    issues: &[Issue],
    stats: &GraphStats,
    impacts: &[ImpactScore],
    thresholds: &RecommendationThresholds,
    staleness_horizon_days: i64,
) -> Vec<PriorityRecommendation> {
    let by_id = index_by_id(issues);
    let phase1 = stats.phase1();

    let mut recs: Vec<PriorityRecommendation> = impacts
        .iter()
        .filter_map(|impact| {
            let unblocks = phase1.unblocks(&impact.id).len();
            recommend(impact, unblocks, thresholds, staleness_horizon_days)
        })
        .filter(|rec| rec.confidence >= thresholds.min_confidence)
        .map(|mut rec| {
            rec.what_if = Some(what_if(&rec.id, &by_id, stats));
            rec
        })
        .collect();

    recs.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.impact_score.total_cmp(&a.impact_score))
            .then_with(|| a.id.cmp(&b.id))
    });
    tracing::debug!(count = recs.len(), "Priority recommendations computed");
    recs
}
