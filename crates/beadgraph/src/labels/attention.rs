//! Ranks labels by how urgently they need someone's attention.
//!
//! Four factors feed the score: how stale the open work is, how much work in
//! other labels it holds up, how slowly the label is closing issues, and
//! whether its high-priority work is stuck.

use super::{extract_labels, label_issues};
use crate::config::AttentionWeights;
use crate::domain::{HIGH_PRIORITY_MAX, Issue, IssueId, IssueStatus, index_by_id};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Attention ranking for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelAttention {
    /// The label
    pub label: String,
    /// 1-based rank, most urgent first
    pub rank: usize,
    /// Weighted blend of the factors
    pub attention_score: f64,
    /// `attention_score` divided by the highest score, in `[0, 1]`
    pub normalized_score: f64,
    /// Mean days since update of open issues, over the stale threshold
    pub staleness_factor: f64,
    /// Distinct open issues outside the label held up by its open issues
    pub block_impact: usize,
    /// Issues closed in the last 30 days
    pub velocity_factor: usize,
    /// Share of open P0/P1 issues that are stale or blocked
    pub priority_mismatch: f64,
    /// Non-closed issues carrying the label
    pub open_count: usize,
    /// Human-readable drivers of the score
    pub reasons: Vec<String>,
}

/// Every label, most urgent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttentionResult {
    /// Ranked labels
    pub labels: Vec<LabelAttention>,
    /// `labels.len()`
    pub total_labels: usize,
    /// Highest raw score
    pub max_score: f64,
}

impl AttentionResult {
    /// Ranking for `label`, if present.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&LabelAttention> {
        self.labels.iter().find(|l| l.label == label)
    }

    /// The `n` most urgent labels.
    #[must_use]
    pub fn top(&self, n: usize) -> &[LabelAttention] {
        &self.labels[..n.min(self.labels.len())]
    }
}

struct RawFactors {
    staleness: f64,
    block_impact: usize,
    velocity: usize,
    mismatch: f64,
    open_count: usize,
}

fn raw_factors(
    label: &str,
    members: &[&Issue],
    by_id: &HashMap<&IssueId, &Issue>,
    stale_days: i64,
    now: DateTime<Utc>,
) -> RawFactors {
    let open: Vec<&Issue> = members
        .iter()
        .copied()
        .filter(|i| !i.status.is_closed())
        .collect();
    let threshold = stale_days.max(1) as f64;

    let staleness = if open.is_empty() {
        0.0
    } else {
        let total: i64 = open.iter().map(|i| i.days_since_update(now).max(0)).sum();
        total as f64 / open.len() as f64 / threshold
    };

    let open_members: BTreeSet<&IssueId> = open.iter().map(|i| &i.id).collect();
    let block_impact = by_id
        .values()
        .filter(|other| !other.status.is_closed() && !other.has_label(label))
        .filter(|other| other.blocking_dependencies().any(|b| open_members.contains(b)))
        .count();

    let month_ago = now - Duration::days(30);
    let velocity = members
        .iter()
        .filter(|i| i.status.is_closed())
        .filter(|i| i.closed_at.unwrap_or(i.updated_at) > month_ago)
        .count();

    let high: Vec<&&Issue> = open.iter().filter(|i| i.priority <= HIGH_PRIORITY_MAX).collect();
    let mismatch = if high.is_empty() {
        0.0
    } else {
        let stuck = high
            .iter()
            .filter(|i| {
                i.days_since_update(now) > stale_days
                    || i.status == IssueStatus::Blocked
                    || i.blocking_dependencies()
                        .any(|b| by_id.get(b).is_some_and(|x| !x.status.is_closed()))
            })
            .count();
        stuck as f64 / high.len() as f64
    };

    RawFactors {
        staleness,
        block_impact,
        velocity,
        mismatch,
        open_count: open.len(),
    }
}

fn reasons_for(f: &RawFactors, stale_days: i64) -> Vec<String> {
    let mut reasons = Vec::new();
    if f.staleness >= 1.0 {
        reasons.push(format!(
            "Open work averages {:.0} days without updates",
            f.staleness * stale_days.max(1) as f64
        ));
    }
    if f.block_impact > 0 {
        let noun = if f.block_impact == 1 { "issue" } else { "issues" };
        reasons.push(format!("Blocks {} {noun} in other labels", f.block_impact));
    }
    if f.velocity == 0 && f.open_count > 0 {
        reasons.push("No issues closed in the last 30 days".to_string());
    }
    if f.mismatch > 0.0 {
        reasons.push(format!(
            "{:.0}% of high-priority work is stale or blocked",
            f.mismatch * 100.0
        ));
    }
    reasons
}

/// Scores and ranks every label.
///
/// Block impact and velocity are normalized against the largest value seen
/// across labels; slow velocity raises the score. Ties rank alphabetically.
#[must_use]
pub fn compute_label_attention(
    issues: &[Issue],
    weights: &AttentionWeights,
    stale_days: i64,
    now: DateTime<Utc>,
) -> AttentionResult {
    let by_id = index_by_id(issues);
    let labels = extract_labels(issues).labels;

    let raw: Vec<(String, RawFactors)> = labels
        .into_iter()
        .map(|label| {
            let members = label_issues(issues, &label);
            let factors = raw_factors(&label, &members, &by_id, stale_days, now);
            (label, factors)
        })
        .collect();

    let max_block = raw.iter().map(|(_, f)| f.block_impact).max().unwrap_or(0);
    let max_velocity = raw.iter().map(|(_, f)| f.velocity).max().unwrap_or(0);
    let norm = |v: usize, max: usize| if max == 0 { 0.0 } else { v as f64 / max as f64 };

    let mut ranked: Vec<LabelAttention> = raw
        .into_iter()
        .map(|(label, f)| {
            let attention_score = weights.staleness * f.staleness
                + weights.block_impact * norm(f.block_impact, max_block)
                + weights.velocity * (1.0 - norm(f.velocity, max_velocity))
                + weights.priority_mismatch * f.mismatch;
            LabelAttention {
                reasons: reasons_for(&f, stale_days),
                label,
                rank: 0,
                attention_score,
                normalized_score: 0.0,
                staleness_factor: f.staleness,
                block_impact: f.block_impact,
                velocity_factor: f.velocity,
                priority_mismatch: f.mismatch,
                open_count: f.open_count,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.attention_score
            .total_cmp(&a.attention_score)
            .then_with(|| a.label.cmp(&b.label))
    });

    let max_score = ranked.first().map_or(0.0, |l| l.attention_score);
    for (i, entry) in ranked.iter_mut().enumerate() {
        entry.rank = i + 1;
        entry.normalized_score = if max_score > 0.0 {
            (entry.attention_score / max_score).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    AttentionResult {
        total_labels: ranked.len(),
        max_score,
        labels: ranked,
    }
}
