//! Human-readable reasons and an action hint for one recommendation.

use super::impact::ScoreBreakdown;
use crate::domain::{Issue, IssueId, IssueStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// Label health below which a label is called out.
pub const LABEL_ATTENTION_HEALTH: f64 = 60.0;

/// Unblock count at which the cascade becomes the primary reason.
const CASCADE_MIN: usize = 3;

/// Fallback primary reason when nothing stands out.
pub const DEFAULT_PRIMARY: &str = "Good candidate for work";

/// Everything reason generation looks at.
#[derive(Debug, Clone, Copy)]
pub struct ReasonContext<'a> {
    /// The issue being explained
    pub issue: &'a Issue,
    /// Its impact breakdown, if scored
    pub breakdown: Option<&'a ScoreBreakdown>,
    /// Issues that become actionable once this one closes
    pub unblocks: &'a [IssueId],
    /// Open issues blocking this one
    pub blocked_by: &'a [IssueId],
    /// Whole days since the last update
    pub days_since_update: i64,
    /// Staleness threshold in days; half of it marks "aging"
    pub stale_days: i64,
    /// Whether the quick-win boost cleared its threshold
    pub is_quick_win: bool,
    /// Per-label health scores, when label analysis ran
    pub label_health: Option<&'a BTreeMap<String, f64>>,
}

/// Ordered reasons plus a suggested next action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageReasons {
    /// The single most important reason
    pub primary: String,
    /// Every reason, in generation order
    pub all: Vec<String>,
    /// What to do next
    pub action_hint: String,
}

/// Formats up to three IDs in full, longer lists as `a, b, +N more`.
#[must_use]
pub fn format_unblock_list(ids: &[IssueId]) -> String {
    if ids.len() > 3 {
        return format!("{}, {}, +{} more", ids[0], ids[1], ids.len() - 2);
    }
    ids.iter()
        .map(IssueId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the reasons for one recommendation.
#[must_use]
pub fn generate_reasons(ctx: &ReasonContext<'_>) -> TriageReasons {
    let issue = ctx.issue;
    let in_progress = issue.status == IssueStatus::InProgress;
    let mut all = Vec::new();
    let mut primary: Option<String> = None;
    let mut action_hint = if in_progress {
        "Continue work on this issue".to_string()
    } else {
        "Start work on this issue".to_string()
    };

    // Unblock cascade
    let n = ctx.unblocks.len();
    if n >= CASCADE_MIN {
        let reason = format!(
            "Completing this unblocks {n} downstream issues ({})",
            format_unblock_list(ctx.unblocks)
        );
        primary.get_or_insert_with(|| reason.clone());
        all.push(reason);
    } else if n > 0 {
        all.push(format!(
            "Unblocks {n} item(s): {}",
            format_unblock_list(ctx.unblocks)
        ));
    }

    // Unhealthy labels
    if let Some(health) = ctx.label_health {
        for label in &issue.labels {
            if let Some(score) = health.get(label).filter(|s| **s < LABEL_ATTENTION_HEALTH) {
                all.push(format!(
                    "Label '{label}' needs attention (health: {score:.0}/100)"
                ));
            }
        }
    }

    // Graph position
    if let Some(bd) = ctx.breakdown {
        if bd.betweenness_norm > 0.5 {
            let reason = format!(
                "Critical path bottleneck (betweenness: {:.0}%)",
                bd.betweenness_norm * 100.0
            );
            primary.get_or_insert_with(|| reason.clone());
            all.push(reason);
        }
        if bd.pagerank_norm > 0.3 {
            all.push(format!(
                "High centrality in dependency graph (PageRank: {:.0}%)",
                bd.pagerank_norm * 100.0
            ));
        }
    }

    // Staleness
    let days = ctx.days_since_update;
    if days > ctx.stale_days {
        all.push(format!("No activity in {days} days - may need review"));
        if in_progress {
            action_hint = "Check if this is stuck and needs help".to_string();
        }
    } else if days > ctx.stale_days / 2 {
        all.push(format!("Last updated {days} days ago"));
    }

    if ctx.is_quick_win {
        let reason = "Low effort, high impact - good starting point".to_string();
        if primary.is_none() && n > 0 {
            primary = Some(reason.clone());
        }
        all.push(reason);
        if !in_progress {
            action_hint = "Quick win - start here for fast progress".to_string();
        }
    }

    // Claim status
    match (&issue.assignee, in_progress) {
        (Some(who), _) => {
            all.push(format!("Claimed by {who}"));
            action_hint = format!("Contact {who} if you want to help");
        }
        (None, true) => all.push("In progress - already being worked".to_string()),
        (None, false) => all.push("Currently unclaimed - available for work".to_string()),
    }

    // Open blockers
    if let Some(first) = ctx.blocked_by.first() {
        if ctx.blocked_by.len() == 1 {
            all.push(format!("Blocked by {first} - complete that first"));
        } else {
            all.push(format!(
                "Blocked by {} items - need to clear dependencies",
                ctx.blocked_by.len()
            ));
        }
        action_hint = format!("Work on {first} first to unblock this");
    } else if issue.status == IssueStatus::Blocked {
        all.push("Marked blocked with no open blockers".to_string());
        action_hint = "Find out what this is waiting on before starting".to_string();
    }

    if issue.priority <= crate::domain::HIGH_PRIORITY_MAX {
        all.push(format!(
            "High priority (P{}) - prioritize this work",
            issue.priority
        ));
    }

    let primary = primary
        .or_else(|| all.first().cloned())
        .unwrap_or_else(|| DEFAULT_PRIMARY.to_string());

    TriageReasons {
        primary,
        all,
        action_hint,
    }
}
