//! Issue builders shared by unit tests.

use crate::domain::{Dependency, Issue, IssueId, IssueStatus};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Fixed "now" used by time-relative tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// An open P2 task created and updated one day before [`now`].
pub fn issue(id: &str) -> Issue {
    let at = now() - Duration::days(1);
    Issue {
        id: IssueId::new(id),
        title: format!("Issue {id}"),
        description: String::new(),
        design: None,
        acceptance_criteria: None,
        notes: None,
        status: IssueStatus::Open,
        priority: 2,
        issue_type: crate::domain::IssueType::Task,
        assignee: None,
        estimated_minutes: None,
        created_at: at,
        updated_at: at,
        closed_at: None,
        external_ref: None,
        source_repo: None,
        labels: Vec::new(),
        dependencies: Vec::new(),
    }
}

/// Adds `Blocks` dependencies on each of `blockers`.
pub fn blocked_by(mut issue: Issue, blockers: &[&str]) -> Issue {
    issue
        .dependencies
        .extend(blockers.iter().map(|b| Dependency::blocks(*b)));
    issue
}

/// Sets the status; closing also stamps `closed_at` at the update time.
pub fn with_status(mut issue: Issue, status: IssueStatus) -> Issue {
    issue.status = status;
    if status.is_closed() {
        issue.closed_at = Some(issue.updated_at);
    }
    issue
}

/// Sets the priority.
pub fn with_priority(mut issue: Issue, priority: u8) -> Issue {
    issue.priority = priority;
    issue
}

/// Replaces the labels.
pub fn with_labels(mut issue: Issue, labels: &[&str]) -> Issue {
    issue.labels = labels.iter().map(|l| (*l).to_string()).collect();
    issue
}

/// Moves creation and last update back so the issue is `days` old and untouched.
pub fn stale_for(mut issue: Issue, days: i64) -> Issue {
    issue.updated_at = now() - Duration::days(days);
    if issue.created_at > issue.updated_at {
        issue.created_at = issue.updated_at;
    }
    issue
}

/// Closes the issue `days` before [`now`], created `lead_days` before that.
pub fn closed_days_ago(mut issue: Issue, days: i64, lead_days: i64) -> Issue {
    let closed = now() - Duration::days(days);
    issue.status = IssueStatus::Closed;
    issue.created_at = closed - Duration::days(lead_days);
    issue.updated_at = closed;
    issue.closed_at = Some(closed);
    issue
}

/// A straight chain where each issue blocks the next: `ids[0] -> ids[1] -> ...`.
pub fn chain(ids: &[&str]) -> Vec<Issue> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            if i == 0 {
                issue(id)
            } else {
                blocked_by(issue(id), &[ids[i - 1]])
            }
        })
        .collect()
}
