//! Domain types for beads issues.
//!
//! These mirror the records stored in a beads JSONL file. The analysis engine
//! only ever reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Default priority when a record omits it (P2, "medium").
pub const DEFAULT_PRIORITY: u8 = 2;

/// Lowest priority number that still counts as "high priority" (P0 and P1).
pub const HIGH_PRIORITY_MAX: u8 = 1;

/// Unique identifier for an issue
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub String);

impl IssueId {
    /// Create a new issue ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for IssueId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

/// An issue as stored in beads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier
    pub id: IssueId,

    /// Issue title
    pub title: String,

    /// Long-form description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Design notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,

    /// Acceptance criteria
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Workflow status
    #[serde(default)]
    pub status: IssueStatus,

    /// Priority level (0 = most urgent)
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Issue type
    #[serde(default)]
    pub issue_type: IssueType,

    /// Assignee, if claimed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Effort estimate in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// When the issue was closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    /// External reference (e.g., GitHub issue number)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    /// Repository the issue was imported from, for multi-repo workspaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_repo: Option<String>,

    /// Labels (unordered; duplicates tolerated)
    #[serde(default)]
    pub labels: Vec<String>,

    /// Dependencies on other issues
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Issue {
    /// Checks the invariants a record must satisfy to take part in analysis.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the ID or title is blank, or when
    /// the update timestamp precedes creation.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.0.trim().is_empty() {
            return Err("issue ID is empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err(format!("issue {} has an empty title", self.id));
        }
        if self.updated_at < self.created_at {
            return Err(format!(
                "issue {} was updated before it was created",
                self.id
            ));
        }
        Ok(())
    }

    /// IDs of issues this one is blocked by (`Blocks` dependencies only).
    pub fn blocking_dependencies(&self) -> impl Iterator<Item = &IssueId> {
        self.dependencies
            .iter()
            .filter(|d| d.dep_type.is_blocking())
            .map(|d| &d.depends_on_id)
    }

    /// Whole days since the last update, never negative.
    #[must_use]
    pub fn days_since_update(&self, now: DateTime<Utc>) -> i64 {
        (now - self.updated_at).num_days().max(0)
    }

    /// Whole days since creation, never negative.
    #[must_use]
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }

    /// Returns `true` if the issue carries `label`.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Looks up issues by ID. The first record with a given ID wins, matching
/// how the dependency graph resolves duplicates.
#[must_use]
pub fn index_by_id(issues: &[Issue]) -> HashMap<&IssueId, &Issue> {
    let mut by_id = HashMap::with_capacity(issues.len());
    for issue in issues {
        by_id.entry(&issue.id).or_insert(issue);
    }
    by_id
}

/// Status of an issue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Ready to be worked on
    #[default]
    Open,

    /// Currently being worked on
    InProgress,

    /// Explicitly marked blocked
    Blocked,

    /// Completed
    Closed,
}

impl IssueStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Blocked, Self::Closed];

    /// Returns `true` for closed issues.
    #[must_use]
    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }

    /// Returns `true` for issues someone can pick up or is working on.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    /// The status as written in beads files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of issue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Bug fix
    Bug,

    /// New feature
    Feature,

    /// General task
    #[default]
    Task,

    /// Epic (parent issue)
    Epic,

    /// Maintenance/chore
    Chore,

    /// Any type this version does not know about
    #[serde(other)]
    Other,
}

impl IssueType {
    /// The type as written in beads files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Task => "task",
            Self::Epic => "epic",
            Self::Chore => "chore",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependency between issues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// The dependent issue (the owner of this record); often omitted inline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<IssueId>,

    /// ID of the issue this depends on
    pub depends_on_id: IssueId,

    /// Type of dependency
    #[serde(rename = "type", default)]
    pub dep_type: DependencyType,

    /// When the dependency was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Dependency {
    /// A `Blocks` dependency on `depends_on`.
    pub fn blocks(depends_on: impl Into<IssueId>) -> Self {
        Self {
            issue_id: None,
            depends_on_id: depends_on.into(),
            dep_type: DependencyType::Blocks,
            created_at: None,
        }
    }
}

/// Type of dependency relationship
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    /// Hard blocker; the only type that forms graph edges
    #[default]
    #[serde(alias = "")]
    Blocks,

    /// Soft link - informational
    Related,

    /// Hierarchical - epic to task
    ParentChild,

    /// Found during work
    DiscoveredFrom,

    /// Unrecognised type; never blocking
    #[serde(other)]
    Unknown,
}

impl DependencyType {
    /// Returns `true` if this dependency prevents work on the dependent.
    #[must_use]
    pub fn is_blocking(self) -> bool {
        self == Self::Blocks
    }

    /// The type as written in beads files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Related => "related",
            Self::ParentChild => "parent-child",
            Self::DiscoveredFrom => "discovered-from",
            Self::Unknown => "unknown",
        }
    }
}

/// Coarse health classification shared by label health and project health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    /// At or above the healthy cutoff
    Healthy,
    /// Between the warning and healthy cutoffs
    Warning,
    /// Below the warning cutoff
    Critical,
}

impl HealthLevel {
    /// Classifies a 0-100 score against the given cutoffs.
    #[must_use]
    pub fn from_score(score: f64, healthy_cutoff: f64, warning_cutoff: f64) -> Self {
        if score >= healthy_cutoff {
            Self::Healthy
        } else if score >= warning_cutoff {
            Self::Warning
        } else {
            Self::Critical
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
        })
    }
}
