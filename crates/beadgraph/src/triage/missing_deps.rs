//! Dependencies that probably exist but were never recorded.
//!
//! Pairs of issues are compared on the keywords of their title and
//! description. Enough overlap, a mention of the other issue's ID, a shared
//! long title word, or shared labels make a pair a candidate.

use crate::config::DependencySuggestionConfig;
use crate::domain::{Issue, IssueId};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Shortest title word that counts as an exact mention.
const MIN_MENTION_LEN: usize = 5;

/// Confidence ceiling for any suggestion.
const MAX_CONFIDENCE: f64 = 0.95;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "into", "when", "then", "than", "are",
    "was", "were", "will", "should", "must", "can", "not", "but", "all", "any", "our", "out",
    "use", "using", "via", "add", "also", "have", "has", "been", "its", "they", "them", "some",
    "more", "new", "need", "needs", "make", "other",
];

/// A suggested `from depends on to` link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencySuggestion {
    /// Issue that should depend on `to`
    pub from: IssueId,
    /// Issue `from` likely waits on
    pub to: IssueId,
    /// In `[0, 0.95]`
    pub confidence: f64,
    /// Keywords both issues mention, sorted
    pub shared_keywords: Vec<String>,
    /// Labels both issues carry (lowercased), sorted
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shared_labels: Vec<String>,
    /// Short explanation
    pub reason: String,
    /// Command recording the dependency
    pub action: String,
}

/// Lowercased words of three or more characters that are neither stop
/// words nor numbers.
#[must_use]
pub fn extract_keywords(title: &str, description: &str) -> BTreeSet<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    title
        .split(|c: char| !c.is_alphanumeric())
        .chain(description.split(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() >= 3 && !w.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_lowercase)
        .filter(|w| !stop.contains(w.as_str()))
        .collect()
}

struct Profile<'a> {
    issue: &'a Issue,
    keywords: BTreeSet<String>,
    labels: BTreeSet<String>,
    title: String,
    description: String,
    id: String,
}

impl<'a> Profile<'a> {
    fn new(issue: &'a Issue) -> Self {
        Self {
            keywords: extract_keywords(&issue.title, &issue.description),
            labels: issue.labels.iter().map(|l| l.to_lowercase()).collect(),
            title: issue.title.to_lowercase(),
            description: issue.description.to_lowercase(),
            id: issue.id.as_str().to_lowercase(),
            issue,
        }
    }

    /// A long keyword of `self` appears in `other`'s title.
    fn title_mentioned_by(&self, other: &Profile<'_>) -> bool {
        self.keywords
            .iter()
            .any(|w| w.chars().count() >= MIN_MENTION_LEN && other.title.contains(w.as_str()))
    }
}

fn linked(a: &Issue, b: &Issue) -> bool {
    a.dependencies.iter().any(|d| d.depends_on_id == b.id)
        || b.dependencies.iter().any(|d| d.depends_on_id == a.id)
}

fn score_pair(
    a: &Profile<'_>,
    b: &Profile<'_>,
    config: &DependencySuggestionConfig,
) -> Option<DependencySuggestion> {
    let shared_keywords: Vec<String> = a.keywords.intersection(&b.keywords).cloned().collect();
    if shared_keywords.len() < config.min_keyword_overlap.max(1) {
        return None;
    }
    let shared_labels: Vec<String> = a.labels.intersection(&b.labels).cloned().collect();

    let mut confidence = (shared_keywords.len() as f64 * 0.1).min(0.5);
    if b.description.contains(&a.id) || a.description.contains(&b.id) {
        confidence += config.exact_match_bonus * 2.0;
    }
    if a.title_mentioned_by(b) || b.title_mentioned_by(a) {
        confidence += config.exact_match_bonus;
    }
    confidence += shared_labels.len() as f64 * config.label_overlap_bonus;
    let confidence = confidence.min(MAX_CONFIDENCE);
    if confidence < config.min_confidence {
        return None;
    }

    // The newer or less urgent issue is taken to wait on the other one.
    let (x, y) = (a.issue, b.issue);
    let (from, to) = if x.created_at < y.created_at || x.priority < y.priority {
        (y, x)
    } else {
        (x, y)
    };

    let mut reason = format!("{} shared keywords", shared_keywords.len());
    if !shared_labels.is_empty() {
        reason.push_str(&format!(", {} shared labels", shared_labels.len()));
    }

    Some(DependencySuggestion {
        action: format!("bd dep add {} {}", from.id, to.id),
        from: from.id.clone(),
        to: to.id.clone(),
        confidence,
        shared_keywords,
        shared_labels,
        reason,
    })
}

/// Likely missing dependencies, best first.
///
/// Pairs where both sides are closed are skipped, as are pairs already
/// linked by any dependency when `ignore_existing_deps` is set. Sorted by
/// confidence descending, then `from` and `to`, and capped at
/// `max_suggestions`.
#[must_use]
pub fn detect_missing_dependencies(
    issues: &[Issue],
    config: &DependencySuggestionConfig,
) -> Vec<DependencySuggestion> {
    let mut seen = HashSet::new();
    let profiles: Vec<Profile<'_>> = issues
        .iter()
        .filter(|i| seen.insert(&i.id))
        .map(Profile::new)
        .collect();
    if profiles.len() < 2 {
        return Vec::new();
    }

    let mut suggestions = Vec::new();
    for (i, a) in profiles.iter().enumerate() {
        for b in &profiles[i + 1..] {
            if a.issue.status.is_closed() && b.issue.status.is_closed() {
                continue;
            }
            if config.ignore_existing_deps && linked(a.issue, b.issue) {
                continue;
            }
            suggestions.extend(score_pair(a, b, config));
        }
    }

    suggestions.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.from.cmp(&b.from))
            .then_with(|| a.to.cmp(&b.to))
    });
    suggestions.truncate(config.max_suggestions);
    tracing::debug!(
        candidates = suggestions.len(),
        issues = profiles.len(),
        "Missing dependency scan complete"
    );
    suggestions
}
