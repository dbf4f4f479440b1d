//! Ranked, capped views over the analysis results.
//!
//! Insights are pure functions of a [`GraphStats`] and the issue list: they
//! can be regenerated at any time and never touch the store.

use crate::analysis::{GraphStats, Phase2Metrics};
use crate::domain::{Issue, IssueId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One entry of a ranked list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightItem {
    /// Issue ID
    pub id: IssueId,
    /// The metric the list is ranked by
    pub value: f64,
}

/// All insight lists for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    /// Highest betweenness: issues many dependency paths run through
    pub bottlenecks: Vec<InsightItem>,
    /// Deepest critical path: issues at the head of long chains
    pub keystones: Vec<InsightItem>,
    /// Highest eigenvector centrality
    pub influencers: Vec<InsightItem>,
    /// Highest HITS hub score: block many important issues
    pub hubs: Vec<InsightItem>,
    /// Highest HITS authority score: blocked by many important issues
    pub authorities: Vec<InsightItem>,
    /// Highest PageRank
    pub central: Vec<InsightItem>,
    /// Non-closed issues untouched for longer than the threshold, in days
    pub stale: Vec<InsightItem>,
    /// Detected cycles
    pub cycles: Vec<Vec<IssueId>>,
    /// Graph density
    pub cluster_density: f64,
    /// `false` if Phase-2 had not finished; centrality lists are then empty
    pub phase2_ready: bool,
}

/// Top `limit` entries by value descending, then ID. Zero values are dropped.
fn top(scores: &BTreeMap<IssueId, f64>, limit: usize) -> Vec<InsightItem> {
    let mut items: Vec<InsightItem> = scores
        .iter()
        .filter(|(_, v)| **v > 0.0)
        .map(|(id, v)| InsightItem {
            id: id.clone(),
            value: *v,
        })
        .collect();
    items.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.id.cmp(&b.id)));
    items.truncate(limit);
    items
}

impl Insights {
    /// Builds every list, capped at `limit` entries.
    ///
    /// Does not wait for Phase-2: callers that want the centrality lists
    /// should call [`GraphStats::wait_for_phase2`] first.
    #[must_use]
    pub fn generate(
        issues: &[Issue],
        stats: &GraphStats,
        limit: usize,
        stale_days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let empty = Phase2Metrics::default();
        let phase2 = stats.phase2();
        let m = phase2.unwrap_or(&empty);

        let depth: BTreeMap<IssueId, f64> = m
            .critical_path
            .iter()
            .map(|(id, d)| (id.clone(), *d as f64))
            .collect();

        let stale_days_by_id: BTreeMap<IssueId, f64> = issues
            .iter()
            .filter(|i| !i.status.is_closed())
            .map(|i| (i.id.clone(), i.days_since_update(now)))
            .filter(|(_, days)| *days > stale_days)
            .map(|(id, days)| (id, days as f64))
            .collect();

        Self {
            bottlenecks: top(&m.betweenness, limit),
            keystones: top(&depth, limit),
            influencers: top(&m.eigenvector, limit),
            hubs: top(&m.hubs, limit),
            authorities: top(&m.authorities, limit),
            central: top(&m.pagerank, limit),
            stale: top(&stale_days_by_id, limit),
            cycles: m.cycles.clone(),
            cluster_density: stats.density(),
            phase2_ready: phase2.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::config::CentralityConfig;
    use crate::domain::IssueStatus;
    use crate::test_support::{blocked_by, chain, issue, now, stale_for, with_status};

    fn ids(items: &[InsightItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn star_center_is_the_top_hub_and_keystone() {
        let issues = vec![
            issue("hub"),
            blocked_by(issue("x"), &["hub"]),
            blocked_by(issue("y"), &["hub"]),
            blocked_by(issue("z"), &["x"]),
        ];
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze_blocking();
        let insights = Insights::generate(&issues, &stats, 10, 14, now());

        assert!(insights.phase2_ready);
        assert_eq!(insights.keystones[0].id.as_str(), "hub");
        assert!((insights.keystones[0].value - 2.0).abs() < f64::EPSILON);
        assert_eq!(insights.hubs[0].id.as_str(), "hub");
        assert_eq!(ids(&insights.bottlenecks), vec!["x"]);
        assert_eq!(insights.central[0].id.as_str(), "z");
    }

    #[test]
    fn lists_are_capped() {
        let issues = chain(&["a", "b", "c", "d", "e"]);
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze_blocking();
        let insights = Insights::generate(&issues, &stats, 2, 14, now());

        assert_eq!(insights.central.len(), 2);
        assert_eq!(ids(&insights.keystones), vec!["a", "b"]);
    }

    #[test]
    fn stale_list_skips_closed_and_fresh_issues() {
        let issues = vec![
            stale_for(issue("old"), 40),
            stale_for(issue("older"), 90),
            with_status(stale_for(issue("done"), 90), IssueStatus::Closed),
            issue("fresh"),
        ];
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze_blocking();
        let insights = Insights::generate(&issues, &stats, 10, 14, now());

        assert_eq!(ids(&insights.stale), vec!["older", "old"]);
    }

    #[test]
    fn empty_input_gives_empty_lists() {
        let stats = Analyzer::new(&[], &CentralityConfig::default()).analyze_blocking();
        let insights = Insights::generate(&[], &stats, 10, 14, now());
        assert!(insights.central.is_empty());
        assert!(insights.cycles.is_empty());
        assert!(insights.cluster_density.abs() < f64::EPSILON);
    }
}
