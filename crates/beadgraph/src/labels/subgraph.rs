//! The dependency neighbourhood of one label, and metrics scoped to it.
//!
//! Core issues carry the label. Extended issues sit one blocking edge away
//! from a core issue in either direction; they keep chains that leave and
//! re-enter the label connected. PageRank and critical path are then rerun on
//! this smaller graph with the same algorithms as the global analysis.

use super::label_issues;
use crate::analysis::centrality::{self, Convergence};
use crate::analysis::{DependencyGraph, paths};
use crate::config::CentralityConfig;
use crate::domain::{Issue, IssueId, index_by_id};
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Issues around one label and the blocking edges between them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LabelSubgraph {
    /// The label
    pub label: String,
    /// Issues carrying the label, sorted
    pub core_issues: Vec<IssueId>,
    /// Issues pulled in by a blocking edge to a core issue, sorted
    pub dependency_issues: Vec<IssueId>,
    /// `core_issues.len()`
    pub core_count: usize,
    /// Core plus dependency issues
    pub issue_count: usize,
    /// Blocking edges among members
    pub edge_count: usize,
    /// Blocker to sorted list of issues it blocks
    pub adjacency: BTreeMap<IssueId, Vec<IssueId>>,
    /// Blockers per member
    pub in_degree: BTreeMap<IssueId, usize>,
    /// Issues blocked per member
    pub out_degree: BTreeMap<IssueId, usize>,
    #[serde(skip)]
    graph: DependencyGraph,
}

impl LabelSubgraph {
    /// Builds the subgraph for `label`. An empty label yields an empty subgraph.
    #[must_use]
    pub fn build(issues: &[Issue], label: &str) -> Self {
        let core = label_issues(issues, label);
        if core.is_empty() {
            return Self {
                label: label.to_string(),
                ..Self::default()
            };
        }

        let by_id = index_by_id(issues);
        let core_ids: BTreeSet<&IssueId> = core.iter().map(|i| &i.id).collect();

        let mut extended: BTreeSet<&IssueId> = BTreeSet::new();
        for issue in &core {
            for blocker in issue.blocking_dependencies() {
                if let Some((id, _)) = by_id.get_key_value(blocker) {
                    if !core_ids.contains(id) {
                        extended.insert(*id);
                    }
                }
            }
        }
        for issue in issues.iter().filter(|i| !core_ids.contains(&i.id)) {
            if issue.blocking_dependencies().any(|b| core_ids.contains(b)) {
                extended.insert(&issue.id);
            }
        }

        let members: Vec<&Issue> = core_ids
            .iter()
            .chain(extended.iter())
            .filter_map(|id| by_id.get(id).copied())
            .collect();
        let graph = DependencyGraph::build(members);

        let mut adjacency = BTreeMap::new();
        let mut in_degree = BTreeMap::new();
        let mut out_degree = BTreeMap::new();
        for &idx in graph.ordered_nodes() {
            let id = graph.id(idx).clone();
            let mut blocked: Vec<IssueId> =
                graph.blocked_by(idx).map(|n| graph.id(n).clone()).collect();
            blocked.sort();
            in_degree.insert(id.clone(), graph.in_degree(idx));
            out_degree.insert(id.clone(), blocked.len());
            if !blocked.is_empty() {
                adjacency.insert(id, blocked);
            }
        }

        tracing::debug!(
            label,
            core = core_ids.len(),
            extended = extended.len(),
            edges = graph.edge_count(),
            "Label subgraph built"
        );

        Self {
            label: label.to_string(),
            core_count: core_ids.len(),
            core_issues: core_ids.into_iter().cloned().collect(),
            dependency_issues: extended.into_iter().cloned().collect(),
            issue_count: graph.node_count(),
            edge_count: graph.edge_count(),
            adjacency,
            in_degree,
            out_degree,
            graph,
        }
    }

    /// Returns `true` if no issue carries the label.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issue_count == 0
    }

    /// Members nothing blocks, sorted.
    #[must_use]
    pub fn roots(&self) -> Vec<&IssueId> {
        self.in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| id)
            .collect()
    }

    /// Members that block nothing, sorted.
    #[must_use]
    pub fn leaves(&self) -> Vec<&IssueId> {
        self.out_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| id)
            .collect()
    }

    /// The core issues as a set.
    #[must_use]
    pub fn core_set(&self) -> HashSet<&IssueId> {
        self.core_issues.iter().collect()
    }

    /// Returns `true` if `id` carries the label.
    #[must_use]
    pub fn is_core(&self, id: &IssueId) -> bool {
        self.core_issues.binary_search(id).is_ok()
    }

    /// The member graph.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}

/// One issue's position in a scoped ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedIssue {
    /// Issue ID
    pub id: IssueId,
    /// Scoped PageRank
    pub score: f64,
    /// Min-max normalized score
    pub normalized: f64,
    /// 1-based rank
    pub rank: usize,
    /// Carries the label
    pub is_core: bool,
}

/// PageRank recomputed inside a label subgraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelPageRank {
    /// The label
    pub label: String,
    /// Raw scores; sum to 1 over a non-empty subgraph
    pub scores: BTreeMap<IssueId, f64>,
    /// Scores scaled so the maximum is 1 and the minimum 0
    pub normalized: BTreeMap<IssueId, f64>,
    /// Largest raw score
    pub max_score: f64,
    /// Smallest raw score
    pub min_score: f64,
    /// Raw scores of core issues only
    pub core_only: BTreeMap<IssueId, f64>,
    /// Every member, best first
    pub top_issues: Vec<RankedIssue>,
    /// Members scored
    pub issue_count: usize,
    /// Core members scored
    pub core_count: usize,
}

impl LabelPageRank {
    /// Runs PageRank over `subgraph`.
    #[must_use]
    pub fn compute(subgraph: &LabelSubgraph, config: &CentralityConfig) -> Self {
        let graph = subgraph.graph();
        if graph.is_empty() {
            return Self {
                label: subgraph.label.clone(),
                ..Self::default()
            };
        }

        let (out, _) = graph.adjacency();
        let result = centrality::pagerank(
            &out,
            config.damping,
            Convergence {
                tolerance: config.tolerance,
                max_iterations: config.max_iterations,
            },
        );

        let scores: BTreeMap<IssueId, f64> = result
            .scores
            .iter()
            .enumerate()
            .map(|(i, s)| (graph.id(NodeIndex::new(i)).clone(), *s))
            .collect();
        let max_score = scores.values().copied().fold(f64::MIN, f64::max);
        let min_score = scores.values().copied().fold(f64::MAX, f64::min);
        let spread = max_score - min_score;
        let normalized: BTreeMap<IssueId, f64> = scores
            .iter()
            .map(|(id, s)| {
                let n = if spread > 0.0 { (s - min_score) / spread } else { 1.0 };
                (id.clone(), n)
            })
            .collect();

        let core_only: BTreeMap<IssueId, f64> = scores
            .iter()
            .filter(|(id, _)| subgraph.is_core(id))
            .map(|(id, s)| (id.clone(), *s))
            .collect();

        let mut ranked: Vec<(&IssueId, f64)> = scores.iter().map(|(id, s)| (id, *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let top_issues = ranked
            .into_iter()
            .enumerate()
            .map(|(i, (id, score))| RankedIssue {
                id: id.clone(),
                score,
                normalized: normalized.get(id).copied().unwrap_or(0.0),
                rank: i + 1,
                is_core: subgraph.is_core(id),
            })
            .collect();

        Self {
            label: subgraph.label.clone(),
            issue_count: scores.len(),
            core_count: core_only.len(),
            scores,
            normalized,
            max_score,
            min_score,
            core_only,
            top_issues,
        }
    }

    /// The best `n` core issues.
    #[must_use]
    pub fn top_core_issues(&self, n: usize) -> Vec<&RankedIssue> {
        self.top_issues.iter().filter(|r| r.is_core).take(n).collect()
    }
}

/// Everything the `label` command reports about one label.
#[derive(Debug, Clone, Serialize)]
pub struct ScopedAnalysis {
    /// The neighbourhood
    pub subgraph: LabelSubgraph,
    /// Scoped PageRank
    pub pagerank: LabelPageRank,
    /// Scoped downstream depth per member
    pub critical_path: BTreeMap<IssueId, usize>,
    /// Deepest member chain
    pub max_depth: usize,
    /// Whether the subgraph contains a blocking cycle
    pub has_cycle: bool,
}

impl ScopedAnalysis {
    /// Builds the subgraph for `label` and reruns PageRank and critical path in it.
    #[must_use]
    pub fn compute(issues: &[Issue], label: &str, config: &CentralityConfig) -> Self {
        let subgraph = LabelSubgraph::build(issues, label);
        let pagerank = LabelPageRank::compute(&subgraph, config);

        let graph = subgraph.graph();
        let path = paths::critical_path(graph);
        let critical_path: BTreeMap<IssueId, usize> = path
            .depth
            .iter()
            .enumerate()
            .map(|(i, d)| (graph.id(NodeIndex::new(i)).clone(), *d))
            .collect();

        Self {
            max_depth: critical_path.values().copied().max().unwrap_or(0),
            has_cycle: path.has_cycle,
            critical_path,
            pagerank,
            subgraph,
        }
    }
}
