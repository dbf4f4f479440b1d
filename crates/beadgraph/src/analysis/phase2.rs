//! Phase-2: the expensive centrality, path, and cycle metrics.

use super::centrality::{self, Convergence};
use super::graph::DependencyGraph;
use super::paths;
use crate::config::CentralityConfig;
use crate::domain::IssueId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// Batch of Phase-2 results, published once per analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Phase2Metrics {
    /// PageRank per issue; sums to 1 over a non-empty graph
    pub pagerank: BTreeMap<IssueId, f64>,
    /// Unnormalized directed betweenness
    pub betweenness: BTreeMap<IssueId, f64>,
    /// Eigenvector centrality (unit L2 norm)
    pub eigenvector: BTreeMap<IssueId, f64>,
    /// HITS hub scores
    pub hubs: BTreeMap<IssueId, f64>,
    /// HITS authority scores
    pub authorities: BTreeMap<IssueId, f64>,
    /// Longest downstream chain (edges) per issue
    pub critical_path: BTreeMap<IssueId, usize>,
    /// One representative cycle per cyclic component, capped
    pub cycles: Vec<Vec<IssueId>>,
    /// Cyclic components found before the cap
    pub cycle_count: usize,
    /// `true` if any cycle exists; critical-path values are then estimates
    pub has_cycle: bool,
    /// PageRank iterations run
    pub pagerank_iterations: usize,
    /// Wall time for the batch
    #[serde(skip)]
    pub elapsed_ms: u128,
}

fn by_id(graph: &DependencyGraph, scores: Vec<f64>) -> BTreeMap<IssueId, f64> {
    scores
        .into_iter()
        .enumerate()
        .map(|(i, s)| (graph.id(petgraph::graph::NodeIndex::new(i)).clone(), s))
        .collect()
}

/// Computes every Phase-2 metric over `graph`.
#[must_use]
pub fn compute(graph: &DependencyGraph, config: &CentralityConfig) -> Phase2Metrics {
    let start = Instant::now();
    let convergence = Convergence {
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
    };
    let (out, inc) = graph.adjacency();

    let pagerank = centrality::pagerank(&out, config.damping, convergence);
    if !pagerank.converged && !out.is_empty() {
        tracing::debug!(
            iterations = pagerank.iterations,
            "PageRank hit the iteration cap before converging"
        );
    }
    let betweenness = centrality::betweenness(&out);
    let eigenvector = centrality::eigenvector(&inc, convergence);
    let hits = centrality::hits(&out, &inc, convergence);
    let critical = paths::critical_path(graph);
    let (cycles, cycle_count) = paths::find_cycles(graph, config.cycle_limit);

    let critical_path = critical
        .depth
        .into_iter()
        .enumerate()
        .map(|(i, d)| (graph.id(petgraph::graph::NodeIndex::new(i)).clone(), d))
        .collect();

    Phase2Metrics {
        pagerank_iterations: pagerank.iterations,
        pagerank: by_id(graph, pagerank.scores),
        betweenness: by_id(graph, betweenness),
        eigenvector: by_id(graph, eigenvector.scores),
        hubs: by_id(graph, hits.hubs),
        authorities: by_id(graph, hits.authorities),
        critical_path,
        has_cycle: critical.has_cycle || cycle_count > 0,
        cycles,
        cycle_count,
        elapsed_ms: start.elapsed().as_millis(),
    }
}
