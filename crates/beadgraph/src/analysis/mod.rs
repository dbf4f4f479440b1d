//! The two-phase graph analysis pipeline.
//!
//! ```text
//! issues ──► DependencyGraph ──► Phase-1 (sync) ──► GraphStats ◄── Phase-2 (background)
//! ```
//!
//! [`Analyzer::analyze`] builds the graph, runs Phase-1 on the caller's
//! thread, dispatches Phase-2 on a background thread and returns at once.
//! The returned [`GraphStats`] answers Phase-1 queries immediately and
//! Phase-2 queries with zero values until the batch lands.

pub mod cache;
pub mod centrality;
pub mod graph;
pub mod paths;
pub mod phase1;
pub mod phase2;
pub mod stats;

pub use cache::{CachedAnalyzer, fingerprint};
pub use graph::DependencyGraph;
pub use phase1::{ExecutionPlan, Phase1Metrics, PlanItem, PlanSummary, Track};
pub use phase2::Phase2Metrics;
pub use stats::{GraphStats, Phase2Cell, Phase2Completion};

use crate::config::CentralityConfig;
use crate::domain::Issue;
use stats::PublishOnDrop;
use std::sync::Arc;
use std::time::Instant;

/// Runs the analysis pipeline over one issue set.
#[derive(Debug)]
pub struct Analyzer<'a> {
    issues: &'a [Issue],
    config: CentralityConfig,
    graph: Arc<DependencyGraph>,
}

impl<'a> Analyzer<'a> {
    /// Builds the dependency graph for `issues`.
    #[must_use]
    pub fn new(issues: &'a [Issue], config: &CentralityConfig) -> Self {
        Self {
            issues,
            config: config.clone(),
            graph: Arc::new(DependencyGraph::build(issues)),
        }
    }

    /// The dependency graph under analysis.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Runs Phase-1 and dispatches Phase-2 in the background.
    #[must_use]
    pub fn analyze(&self) -> Arc<GraphStats> {
        self.analyze_with(fingerprint(self.issues), None)
    }

    /// Runs both phases and waits for Phase-2 before returning.
    #[must_use]
    pub fn analyze_blocking(&self) -> Arc<GraphStats> {
        let stats = self.analyze();
        stats.wait_for_phase2();
        stats
    }

    pub(crate) fn analyze_with(
        &self,
        fingerprint: String,
        reuse: Option<Arc<Phase2Cell>>,
    ) -> Arc<GraphStats> {
        let start = Instant::now();
        let phase1 = phase1::compute(self.issues, &self.graph);
        tracing::debug!(
            issues = phase1.node_count,
            edges = phase1.edge_count,
            actionable = phase1.actionable_count,
            elapsed_ms = start.elapsed().as_millis(),
            "Phase-1 complete"
        );

        let cache_hit = reuse.is_some();
        let cell = reuse.unwrap_or_else(|| {
            let cell = Arc::new(Phase2Cell::new());
            spawn_phase2(Arc::clone(&self.graph), self.config.clone(), Arc::clone(&cell));
            cell
        });

        Arc::new(GraphStats::new(
            fingerprint,
            self.config.clone(),
            cache_hit,
            phase1,
            cell,
        ))
    }
}

/// Starts the Phase-2 computation on its own thread.
///
/// Falls back to computing inline if the thread cannot be spawned, so the
/// cell is always filled.
fn spawn_phase2(graph: Arc<DependencyGraph>, config: CentralityConfig, cell: Arc<Phase2Cell>) {
    let worker = {
        let graph = Arc::clone(&graph);
        let config = config.clone();
        let cell = Arc::clone(&cell);
        move || {
            let guard = PublishOnDrop { cell };
            run_phase2(&graph, &config, &guard.cell);
        }
    };

    match std::thread::Builder::new()
        .name("beadgraph-phase2".to_string())
        .spawn(worker)
    {
        Ok(_) => tracing::debug!(nodes = graph.node_count(), "Phase-2 dispatched"),
        Err(e) => {
            tracing::warn!(error = %e, "Could not spawn Phase-2 thread, computing inline");
            run_phase2(&graph, &config, &cell);
        }
    }
}

fn run_phase2(graph: &DependencyGraph, config: &CentralityConfig, cell: &Phase2Cell) {
    let metrics = phase2::compute(graph, config);
    tracing::debug!(
        elapsed_ms = metrics.elapsed_ms,
        iterations = metrics.pagerank_iterations,
        cycles = metrics.cycle_count,
        "Phase-2 committed"
    );
    cell.publish(metrics);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssueId;
    use crate::test_support::{blocked_by, chain, issue};

    #[test]
    fn phase1_is_available_immediately() {
        let issues = chain(&["a", "b", "c"]);
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze();

        assert_eq!(stats.node_count(), 3);
        assert_eq!(stats.edge_count(), 2);
        assert_eq!(stats.actionable_count(), 1);
        assert!(!stats.was_cache_hit());
    }

    #[test]
    fn blocking_analysis_has_final_scores() {
        let issues = chain(&["a", "b", "c", "d"]);
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze_blocking();

        assert!(stats.is_phase2_ready());
        let total: f64 = stats.page_rank().values().sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert_eq!(stats.critical_path_score(&IssueId::new("a")), 3);
        assert!(!stats.has_cycle());
    }

    #[test]
    fn cycle_is_reported_through_stats() {
        let mut issues = chain(&["a", "b", "c", "d"]);
        issues[0] = blocked_by(issue("a"), &["d"]);
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze_blocking();

        assert!(stats.has_cycle());
        let cycle = &stats.cycles()[0];
        for id in ["a", "b", "c", "d"] {
            assert!(cycle.contains(&IssueId::new(id)));
        }
    }

    #[test]
    fn empty_input_is_well_defined() {
        let stats = Analyzer::new(&[], &CentralityConfig::default()).analyze_blocking();
        assert_eq!(stats.node_count(), 0);
        assert!(stats.cycles().is_empty());
        assert!(stats.page_rank().is_empty());
    }
}
