//! The GraphStats store.
//!
//! A [`GraphStats`] is created with its Phase-1 results already in place and
//! a [`Phase2Cell`] that the background task fills exactly once. Readers never
//! lock on the hot path: accessors check a [`OnceLock`] and fall back to zero
//! values until the batch lands.
//!
//! Consumers that need final numbers either block with
//! [`GraphStats::wait_for_phase2`] or await [`GraphStats::phase2_complete`].
//! The completion carries the analysis generation, so a notification from a
//! superseded analysis can be recognised and dropped.

use super::phase1::{ExecutionPlan, Phase1Metrics};
use super::phase2::Phase2Metrics;
use crate::config::CentralityConfig;
use crate::domain::IssueId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};
use tokio::sync::watch;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// Phase-2 Cell
// ============================================================================

/// Single-writer, many-reader slot for the Phase-2 batch.
#[derive(Debug)]
pub struct Phase2Cell {
    metrics: OnceLock<Phase2Metrics>,
    done: Mutex<bool>,
    ready: Condvar,
    notify: watch::Sender<bool>,
}

impl Default for Phase2Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase2Cell {
    /// An empty cell awaiting its batch.
    #[must_use]
    pub fn new() -> Self {
        let (notify, _) = watch::channel(false);
        Self {
            metrics: OnceLock::new(),
            done: Mutex::new(false),
            ready: Condvar::new(),
            notify,
        }
    }

    /// A cell that is already complete.
    #[must_use]
    pub fn ready(metrics: Phase2Metrics) -> Self {
        let cell = Self::new();
        cell.publish(metrics);
        cell
    }

    /// Stores the batch and wakes every waiter.
    ///
    /// Only the first call has any effect; later batches are discarded.
    pub fn publish(&self, metrics: Phase2Metrics) {
        if self.metrics.set(metrics).is_err() {
            tracing::debug!("Phase-2 batch already published, ignoring duplicate");
            return;
        }
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.ready.notify_all();
        self.notify.send_replace(true);
    }

    /// The batch, if it has landed.
    #[must_use]
    pub fn get(&self) -> Option<&Phase2Metrics> {
        self.metrics.get()
    }

    /// Blocks the calling thread until the batch lands.
    pub fn wait(&self) -> &Phase2Metrics {
        if let Some(m) = self.metrics.get() {
            return m;
        }
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            done = self
                .ready
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(done);
        match self.metrics.get() {
            Some(m) => m,
            None => empty_metrics(),
        }
    }

    /// Resolves once the batch lands, without blocking the runtime.
    pub async fn wait_async(&self) {
        let mut rx = self.notify.subscribe();
        // The sender lives as long as `self`, so this can only fail if it was dropped.
        let _ = rx.wait_for(|done| *done).await;
    }
}

fn empty_metrics() -> &'static Phase2Metrics {
    static EMPTY: OnceLock<Phase2Metrics> = OnceLock::new();
    EMPTY.get_or_init(Phase2Metrics::default)
}

/// Publishes an empty batch if the Phase-2 task unwinds, so waiters never hang.
pub(crate) struct PublishOnDrop {
    pub(crate) cell: Arc<Phase2Cell>,
}

impl Drop for PublishOnDrop {
    fn drop(&mut self) {
        if self.cell.get().is_none() {
            tracing::warn!("Phase-2 task ended without results, publishing empty metrics");
            self.cell.publish(Phase2Metrics::default());
        }
    }
}

// ============================================================================
// GraphStats
// ============================================================================

/// Notification that Phase-2 finished for one analysis generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase2Completion {
    /// Generation of the analysis that completed.
    pub generation: u64,
}

impl Phase2Completion {
    /// Returns `true` if this completion belongs to `stats` (and is not stale).
    #[must_use]
    pub fn is_for(&self, stats: &GraphStats) -> bool {
        self.generation == stats.generation
    }
}

/// Analysis results for one issue set.
#[derive(Debug)]
pub struct GraphStats {
    generation: u64,
    fingerprint: String,
    centrality: CentralityConfig,
    cache_hit: bool,
    phase1: Phase1Metrics,
    phase2: Arc<Phase2Cell>,
}

impl GraphStats {
    pub(crate) fn new(
        fingerprint: String,
        centrality: CentralityConfig,
        cache_hit: bool,
        phase1: Phase1Metrics,
        phase2: Arc<Phase2Cell>,
    ) -> Self {
        Self {
            generation: next_generation(),
            fingerprint,
            centrality,
            cache_hit,
            phase1,
            phase2,
        }
    }

    /// Process-unique, increasing identifier of this analysis.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Content fingerprint of the analysed issue set.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub(crate) fn centrality_config(&self) -> &CentralityConfig {
        &self.centrality
    }

    pub(crate) fn phase2_cell(&self) -> &Arc<Phase2Cell> {
        &self.phase2
    }

    /// Whether Phase-2 results were reused from a previous analysis.
    #[must_use]
    pub fn was_cache_hit(&self) -> bool {
        self.cache_hit
    }

    /// Identity comparison: `true` only for the very same analysis.
    #[must_use]
    pub fn same_analysis(a: &Arc<Self>, b: &Arc<Self>) -> bool {
        Arc::ptr_eq(a, b) || a.generation == b.generation
    }

    // ----- Phase-1 -----

    /// Phase-1 results.
    #[must_use]
    pub fn phase1(&self) -> &Phase1Metrics {
        &self.phase1
    }

    /// Distinct issues.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.phase1.node_count
    }

    /// Distinct blocking edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.phase1.edge_count
    }

    /// Graph density.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.phase1.density
    }

    /// Size of the actionable set.
    #[must_use]
    pub fn actionable_count(&self) -> usize {
        self.phase1.actionable_count
    }

    /// Layered plan of open work.
    #[must_use]
    pub fn execution_plan(&self) -> &ExecutionPlan {
        &self.phase1.execution_plan
    }

    // ----- Phase-2 -----

    /// Returns `true` once the Phase-2 batch has landed.
    #[must_use]
    pub fn is_phase2_ready(&self) -> bool {
        self.phase2.get().is_some()
    }

    /// Blocks until Phase-2 is complete and returns its batch.
    pub fn wait_for_phase2(&self) -> &Phase2Metrics {
        self.phase2.wait()
    }

    /// Resolves when Phase-2 completes, tagged with this analysis's generation.
    pub async fn phase2_complete(&self) -> Phase2Completion {
        self.phase2.wait_async().await;
        Phase2Completion {
            generation: self.generation,
        }
    }

    /// The Phase-2 batch, if ready.
    #[must_use]
    pub fn phase2(&self) -> Option<&Phase2Metrics> {
        self.phase2.get()
    }

    fn score(&self, pick: impl Fn(&Phase2Metrics) -> &BTreeMap<IssueId, f64>, id: &IssueId) -> f64 {
        self.phase2
            .get()
            .and_then(|m| pick(m).get(id).copied())
            .unwrap_or(0.0)
    }

    /// PageRank of `id`, or 0 before Phase-2 completes.
    #[must_use]
    pub fn page_rank_score(&self, id: &IssueId) -> f64 {
        self.score(|m| &m.pagerank, id)
    }

    /// Betweenness of `id`, or 0 before Phase-2 completes.
    #[must_use]
    pub fn betweenness_score(&self, id: &IssueId) -> f64 {
        self.score(|m| &m.betweenness, id)
    }

    /// Eigenvector centrality of `id`, or 0 before Phase-2 completes.
    #[must_use]
    pub fn eigenvector_score(&self, id: &IssueId) -> f64 {
        self.score(|m| &m.eigenvector, id)
    }

    /// Hub score of `id`, or 0 before Phase-2 completes.
    #[must_use]
    pub fn hub_score(&self, id: &IssueId) -> f64 {
        self.score(|m| &m.hubs, id)
    }

    /// Authority score of `id`, or 0 before Phase-2 completes.
    #[must_use]
    pub fn authority_score(&self, id: &IssueId) -> f64 {
        self.score(|m| &m.authorities, id)
    }

    /// Critical-path depth of `id`, or 0 before Phase-2 completes.
    #[must_use]
    pub fn critical_path_score(&self, id: &IssueId) -> usize {
        self.phase2
            .get()
            .and_then(|m| m.critical_path.get(id).copied())
            .unwrap_or(0)
    }

    /// Detected cycles; empty before Phase-2 completes.
    #[must_use]
    pub fn cycles(&self) -> &[Vec<IssueId>] {
        self.phase2.get().map_or(&[], |m| m.cycles.as_slice())
    }

    /// Whether a cycle was found; `false` before Phase-2 completes.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.phase2.get().is_some_and(|m| m.has_cycle)
    }

    /// Copy of the PageRank map; empty before Phase-2 completes.
    #[must_use]
    pub fn page_rank(&self) -> BTreeMap<IssueId, f64> {
        self.phase2
            .get()
            .map(|m| m.pagerank.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_metrics() -> Phase2Metrics {
        let mut m = Phase2Metrics::default();
        m.pagerank.insert("a".into(), 0.6);
        m.critical_path.insert("a".into(), 2);
        m.cycles.push(vec!["a".into(), "b".into(), "a".into()]);
        m.has_cycle = true;
        m
    }

    fn stats_with(cell: Arc<Phase2Cell>) -> GraphStats {
        let phase1 = super::super::phase1::compute(&[], &super::super::graph::DependencyGraph::default());
        GraphStats::new("empty".into(), CentralityConfig::default(), false, phase1, cell)
    }

    #[test]
    fn accessors_return_zero_before_publish() {
        let stats = stats_with(Arc::new(Phase2Cell::new()));
        let id = IssueId::new("a");

        assert!(!stats.is_phase2_ready());
        assert!(stats.page_rank_score(&id).abs() < f64::EPSILON);
        assert_eq!(stats.critical_path_score(&id), 0);
        assert!(stats.cycles().is_empty());
        assert!(!stats.has_cycle());
        assert!(stats.page_rank().is_empty());
    }

    #[test]
    fn wait_blocks_until_background_publish() {
        let cell = Arc::new(Phase2Cell::new());
        let stats = stats_with(Arc::clone(&cell));

        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            cell.publish(sample_metrics());
        });

        let metrics = stats.wait_for_phase2();
        assert!((metrics.pagerank[&IssueId::new("a")] - 0.6).abs() < f64::EPSILON);
        assert!(stats.has_cycle());
        assert_eq!(stats.critical_path_score(&"a".into()), 2);
        writer.join().unwrap();
    }

    #[test]
    fn wait_on_local_cell_returns_published_batch() {
        let cell = Phase2Cell::new();
        std::thread::scope(|s| {
            s.spawn(|| {
                std::thread::sleep(Duration::from_millis(10));
                cell.publish(sample_metrics());
            });
            let metrics = cell.wait();
            assert!(metrics.has_cycle);
        });
    }

    #[test]
    fn second_publish_is_ignored() {
        let cell = Phase2Cell::ready(sample_metrics());
        cell.publish(Phase2Metrics::default());
        assert!(cell.get().unwrap().has_cycle);
    }

    #[test]
    fn dropped_writer_publishes_empty_batch() {
        let cell = Arc::new(Phase2Cell::new());
        let guard = PublishOnDrop {
            cell: Arc::clone(&cell),
        };
        let _ = std::thread::spawn(move || {
            let _guard = guard;
            panic!("phase-2 failure");
        })
        .join();

        assert_eq!(cell.wait(), &Phase2Metrics::default());
    }

    #[tokio::test]
    async fn completion_identifies_its_generation() {
        let old = stats_with(Arc::new(Phase2Cell::ready(sample_metrics())));
        let current = stats_with(Arc::new(Phase2Cell::ready(sample_metrics())));

        let done = old.phase2_complete().await;
        assert!(done.is_for(&old));
        assert!(!done.is_for(&current));
        assert!(current.generation() > old.generation());
    }

    #[tokio::test]
    async fn async_wait_sees_later_publish() {
        let cell = Arc::new(Phase2Cell::new());
        let stats = stats_with(Arc::clone(&cell));

        std::thread::spawn(move || cell.publish(sample_metrics()));
        let done = stats.phase2_complete().await;

        assert!(done.is_for(&stats));
        assert!(stats.is_phase2_ready());
    }

    #[test]
    fn identity_not_value_comparison() {
        let a = Arc::new(stats_with(Arc::new(Phase2Cell::new())));
        let b = Arc::new(stats_with(Arc::new(Phase2Cell::new())));
        assert!(GraphStats::same_analysis(&a, &Arc::clone(&a)));
        assert!(!GraphStats::same_analysis(&a, &b));
    }
}
