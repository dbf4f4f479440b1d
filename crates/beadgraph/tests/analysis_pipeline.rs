//! End-to-end tests of the analysis pipeline through the public library API.

use beadgraph::analysis::{Analyzer, CachedAnalyzer, DependencyGraph, fingerprint};
use beadgraph::config::{CentralityConfig, TriageConfig};
use beadgraph::domain::{Issue, IssueId};
use beadgraph::labels::ScopedAnalysis;
use beadgraph::loader::load_issues;
use beadgraph::snapshot::{Snapshot, compare_snapshots};
use beadgraph::triage::{TriageOptions, compute_triage};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};

mod common;
use common::{IssueLine, beads_repo, chain, issues, now};

// ============================================================================
// Generators
// ============================================================================

/// Up to 12 issues with random blocking edges (no self-loops) and about a
/// quarter of them closed.
fn arb_issues() -> impl Strategy<Value = Vec<Issue>> {
    (1usize..12).prop_flat_map(|n| {
        (
            proptest::collection::vec((0..n, 0..n), 0..(n * 2)),
            proptest::collection::vec(proptest::bool::weighted(0.25), n),
        )
            .prop_map(move |(edges, closed)| {
                let mut blockers: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
                for (from, to) in edges {
                    if from != to {
                        blockers.entry(to).or_default().insert(format!("n{from}"));
                    }
                }
                (0..n)
                    .map(|i| {
                        let mut line = IssueLine::new(&format!("n{i}"));
                        if let Some(b) = blockers.get(&i) {
                            let refs: Vec<&str> = b.iter().map(String::as_str).collect();
                            line = line.blocked_by(&refs);
                        }
                        if closed[i] {
                            line = line.status("closed");
                        }
                        line.issue()
                    })
                    .collect()
            })
    })
}

/// Like [`arb_issues`], with each issue carrying any of three labels.
fn arb_labelled_issues() -> impl Strategy<Value = Vec<Issue>> {
    const POOL: [&str; 3] = ["api", "ui", "core"];
    (1usize..12).prop_flat_map(|n| {
        (
            proptest::collection::vec((0..n, 0..n), 0..(n * 2)),
            proptest::collection::vec(proptest::collection::vec(any::<bool>(), 3), n),
        )
            .prop_map(move |(edges, picks)| {
                let mut blockers: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
                for (from, to) in edges {
                    blockers.entry(to).or_default().insert(format!("n{from}"));
                }
                (0..n)
                    .map(|i| {
                        let labels: Vec<&str> = POOL
                            .iter()
                            .zip(&picks[i])
                            .filter(|(_, on)| **on)
                            .map(|(l, _)| *l)
                            .collect();
                        let mut line = IssueLine::new(&format!("n{i}")).labels(&labels);
                        if let Some(b) = blockers.get(&i) {
                            let refs: Vec<&str> = b.iter().map(String::as_str).collect();
                            line = line.blocked_by(&refs);
                        }
                        line.issue()
                    })
                    .collect()
            })
    })
}

/// Records with repeated IDs, self-references, repeated and dangling
/// dependencies. Dependency targets at or past `n` name unknown issues.
fn arb_messy_records() -> impl Strategy<Value = Vec<(usize, Vec<usize>)>> {
    (1usize..8).prop_flat_map(|n| {
        proptest::collection::vec(
            (0..n, proptest::collection::vec(0..(n + 3), 0..6)),
            1..14,
        )
    })
}

fn wide_triage() -> TriageConfig {
    TriageConfig {
        top_n: 100,
        ..TriageConfig::default()
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn pagerank_is_a_distribution(issues in arb_issues()) {
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze_blocking();
        let total: f64 = stats.page_rank().values().sum();
        prop_assert!((total - 1.0).abs() < 1e-4, "sum was {total}");
    }

    #[test]
    fn plan_schedules_each_open_issue_once(issues in arb_issues()) {
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze();
        let plan = stats.execution_plan();

        let mut seen: Vec<IssueId> = plan
            .tracks
            .iter()
            .flat_map(|t| t.items.iter().map(|i| i.id.clone()))
            .chain(plan.unscheduled.iter().cloned())
            .collect();
        seen.sort();
        let mut open: Vec<IssueId> = issues
            .iter()
            .filter(|i| !i.status.is_closed())
            .map(|i| i.id.clone())
            .collect();
        open.sort();
        prop_assert_eq!(seen, open);

        let first: Vec<IssueId> = plan
            .tracks
            .first()
            .map(|t| {
                let mut ids: Vec<IssueId> = t.items.iter().map(|i| i.id.clone()).collect();
                ids.sort();
                ids
            })
            .unwrap_or_default();
        prop_assert_eq!(&first, &stats.phase1().actionable);
    }

    #[test]
    fn build_counts_nodes_edges_and_dangling_refs(records in arb_messy_records()) {
        let name = |k: usize, known: usize| if k < known { format!("n{k}") } else { format!("ghost{k}") };
        let known = records.iter().map(|(id, _)| *id).max().map_or(0, |m| m + 1);
        let issues: Vec<Issue> = records
            .iter()
            .map(|(id, deps)| {
                let targets: Vec<String> = deps.iter().map(|d| name(*d, known)).collect();
                let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
                IssueLine::new(&format!("n{id}")).blocked_by(&refs).issue()
            })
            .collect();

        let graph = DependencyGraph::build(&issues);

        let mut seen = HashSet::new();
        let mut edges = HashSet::new();
        let mut dangling = 0;
        for issue in &issues {
            if !seen.insert(issue.id.clone()) {
                continue;
            }
            for dep in issue.blocking_dependencies() {
                if !records.iter().any(|(id, _)| format!("n{id}") == dep.as_str()) {
                    dangling += 1;
                } else if *dep != issue.id {
                    edges.insert((dep.clone(), issue.id.clone()));
                }
            }
        }
        prop_assert_eq!(graph.node_count(), seen.len());
        prop_assert_eq!(graph.duplicate_ids(), issues.len() - seen.len());
        prop_assert_eq!(graph.edge_count(), edges.len());
        prop_assert_eq!(graph.dangling_refs(), dangling);
    }

    #[test]
    fn scoped_pagerank_stays_inside_its_subgraph(issues in arb_labelled_issues()) {
        let scoped = ScopedAnalysis::compute(&issues, "api", &CentralityConfig::default());
        let members: BTreeSet<&IssueId> = scoped
            .subgraph
            .core_issues
            .iter()
            .chain(&scoped.subgraph.dependency_issues)
            .collect();

        prop_assert_eq!(scoped.pagerank.scores.len(), members.len());
        for id in scoped.pagerank.scores.keys() {
            prop_assert!(members.contains(id), "{id} is outside the subgraph");
        }
        if !members.is_empty() {
            let total: f64 = scoped.pagerank.scores.values().sum();
            prop_assert!((total - 1.0).abs() < 1e-4, "sum was {total}");
        }
    }

    #[test]
    fn fingerprint_ignores_order(issues in arb_issues()) {
        let mut reversed = issues.clone();
        reversed.reverse();
        prop_assert_eq!(fingerprint(&issues), fingerprint(&reversed));
    }

    #[test]
    fn triage_covers_open_work_in_score_order(issues in arb_issues()) {
        let stats = Analyzer::new(&issues, &CentralityConfig::default()).analyze();
        let result = compute_triage(
            &issues,
            &stats,
            &wide_triage(),
            None,
            &TriageOptions::default(),
            now(),
        );

        let open = issues.iter().filter(|i| !i.status.is_closed()).count();
        prop_assert_eq!(result.recommendations.len(), open);
        for pair in result.recommendations.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn unchanged_issues_reuse_phase2() {
    let issues = issues(&chain(&["a", "b", "c"]));
    let config = CentralityConfig::default();

    let first = Analyzer::new(&issues, &config).analyze_blocking();
    let cached = CachedAnalyzer::new(&issues, &config, Some(&first));
    assert!(cached.was_cache_hit());

    let second = cached.analyze();
    assert!(second.was_cache_hit());
    assert!(second.is_phase2_ready());
    assert_eq!(second.page_rank(), first.page_rank());
}

#[test]
fn changed_issues_recompute() {
    let before = issues(&chain(&["a", "b"]));
    let after = issues(&[IssueLine::new("a"), IssueLine::new("b")]);
    let config = CentralityConfig::default();

    let first = Analyzer::new(&before, &config).analyze_blocking();
    assert!(!CachedAnalyzer::new(&after, &config, Some(&first)).was_cache_hit());

    let tweaked = CentralityConfig {
        damping: 0.5,
        ..config.clone()
    };
    assert!(!CachedAnalyzer::new(&before, &tweaked, Some(&first)).was_cache_hit());
}

// ============================================================================
// Labels
// ============================================================================

#[test]
fn scoped_pagerank_sums_to_one() {
    let issues = issues(&[
        IssueLine::new("a").labels(&["api"]),
        IssueLine::new("b").labels(&["api"]).blocked_by(&["a", "x"]),
        IssueLine::new("x").labels(&["infra"]),
        IssueLine::new("y").labels(&["infra"]),
    ]);
    let scoped = ScopedAnalysis::compute(&issues, "api", &CentralityConfig::default());

    assert_eq!(scoped.subgraph.core_count, 2);
    assert_eq!(scoped.subgraph.dependency_issues, vec![IssueId::new("x")]);
    let total: f64 = scoped.pagerank.scores.values().sum();
    assert!((total - 1.0).abs() < 1e-4);
}

// ============================================================================
// Loading and Snapshots
// ============================================================================

#[tokio::test]
async fn load_analyze_snapshot_roundtrip() {
    let repo = beads_repo(&chain(&["a", "b", "c"]));
    let loaded = load_issues(repo.path()).await.unwrap();
    assert_eq!(loaded.issues.len(), 3);
    assert!(loaded.warnings.is_empty());

    let snapshot = Snapshot::new(&loaded.issues, now()).with_revision("v1");
    let path = repo.path().join("snap.json");
    snapshot.save(&path).await.unwrap();
    let restored = Snapshot::load(&path).await.unwrap();

    let diff = compare_snapshots(&snapshot, &restored);
    assert!(diff.is_empty());
    assert_eq!(restored.revision.as_deref(), Some("v1"));
    assert_eq!(restored.metrics.actionable_issues, 1);
}
