//! Dependency graph construction using petgraph.
//!
//! Nodes are issue IDs stored in a petgraph arena; edges run from blocker to
//! blocked. Only `Blocks` dependencies form edges.

use crate::domain::{Issue, IssueId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Immutable blocker-to-blocked graph over one issue set.
///
/// Node indices are dense (`0..node_count`) and follow the order issues were
/// supplied in, so per-node results can live in plain vectors.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<IssueId, ()>,
    node_map: HashMap<IssueId, NodeIndex>,
    /// Sorted-by-ID node order, for deterministic traversals.
    ordered: Vec<NodeIndex>,
    dangling_refs: usize,
    duplicate_ids: usize,
}

impl DependencyGraph {
    /// Builds the graph in O(V+E).
    ///
    /// - dependencies on unknown IDs are counted as dangling and skipped
    /// - self-dependencies are dropped
    /// - repeated dependencies produce a single edge
    /// - a repeated issue ID keeps its first occurrence
    pub fn build<'a, I>(issues: I) -> Self
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        let issues: Vec<&Issue> = issues.into_iter().collect();
        let mut graph = DiGraph::with_capacity(issues.len(), issues.len());
        let mut node_map = HashMap::with_capacity(issues.len());
        let mut duplicate_ids = 0;

        let mut owners = Vec::with_capacity(issues.len());
        for issue in &issues {
            if node_map.contains_key(&issue.id) {
                duplicate_ids += 1;
                continue;
            }
            let idx = graph.add_node(issue.id.clone());
            node_map.insert(issue.id.clone(), idx);
            owners.push((idx, *issue));
        }

        let mut seen = HashSet::new();
        let mut dangling_refs = 0;
        for (blocked, issue) in owners {
            for blocker_id in issue.blocking_dependencies() {
                let Some(&blocker) = node_map.get(blocker_id) else {
                    dangling_refs += 1;
                    tracing::debug!(
                        issue = %issue.id,
                        depends_on = %blocker_id,
                        "Skipping dangling dependency"
                    );
                    continue;
                };
                if blocker == blocked || !seen.insert((blocker, blocked)) {
                    continue;
                }
                graph.add_edge(blocker, blocked, ());
            }
        }

        let mut ordered: Vec<NodeIndex> = graph.node_indices().collect();
        ordered.sort_by(|a, b| graph[*a].cmp(&graph[*b]));

        Self {
            graph,
            node_map,
            ordered,
            dangling_refs,
            duplicate_ids,
        }
    }

    /// Number of distinct issues.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct blocker-to-blocked edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// `E / (N * (N - 1))`, or 0 for fewer than two nodes.
    #[must_use]
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        self.edge_count() as f64 / (n as f64 * (n - 1) as f64)
    }

    /// Dependencies that named an issue not in the set.
    #[must_use]
    pub fn dangling_refs(&self) -> usize {
        self.dangling_refs
    }

    /// Issues skipped because their ID was already present.
    #[must_use]
    pub fn duplicate_ids(&self) -> usize {
        self.duplicate_ids
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Node index of an issue, if present.
    #[must_use]
    pub fn index_of(&self, id: &IssueId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Returns `true` if the issue is a node of this graph.
    #[must_use]
    pub fn contains(&self, id: &IssueId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Issue ID at a node index.
    #[must_use]
    pub fn id(&self, idx: NodeIndex) -> &IssueId {
        &self.graph[idx]
    }

    /// Node indices sorted by issue ID.
    #[must_use]
    pub fn ordered_nodes(&self) -> &[NodeIndex] {
        &self.ordered
    }

    /// Issues directly blocked by `idx`.
    pub fn blocked_by(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Issues directly blocking `idx`.
    pub fn blockers_of(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Incoming)
    }

    /// Number of issues `idx` blocks.
    #[must_use]
    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.blocked_by(idx).count()
    }

    /// Number of issues blocking `idx`.
    #[must_use]
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.blockers_of(idx).count()
    }

    /// Dense adjacency lists `(outgoing, incoming)` indexed by node position.
    ///
    /// Neighbour lists are sorted by node index so iteration order, and with
    /// it floating-point summation order, is stable.
    #[must_use]
    pub fn adjacency(&self) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let n = self.node_count();
        let mut out = vec![Vec::new(); n];
        let mut inc = vec![Vec::new(); n];
        for edge in self.graph.raw_edges() {
            let (s, t) = (edge.source().index(), edge.target().index());
            out[s].push(t);
            inc[t].push(s);
        }
        for list in out.iter_mut().chain(inc.iter_mut()) {
            list.sort_unstable();
        }
        (out, inc)
    }

    /// The underlying petgraph graph, for algorithms in `petgraph::algo`.
    #[must_use]
    pub fn inner(&self) -> &DiGraph<IssueId, ()> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blocked_by, issue};

    #[test]
    fn empty_graph_has_zero_everything() {
        let graph = DependencyGraph::build(&Vec::<crate::domain::Issue>::new());
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.density().abs() < f64::EPSILON);
    }

    #[test]
    fn edges_run_from_blocker_to_blocked() {
        let issues = vec![issue("a"), blocked_by(issue("b"), &["a"])];
        let graph = DependencyGraph::build(&issues);

        let a = graph.index_of(&"a".into()).unwrap();
        let b = graph.index_of(&"b".into()).unwrap();
        assert_eq!(graph.blocked_by(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(graph.blockers_of(b).collect::<Vec<_>>(), vec![a]);
        assert_eq!(graph.out_degree(a), 1);
        assert_eq!(graph.in_degree(b), 1);
    }

    #[test]
    fn dangling_self_and_duplicate_dependencies() {
        let issues = vec![
            issue("a"),
            blocked_by(issue("b"), &["a", "a", "b", "ghost", "phantom"]),
        ];
        let graph = DependencyGraph::build(&issues);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dangling_refs(), 2);
        assert!((graph.density() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn non_blocking_dependencies_are_ignored() {
        let mut b = issue("b");
        b.dependencies.push(crate::domain::Dependency {
            issue_id: None,
            depends_on_id: "a".into(),
            dep_type: crate::domain::DependencyType::Related,
            created_at: None,
        });
        let graph = DependencyGraph::build(&[issue("a"), b]);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.dangling_refs(), 0);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let graph = DependencyGraph::build(&[issue("a"), issue("a"), issue("b")]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.duplicate_ids(), 1);
    }

    #[test]
    fn ordered_nodes_are_sorted_by_id() {
        let graph = DependencyGraph::build(&[issue("c"), issue("a"), issue("b")]);
        let ids: Vec<&str> = graph
            .ordered_nodes()
            .iter()
            .map(|&i| graph.id(i).as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
