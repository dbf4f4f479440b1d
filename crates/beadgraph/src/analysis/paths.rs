//! Critical-path depth and cycle enumeration.

use super::graph::DependencyGraph;
use crate::domain::IssueId;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use std::collections::HashSet;

/// Longest downstream chain per node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CriticalPath {
    /// Edges on the longest simple blocker-to-blocked path starting at each node.
    pub depth: Vec<usize>,
    /// `true` when the graph has a cycle, so a depth may run through one.
    pub has_cycle: bool,
}

/// Paths explored per start node inside one cyclic component.
const CYCLE_SEARCH_BUDGET: usize = 50_000;

/// Successor lists ordered by issue ID, so traversal does not depend on input order.
fn successors_by_id(graph: &DependencyGraph) -> Vec<Vec<NodeIndex>> {
    let mut succ: Vec<Vec<NodeIndex>> = (0..graph.node_count())
        .map(|i| graph.blocked_by(NodeIndex::new(i)).collect())
        .collect();
    for list in &mut succ {
        list.sort_by(|a, b| graph.id(*a).cmp(graph.id(*b)));
    }
    succ
}

/// Computes impact depth over the strongly connected components.
///
/// Components are processed sinks first, so a node outside any cycle gets
/// its exact longest-path depth in one pass. Inside a cyclic component each
/// node gets the longest simple path that stays in the component and then
/// leaves it through its deepest exit. That search is exhaustive for small
/// components; past [`CYCLE_SEARCH_BUDGET`] steps per node it stops, and the
/// depth is then a lower bound. Either way the result does not depend on the
/// order issues were supplied in.
#[must_use]
pub fn critical_path(graph: &DependencyGraph) -> CriticalPath {
    let n = graph.node_count();
    let succ = successors_by_id(graph);
    let components = tarjan_scc(graph.inner());

    let mut component_of = vec![0usize; n];
    for (c, members) in components.iter().enumerate() {
        for m in members {
            component_of[m.index()] = c;
        }
    }

    let mut depth = vec![0usize; n];
    let mut has_cycle = false;
    let mut exits = vec![0usize; n];
    let mut on_path = vec![false; n];

    for (c, members) in components.iter().enumerate() {
        for m in members {
            let v = m.index();
            exits[v] = succ[v]
                .iter()
                .map(|w| w.index())
                .filter(|&w| component_of[w] != c)
                .map(|w| depth[w] + 1)
                .max()
                .unwrap_or(0);
        }
        if let [single] = members.as_slice() {
            depth[single.index()] = exits[single.index()];
            continue;
        }

        has_cycle = true;
        let search = CycleSearch {
            component: c,
            succ: &succ,
            component_of: &component_of,
            exits: &exits,
        };
        let mut bounded = false;
        for m in members {
            let (best, complete) = search.longest_from(m.index(), &mut on_path);
            depth[m.index()] = best;
            bounded |= !complete;
        }
        if bounded {
            tracing::debug!(
                size = members.len(),
                "Cyclic component too large for an exhaustive path search"
            );
        }
    }

    CriticalPath { depth, has_cycle }
}

/// Simple-path search confined to one strongly connected component.
struct CycleSearch<'a> {
    component: usize,
    succ: &'a [Vec<NodeIndex>],
    component_of: &'a [usize],
    exits: &'a [usize],
}

impl CycleSearch<'_> {
    /// Longest simple path from `start` within the component plus the exit
    /// depth of its last node. The flag is `false` if the budget ran out.
    fn longest_from(&self, start: usize, on_path: &mut [bool]) -> (usize, bool) {
        let mut best = self.exits[start];
        let mut budget = CYCLE_SEARCH_BUDGET;
        on_path[start] = true;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(top) = stack.last_mut() {
            let v = top.0;
            let Some(w) = self.succ[v].get(top.1).map(|w| w.index()) else {
                on_path[v] = false;
                stack.pop();
                continue;
            };
            top.1 += 1;
            if self.component_of[w] != self.component || on_path[w] || budget == 0 {
                continue;
            }
            budget -= 1;
            on_path[w] = true;
            // Nodes on the stack equal edges walked once `w` is appended.
            best = best.max(stack.len() + self.exits[w]);
            stack.push((w, 0));
        }
        (best, budget > 0)
    }
}

/// Finds one simple cycle per strongly connected component.
///
/// Each cycle starts at the smallest ID of its component and repeats that ID
/// at the end. Cycles are ordered by length, then lexicographically, and
/// truncated to `limit`. The second value is the total number of cyclic
/// components before truncation.
#[must_use]
pub fn find_cycles(graph: &DependencyGraph, limit: usize) -> (Vec<Vec<IssueId>>, usize) {
    let succ = successors_by_id(graph);
    let mut cycles = Vec::new();

    for component in tarjan_scc(graph.inner()) {
        if component.len() < 2 {
            continue;
        }
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let Some(&start) = component.iter().min_by(|a, b| graph.id(**a).cmp(graph.id(**b)))
        else {
            continue;
        };
        if let Some(path) = cycle_through(start, &succ, &members) {
            cycles.push(path.into_iter().map(|i| graph.id(i).clone()).collect::<Vec<_>>());
        }
    }

    cycles.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    let total = cycles.len();
    cycles.truncate(limit);
    (cycles, total)
}

/// Depth-first search inside one component for a path from `start` back to itself.
fn cycle_through(
    start: NodeIndex,
    succ: &[Vec<NodeIndex>],
    members: &HashSet<NodeIndex>,
) -> Option<Vec<NodeIndex>> {
    let mut visited = HashSet::from([start]);
    let mut stack: Vec<(NodeIndex, usize)> = vec![(start, 0)];

    while let Some(top) = stack.last_mut() {
        let Some(&w) = succ[top.0.index()].get(top.1) else {
            stack.pop();
            continue;
        };
        top.1 += 1;
        if w == start {
            let mut path: Vec<NodeIndex> = stack.iter().map(|(n, _)| *n).collect();
            path.push(start);
            return Some(path);
        }
        if members.contains(&w) && visited.insert(w) {
            stack.push((w, 0));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blocked_by, chain, issue};

    fn depth_of(graph: &DependencyGraph, cp: &CriticalPath, id: &str) -> usize {
        cp.depth[graph.index_of(&id.into()).unwrap().index()]
    }

    #[test]
    fn chain_depth_strictly_decreases_downstream() {
        let graph = DependencyGraph::build(&chain(&["a", "b", "c", "d"]));
        let cp = critical_path(&graph);

        assert!(!cp.has_cycle);
        assert_eq!(depth_of(&graph, &cp, "a"), 3);
        assert_eq!(depth_of(&graph, &cp, "b"), 2);
        assert_eq!(depth_of(&graph, &cp, "c"), 1);
        assert_eq!(depth_of(&graph, &cp, "d"), 0);
    }

    #[test]
    fn cycle_is_flagged_and_depths_still_produced() {
        let mut issues = chain(&["a", "b", "c", "d"]);
        issues[0] = blocked_by(issue("a"), &["d"]);
        let graph = DependencyGraph::build(&issues);

        let cp = critical_path(&graph);
        assert!(cp.has_cycle);
        assert_eq!(cp.depth.len(), 4);
        assert_eq!(depth_of(&graph, &cp, "a"), 3);

        let (cycles, total) = find_cycles(&graph, 10);
        assert_eq!(total, 1);
        let ids: Vec<&str> = cycles[0].iter().map(IssueId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "a"]);
    }

    #[test]
    fn cycle_depths_do_not_depend_on_entry_order() {
        // a -> b -> c -> a, plus c -> z
        let forward = vec![
            blocked_by(issue("a"), &["c"]),
            blocked_by(issue("b"), &["a"]),
            blocked_by(issue("c"), &["b"]),
            blocked_by(issue("z"), &["c"]),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        for issues in [forward, reversed] {
            let graph = DependencyGraph::build(&issues);
            let cp = critical_path(&graph);
            assert!(cp.has_cycle);
            assert_eq!(depth_of(&graph, &cp, "a"), 3);
            assert_eq!(depth_of(&graph, &cp, "b"), 2);
            assert_eq!(depth_of(&graph, &cp, "c"), 2);
            assert_eq!(depth_of(&graph, &cp, "z"), 0);
        }
    }

    #[test]
    fn upstream_of_cycle_counts_through_it() {
        // root -> a -> b -> a
        let issues = vec![
            issue("root"),
            blocked_by(issue("a"), &["root", "b"]),
            blocked_by(issue("b"), &["a"]),
        ];
        let graph = DependencyGraph::build(&issues);
        let cp = critical_path(&graph);
        assert_eq!(depth_of(&graph, &cp, "a"), 1);
        assert_eq!(depth_of(&graph, &cp, "root"), 2);
    }

    #[test]
    fn diamond_takes_longest_branch() {
        // a -> b -> c -> e, a -> d -> e
        let issues = vec![
            issue("a"),
            blocked_by(issue("b"), &["a"]),
            blocked_by(issue("c"), &["b"]),
            blocked_by(issue("d"), &["a"]),
            blocked_by(issue("e"), &["c", "d"]),
        ];
        let graph = DependencyGraph::build(&issues);
        let cp = critical_path(&graph);
        assert_eq!(depth_of(&graph, &cp, "a"), 3);
        assert_eq!(depth_of(&graph, &cp, "d"), 1);
    }

    #[test]
    fn cycles_sorted_by_length_and_limited() {
        let issues = vec![
            blocked_by(issue("x"), &["z"]),
            blocked_by(issue("y"), &["x"]),
            blocked_by(issue("z"), &["y"]),
            blocked_by(issue("p"), &["q"]),
            blocked_by(issue("q"), &["p"]),
            issue("lonely"),
        ];
        let graph = DependencyGraph::build(&issues);

        let (cycles, total) = find_cycles(&graph, 10);
        assert_eq!(total, 2);
        assert_eq!(cycles[0].len(), 3);
        assert_eq!(cycles[0][0].as_str(), "p");
        assert_eq!(cycles[1][0].as_str(), "x");

        let (limited, total) = find_cycles(&graph, 1);
        assert_eq!(limited.len(), 1);
        assert_eq!(total, 2);
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let graph = DependencyGraph::build(&chain(&["a", "b"]));
        let (cycles, total) = find_cycles(&graph, 10);
        assert!(cycles.is_empty());
        assert_eq!(total, 0);
    }
}
