//! Phase-1: the fast, synchronous pass.
//!
//! Everything here is O(V+E) and runs on the caller's thread before any
//! background work is started: counts, density, the actionable set, blocker
//! bookkeeping, and the execution plan.

use super::graph::DependencyGraph;
use crate::domain::{Issue, IssueId, IssueStatus, index_by_id};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// One issue inside an execution-plan track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanItem {
    /// Issue ID
    pub id: IssueId,
    /// Issue title
    pub title: String,
    /// Priority (0 = most urgent)
    pub priority: u8,
    /// Current status
    pub status: IssueStatus,
    /// Issues that become actionable once this one closes
    pub unblocks: Vec<IssueId>,
}

/// A batch of issues with no dependency between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    /// `track-1`, `track-2`, ... in execution order
    pub track_id: String,
    /// Why these issues are grouped here
    pub reason: String,
    /// Members sorted by priority, then ID
    pub items: Vec<PlanItem>,
}

/// Headline of the plan: the ready issue that frees the most work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    /// Ready issue with the largest unblock count, if any
    pub highest_impact: Option<IssueId>,
    /// Human-readable explanation
    pub impact_reason: String,
    /// How many issues it unblocks
    pub unblocks_count: usize,
}

/// Topological layering of all open work into parallelizable tracks.
///
/// Track 1 is exactly the actionable set. Each later track holds issues whose
/// open blockers all sit in earlier tracks. Issues stuck in or behind a
/// blocking cycle cannot be layered and are listed as unscheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    /// Tracks in execution order
    pub tracks: Vec<Track>,
    /// Size of track 1
    pub total_actionable: usize,
    /// Open issues that cannot be scheduled because of a cycle, sorted
    pub unscheduled: Vec<IssueId>,
    /// Plan headline
    pub summary: PlanSummary,
}

/// Results of the fast pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase1Metrics {
    /// Distinct issues
    pub node_count: usize,
    /// Distinct blocker-to-blocked edges
    pub edge_count: usize,
    /// `E / (N * (N - 1))`
    pub density: f64,
    /// Dependencies naming unknown issues
    pub dangling_refs: usize,
    /// Actionable issue IDs, sorted
    pub actionable: Vec<IssueId>,
    /// `actionable.len()`
    pub actionable_count: usize,
    /// Non-closed issues with at least one open blocker
    pub blocked_count: usize,
    /// Layered plan of open work
    pub execution_plan: ExecutionPlan,
    /// Issues each issue blocks (graph out-degree)
    pub out_degree: BTreeMap<IssueId, usize>,
    /// Issues blocking each issue (graph in-degree)
    pub in_degree: BTreeMap<IssueId, usize>,
    #[serde(skip)]
    pub(crate) open_blockers: HashMap<IssueId, Vec<IssueId>>,
    #[serde(skip)]
    pub(crate) unblocks: HashMap<IssueId, Vec<IssueId>>,
    #[serde(skip)]
    pub(crate) blocker_depth: HashMap<IssueId, usize>,
}

impl Phase1Metrics {
    /// Open issues blocking `id`, sorted. Empty for unknown or closed issues.
    #[must_use]
    pub fn open_blockers(&self, id: &IssueId) -> &[IssueId] {
        self.open_blockers.get(id).map_or(&[], Vec::as_slice)
    }

    /// Open issues whose only open blocker is `id`, sorted.
    #[must_use]
    pub fn unblocks(&self, id: &IssueId) -> &[IssueId] {
        self.unblocks.get(id).map_or(&[], Vec::as_slice)
    }

    /// Length of the longest chain of open blockers above `id`.
    ///
    /// `None` for closed or unknown issues and for issues in or behind a
    /// blocking cycle.
    #[must_use]
    pub fn blocker_depth(&self, id: &IssueId) -> Option<usize> {
        self.blocker_depth.get(id).copied()
    }

    /// Returns `true` if `id` is in the actionable set.
    #[must_use]
    pub fn is_actionable(&self, id: &IssueId) -> bool {
        self.actionable.binary_search(id).is_ok()
    }
}

/// Runs the fast pass over `issues` using an already-built `graph`.
#[must_use]
pub fn compute(issues: &[Issue], graph: &DependencyGraph) -> Phase1Metrics {
    let by_id = index_by_id(issues);

    // Open blockers per non-closed issue: resolved, not closed, not self, deduped.
    let mut open_blockers: HashMap<IssueId, Vec<IssueId>> = HashMap::new();
    let first_records = issues
        .iter()
        .filter(|i| by_id.get(&i.id).is_some_and(|first| std::ptr::eq(*first, *i)));
    for issue in first_records.filter(|i| !i.status.is_closed()) {
        let mut blockers: Vec<IssueId> = issue
            .blocking_dependencies()
            .filter(|dep| *dep != &issue.id)
            .filter(|dep| by_id.get(dep).is_some_and(|b| !b.status.is_closed()))
            .cloned()
            .collect();
        blockers.sort();
        blockers.dedup();
        open_blockers.insert(issue.id.clone(), blockers);
    }

    let mut actionable: Vec<IssueId> = open_blockers
        .iter()
        .filter(|(id, blockers)| {
            blockers.is_empty() && by_id.get(id).is_some_and(|i| i.status != IssueStatus::Blocked)
        })
        .map(|(id, _)| id.clone())
        .collect();
    actionable.sort();
    let blocked_count = open_blockers.values().filter(|b| !b.is_empty()).count();

    let mut unblocks: HashMap<IssueId, Vec<IssueId>> = HashMap::new();
    for (id, blockers) in &open_blockers {
        if let [only] = blockers.as_slice() {
            unblocks.entry(only.clone()).or_default().push(id.clone());
        }
    }
    for list in unblocks.values_mut() {
        list.sort();
    }

    let layering = layer(&by_id, &open_blockers);
    let execution_plan = build_plan(&by_id, &layering, &unblocks, actionable.len());

    let mut out_degree = BTreeMap::new();
    let mut in_degree = BTreeMap::new();
    for &idx in graph.ordered_nodes() {
        let id = graph.id(idx).clone();
        out_degree.insert(id.clone(), graph.out_degree(idx));
        in_degree.insert(id, graph.in_degree(idx));
    }

    open_blockers.retain(|_, blockers| !blockers.is_empty());

    Phase1Metrics {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        density: graph.density(),
        dangling_refs: graph.dangling_refs(),
        actionable_count: actionable.len(),
        actionable,
        blocked_count,
        execution_plan,
        out_degree,
        in_degree,
        open_blockers,
        unblocks,
        blocker_depth: layering.depth,
    }
}

struct Layering {
    /// Track index per schedulable issue (0 = actionable).
    level: HashMap<IssueId, usize>,
    /// Longest open-blocker chain per schedulable issue.
    depth: HashMap<IssueId, usize>,
    unscheduled: Vec<IssueId>,
}

/// Kahn's algorithm over the open-blocker relation.
///
/// An explicitly `blocked` issue with no open blockers starts at level 1 so
/// that level 0 matches the actionable set.
fn layer(
    by_id: &HashMap<&IssueId, &Issue>,
    open_blockers: &HashMap<IssueId, Vec<IssueId>>,
) -> Layering {
    let mut dependents: HashMap<&IssueId, Vec<&IssueId>> = HashMap::new();
    let mut remaining: HashMap<&IssueId, usize> = HashMap::with_capacity(open_blockers.len());
    for (id, blockers) in open_blockers {
        remaining.insert(id, blockers.len());
        for b in blockers {
            dependents.entry(b).or_default().push(id);
        }
    }

    let mut level: HashMap<IssueId, usize> = HashMap::new();
    let mut depth: HashMap<IssueId, usize> = HashMap::new();
    let mut roots: Vec<&IssueId> = remaining
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(id, _)| *id)
        .collect();
    roots.sort();

    let mut queue: VecDeque<&IssueId> = VecDeque::new();
    for id in roots {
        let explicitly_blocked = by_id
            .get(id)
            .is_some_and(|i| i.status == IssueStatus::Blocked);
        level.insert(id.clone(), usize::from(explicitly_blocked));
        depth.insert(id.clone(), 0);
        queue.push_back(id);
    }

    while let Some(id) = queue.pop_front() {
        let (l, d) = (level[id], depth[id]);
        for &next in dependents.get(id).map_or(&[][..], Vec::as_slice) {
            let nl = level.entry(next.clone()).or_insert(0);
            *nl = (*nl).max(l + 1);
            let nd = depth.entry(next.clone()).or_insert(0);
            *nd = (*nd).max(d + 1);
            if let Some(count) = remaining.get_mut(next) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    let mut unscheduled: Vec<IssueId> = remaining
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(id, _)| id.clone())
        .collect();
    unscheduled.sort();
    for id in &unscheduled {
        level.remove(id);
        depth.remove(id);
    }
    if !unscheduled.is_empty() {
        tracing::debug!(count = unscheduled.len(), "Issues blocked by a dependency cycle");
    }

    Layering {
        level,
        depth,
        unscheduled,
    }
}

fn build_plan(
    by_id: &HashMap<&IssueId, &Issue>,
    layering: &Layering,
    unblocks: &HashMap<IssueId, Vec<IssueId>>,
    total_actionable: usize,
) -> ExecutionPlan {
    let mut by_level: BTreeMap<usize, Vec<PlanItem>> = BTreeMap::new();
    for (id, &lvl) in &layering.level {
        let Some(issue) = by_id.get(id) else { continue };
        by_level.entry(lvl).or_default().push(PlanItem {
            id: id.clone(),
            title: issue.title.clone(),
            priority: issue.priority,
            status: issue.status,
            unblocks: unblocks.get(id).cloned().unwrap_or_default(),
        });
    }

    let tracks: Vec<Track> = by_level
        .into_iter()
        .map(|(lvl, mut items)| {
            items.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
            let reason = if lvl == 0 {
                "Ready now: no open blockers".to_string()
            } else {
                format!("Available once track-{lvl} is complete")
            };
            Track {
                track_id: format!("track-{}", lvl + 1),
                reason,
                items,
            }
        })
        .collect();

    let best = tracks
        .first()
        .filter(|t| t.track_id == "track-1")
        .and_then(|t| {
            t.items.iter().min_by(|a, b| {
                b.unblocks
                    .len()
                    .cmp(&a.unblocks.len())
                    .then_with(|| a.priority.cmp(&b.priority))
                    .then_with(|| a.id.cmp(&b.id))
            })
        });
    let summary = match best {
        Some(item) if !item.unblocks.is_empty() => PlanSummary {
            highest_impact: Some(item.id.clone()),
            impact_reason: format!("Unblocks {} issue(s)", item.unblocks.len()),
            unblocks_count: item.unblocks.len(),
        },
        Some(item) => PlanSummary {
            highest_impact: Some(item.id.clone()),
            impact_reason: "Highest priority ready issue".to_string(),
            unblocks_count: 0,
        },
        None => PlanSummary {
            highest_impact: None,
            impact_reason: "No actionable issues".to_string(),
            unblocks_count: 0,
        },
    };

    ExecutionPlan {
        tracks,
        total_actionable,
        unscheduled: layering.unscheduled.clone(),
        summary,
    }
}
