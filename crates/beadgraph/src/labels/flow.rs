//! Blocking dependencies that cross label boundaries.

use super::distinct_labels;
use crate::domain::{Issue, IssueId, index_by_id};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One blocker-to-blocked edge seen through a pair of labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockingPair {
    /// Blocking issue
    pub blocker_id: IssueId,
    /// Blocked issue
    pub blocked_id: IssueId,
    /// Label on the blocker
    pub blocker_label: String,
    /// Label on the blocked issue
    pub blocked_label: String,
}

/// Aggregated flow from one label to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelDependency {
    /// Label doing the blocking
    pub from_label: String,
    /// Label being blocked
    pub to_label: String,
    /// Blocking edges from `from_label` to `to_label`
    pub issue_count: usize,
    /// Distinct blocked issues, sorted
    pub issue_ids: Vec<IssueId>,
    /// The individual edges
    pub blocking_pairs: Vec<BlockingPair>,
}

/// Label-to-label blocking flow over the open issues.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossLabelFlow {
    /// Every label, sorted; indexes the matrix
    pub labels: Vec<String>,
    /// `flow_matrix[from][to]` = blocking edges from `from` to `to`
    pub flow_matrix: Vec<Vec<usize>>,
    /// Non-zero entries, by count descending then labels
    pub dependencies: Vec<LabelDependency>,
    /// Labels with the largest outgoing flow
    pub bottleneck_labels: Vec<String>,
    /// Sum over the matrix
    pub total_cross_label_deps: usize,
}

impl CrossLabelFlow {
    /// Blocking edges from `from` to `to`, or 0 for unknown labels.
    #[must_use]
    pub fn flow(&self, from: &str, to: &str) -> usize {
        let index = |l: &str| self.labels.binary_search_by(|x| x.as_str().cmp(l)).ok();
        match (index(from), index(to)) {
            (Some(f), Some(t)) => self.flow_matrix[f][t],
            _ => 0,
        }
    }

    /// Total outgoing flow per label.
    #[must_use]
    pub fn outgoing(&self, label: &str) -> usize {
        self.dependencies
            .iter()
            .filter(|d| d.from_label == label)
            .map(|d| d.issue_count)
            .sum()
    }

    /// Total incoming flow per label.
    #[must_use]
    pub fn incoming(&self, label: &str) -> usize {
        self.dependencies
            .iter()
            .filter(|d| d.to_label == label)
            .map(|d| d.issue_count)
            .sum()
    }
}

/// Counts blocking edges between differently-labelled open issues.
///
/// An edge where either end is closed does not count. Each edge contributes
/// once per (blocker label, blocked label) pair, skipping pairs where both
/// labels are the same.
#[must_use]
pub fn compute_cross_label_flow(issues: &[Issue]) -> CrossLabelFlow {
    let labels: Vec<String> = issues
        .iter()
        .flat_map(distinct_labels)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();
    let by_id = index_by_id(issues);

    let mut matrix = vec![vec![0usize; labels.len()]; labels.len()];
    let mut pairs: BTreeMap<(usize, usize), Vec<BlockingPair>> = BTreeMap::new();

    for blocked in issues.iter().filter(|i| !i.status.is_closed()) {
        let blocked_labels = distinct_labels(blocked);
        if blocked_labels.is_empty() {
            continue;
        }
        let mut blockers: Vec<&IssueId> = blocked.blocking_dependencies().collect();
        blockers.sort();
        blockers.dedup();

        for blocker_id in blockers {
            let Some(blocker) = by_id.get(blocker_id) else {
                continue;
            };
            if blocker.status.is_closed() || blocker.id == blocked.id {
                continue;
            }
            for from in distinct_labels(blocker) {
                for to in &blocked_labels {
                    if from == *to {
                        continue;
                    }
                    let (f, t) = (index[from], index[*to]);
                    matrix[f][t] += 1;
                    pairs.entry((f, t)).or_default().push(BlockingPair {
                        blocker_id: blocker.id.clone(),
                        blocked_id: blocked.id.clone(),
                        blocker_label: from.to_string(),
                        blocked_label: (*to).to_string(),
                    });
                }
            }
        }
    }

    let mut dependencies: Vec<LabelDependency> = pairs
        .into_iter()
        .map(|((f, t), blocking_pairs)| {
            let issue_ids: BTreeSet<IssueId> =
                blocking_pairs.iter().map(|p| p.blocked_id.clone()).collect();
            LabelDependency {
                from_label: labels[f].clone(),
                to_label: labels[t].clone(),
                issue_count: blocking_pairs.len(),
                issue_ids: issue_ids.into_iter().collect(),
                blocking_pairs,
            }
        })
        .collect();
    dependencies.sort_by(|a, b| {
        b.issue_count
            .cmp(&a.issue_count)
            .then_with(|| a.from_label.cmp(&b.from_label))
            .then_with(|| a.to_label.cmp(&b.to_label))
    });

    let outgoing: Vec<usize> = matrix.iter().map(|row| row.iter().sum()).collect();
    let max_out = outgoing.iter().copied().max().unwrap_or(0);
    let bottleneck_labels = if max_out == 0 {
        Vec::new()
    } else {
        labels
            .iter()
            .zip(&outgoing)
            .filter(|(_, n)| **n == max_out)
            .map(|(l, _)| l.clone())
            .collect()
    };

    CrossLabelFlow {
        total_cross_label_deps: outgoing.iter().sum(),
        labels,
        flow_matrix: matrix,
        dependencies,
        bottleneck_labels,
    }
}
