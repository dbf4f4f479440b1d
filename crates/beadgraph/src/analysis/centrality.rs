//! Iterative and path-counting centrality measures.
//!
//! All functions work on dense adjacency lists (`out[u]` = nodes `u` blocks,
//! `inc[v]` = nodes blocking `v`) as produced by
//! [`DependencyGraph::adjacency`](super::graph::DependencyGraph::adjacency),
//! and return one score per node index.

use std::collections::VecDeque;

/// Convergence policy shared by the iterative algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    /// Stop once the change between iterations falls below this.
    pub tolerance: f64,
    /// Hard cap on iterations.
    pub max_iterations: usize,
}

/// Scores plus the number of iterations it took to produce them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IterativeScores {
    /// One score per node index.
    pub scores: Vec<f64>,
    /// Iterations actually run.
    pub iterations: usize,
    /// Whether the tolerance was reached before the cap.
    pub converged: bool,
}

fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Scales `v` to unit L2 norm. Returns `false` (leaving `v` untouched) for a zero vector.
fn normalize_l2(v: &mut [f64]) -> bool {
    let norm = l2_norm(v);
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

/// PageRank over blocker-to-blocked edges.
///
/// `rank(v) = (1-d)/N + d * sum(rank(u) / outdeg(u) for u -> v)`, with the
/// rank of nodes that block nothing spread evenly over all nodes so the total
/// stays 1. Stops when the L1 change drops below the tolerance.
#[must_use]
pub fn pagerank(out: &[Vec<usize>], damping: f64, convergence: Convergence) -> IterativeScores {
    let n = out.len();
    if n == 0 {
        return IterativeScores::default();
    }
    let nf = n as f64;
    let mut rank = vec![1.0 / nf; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < convergence.max_iterations {
        iterations += 1;

        let dangling: f64 = out
            .iter()
            .zip(&rank)
            .filter(|(targets, _)| targets.is_empty())
            .map(|(_, r)| r)
            .sum();
        let base = (1.0 - damping) / nf + damping * dangling / nf;

        let mut next = vec![base; n];
        for (u, targets) in out.iter().enumerate() {
            if targets.is_empty() {
                continue;
            }
            let share = damping * rank[u] / targets.len() as f64;
            for &v in targets {
                next[v] += share;
            }
        }

        let delta = l1_distance(&rank, &next);
        rank = next;
        if delta < convergence.tolerance {
            converged = true;
            break;
        }
    }

    IterativeScores {
        scores: rank,
        iterations,
        converged,
    }
}

/// Brandes betweenness centrality for an unweighted directed graph.
///
/// Runs one BFS per source and accumulates dependencies in reverse BFS
/// order. Scores are raw pair counts (not normalized).
#[must_use]
pub fn betweenness(out: &[Vec<usize>]) -> Vec<f64> {
    let n = out.len();
    let mut centrality = vec![0.0; n];

    let mut order = Vec::with_capacity(n);
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n];
    let mut dist = vec![-1_i64; n];
    let mut delta = vec![0.0_f64; n];
    let mut queue = VecDeque::with_capacity(n);

    for s in 0..n {
        order.clear();
        for p in &mut preds {
            p.clear();
        }
        sigma.fill(0.0);
        dist.fill(-1);
        delta.fill(0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            order.push(v);
            for &w in &out[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        while let Some(w) = order.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    centrality
}

/// Eigenvector centrality by power iteration on incoming edges.
///
/// `x'(v) = sum(x(u) for u -> v)`, L2-normalized every step. An acyclic graph
/// drains to the zero vector after as many steps as its longest path; the
/// last non-zero iterate is kept in that case. A graph without edges scores
/// zero everywhere.
#[must_use]
pub fn eigenvector(inc: &[Vec<usize>], convergence: Convergence) -> IterativeScores {
    let n = inc.len();
    if n == 0 {
        return IterativeScores::default();
    }
    let mut x = vec![1.0 / (n as f64).sqrt(); n];
    let mut iterations = 0;
    let mut converged = false;
    let mut any_nonzero = false;

    while iterations < convergence.max_iterations {
        iterations += 1;
        let mut next: Vec<f64> = inc
            .iter()
            .map(|sources| sources.iter().map(|&u| x[u]).sum())
            .collect();
        if !normalize_l2(&mut next) {
            converged = true;
            break;
        }
        any_nonzero = true;

        let delta = l1_distance(&x, &next);
        x = next;
        if delta < convergence.tolerance {
            converged = true;
            break;
        }
    }

    IterativeScores {
        scores: if any_nonzero { x } else { vec![0.0; n] },
        iterations,
        converged,
    }
}

/// Hub and authority scores from Kleinberg's HITS algorithm.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HitsScores {
    /// Hub score per node: points at good authorities (blocks important work).
    pub hubs: Vec<f64>,
    /// Authority score per node: pointed at by good hubs (blocked by key work).
    pub authorities: Vec<f64>,
    /// Iterations run.
    pub iterations: usize,
}

/// HITS: alternate authority and hub updates, L2-normalizing after each half step.
#[must_use]
pub fn hits(out: &[Vec<usize>], inc: &[Vec<usize>], convergence: Convergence) -> HitsScores {
    let n = out.len();
    if n == 0 {
        return HitsScores::default();
    }
    let start = 1.0 / (n as f64).sqrt();
    let mut hubs = vec![start; n];
    let mut authorities = vec![start; n];
    let mut iterations = 0;

    while iterations < convergence.max_iterations {
        iterations += 1;

        let mut next_auth: Vec<f64> = inc
            .iter()
            .map(|sources| sources.iter().map(|&u| hubs[u]).sum())
            .collect();
        if !normalize_l2(&mut next_auth) {
            return HitsScores {
                hubs: vec![0.0; n],
                authorities: vec![0.0; n],
                iterations,
            };
        }

        let mut next_hubs: Vec<f64> = out
            .iter()
            .map(|targets| targets.iter().map(|&v| next_auth[v]).sum())
            .collect();
        normalize_l2(&mut next_hubs);

        let delta = l1_distance(&hubs, &next_hubs) + l1_distance(&authorities, &next_auth);
        hubs = next_hubs;
        authorities = next_auth;
        if delta < convergence.tolerance {
            break;
        }
    }

    HitsScores {
        hubs,
        authorities,
        iterations,
    }
}
