//! Biased second-order random walk generation.
//!
//! Implements the biased walk policy of
//! Grover & Leskovec, "node2vec: Scalable Feature Learning for Networks"
//! (KDD 2016): from current node `c` with previous node `prev`, a neighbor
//! is chosen with unnormalized weight `1/p` (return to `prev`), `1`
//! (neighbor of `prev`, a triangle move) or `1/q` (outward move).
//!
//! ## Performance Notes
//!
//! - Rejection sampling gives O(1) expected time per step (vs O(d) naive
//!   weight normalization)
//! - The previous node's neighbors are cached in a `HashSet` for O(1)
//!   membership tests
//! - Walk iterations are parallelized via rayon; each iteration owns a
//!   seeded RNG, so results are reproducible regardless of thread schedule

use crate::graph::Graph;
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for random walks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Target length of each walk (a walk from an isolated node has length 1).
    pub walk_length: usize,
    /// Number of walks started from each node.
    pub num_walks: usize,
    /// Return parameter (p) - likelihood of revisiting the previous node.
    pub p: f64,
    /// In-out parameter (q) - BFS-like (q > 1) vs DFS-like (q < 1) behavior.
    pub q: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            walk_length: 80,
            num_walks: 10,
            p: 1.0,
            q: 1.0,
            seed: 42,
        }
    }
}

/// Generate random walks for all nodes in the graph.
///
/// Produces `num_walks * node_count` walks. Walk order carries no meaning;
/// downstream sample extraction is order-independent.
#[must_use]
pub fn generate_walks(graph: &Graph, config: &WalkConfig) -> Vec<Vec<usize>> {
    let nodes: Vec<usize> = graph.nodes().collect();
    let is_unbiased = (config.p - 1.0).abs() < f64::EPSILON && (config.q - 1.0).abs() < f64::EPSILON;

    (0..config.num_walks)
        .into_par_iter()
        .flat_map(|iter_idx| {
            let mut rng = XorShiftRng::seed_from_u64(config.seed.wrapping_add(iter_idx as u64));
            let mut shuffled = nodes.clone();
            shuffled.shuffle(&mut rng);

            let mut walks = Vec::with_capacity(shuffled.len());
            for &start in &shuffled {
                let walk = if is_unbiased {
                    unbiased_walk(graph, start, config.walk_length, &mut rng)
                } else {
                    biased_walk(graph, start, config, &mut rng)
                };
                walks.push(walk);
            }
            walks
        })
        .collect()
}

/// Uniform random walk (DeepWalk special case, p = q = 1). O(d) per step.
fn unbiased_walk<R: Rng>(graph: &Graph, start: usize, length: usize, rng: &mut R) -> Vec<usize> {
    let mut walk = Vec::with_capacity(length);
    walk.push(start);

    let mut curr = start;
    for _ in 1..length {
        let neighbors = graph.neighbors(curr);
        let Some(&next) = neighbors.choose(rng) else {
            break;
        };
        walk.push(next);
        curr = next;
    }
    walk
}

/// Biased second-order walk - O(1) expected per step via rejection sampling.
fn biased_walk<R: Rng>(graph: &Graph, start: usize, config: &WalkConfig, rng: &mut R) -> Vec<usize> {
    let mut walk = Vec::with_capacity(config.walk_length);
    walk.push(start);

    let mut curr = start;
    let mut prev: Option<usize> = None;
    let mut prev_neighbors: HashSet<usize> = HashSet::new();

    for _ in 1..config.walk_length {
        let neighbors = graph.neighbors(curr);
        if neighbors.is_empty() {
            break;
        }

        let next = if let Some(prev_node) = prev {
            sample_biased_rejection(rng, prev_node, &prev_neighbors, &neighbors, config.p, config.q)
        } else {
            // First step: uniform over neighbors
            *neighbors.choose(rng).unwrap_or(&curr)
        };

        walk.push(next);

        // Current's neighbors become "prev_neighbors" for the next step
        prev = Some(curr);
        prev_neighbors.clear();
        prev_neighbors.extend(neighbors);
        curr = next;
    }
    walk
}

/// Sample the next node by uniform proposal + accept/reject on the bias
/// weight. Expected trials ~2-3 for typical p, q.
fn sample_biased_rejection<R: Rng>(
    rng: &mut R,
    prev_node: usize,
    prev_neighbors: &HashSet<usize>,
    neighbors: &[usize],
    p: f64,
    q: f64,
) -> usize {
    // Unnormalized acceptance weights:
    // - return to prev: 1/p
    // - triangle move (neighbor of prev): 1
    // - outward move: 1/q
    let max_weight = (1.0 / p).max(1.0).max(1.0 / q);

    loop {
        let candidate = *neighbors
            .choose(rng)
            .unwrap_or_else(|| panic!("neighbors cannot be empty (checked by caller)"));
        let r: f64 = rng.random();

        let weight = if candidate == prev_node {
            1.0 / p
        } else if prev_neighbors.contains(&candidate) {
            1.0
        } else {
            1.0 / q
        };

        if r < weight / max_weight {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> Graph {
        // 0 - 1 - 2 - 3
        Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)])
    }

    #[test]
    fn test_walk_counts_and_lengths() {
        let graph = path_graph();
        let config = WalkConfig {
            walk_length: 10,
            num_walks: 3,
            ..Default::default()
        };

        let walks = generate_walks(&graph, &config);
        assert_eq!(walks.len(), 4 * 3);
        for walk in &walks {
            assert_eq!(walk.len(), 10);
        }
    }

    #[test]
    fn test_walks_stay_on_edges() {
        let graph = path_graph();
        let config = WalkConfig {
            walk_length: 20,
            num_walks: 2,
            p: 0.5,
            q: 2.0,
            seed: 123,
        };

        for walk in generate_walks(&graph, &config) {
            for pair in walk.windows(2) {
                assert!(graph.has_edge(pair[0], pair[1]), "invalid step {:?}", pair);
            }
        }
    }

    #[test]
    fn test_isolated_node_walk_has_length_one() {
        let mut graph = Graph::with_nodes(3);
        graph.add_edge(0, 1);
        // node 2 is isolated

        let config = WalkConfig {
            walk_length: 10,
            num_walks: 2,
            ..Default::default()
        };

        let walks = generate_walks(&graph, &config);
        let isolated: Vec<_> = walks.iter().filter(|w| w[0] == 2).collect();
        assert_eq!(isolated.len(), 2);
        for walk in isolated {
            assert_eq!(walk, &vec![2]);
        }
    }

    #[test]
    fn test_walks_reproducible() {
        let graph = path_graph();
        let config = WalkConfig {
            walk_length: 15,
            num_walks: 4,
            p: 2.0,
            q: 0.5,
            seed: 999,
        };

        let walks1 = generate_walks(&graph, &config);
        let walks2 = generate_walks(&graph, &config);
        assert_eq!(walks1, walks2);
    }
}
