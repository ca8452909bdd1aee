//! Louvain algorithm for community detection.
//!
//! Fast modularity optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! Louvain is a multi-level, greedy modularity optimization algorithm:
//!
//! 1. **Phase 1 (Local Moving)**: Start with each node in its own community.
//!    Repeatedly move nodes to neighboring community with highest modularity
//!    gain until no improvement.
//!
//! 2. **Phase 2 (Aggregation)**: Build a meta-graph where communities become
//!    single nodes. Edge weights are sums of edges between communities.
//!    Self-loops represent internal community edges.
//!
//! 3. **Iterate**: Repeat phases 1-2 on the meta-graph until modularity
//!    stops improving.
//!
//! ## Determinism
//!
//! Nodes are visited in an order shuffled by a seeded RNG, and all
//! neighbourhood bookkeeping uses ordered maps, so a fixed seed yields the
//! same partition on every run.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

use super::traits::{clusters_from_labels, CommunityDetection, RelationGraph};
use crate::error::{Error, Result};
use petgraph::visit::EdgeRef;
use rand::prelude::*;
use std::collections::BTreeMap;

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum iterations per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
    /// Minimum modularity improvement to continue.
    min_modularity_gain: f64,
    /// Seed for the node visit order.
    seed: u64,
}

/// Weighted edge list `(i, j, w)` with `i < j`.
type Edges = Vec<(usize, usize, f64)>;

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
            min_modularity_gain: 1e-7,
            seed: 100,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Compute modularity of a weighted graph partition.
    fn modularity_weighted(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        communities: &[usize],
    ) -> f64 {
        let m: f64 = edges.iter().map(|(_, _, w)| w).sum::<f64>() + self_loops.iter().sum::<f64>();
        if m == 0.0 {
            return 0.0;
        }

        let degrees = weighted_degrees(n, edges, self_loops);

        // Σ_in and Σ_tot per community
        let mut internal: BTreeMap<usize, f64> = BTreeMap::new();
        let mut total: BTreeMap<usize, f64> = BTreeMap::new();
        for &(i, j, w) in edges {
            if communities[i] == communities[j] {
                *internal.entry(communities[i]).or_insert(0.0) += w;
            }
        }
        for (i, &sl) in self_loops.iter().enumerate() {
            *internal.entry(communities[i]).or_insert(0.0) += sl;
        }
        for (i, &d) in degrees.iter().enumerate() {
            *total.entry(communities[i]).or_insert(0.0) += d;
        }

        total
            .iter()
            .map(|(c, &tot)| {
                let inside = internal.get(c).copied().unwrap_or(0.0);
                inside / m - self.resolution * (tot / (2.0 * m)).powi(2)
            })
            .sum()
    }

    /// Phase 1: Local moving on weighted graph.
    /// Returns (communities, improved).
    fn local_moving(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        rng: &mut StdRng,
    ) -> (Vec<usize>, bool) {
        let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for &(i, j, w) in edges {
            *adj[i].entry(j).or_insert(0.0) += w;
            *adj[j].entry(i).or_insert(0.0) += w;
        }

        let m: f64 = edges.iter().map(|(_, _, w)| w).sum::<f64>() + self_loops.iter().sum::<f64>();
        if m == 0.0 {
            return ((0..n).collect(), false);
        }

        let degrees = weighted_degrees(n, edges, self_loops);

        let mut communities: Vec<usize> = (0..n).collect();
        let mut community_degrees = degrees.clone();
        let mut any_improved = false;

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        for _iter in 0..self.max_iter {
            let mut improved = false;

            for &node in &order {
                let current_community = communities[node];
                let ki = degrees[node];

                // Temporarily remove node from community
                community_degrees[current_community] -= ki;

                let mut community_weights: BTreeMap<usize, f64> = BTreeMap::new();
                for (&neighbor, &w) in &adj[node] {
                    let nc = communities[neighbor];
                    *community_weights.entry(nc).or_insert(0.0) += w;
                }

                // Staying alone scores 0.
                let mut best_community = current_community;
                let mut best_gain = 0.0;

                for (&target_comm, &ki_in) in &community_weights {
                    let sigma_tot = community_degrees[target_comm];
                    let gain = ki_in / m - self.resolution * sigma_tot * ki / (2.0 * m * m);
                    if gain > best_gain {
                        best_gain = gain;
                        best_community = target_comm;
                    }
                }

                if best_community != current_community {
                    communities[node] = best_community;
                    community_degrees[best_community] += ki;
                    improved = true;
                    any_improved = true;
                } else {
                    community_degrees[current_community] += ki;
                }
            }

            if !improved {
                break;
            }
        }

        (communities, any_improved)
    }

    /// Phase 2: Aggregate graph based on communities.
    /// Returns (new_edges, new_self_loops, node_to_original_mapping).
    fn aggregate(
        &self,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        communities: &[usize],
    ) -> (Edges, Vec<f64>, Vec<Vec<usize>>) {
        let mut unique_comms: Vec<usize> = communities.to_vec();
        unique_comms.sort_unstable();
        unique_comms.dedup();
        let n_new = unique_comms.len();

        let comm_to_new: BTreeMap<usize, usize> = unique_comms
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect();

        let mut new_to_old: Vec<Vec<usize>> = vec![Vec::new(); n_new];
        for (node, &comm) in communities.iter().enumerate() {
            new_to_old[comm_to_new[&comm]].push(node);
        }

        let mut new_self_loops = vec![0.0; n_new];
        for (i, &sl) in self_loops.iter().enumerate() {
            new_self_loops[comm_to_new[&communities[i]]] += sl;
        }

        let mut new_edge_weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for &(i, j, w) in edges {
            let ci = comm_to_new[&communities[i]];
            let cj = comm_to_new[&communities[j]];
            if ci == cj {
                new_self_loops[ci] += w;
                continue;
            }
            let key = if ci < cj { (ci, cj) } else { (cj, ci) };
            *new_edge_weights.entry(key).or_insert(0.0) += w;
        }

        let new_edges: Edges = new_edge_weights
            .into_iter()
            .map(|((i, j), w)| (i, j, w))
            .collect();

        (new_edges, new_self_loops, new_to_old)
    }

    /// Run the multi-level optimisation and return one label per node.
    fn labels(&self, graph: &RelationGraph) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let mut edges: Edges = Vec::new();
        let mut self_loops = vec![0.0; n];
        for edge in graph.edge_references() {
            let i = edge.source().index();
            let j = edge.target().index();
            let w = *edge.weight();
            if i == j {
                self_loops[i] += w;
            } else {
                edges.push((i.min(j), i.max(j), w));
            }
        }
        if edges.is_empty() {
            // No edges: each node is its own community
            return Ok((0..n).collect());
        }

        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut current_n = n;
        let mut current_edges = edges;
        let mut current_self_loops = self_loops;

        // Stack of node mappings for expanding final partition
        let mut mapping_stack: Vec<Vec<Vec<usize>>> = Vec::new();
        let mut prev_modularity = f64::NEG_INFINITY;

        for _level in 0..self.max_levels {
            let (partition, improved) =
                self.local_moving(current_n, &current_edges, &current_self_loops, &mut rng);
            if !improved {
                break;
            }

            let mod_now =
                self.modularity_weighted(current_n, &current_edges, &current_self_loops, &partition);
            if mod_now - prev_modularity < self.min_modularity_gain {
                break;
            }
            prev_modularity = mod_now;

            let (new_edges, new_self_loops, node_mapping) =
                self.aggregate(&current_edges, &current_self_loops, &partition);

            if node_mapping.len() == current_n {
                break;
            }

            current_n = node_mapping.len();
            mapping_stack.push(node_mapping);
            current_edges = new_edges;
            current_self_loops = new_self_loops;
        }

        // Each aggregated node at the top level is one community; walk the
        // mappings back down to the original nodes.
        let mut result: Vec<usize> = (0..current_n).collect();
        while let Some(mapping) = mapping_stack.pop() {
            let mut expanded = vec![0; mapping.iter().map(Vec::len).sum()];
            for (agg_node, members) in mapping.iter().enumerate() {
                for &orig in members {
                    expanded[orig] = result[agg_node];
                }
            }
            result = expanded;
        }

        Ok(result)
    }
}

fn weighted_degrees(n: usize, edges: &[(usize, usize, f64)], self_loops: &[f64]) -> Vec<f64> {
    let mut degrees = vec![0.0; n];
    for &(i, j, w) in edges {
        degrees[i] += w;
        degrees[j] += w;
    }
    for (i, &sl) in self_loops.iter().enumerate() {
        degrees[i] += 2.0 * sl; // self-loops counted twice for degree
    }
    degrees
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for Louvain {
    fn communities(&self, graph: &RelationGraph) -> Result<Vec<Vec<usize>>> {
        Ok(clusters_from_labels(&self.labels(graph)?))
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}
