//! Greedy modularity agglomeration (Clauset, Newman & Moore 2004).
//!
//! Start from singletons and repeatedly merge the pair of adjacent
//! communities whose union raises modularity the most:
//!
//! ```text
//! ΔQ_ij = 2 (e_ij - γ a_i a_j)
//! ```
//!
//! where `e_ij` is the fraction of edge weight running between `i` and `j`
//! (each direction counted once) and `a_i` the fraction of edge ends in `i`.
//! Merging stops once every remaining merge would lower modularity; merges
//! with zero gain still happen.
//!
//! Equal gains are resolved by a seeded permutation of the nodes, so the
//! result depends only on the graph, the resolution and the seed.

use super::traits::{CommunityDetection, RelationGraph};
use crate::error::{Error, Result};
use petgraph::visit::EdgeRef;
use rand::prelude::*;
use std::collections::BTreeMap;

/// Greedy modularity community detection.
#[derive(Debug, Clone)]
pub struct GreedyModularity {
    resolution: f64,
    seed: u64,
}

impl GreedyModularity {
    /// Resolution 1, seed 100.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            seed: 100,
        }
    }

    /// Set resolution parameter.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set tie-break seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for GreedyModularity {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for GreedyModularity {
    fn communities(&self, graph: &RelationGraph) -> Result<Vec<Vec<usize>>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let mut degree = vec![0.0_f64; n];
        let mut between: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for edge in graph.edge_references() {
            let (i, j, w) = (edge.source().index(), edge.target().index(), *edge.weight());
            degree[i] += w;
            degree[j] += w;
            if i != j {
                *between[i].entry(j).or_insert(0.0) += w;
                *between[j].entry(i).or_insert(0.0) += w;
            }
        }
        let two_m: f64 = degree.iter().sum();
        if two_m <= 0.0 {
            return Ok((0..n).map(|i| vec![i]).collect());
        }

        // e[i][j] and a[i] as fractions of total edge ends.
        let mut e: Vec<BTreeMap<usize, f64>> = between
            .into_iter()
            .map(|row| row.into_iter().map(|(j, w)| (j, w / two_m)).collect())
            .collect();
        let mut a: Vec<f64> = degree.iter().map(|d| d / two_m).collect();
        let mut members: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();

        let mut priority: Vec<usize> = (0..n).collect();
        priority.shuffle(&mut StdRng::seed_from_u64(self.seed));

        loop {
            let mut best: Option<(f64, (usize, usize), usize, usize)> = None;
            for (i, row) in e.iter().enumerate() {
                if members[i].is_none() {
                    continue;
                }
                for (&j, &eij) in row.range(i + 1..) {
                    let dq = 2.0 * (eij - self.resolution * a[i] * a[j]);
                    let key = (priority[i].min(priority[j]), priority[i].max(priority[j]));
                    let better = match best {
                        None => true,
                        Some((best_dq, best_key, _, _)) => dq > best_dq || (dq == best_dq && key < best_key),
                    };
                    if better {
                        best = Some((dq, key, i, j));
                    }
                }
            }

            let Some((dq, _, i, j)) = best else { break };
            if dq < 0.0 {
                break;
            }

            // Fold j into i.
            let row_j = std::mem::take(&mut e[j]);
            for (k, w) in row_j {
                let _ = e[k].remove(&j);
                if k == i {
                    continue;
                }
                *e[i].entry(k).or_insert(0.0) += w;
                *e[k].entry(i).or_insert(0.0) += w;
            }
            a[i] += a[j];
            a[j] = 0.0;
            let moved = members[j].take().unwrap_or_default();
            if let Some(target) = members[i].as_mut() {
                target.extend(moved);
            }
        }

        let mut clusters: Vec<Vec<usize>> = members.into_iter().flatten().collect();
        for cluster in &mut clusters {
            cluster.sort_unstable();
        }
        clusters.sort_by_key(|c| c[0]);
        Ok(clusters)
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::traits::test_graph;

    #[test]
    fn test_greedy_two_cliques() -> Result<()> {
        let graph = test_graph(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 1.0),
                (0, 2, 1.0),
                (3, 4, 1.0),
                (4, 5, 1.0),
                (3, 5, 1.0),
                (2, 3, 1.0),
            ],
        );
        let communities = GreedyModularity::new().communities(&graph)?;
        assert_eq!(communities, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        Ok(())
    }

    #[test]
    fn test_greedy_isolated_nodes_stay_alone() -> Result<()> {
        let graph = test_graph(4, &[(0, 1, 11.0), (0, 2, 8.0)]);
        let communities = GreedyModularity::new().communities(&graph)?;
        assert_eq!(communities, vec![vec![0, 1, 2], vec![3]]);
        Ok(())
    }

    #[test]
    fn test_greedy_high_resolution_keeps_singletons() -> Result<()> {
        let graph = test_graph(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        let communities = GreedyModularity::new().with_resolution(10.0).communities(&graph)?;
        assert_eq!(communities.len(), 3);
        Ok(())
    }

    #[test]
    fn test_greedy_deterministic_under_ties() -> Result<()> {
        // Four-cycle: every first merge has the same gain.
        let graph = test_graph(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)]);
        let a = GreedyModularity::new().with_seed(3).communities(&graph)?;
        let b = GreedyModularity::new().with_seed(3).communities(&graph)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_greedy_zero_gain_merges() -> Result<()> {
        // e_01 = 1/2 and a_0 = a_1 = 1/2, so at γ = 2 the gain is exactly 0.
        let graph = test_graph(2, &[(0, 1, 1.0)]);
        let communities = GreedyModularity::new().with_resolution(2.0).communities(&graph)?;
        assert_eq!(communities, vec![vec![0, 1]]);
        Ok(())
    }

    #[test]
    fn test_greedy_empty_graph() {
        let graph = RelationGraph::new_undirected();
        assert!(GreedyModularity::new().communities(&graph).is_err());
    }
}
