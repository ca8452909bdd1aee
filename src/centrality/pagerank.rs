//! PageRank on the reversed relation graph.
//!
//! Edges are followed from alter back to ego, so rank flows from recipients
//! to suppliers. Transition probabilities are proportional to edge weight.
//! Nodes without (reversed) outgoing weight spread their mass uniformly.

use super::traits::Centrality;
use crate::error::{Error, Result};
use crate::network::DirectedNetwork;
use petgraph::visit::EdgeRef;

/// Weighted PageRank with damping and an L1 stopping rule.
#[derive(Debug, Clone, Copy)]
pub struct PageRank {
    /// Probability of following a link rather than teleporting.
    damping: f64,
    /// Maximum power iterations.
    max_iter: usize,
    /// Per-node tolerance; the run stops once the L1 change is below `n * tolerance`.
    tolerance: f64,
}

impl PageRank {
    /// Damping 0.85, 100 iterations, tolerance 1e-6.
    pub fn new() -> Self {
        Self {
            damping: 0.85,
            max_iter: 100,
            tolerance: 1e-6,
        }
    }

    /// Set damping factor.
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

impl Default for PageRank {
    fn default() -> Self {
        Self::new()
    }
}

impl Centrality for PageRank {
    fn name(&self) -> &'static str {
        "pagerank"
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, network: &DirectedNetwork) -> Result<Vec<f64>> {
        let graph = network.graph();
        let n = graph.node_count();
        if n == 0 {
            return Ok(Vec::new());
        }
        let uniform = 1.0 / n as f64;

        // Reversed graph: original edge ego -> alter becomes alter -> ego.
        let mut links: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut strength = vec![0.0_f64; n];
        for edge in graph.edge_references() {
            let (ego, alter) = (edge.source().index(), edge.target().index());
            let w = *edge.weight();
            if w > 0.0 {
                links[alter].push((ego, w));
                strength[alter] += w;
            }
        }

        let mut rank = vec![uniform; n];
        for _iter in 0..self.max_iter {
            let dangling: f64 = (0..n).filter(|&v| strength[v] == 0.0).map(|v| rank[v]).sum();
            let base = (self.damping * dangling + (1.0 - self.damping)) * uniform;

            let mut next = vec![base; n];
            for (v, out) in links.iter().enumerate() {
                if strength[v] == 0.0 {
                    continue;
                }
                let share = self.damping * rank[v] / strength[v];
                for &(u, w) in out {
                    next[u] += share * w;
                }
            }

            let change: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
            rank = next;
            if change < n as f64 * self.tolerance {
                return Ok(rank);
            }
        }

        Err(Error::ConvergenceFailure {
            iterations: self.max_iter,
        })
    }
}
