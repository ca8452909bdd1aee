//! Betweenness centrality: how often a node brokers shortest paths.
//!
//! ```text
//! C_B(v) = Σ_{s≠v≠t} σ_st(v) / σ_st
//! ```
//!
//! Computed with Brandes' algorithm (2001): one BFS per source counts
//! shortest paths forward, then dependencies are accumulated backward:
//!
//! ```text
//! δ_s(v) = Σ_{w: v∈P_s(w)} (σ_sv/σ_sw) × (1 + δ_s(w))
//! ```
//!
//! Paths follow edge direction and ignore weights. Normalised scores divide
//! by `(n-1)(n-2)`, the number of ordered pairs excluding `v`.

use super::traits::Centrality;
use crate::error::Result;
use crate::network::DirectedNetwork;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::VecDeque;

/// Shortest-path betweenness.
#[derive(Debug, Clone, Copy)]
pub struct Betweenness {
    normalized: bool,
}

impl Betweenness {
    /// Normalised betweenness.
    pub fn new() -> Self {
        Self { normalized: true }
    }

    /// Toggle normalisation by `(n-1)(n-2)`.
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }
}

impl Default for Betweenness {
    fn default() -> Self {
        Self::new()
    }
}

impl Centrality for Betweenness {
    fn name(&self) -> &'static str {
        "betweenness"
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, network: &DirectedNetwork) -> Result<Vec<f64>> {
        let graph = network.graph();
        let n = graph.node_count();
        let mut betweenness = vec![0.0_f64; n];
        if n < 3 {
            return Ok(betweenness);
        }

        for s in graph.node_indices() {
            let (sigma, predecessors, order) = shortest_paths(network, s);

            let mut delta = vec![0.0_f64; n];
            for &w in order.iter().rev() {
                let wi = w.index();
                for &v in &predecessors[wi] {
                    let vi = v.index();
                    delta[vi] += sigma[vi] / sigma[wi] * (1.0 + delta[wi]);
                }
                if w != s {
                    betweenness[wi] += delta[wi];
                }
            }
        }

        if self.normalized {
            let norm = ((n - 1) * (n - 2)) as f64;
            for b in &mut betweenness {
                *b /= norm;
            }
        }
        Ok(betweenness)
    }
}

/// BFS from `source` along outgoing edges.
///
/// Returns path counts σ, shortest-path predecessors and visit order.
fn shortest_paths(
    network: &DirectedNetwork,
    source: NodeIndex,
) -> (Vec<f64>, Vec<Vec<NodeIndex>>, Vec<NodeIndex>) {
    let graph = network.graph();
    let n = graph.node_count();
    let mut sigma = vec![0.0_f64; n];
    let mut dist: Vec<Option<usize>> = vec![None; n];
    let mut predecessors: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
    let mut order = Vec::with_capacity(n);

    sigma[source.index()] = 1.0;
    dist[source.index()] = Some(0);

    let mut queue = VecDeque::from([source]);
    while let Some(v) = queue.pop_front() {
        order.push(v);
        let vi = v.index();
        let next = dist[vi].map_or(0, |d| d + 1);

        for w in graph.neighbors_directed(v, Direction::Outgoing) {
            let wi = w.index();
            if dist[wi].is_none() {
                dist[wi] = Some(next);
                queue.push_back(w);
            }
            if dist[wi] == Some(next) {
                sigma[wi] += sigma[vi];
                predecessors[wi].push(v);
            }
        }
    }

    (sigma, predecessors, order)
}
