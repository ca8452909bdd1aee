//! Laplacian centrality (Qi et al. 2012).
//!
//! The Laplacian energy of a weighted graph is the sum of squared
//! Laplacian eigenvalues, which has the closed form
//!
//! ```text
//! E(G) = Σ_i d_i² + 2 Σ_{i<j} w_ij²
//! ```
//!
//! A node's centrality is the relative energy lost when it is deleted,
//! `(E(G) - E(G \ v)) / E(G)`. Direction is dropped: reciprocal edges are
//! summed into one symmetric weight before the energy is taken.

use super::traits::Centrality;
use crate::error::Result;
use crate::network::DirectedNetwork;
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;

/// Weight-sensitive Laplacian-energy centrality.
#[derive(Debug, Clone, Copy, Default)]
pub struct Laplacian;

impl Centrality for Laplacian {
    fn name(&self) -> &'static str {
        "laplacian"
    }

    fn compute(&self, network: &DirectedNetwork) -> Result<Vec<f64>> {
        let graph = network.graph();
        let n = graph.node_count();

        let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for edge in graph.edge_references() {
            let (i, j) = (edge.source().index(), edge.target().index());
            *adj[i].entry(j).or_insert(0.0) += *edge.weight();
            *adj[j].entry(i).or_insert(0.0) += *edge.weight();
        }
        let degrees: Vec<f64> = adj.iter().map(|row| row.values().sum()).collect();

        // Each undirected edge appears twice in `adj`, which supplies the factor 2.
        let energy: f64 = degrees.iter().map(|d| d * d).sum::<f64>()
            + adj.iter().flat_map(|row| row.values()).map(|w| w * w).sum::<f64>();
        if energy == 0.0 {
            return Ok(vec![0.0; n]);
        }

        Ok((0..n)
            .map(|v| {
                let own = degrees[v] * degrees[v];
                let drop: f64 = adj[v]
                    .iter()
                    .map(|(&u, &w)| {
                        let reduced = degrees[u] - w;
                        2.0 * w * w + degrees[u] * degrees[u] - reduced * reduced
                    })
                    .sum();
                (own + drop) / energy
            })
            .collect())
    }
}
