//! Reaching centrality and the global hierarchy score.
//!
//! The local reaching centrality of `v` is the share of other nodes that can
//! be reached from `v` along directed edges. Global reaching centrality
//! measures how far the best-reaching node stands above the rest:
//!
//! ```text
//! GRC = Σ_v (C_max - C(v)) / (n - 1)
//! ```
//!
//! A perfect out-star scores 1, a directed cycle scores 0.
//!
//! ## References
//!
//! Mones, Vicsek, Vicsek (2012). "Hierarchy measure for complex networks."
//! PLoS ONE 7(3): e33799.

use crate::error::{Error, Result};
use crate::network::DirectedNetwork;
use petgraph::graph::NodeIndex;
use petgraph::visit::Bfs;

/// Share of the other nodes reachable from `node`.
#[allow(clippy::cast_precision_loss)]
pub fn local_reaching_centrality(network: &DirectedNetwork, node: NodeIndex) -> f64 {
    let graph = network.graph();
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    let mut bfs = Bfs::new(graph, node);
    let mut reached = 0usize;
    while bfs.next(graph).is_some() {
        reached += 1;
    }
    // The start node itself is visited first.
    (reached - 1) as f64 / (n - 1) as f64
}

/// Hierarchy score of a directed network.
///
/// Fails with [`Error::UndefinedMeasure`] when the network has no edges
/// (which includes every network with fewer than two nodes).
#[allow(clippy::cast_precision_loss)]
pub fn global_reaching_centrality(network: &DirectedNetwork) -> Result<f64> {
    if !network.is_directed() {
        return Err(Error::UndefinedMeasure {
            measure: "global reaching centrality",
            reason: "network is undirected",
        });
    }
    if network.edge_count() == 0 {
        return Err(Error::UndefinedMeasure {
            measure: "global reaching centrality",
            reason: "network has no edges",
        });
    }

    let graph = network.graph();
    let n = graph.node_count();
    let local: Vec<f64> = graph
        .node_indices()
        .map(|v| local_reaching_centrality(network, v))
        .collect();
    let max = local.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(local.iter().map(|c| max - c).sum::<f64>() / (n - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RelationTriple, TripleTable};
    use crate::country::Vocabulary;
    use crate::network::NetworkBuilder;

    fn network(edges: &[(&str, &str)], nodes: &[&str]) -> Result<DirectedNetwork> {
        let triples =
            TripleTable::from_triples(edges.iter().map(|&(a, b)| RelationTriple::new(2000, a, b, 1.0)))?;
        let vocab = Vocabulary::new(nodes.iter().copied());
        Ok(NetworkBuilder::new().directed(&triples, &vocab, 2000))
    }

    #[test]
    fn test_out_star_is_fully_hierarchical() -> Result<()> {
        let net = network(&[("A", "B"), ("A", "C"), ("A", "D")], &["A", "B", "C", "D"])?;
        assert!((global_reaching_centrality(&net)? - 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_cycle_is_flat() -> Result<()> {
        let net = network(&[("A", "B"), ("B", "C"), ("C", "A")], &["A", "B", "C"])?;
        assert!(global_reaching_centrality(&net)?.abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_chain() -> Result<()> {
        // A -> B -> C: reach 1, 0.5, 0 -> (0 + 0.5 + 1) / 2
        let net = network(&[("A", "B"), ("B", "C")], &["A", "B", "C"])?;
        assert!((global_reaching_centrality(&net)? - 0.75).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_edgeless_is_undefined() -> Result<()> {
        let net = network(&[], &["A", "B"])?;
        let err = global_reaching_centrality(&net).unwrap_err();
        assert!(matches!(err, Error::UndefinedMeasure { .. }));
        Ok(())
    }
}
