//! Out-degree centralities.

use super::traits::Centrality;
use crate::error::Result;
use crate::network::DirectedNetwork;
use petgraph::Direction;

/// Fraction of possible outgoing ties a node realises: `out_degree / (n - 1)`.
///
/// On graphs with at most one node every node scores 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutDegree;

impl Centrality for OutDegree {
    fn name(&self) -> &'static str {
        "out-degree"
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, network: &DirectedNetwork) -> Result<Vec<f64>> {
        let graph = network.graph();
        let n = graph.node_count();
        if n <= 1 {
            return Ok(vec![1.0; n]);
        }
        let scale = 1.0 / (n - 1) as f64;
        Ok(graph
            .node_indices()
            .map(|v| graph.edges_directed(v, Direction::Outgoing).count() as f64 * scale)
            .collect())
    }
}

/// Out-strength: the sum of outgoing edge weights, not normalised.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutDegreeWeighted;

impl Centrality for OutDegreeWeighted {
    fn name(&self) -> &'static str {
        "out-degree-weighted"
    }

    fn compute(&self, network: &DirectedNetwork) -> Result<Vec<f64>> {
        let graph = network.graph();
        Ok(graph
            .node_indices()
            .map(|v| graph.edges_directed(v, Direction::Outgoing).map(|e| *e.weight()).sum())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RelationTriple, TripleTable};
    use crate::country::Vocabulary;
    use crate::network::NetworkBuilder;

    fn star() -> Result<DirectedNetwork> {
        let triples = TripleTable::from_triples([
            RelationTriple::new(2000, "A", "B", 10.0),
            RelationTriple::new(2000, "A", "C", 8.0),
            RelationTriple::new(2000, "B", "A", 1.0),
        ])?;
        let vocab = Vocabulary::new(["A", "B", "C"]);
        Ok(NetworkBuilder::new().directed(&triples, &vocab, 2000))
    }

    #[test]
    fn test_out_degree_fraction() -> Result<()> {
        let scores = OutDegree.compute(&star()?)?;
        assert_eq!(scores, vec![1.0, 0.5, 0.0]);
        Ok(())
    }

    #[test]
    fn test_out_degree_weighted_sums_weights() -> Result<()> {
        let scores = OutDegreeWeighted.compute(&star()?)?;
        assert_eq!(scores, vec![18.0, 1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_single_node_scores_one() -> Result<()> {
        let vocab = Vocabulary::new(["A"]);
        let net = NetworkBuilder::new().directed(&TripleTable::new(), &vocab, 2000);
        assert_eq!(OutDegree.compute(&net)?, vec![1.0]);
        Ok(())
    }
}
