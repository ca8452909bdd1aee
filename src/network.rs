//! Yearly relation networks built from the triple stream.
//!
//! Every requested country is a node, even when isolated, so node sets are
//! identical across years. Edges exist only for relations that survive the
//! value filter; self-relations are ignored.
//!
//! Directed networks carry flow direction (who supplies whom) and feed
//! centrality and hierarchy measures. Undirected networks express structural
//! proximity and feed community detection.

use crate::context::{TripleTable, Year};
use crate::country::{CountryId, Vocabulary};
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, EdgeType, Undirected};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Weighted relation graph for one year.
#[derive(Debug, Clone)]
pub struct RelationNetwork<Ty: EdgeType> {
    year: Year,
    graph: Graph<CountryId, f64, Ty>,
    index: HashMap<CountryId, NodeIndex>,
}

/// Directed relation network.
pub type DirectedNetwork = RelationNetwork<Directed>;
/// Undirected relation network.
pub type UndirectedNetwork = RelationNetwork<Undirected>;

impl<Ty: EdgeType> RelationNetwork<Ty> {
    fn with_nodes<'a, I>(year: Year, countries: I) -> Self
    where
        I: IntoIterator<Item = &'a CountryId>,
    {
        let mut graph = Graph::default();
        let mut index = HashMap::new();
        for country in countries {
            if !index.contains_key(country) {
                let idx = graph.add_node(country.clone());
                let _ = index.insert(country.clone(), idx);
            }
        }
        Self { year, graph, index }
    }

    /// Add `weight` to the edge between two nodes, creating it if needed.
    fn accumulate(&mut self, a: NodeIndex, b: NodeIndex, weight: f64) {
        match self.graph.find_edge(a, b) {
            Some(edge) => self.graph[edge] += weight,
            None => {
                let _ = self.graph.add_edge(a, b, weight);
            }
        }
    }

    /// The observation year.
    pub fn year(&self) -> Year {
        self.year
    }

    /// Underlying petgraph graph. Node weights are country identifiers.
    pub fn graph(&self) -> &Graph<CountryId, f64, Ty> {
        &self.graph
    }

    /// Node index of `country`, if it is part of this network.
    pub fn node(&self, country: &CountryId) -> Option<NodeIndex> {
        self.index.get(country).copied()
    }

    /// Country at `node`.
    pub fn country(&self, node: NodeIndex) -> &CountryId {
        &self.graph[node]
    }

    /// Countries in node order.
    pub fn countries(&self) -> impl Iterator<Item = &CountryId> {
        self.graph.node_weights()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether edges carry direction.
    pub fn is_directed(&self) -> bool {
        Ty::is_directed()
    }

    /// Weight of the edge `ego -> alter` (either direction when undirected).
    pub fn weight(&self, ego: &CountryId, alter: &CountryId) -> Option<f64> {
        let edge = self.graph.find_edge(self.node(ego)?, self.node(alter)?)?;
        Some(self.graph[edge])
    }
}

impl DirectedNetwork {
    /// Symmetric projection; reciprocal edges are merged by summing weights.
    pub fn to_undirected(&self) -> UndirectedNetwork {
        let mut out = UndirectedNetwork::with_nodes(self.year, self.countries());
        for edge in self.graph.edge_references() {
            // Node indices coincide: both graphs were filled in the same order.
            out.accumulate(edge.source(), edge.target(), *edge.weight());
        }
        out
    }
}

/// Builds [`RelationNetwork`]s from a [`TripleTable`].
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    drop_non_positive: bool,
}

impl NetworkBuilder {
    /// Builder that drops relations with `value <= 0`.
    pub fn new() -> Self {
        Self {
            drop_non_positive: true,
        }
    }

    /// Keep or drop relations with `value <= 0`.
    pub fn with_drop_non_positive(mut self, drop: bool) -> Self {
        self.drop_non_positive = drop;
        self
    }

    /// Build a network over `countries` from the relations of `year`.
    ///
    /// Relations with an endpoint outside `countries` are dropped.
    pub fn build<'a, Ty, I>(&self, triples: &TripleTable, countries: I, year: Year) -> RelationNetwork<Ty>
    where
        Ty: EdgeType,
        I: IntoIterator<Item = &'a CountryId>,
    {
        let mut network = RelationNetwork::<Ty>::with_nodes(year, countries);
        let mut dropped = 0usize;

        for (ego, alter, value) in triples.year(year) {
            if ego == alter || (self.drop_non_positive && value <= 0.0) {
                dropped += 1;
                continue;
            }
            let (Some(a), Some(b)) = (network.node(ego), network.node(alter)) else {
                dropped += 1;
                continue;
            };
            network.accumulate(a, b, value);
        }

        debug!(
            year,
            nodes = network.node_count(),
            edges = network.edge_count(),
            dropped,
            "built relation network"
        );
        network
    }

    /// Directed network over `countries`.
    pub fn directed<'a, I>(&self, triples: &TripleTable, countries: I, year: Year) -> DirectedNetwork
    where
        I: IntoIterator<Item = &'a CountryId>,
    {
        self.build(triples, countries, year)
    }

    /// Undirected network over `countries`.
    pub fn undirected<'a, I>(&self, triples: &TripleTable, countries: I, year: Year) -> UndirectedNetwork
    where
        I: IntoIterator<Item = &'a CountryId>,
    {
        self.build(triples, countries, year)
    }

    /// Directed global networks for every year in `start..=end`.
    pub fn yearly(
        &self,
        triples: &TripleTable,
        vocabulary: &Vocabulary,
        start: Year,
        end: Year,
    ) -> BTreeMap<Year, DirectedNetwork> {
        info!(start, end, "building global networks");
        (start..=end)
            .map(|year| (year, self.directed(triples, vocabulary, year)))
            .collect()
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RelationTriple;
    use crate::error::Result;

    fn sample() -> Result<(TripleTable, Vocabulary)> {
        let triples = TripleTable::from_triples([
            RelationTriple::new(2000, "A", "B", 10.0),
            RelationTriple::new(2000, "B", "A", 1.0),
            RelationTriple::new(2000, "A", "C", 0.0),
            RelationTriple::new(2000, "D", "D", 4.0),
            RelationTriple::new(2000, "A", "Z", 7.0),
            RelationTriple::new(2001, "C", "D", 2.0),
        ])?;
        Ok((triples, Vocabulary::new(["A", "B", "C", "D"])))
    }

    #[test]
    fn test_every_vocabulary_country_is_a_node() -> Result<()> {
        let (triples, vocab) = sample()?;
        for year in [2000, 2001, 2002] {
            let net = NetworkBuilder::new().directed(&triples, &vocab, year);
            let nodes: Vec<&CountryId> = net.countries().collect();
            let expected: Vec<&CountryId> = vocab.iter().collect();
            assert_eq!(nodes, expected);
        }
        Ok(())
    }

    #[test]
    fn test_filters_self_loops_zero_values_and_strangers() -> Result<()> {
        let (triples, vocab) = sample()?;
        let net = NetworkBuilder::new().directed(&triples, &vocab, 2000);
        // Only A->B and B->A survive.
        assert_eq!(net.edge_count(), 2);
        assert_eq!(net.weight(&"A".into(), &"B".into()), Some(10.0));
        assert_eq!(net.weight(&"A".into(), &"C".into()), None);
        assert_eq!(net.weight(&"D".into(), &"D".into()), None);
        Ok(())
    }

    #[test]
    fn test_keep_non_positive_when_configured() -> Result<()> {
        let (triples, vocab) = sample()?;
        let net = NetworkBuilder::new()
            .with_drop_non_positive(false)
            .directed(&triples, &vocab, 2000);
        assert_eq!(net.weight(&"A".into(), &"C".into()), Some(0.0));
        Ok(())
    }

    #[test]
    fn test_undirected_projection_sums_reciprocal_edges() -> Result<()> {
        let (triples, vocab) = sample()?;
        let directed = NetworkBuilder::new().directed(&triples, &vocab, 2000);
        let undirected = directed.to_undirected();
        assert!(!undirected.is_directed());
        assert_eq!(undirected.edge_count(), 1);
        assert_eq!(undirected.weight(&"B".into(), &"A".into()), Some(11.0));

        let built = NetworkBuilder::new().undirected(&triples, &vocab, 2000);
        assert_eq!(built.weight(&"A".into(), &"B".into()), Some(11.0));
        Ok(())
    }

    #[test]
    fn test_local_network_restricted_to_members() -> Result<()> {
        let (triples, _) = sample()?;
        let members = [CountryId::new("A"), CountryId::new("C")];
        let net = NetworkBuilder::new().directed(&triples, &members, 2000);
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 0);
        Ok(())
    }
}
