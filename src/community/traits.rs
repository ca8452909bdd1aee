//! Community detection traits.

use crate::country::CountryId;
use crate::error::Result;
use petgraph::graph::UnGraph;
use std::collections::HashMap;

/// Undirected relation graph as consumed by detectors.
pub type RelationGraph = UnGraph<CountryId, f64>;

/// Trait for community detection algorithms.
pub trait CommunityDetection {
    /// Detect communities in a weighted undirected graph.
    ///
    /// Returns clusters of node indices. Partitioning algorithms return
    /// disjoint clusters covering every node; overlapping algorithms may
    /// place a node in several clusters or in none.
    fn communities(&self, graph: &RelationGraph) -> Result<Vec<Vec<usize>>>;

    /// Get the resolution parameter (if applicable).
    fn resolution(&self) -> f64 {
        1.0
    }
}

/// Group node labels into clusters, ordered by their smallest member.
pub(crate) fn clusters_from_labels(labels: &[usize]) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = Vec::new();
    let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
    for (node, &label) in labels.iter().enumerate() {
        let entry = members.entry(label).or_default();
        if entry.is_empty() {
            order.push(label);
        }
        entry.push(node);
    }
    order
        .into_iter()
        .filter_map(|label| members.remove(&label))
        .collect()
}

#[cfg(test)]
pub(crate) fn test_graph(n: usize, edges: &[(usize, usize, f64)]) -> RelationGraph {
    let mut graph = RelationGraph::new_undirected();
    let nodes: Vec<_> = (0..n)
        .map(|i| graph.add_node(CountryId::new(format!("c{i:02}"))))
        .collect();
    for &(i, j, w) in edges {
        let _ = graph.add_edge(nodes[i], nodes[j], w);
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clusters_from_labels_orders_by_first_member() {
        let clusters = clusters_from_labels(&[7, 3, 7, 3, 9]);
        assert_eq!(clusters, vec![vec![0, 2], vec![1, 3], vec![4]]);
    }
}
