//! Clique percolation (Palla et al. 2005).
//!
//! A k-clique community is the union of k-cliques that can reach each other
//! through adjacent k-cliques, where two k-cliques are adjacent when they
//! share `k - 1` nodes. Working on maximal cliques is equivalent: two maximal
//! cliques of size ≥ k belong to the same community when they share at least
//! `k - 1` nodes.
//!
//! Communities may overlap, and nodes outside every k-clique belong to none.
//! Edge weights are ignored.

use super::traits::{CommunityDetection, RelationGraph};
use crate::error::{Error, Result};
use petgraph::visit::EdgeRef;
use std::collections::BTreeSet;

/// k-clique percolation communities.
#[derive(Debug, Clone)]
pub struct KClique {
    k: usize,
}

impl KClique {
    /// Communities built from cliques of at least `k` nodes.
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Default for KClique {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Bron–Kerbosch with pivoting; appends every maximal clique to `out`.
fn bron_kerbosch(
    adj: &[BTreeSet<usize>],
    r: &mut Vec<usize>,
    mut p: BTreeSet<usize>,
    mut x: BTreeSet<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if p.is_empty() {
        if x.is_empty() {
            out.push(r.clone());
        }
        return;
    }
    let pivot = p
        .union(&x)
        .max_by_key(|&&u| adj[u].intersection(&p).count())
        .copied();
    let candidates: Vec<usize> = match pivot {
        Some(u) => p.difference(&adj[u]).copied().collect(),
        None => p.iter().copied().collect(),
    };
    for v in candidates {
        r.push(v);
        bron_kerbosch(
            adj,
            r,
            p.intersection(&adj[v]).copied().collect(),
            x.intersection(&adj[v]).copied().collect(),
            out,
        );
        let _ = r.pop();
        let _ = p.remove(&v);
        let _ = x.insert(v);
    }
}

impl CommunityDetection for KClique {
    fn communities(&self, graph: &RelationGraph) -> Result<Vec<Vec<usize>>> {
        if self.k < 2 {
            return Err(Error::invalid("k", "clique size must be at least 2"));
        }
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let mut adj: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        for edge in graph.edge_references() {
            let (i, j) = (edge.source().index(), edge.target().index());
            if i != j {
                let _ = adj[i].insert(j);
                let _ = adj[j].insert(i);
            }
        }

        let mut cliques = Vec::new();
        bron_kerbosch(&adj, &mut Vec::new(), (0..n).collect(), BTreeSet::new(), &mut cliques);
        let cliques: Vec<BTreeSet<usize>> = cliques
            .into_iter()
            .filter(|c| c.len() >= self.k)
            .map(|c| c.into_iter().collect())
            .collect();

        // Connected components of the clique-overlap graph.
        let mut component = vec![usize::MAX; cliques.len()];
        let mut communities: Vec<Vec<usize>> = Vec::new();
        for start in 0..cliques.len() {
            if component[start] != usize::MAX {
                continue;
            }
            let id = communities.len();
            component[start] = id;
            let mut members: BTreeSet<usize> = BTreeSet::new();
            let mut stack = vec![start];
            while let Some(c) = stack.pop() {
                members.extend(&cliques[c]);
                for other in 0..cliques.len() {
                    if component[other] == usize::MAX
                        && cliques[c].intersection(&cliques[other]).count() + 1 >= self.k
                    {
                        component[other] = id;
                        stack.push(other);
                    }
                }
            }
            communities.push(members.into_iter().collect());
        }

        communities.sort();
        Ok(communities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::traits::test_graph;

    fn clique(nodes: &[usize]) -> Vec<(usize, usize, f64)> {
        let mut edges = Vec::new();
        for (a, &i) in nodes.iter().enumerate() {
            for &j in &nodes[a + 1..] {
                edges.push((i, j, 1.0));
            }
        }
        edges
    }

    #[test]
    fn test_two_triangles_sharing_an_edge_percolate() -> Result<()> {
        let mut edges = clique(&[0, 1, 2]);
        edges.extend(clique(&[1, 2, 3]));
        edges.push((3, 4, 1.0));
        let graph = test_graph(5, &edges);
        let communities = KClique::new(3).communities(&graph)?;
        assert_eq!(communities, vec![vec![0, 1, 2, 3]]);
        Ok(())
    }

    #[test]
    fn test_overlapping_communities() -> Result<()> {
        // Two 4-cliques sharing one node: no percolation at k=3.
        let mut edges = clique(&[0, 1, 2, 3]);
        edges.extend(clique(&[3, 4, 5, 6]));
        let graph = test_graph(7, &edges);
        let communities = KClique::new(3).communities(&graph)?;
        assert_eq!(communities, vec![vec![0, 1, 2, 3], vec![3, 4, 5, 6]]);
        Ok(())
    }

    #[test]
    fn test_default_k_needs_five_clique() -> Result<()> {
        let graph = test_graph(6, &clique(&[0, 1, 2, 3]));
        assert!(KClique::default().communities(&graph)?.is_empty());

        let graph = test_graph(6, &clique(&[0, 1, 2, 3, 4]));
        assert_eq!(KClique::default().communities(&graph)?, vec![vec![0, 1, 2, 3, 4]]);
        Ok(())
    }

    #[test]
    fn test_k_below_two_rejected() {
        let graph = test_graph(2, &[(0, 1, 1.0)]);
        assert!(KClique::new(1).communities(&graph).is_err());
    }
}
