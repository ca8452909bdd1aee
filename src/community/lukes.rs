//! Size-bounded partitioning (Lukes 1974).
//!
//! Lukes' dynamic program finds, for a tree, the partition into connected
//! clusters of at most `max_size` nodes that keeps the largest total edge
//! weight inside clusters. Relation networks are not trees, so the program
//! runs on a maximum spanning forest: each tree of the forest is
//! partitioned independently, and isolated nodes are their own clusters.
//!
//! For every node `v` and cluster size `s`, the table holds the best
//! partition of `v`'s subtree in which `v`'s open cluster has `s` members.
//! A child is either cut off (its best partition is closed) or joined
//! (sizes add, and the connecting edge weight is gained).
//!
//! Work is `O(n · K²)` table merges with `K = min(max_size, tree size)`;
//! each entry carries its partition so no back-tracking pass is needed.

use super::traits::{CommunityDetection, RelationGraph};
use crate::error::{Error, Result};
use petgraph::algo::min_spanning_tree;
use petgraph::data::Element;

/// Lukes tree partitioning on the maximum spanning forest.
#[derive(Debug, Clone)]
pub struct Lukes {
    max_size: usize,
}

impl Lukes {
    /// Clusters of at most `max_size` nodes.
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

/// Best partition of a subtree given the size of the root's open cluster.
#[derive(Debug, Clone)]
struct Entry {
    score: f64,
    open: Vec<usize>,
    closed: Vec<Vec<usize>>,
}

impl Entry {
    fn into_clusters(self) -> Vec<Vec<usize>> {
        let mut clusters = self.closed;
        clusters.push(self.open);
        clusters
    }
}

fn best(table: &[Option<Entry>]) -> Option<&Entry> {
    table.iter().flatten().fold(None, |acc: Option<&Entry>, e| match acc {
        Some(b) if b.score >= e.score => Some(b),
        _ => Some(e),
    })
}

fn offer(slot: &mut Option<Entry>, candidate: Entry) {
    if slot.as_ref().map_or(true, |cur| candidate.score > cur.score) {
        *slot = Some(candidate);
    }
}

impl CommunityDetection for Lukes {
    fn communities(&self, graph: &RelationGraph) -> Result<Vec<Vec<usize>>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.max_size == 0 {
            return Err(Error::invalid("max_size", "must be at least 1"));
        }

        // Maximum spanning forest via Kruskal on negated weights.
        let negated = graph.map(|_, _| (), |_, w| -*w);
        let mut tree: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for element in min_spanning_tree(&negated) {
            if let Element::Edge { source, target, weight } = element {
                tree[source].push((target, -weight));
                tree[target].push((source, -weight));
            }
        }

        let mut visited = vec![false; n];
        let mut clusters = Vec::new();
        for root in 0..n {
            if visited[root] {
                continue;
            }
            clusters.extend(self.partition_tree(&tree, root, &mut visited));
        }

        for cluster in &mut clusters {
            cluster.sort_unstable();
        }
        clusters.sort_by_key(|c| c[0]);
        Ok(clusters)
    }
}

impl Lukes {
    fn partition_tree(&self, tree: &[Vec<(usize, f64)>], root: usize, visited: &mut [bool]) -> Vec<Vec<usize>> {
        // Preorder with parents; children are processed before their parent
        // by walking the preorder backwards.
        let mut order = Vec::new();
        let mut parent: Vec<Option<(usize, f64)>> = vec![None; tree.len()];
        let mut stack = vec![root];
        visited[root] = true;
        while let Some(v) = stack.pop() {
            order.push(v);
            for &(u, w) in &tree[v] {
                if !visited[u] {
                    visited[u] = true;
                    parent[u] = Some((v, w));
                    stack.push(u);
                }
            }
        }
        let cap = self.max_size.min(order.len());

        let mut tables: Vec<Option<Vec<Option<Entry>>>> = vec![None; tree.len()];
        for &v in order.iter().rev() {
            let mut table: Vec<Option<Entry>> = vec![None; cap + 1];
            table[1] = Some(Entry {
                score: 0.0,
                open: vec![v],
                closed: Vec::new(),
            });

            for &(c, w) in &tree[v] {
                if parent[c].map(|(p, _)| p) != Some(v) {
                    continue;
                }
                let Some(child) = tables[c].take() else { continue };
                let Some(child_best) = best(&child).cloned() else { continue };

                let mut merged: Vec<Option<Entry>> = vec![None; cap + 1];
                for (s1, own) in table.iter().enumerate() {
                    let Some(own) = own else { continue };

                    // Cut the edge to c.
                    let mut closed = own.closed.clone();
                    closed.extend(child_best.clone().into_clusters());
                    offer(
                        &mut merged[s1],
                        Entry {
                            score: own.score + child_best.score,
                            open: own.open.clone(),
                            closed,
                        },
                    );

                    // Join c's open cluster.
                    for (s2, sub) in child.iter().enumerate() {
                        let Some(sub) = sub else { continue };
                        if s1 + s2 > cap {
                            break;
                        }
                        let mut open = own.open.clone();
                        open.extend(&sub.open);
                        let mut closed = own.closed.clone();
                        closed.extend(sub.closed.iter().cloned());
                        offer(
                            &mut merged[s1 + s2],
                            Entry {
                                score: own.score + sub.score + w,
                                open,
                                closed,
                            },
                        );
                    }
                }
                table = merged;
            }
            tables[v] = Some(table);
        }

        tables[root]
            .take()
            .and_then(|table| best(&table).cloned())
            .map(Entry::into_clusters)
            .unwrap_or_else(|| vec![vec![root]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::traits::test_graph;

    #[test]
    fn test_unbounded_size_keeps_components() -> Result<()> {
        let graph = test_graph(5, &[(0, 1, 1.0), (1, 2, 2.0), (3, 4, 1.0)]);
        let clusters = Lukes::new(100_000).communities(&graph)?;
        assert_eq!(clusters, vec![vec![0, 1, 2], vec![3, 4]]);
        Ok(())
    }

    #[test]
    fn test_size_bound_cuts_lightest_edge() -> Result<()> {
        // Path 0 -1- 1 -5- 2 -1- 3 -5- 4 with clusters of at most 2:
        // best keeps the two weight-5 edges.
        let graph = test_graph(5, &[(0, 1, 1.0), (1, 2, 5.0), (2, 3, 1.0), (3, 4, 5.0)]);
        let clusters = Lukes::new(2).communities(&graph)?;
        assert_eq!(clusters, vec![vec![0], vec![1, 2], vec![3, 4]]);
        assert!(clusters.iter().all(|c| c.len() <= 2));
        Ok(())
    }

    #[test]
    fn test_cycle_uses_spanning_tree() -> Result<()> {
        // Triangle with a weak edge; spanning tree drops 0-2.
        let graph = test_graph(3, &[(0, 1, 3.0), (1, 2, 3.0), (0, 2, 0.5)]);
        let clusters = Lukes::new(2).communities(&graph)?;
        let sizes: Vec<usize> = clusters.iter().map(Vec::len).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 3);
        assert!(sizes.iter().all(|&s| s <= 2));
        Ok(())
    }

    #[test]
    fn test_max_size_one_is_singletons() -> Result<()> {
        let graph = test_graph(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        let clusters = Lukes::new(1).communities(&graph)?;
        assert_eq!(clusters, vec![vec![0], vec![1], vec![2]]);
        Ok(())
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let graph = test_graph(2, &[(0, 1, 1.0)]);
        assert!(matches!(
            Lukes::new(0).communities(&graph),
            Err(Error::InvalidParameter { name: "max_size", .. })
        ));
    }
}
