//! From detector clusters to a per-country community assignment.

use super::traits::CommunityDetection;
use crate::centrality::{CentralityKind, CentralityTable};
use crate::context::Year;
use crate::country::CountryId;
use crate::error::Result;
use crate::network::DirectedNetwork;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Community membership of one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The country.
    pub country: CountryId,
    /// Consecutive index among retained communities.
    pub community: usize,
    /// Size of that community.
    pub population: usize,
}

/// Non-trivial communities of one year's network at one resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearPartition {
    year: Year,
    resolution: f64,
    assignments: Vec<Assignment>,
    global: CentralityTable,
}

impl YearPartition {
    /// Observation year.
    pub fn year(&self) -> Year {
        self.year
    }

    /// Resolution the detector ran with.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Assignments of retained countries, in network node order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Community index of `country`, if it was retained.
    pub fn community_of(&self, country: &CountryId) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| &a.country == country)
            .map(|a| a.community)
    }

    /// Members of each retained community, by community index.
    pub fn communities(&self) -> Vec<Vec<CountryId>> {
        let mut grouped: Vec<Vec<CountryId>> = Vec::new();
        for a in &self.assignments {
            if grouped.len() <= a.community {
                grouped.resize_with(a.community + 1, Vec::new);
            }
            grouped[a.community].push(a.country.clone());
        }
        grouped
    }

    /// Centrality of every country in the full yearly network.
    pub fn global_centrality(&self) -> &CentralityTable {
        &self.global
    }
}

#[cfg(test)]
impl YearPartition {
    /// Partition with fixed member lists, indexed in the order given.
    pub(crate) fn from_members(
        network: &DirectedNetwork,
        resolution: f64,
        communities: Vec<Vec<CountryId>>,
    ) -> Result<Self> {
        let assignments = communities
            .iter()
            .enumerate()
            .flat_map(|(community, members)| {
                members.iter().map(move |country| Assignment {
                    country: country.clone(),
                    community,
                    population: members.len(),
                })
            })
            .collect();
        let vocabulary: Vec<CountryId> = network.countries().cloned().collect();
        Ok(Self {
            year: network.year(),
            resolution,
            assignments,
            global: CentralityTable::compute(network, &vocabulary, CentralityKind::OutDegree, "global")?,
        })
    }
}

/// Detect communities in `network` and keep those with more than one member.
///
/// Detection runs on the undirected projection. When an overlapping detector
/// places a country in several clusters, the last cluster wins. Populations
/// are counted after that collapse, and countries in clusters of one are
/// dropped.
pub fn partition_year(
    network: &DirectedNetwork,
    detector: &dyn CommunityDetection,
    kind: CentralityKind,
) -> Result<YearPartition> {
    let undirected = network.to_undirected();
    let clusters = detector.communities(undirected.graph())?;

    let mut label: Vec<Option<usize>> = vec![None; network.node_count()];
    for (i, cluster) in clusters.iter().enumerate() {
        for &node in cluster {
            label[node] = Some(i);
        }
    }

    let mut population: BTreeMap<usize, usize> = BTreeMap::new();
    for l in label.iter().flatten() {
        *population.entry(*l).or_insert(0) += 1;
    }

    // Renumber retained clusters in order of first appearance.
    let mut renumber: BTreeMap<usize, usize> = BTreeMap::new();
    let mut assignments = Vec::new();
    for (node, country) in network.countries().enumerate() {
        let Some(l) = label[node] else { continue };
        let size = population[&l];
        if size < 2 {
            continue;
        }
        let next = renumber.len();
        let community = *renumber.entry(l).or_insert(next);
        assignments.push(Assignment {
            country: country.clone(),
            community,
            population: size,
        });
    }

    let vocabulary: Vec<CountryId> = network.countries().cloned().collect();
    let global = CentralityTable::compute(network, &vocabulary, kind, "global")?;

    debug!(
        year = network.year(),
        resolution = detector.resolution(),
        clusters = clusters.len(),
        retained = renumber.len(),
        "partitioned network"
    );

    Ok(YearPartition {
        year: network.year(),
        resolution: detector.resolution(),
        assignments,
        global,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::{KClique, Louvain};
    use crate::context::{RelationTriple, TripleTable};
    use crate::country::Vocabulary;
    use crate::network::NetworkBuilder;

    fn scenario() -> Result<DirectedNetwork> {
        let triples = TripleTable::from_triples([
            RelationTriple::new(2000, "A", "B", 10.0),
            RelationTriple::new(2000, "A", "C", 8.0),
            RelationTriple::new(2000, "B", "A", 1.0),
            RelationTriple::new(2000, "D", "D", 3.0),
        ])?;
        let vocab = Vocabulary::new(["A", "B", "C", "D"]);
        Ok(NetworkBuilder::new().directed(&triples, &vocab, 2000))
    }

    #[test]
    fn test_singletons_are_dropped() -> Result<()> {
        let network = scenario()?;
        let partition = partition_year(&network, &Louvain::new(), CentralityKind::OutDegree)?;

        let communities = partition.communities();
        assert_eq!(communities.len(), 1);
        let names: Vec<&str> = communities[0].iter().map(CountryId::as_str).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert!(partition.assignments().iter().all(|a| a.population == 3));
        assert_eq!(partition.community_of(&"D".into()), None);

        // Global ranking still covers the whole vocabulary.
        assert_eq!(partition.global_centrality().rows().len(), 4);
        assert_eq!(partition.global_centrality().prefix(), "global");
        Ok(())
    }

    #[test]
    fn test_overlap_collapses_to_last_cluster() -> Result<()> {
        // Two triangles sharing C; at k=3 they do not percolate.
        let triples = TripleTable::from_triples(
            [("A", "B"), ("B", "C"), ("A", "C"), ("C", "D"), ("D", "E"), ("C", "E")]
                .into_iter()
                .map(|(a, b)| RelationTriple::new(2000, a, b, 1.0)),
        )?;
        let vocab = Vocabulary::new(["A", "B", "C", "D", "E"]);
        let network = NetworkBuilder::new().directed(&triples, &vocab, 2000);
        let partition = partition_year(&network, &KClique::new(3), CentralityKind::OutDegree)?;

        assert_eq!(partition.community_of(&"A".into()), Some(0));
        assert_eq!(partition.community_of(&"C".into()), Some(1));
        let communities = partition.communities();
        assert_eq!(communities[0].len(), 2);
        assert_eq!(communities[1].len(), 3);
        Ok(())
    }
}
