//! Ranked centrality tables.

use super::CentralityKind;
use crate::country::CountryId;
use crate::error::{Error, Result};
use crate::network::DirectedNetwork;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Centrality, rank and status of one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityRow {
    /// The country.
    pub country: CountryId,
    /// Raw (or max-normalised) centrality.
    pub centrality: f64,
    /// Descending rank; tied values share the average of their positions.
    pub rank: f64,
    /// `|countries| / rank`.
    pub status: f64,
}

/// Centrality of a list of countries within one network.
///
/// `prefix` namespaces the columns (`global_centrality`, `local_rank`, ...)
/// when rows are exported; it does not change the computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralityTable {
    kind: CentralityKind,
    prefix: String,
    rows: Vec<CentralityRow>,
}

impl CentralityTable {
    /// Compute `kind` over `network` and rank the listed countries.
    ///
    /// Every listed country must be a node of `network`. Pass the whole
    /// vocabulary for a global table, or a community's members together with
    /// its local network for a local one.
    pub fn compute(
        network: &DirectedNetwork,
        countries: &[CountryId],
        kind: CentralityKind,
        prefix: &str,
    ) -> Result<Self> {
        let scores = kind.measure().compute(network)?;
        let centrality = countries
            .iter()
            .map(|country| {
                let node = network
                    .node(country)
                    .ok_or_else(|| Error::UnknownCountry(country.to_string()))?;
                let value = scores[node.index()];
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(Error::NonFiniteValue { what: "centrality" })
                }
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Self::from_scores(countries, &centrality, kind, prefix))
    }

    fn from_scores(countries: &[CountryId], centrality: &[f64], kind: CentralityKind, prefix: &str) -> Self {
        let ranks = average_ranks_descending(centrality);
        #[allow(clippy::cast_precision_loss)]
        let n = countries.len() as f64;
        let rows = countries
            .iter()
            .zip(centrality)
            .zip(ranks)
            .map(|((country, &centrality), rank)| CentralityRow {
                country: country.clone(),
                centrality,
                rank,
                status: n / rank,
            })
            .collect();
        Self {
            kind,
            prefix: prefix.to_string(),
            rows,
        }
    }

    /// Divide every centrality by the largest one, then re-rank.
    ///
    /// A table whose maximum is not positive is returned unchanged.
    pub fn normalized_by_max(&self) -> Self {
        let max = self
            .rows
            .iter()
            .map(|r| r.centrality)
            .fold(f64::NEG_INFINITY, f64::max);
        if max.is_nan() || max <= 0.0 {
            return self.clone();
        }
        let countries: Vec<CountryId> = self.rows.iter().map(|r| r.country.clone()).collect();
        let scaled: Vec<f64> = self.rows.iter().map(|r| r.centrality / max).collect();
        Self::from_scores(&countries, &scaled, self.kind, &self.prefix)
    }

    /// Measure used.
    pub fn kind(&self) -> CentralityKind {
        self.kind
    }

    /// Column prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Column name for `field` (`centrality`, `rank`, `status`).
    pub fn column(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}_{field}", self.prefix)
        }
    }

    /// Rows in the order countries were listed.
    pub fn rows(&self) -> &[CentralityRow] {
        &self.rows
    }

    /// Row for `country`.
    pub fn get(&self, country: &CountryId) -> Option<&CentralityRow> {
        self.rows.iter().find(|r| &r.country == country)
    }

    /// Rows by descending centrality; ties keep listing order.
    pub fn sorted_descending(&self) -> Vec<&CentralityRow> {
        let mut rows: Vec<&CentralityRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.centrality.partial_cmp(&a.centrality).unwrap_or(Ordering::Equal));
        rows
    }
}

/// Rank values from largest (rank 1) to smallest; ties get their mean position.
#[allow(clippy::cast_precision_loss)]
fn average_ranks_descending(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start+1 ..= end share their mean.
        let mean = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = mean;
        }
        start = end;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RelationTriple, TripleTable};
    use crate::country::Vocabulary;
    use crate::network::NetworkBuilder;

    fn ids(names: &[&str]) -> Vec<CountryId> {
        names.iter().map(|&n| CountryId::new(n)).collect()
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks_descending(&[3.0, 1.0, 3.0, 0.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_status_decreases_with_rank() -> Result<()> {
        let triples = TripleTable::from_triples([
            RelationTriple::new(2000, "A", "B", 10.0),
            RelationTriple::new(2000, "A", "C", 8.0),
            RelationTriple::new(2000, "B", "A", 1.0),
        ])?;
        let vocab = Vocabulary::new(["A", "B", "C"]);
        let net = NetworkBuilder::new().directed(&triples, &vocab, 2000);
        let table = CentralityTable::compute(&net, &ids(&["A", "B", "C"]), CentralityKind::OutDegreeWeighted, "local")?;

        let a = table.get(&"A".into()).unwrap();
        assert_eq!(a.rank, 1.0);
        assert_eq!(a.status, 3.0);
        let c = table.get(&"C".into()).unwrap();
        assert_eq!(c.rank, 3.0);
        assert_eq!(c.status, 1.0);
        assert_eq!(table.column("centrality"), "local_centrality");

        let sorted: Vec<&str> = table.sorted_descending().iter().map(|r| r.country.as_str()).collect();
        assert_eq!(sorted, ["A", "B", "C"]);
        Ok(())
    }

    #[test]
    fn test_normalized_by_max() -> Result<()> {
        let triples = TripleTable::from_triples([
            RelationTriple::new(2000, "A", "B", 10.0),
            RelationTriple::new(2000, "B", "A", 5.0),
        ])?;
        let vocab = Vocabulary::new(["A", "B"]);
        let net = NetworkBuilder::new().directed(&triples, &vocab, 2000);
        let table = CentralityTable::compute(&net, &ids(&["A", "B"]), CentralityKind::OutDegreeWeighted, "")?
            .normalized_by_max();
        assert_eq!(table.rows()[0].centrality, 1.0);
        assert_eq!(table.rows()[1].centrality, 0.5);
        assert_eq!(table.column("rank"), "rank");
        Ok(())
    }

    #[test]
    fn test_normalizing_all_zero_is_finite() -> Result<()> {
        let vocab = Vocabulary::new(["A", "B"]);
        let net = NetworkBuilder::new().directed(&TripleTable::new(), &vocab, 2000);
        let table = CentralityTable::compute(&net, &ids(&["A", "B"]), CentralityKind::OutDegreeWeighted, "")?
            .normalized_by_max();
        assert!(table.rows().iter().all(|r| r.centrality == 0.0 && r.status.is_finite()));
        Ok(())
    }

    #[test]
    fn test_unknown_country_rejected() {
        let vocab = Vocabulary::new(["A"]);
        let net = NetworkBuilder::new().directed(&TripleTable::new(), &vocab, 2000);
        let err = CentralityTable::compute(&net, &ids(&["B"]), CentralityKind::OutDegree, "").unwrap_err();
        assert!(matches!(err, Error::UnknownCountry(_)));
    }
}
