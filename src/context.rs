//! Inputs supplied by upstream collaborators, bundled into one run context.
//!
//! The context is loaded once per run and passed by reference to every
//! stage. Nothing in it changes after construction.

use crate::country::{CountryId, Vocabulary};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

/// Calendar year.
pub type Year = i32;

/// A directed, weighted relation from `ego` to `alter` in `year`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationTriple {
    /// Observation year.
    pub year: Year,
    /// Source of the relation (seller, intervener, sender).
    pub ego: CountryId,
    /// Target of the relation.
    pub alter: CountryId,
    /// Relation strength, already normalised upstream.
    pub value: f64,
}

impl RelationTriple {
    /// Convenience constructor.
    pub fn new(year: Year, ego: impl Into<CountryId>, alter: impl Into<CountryId>, value: f64) -> Self {
        Self {
            year,
            ego: ego.into(),
            alter: alter.into(),
            value,
        }
    }
}

/// An ordered country pair observed in a given year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dyad {
    /// Year.
    pub year: Year,
    /// Source.
    pub ego: CountryId,
    /// Target.
    pub alter: CountryId,
}

impl Dyad {
    /// Convenience constructor.
    pub fn new(year: Year, ego: impl Into<CountryId>, alter: impl Into<CountryId>) -> Self {
        Self {
            year,
            ego: ego.into(),
            alter: alter.into(),
        }
    }
}

/// Relation triples keyed by `(year, ego, alter)`.
///
/// Inserting a key twice sums the values, so several sources can be folded
/// into one relation before analysis.
#[derive(Debug, Clone, Default)]
pub struct TripleTable {
    by_year: BTreeMap<Year, BTreeMap<(CountryId, CountryId), f64>>,
}

impl TripleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a triple stream.
    pub fn from_triples<I>(triples: I) -> Result<Self>
    where
        I: IntoIterator<Item = RelationTriple>,
    {
        let mut table = Self::new();
        for triple in triples {
            table.insert(triple)?;
        }
        Ok(table)
    }

    /// Add one triple, summing into an existing key.
    pub fn insert(&mut self, triple: RelationTriple) -> Result<()> {
        if !triple.value.is_finite() {
            return Err(Error::NonFiniteValue {
                what: "relation triple value",
            });
        }
        *self
            .by_year
            .entry(triple.year)
            .or_default()
            .entry((triple.ego, triple.alter))
            .or_insert(0.0) += triple.value;
        Ok(())
    }

    /// Relations observed in `year` as `(ego, alter, value)`.
    pub fn year(&self, year: Year) -> impl Iterator<Item = (&CountryId, &CountryId, f64)> {
        self.by_year
            .get(&year)
            .into_iter()
            .flat_map(|rows| rows.iter().map(|((ego, alter), &value)| (ego, alter, value)))
    }

    /// Keep only triples matching `keep`; years left empty are removed.
    pub fn filtered<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(Year, &CountryId, &CountryId, f64) -> bool,
    {
        let by_year = self
            .by_year
            .iter()
            .filter_map(|(&year, rows)| {
                let rows: BTreeMap<(CountryId, CountryId), f64> = rows
                    .iter()
                    .filter(|&((ego, alter), &value)| keep(year, ego, alter, value))
                    .map(|(key, &value)| (key.clone(), value))
                    .collect();
                (!rows.is_empty()).then_some((year, rows))
            })
            .collect();
        Self { by_year }
    }

    /// Triples whose ego and alter are both in `vocabulary`.
    pub fn within(&self, vocabulary: &Vocabulary) -> Self {
        self.filtered(|_, ego, alter, _| vocabulary.contains(ego) && vocabulary.contains(alter))
    }

    /// Triples with a strictly positive value.
    pub fn positive(&self) -> Self {
        self.filtered(|_, _, _, value| value > 0.0)
    }

    /// Years with at least one relation, ascending.
    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.by_year.keys().copied()
    }

    /// First and last year present.
    pub fn year_range(&self) -> Option<(Year, Year)> {
        let first = self.by_year.keys().next()?;
        let last = self.by_year.keys().next_back()?;
        Some((*first, *last))
    }

    /// Number of distinct `(year, ego, alter)` keys.
    pub fn len(&self) -> usize {
        self.by_year.values().map(BTreeMap::len).sum()
    }

    /// Whether no relations are stored.
    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }

    /// Every country appearing as ego or alter in any year.
    pub fn vocabulary(&self) -> Vocabulary {
        self.by_year
            .values()
            .flat_map(|rows| rows.keys())
            .flat_map(|(ego, alter)| [ego.clone(), alter.clone()])
            .collect()
    }
}

/// Which political entities exist in which year.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemMembership {
    members: BTreeMap<Year, BTreeSet<CountryId>>,
}

impl SystemMembership {
    /// Create an empty membership table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every vocabulary country exists in every year of `years`.
    ///
    /// Used when no membership data is available.
    pub fn uniform(vocabulary: &Vocabulary, years: RangeInclusive<Year>) -> Self {
        let all: BTreeSet<CountryId> = vocabulary.iter().cloned().collect();
        Self {
            members: years.map(|y| (y, all.clone())).collect(),
        }
    }

    /// Record that `country` exists in `year`.
    pub fn insert(&mut self, year: Year, country: impl Into<CountryId>) {
        let _ = self.members.entry(year).or_default().insert(country.into());
    }

    /// Members in `year`.
    pub fn members(&self, year: Year) -> impl Iterator<Item = &CountryId> {
        self.members.get(&year).into_iter().flatten()
    }

    /// Every ordered pair of distinct co-existing members, for each year in
    /// `start..=end`. Empty when `start > end`.
    pub fn dyads(&self, start: Year, end: Year) -> impl Iterator<Item = Dyad> + '_ {
        let years = if start <= end {
            self.members.range(start..=end)
        } else {
            self.members.range(start..start)
        };
        years.flat_map(|(&year, members)| {
            members.iter().flat_map(move |ego| {
                members
                    .iter()
                    .filter(move |alter| *alter != ego)
                    .map(move |alter| Dyad {
                        year,
                        ego: ego.clone(),
                        alter: alter.clone(),
                    })
            })
        })
    }
}

/// Everything one pipeline run reads.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    vocabulary: Vocabulary,
    triples: TripleTable,
    membership: SystemMembership,
}

impl AnalysisContext {
    /// Bundle explicitly supplied inputs.
    pub fn new(vocabulary: Vocabulary, triples: TripleTable, membership: SystemMembership) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(Self {
            vocabulary,
            triples,
            membership,
        })
    }

    /// Derive vocabulary and a uniform membership table from the triples.
    pub fn from_triples(triples: TripleTable) -> Result<Self> {
        let (start, end) = triples.year_range().ok_or(Error::EmptyInput)?;
        let vocabulary = triples.vocabulary();
        let membership = SystemMembership::uniform(&vocabulary, start..=end);
        Self::new(vocabulary, triples, membership)
    }

    /// The analysis vocabulary.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The relation triples.
    pub fn triples(&self) -> &TripleTable {
        &self.triples
    }

    /// The system-membership table.
    pub fn membership(&self) -> &SystemMembership {
        &self.membership
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_keys_are_summed() -> Result<()> {
        let table = TripleTable::from_triples([
            RelationTriple::new(2000, "A", "B", 2.0),
            RelationTriple::new(2000, "A", "B", 3.0),
            RelationTriple::new(2001, "A", "B", 1.0),
        ])?;
        assert_eq!(table.len(), 2);
        let rows: Vec<_> = table.year(2000).collect();
        assert_eq!(rows.len(), 1);
        assert!((rows[0].2 - 5.0).abs() < 1e-12);
        assert_eq!(table.year_range(), Some((2000, 2001)));
        Ok(())
    }

    #[test]
    fn test_vocabulary_and_positive_filters() -> Result<()> {
        let table = TripleTable::from_triples([
            RelationTriple::new(2000, "A", "B", 2.0),
            RelationTriple::new(2000, "A", "Z", 3.0),
            RelationTriple::new(2001, "B", "A", -1.0),
        ])?;
        let vocab = Vocabulary::new(["A", "B"]);
        assert_eq!(table.within(&vocab).len(), 2);

        let positive = table.positive();
        assert_eq!(positive.len(), 2);
        assert_eq!(positive.year_range(), Some((2000, 2000)));
        Ok(())
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let err = TripleTable::from_triples([RelationTriple::new(2000, "A", "B", f64::NAN)]);
        assert!(matches!(err, Err(Error::NonFiniteValue { .. })));
    }

    #[test]
    fn test_missing_year_is_empty() {
        let table = TripleTable::new();
        assert_eq!(table.year(1999).count(), 0);
        assert!(table.year_range().is_none());
    }

    #[test]
    fn test_dyads_are_permutations_of_members() {
        let mut sm = SystemMembership::new();
        for c in ["A", "B", "C"] {
            sm.insert(2000, c);
        }
        sm.insert(2001, "A");
        sm.insert(2001, "B");
        sm.insert(2005, "A");

        let dyads: Vec<Dyad> = sm.dyads(2000, 2001).collect();
        // 3*2 ordered pairs in 2000, 2*1 in 2001
        assert_eq!(dyads.len(), 8);
        assert!(dyads.iter().all(|d| d.ego != d.alter));
        assert!(dyads.contains(&Dyad::new(2001, "B", "A")));
        assert!(!dyads.iter().any(|d| d.year == 2005));
    }

    #[test]
    fn test_context_from_triples_derives_vocabulary() -> Result<()> {
        let triples = TripleTable::from_triples([
            RelationTriple::new(1990, "A", "B", 1.0),
            RelationTriple::new(1992, "C", "A", 1.0),
        ])?;
        let ctx = AnalysisContext::from_triples(triples)?;
        assert_eq!(ctx.vocabulary().len(), 3);
        assert_eq!(ctx.membership().members(1991).count(), 3);
        Ok(())
    }
}
