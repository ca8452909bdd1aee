//! Longitudinal hegemony scores.
//!
//! Scoring is a fold: communities flatten into a lazy stream of
//! [`ScoreIncrement`]s, one per `(hegemon, client)` pair, which are summed
//! into a [`HegemonyScoreTable`] seeded with a zero row for every dyad of
//! co-existing countries. Because addition commutes, tables scored from
//! disjoint community sets can be [`merge`](HegemonyScoreTable::merge)d.

use super::Community;
use crate::context::{Dyad, SystemMembership, Year};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One hegemon's strength applied to one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreIncrement {
    /// `(year, hegemon, client)`.
    pub dyad: Dyad,
    /// Strength of the hegemon in its community.
    pub strength: f64,
}

/// Flatten communities into score increments.
///
/// Communities without hegemons contribute nothing.
pub fn hegemony_increments<'a, I>(communities: I) -> impl Iterator<Item = ScoreIncrement> + 'a
where
    I: IntoIterator<Item = &'a Community>,
    I::IntoIter: 'a,
{
    communities.into_iter().flat_map(|community| {
        let year = community.year();
        community.hegemons().unwrap_or_default().iter().flat_map(move |hegemon| {
            let strength = hegemon.strength();
            hegemon.clientele().iter().map(move |client| ScoreIncrement {
                dyad: Dyad::new(year, hegemon.name().clone(), client.clone()),
                strength,
            })
        })
    })
}

/// Scores per dyad, one column per relation.
///
/// Serialized rows are a list of `{year, ego, alter, values}` records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HegemonyScoreTable {
    columns: Vec<String>,
    #[serde(with = "dyad_rows")]
    rows: BTreeMap<Dyad, Vec<f64>>,
}

// JSON object keys must be strings, so the dyad key is spread into each row.
mod dyad_rows {
    use crate::context::{Dyad, Year};
    use crate::country::CountryId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct RowRef<'a> {
        year: Year,
        ego: &'a CountryId,
        alter: &'a CountryId,
        values: &'a [f64],
    }

    #[derive(Deserialize)]
    struct Row {
        year: Year,
        ego: CountryId,
        alter: CountryId,
        values: Vec<f64>,
    }

    pub(super) fn serialize<S>(rows: &BTreeMap<Dyad, Vec<f64>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(rows.iter().map(|(dyad, values)| RowRef {
            year: dyad.year,
            ego: &dyad.ego,
            alter: &dyad.alter,
            values: values.as_slice(),
        }))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<Dyad, Vec<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Vec::<Row>::deserialize(deserializer)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let dyad = Dyad {
                    year: row.year,
                    ego: row.ego,
                    alter: row.alter,
                };
                (dyad, row.values)
            })
            .collect())
    }
}

impl HegemonyScoreTable {
    /// A single zero column over every dyad of co-existing members in
    /// `start..=end`.
    pub fn baseline(membership: &SystemMembership, start: Year, end: Year, column: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into()],
            rows: membership.dyads(start, end).map(|d| (d, vec![0.0])).collect(),
        }
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of `column`.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Rows keyed by `(year, ego, alter)`, one value per column.
    pub fn rows(&self) -> &BTreeMap<Dyad, Vec<f64>> {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` for `dyad`.
    pub fn score(&self, dyad: &Dyad, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(dyad).map(|values| values[idx])
    }

    /// Add `increments` into `column`.
    ///
    /// Dyads outside the table get a new row, zero in the other columns.
    pub fn accumulate<I>(&mut self, column: &str, increments: I) -> Result<()>
    where
        I: IntoIterator<Item = ScoreIncrement>,
    {
        let idx = self
            .column_index(column)
            .ok_or_else(|| Error::invalid("column", format!("no column named '{column}'")))?;
        let width = self.columns.len();
        let mut outside = 0usize;
        for ScoreIncrement { dyad, strength } in increments {
            let row = self.rows.entry(dyad).or_insert_with(|| {
                outside += 1;
                vec![0.0; width]
            });
            row[idx] += strength;
        }
        if outside > 0 {
            debug!(column, outside, "scored dyads outside the membership baseline");
        }
        Ok(())
    }

    /// Sum two tables with the same columns.
    pub fn merge(mut self, other: Self) -> Result<Self> {
        if self.columns != other.columns {
            return Err(Error::invalid(
                "columns",
                format!("cannot merge {:?} into {:?}", other.columns, self.columns),
            ));
        }
        for (dyad, values) in other.rows {
            match self.rows.get_mut(&dyad) {
                Some(row) => row.iter_mut().zip(values).for_each(|(a, b)| *a += b),
                None => {
                    let _ = self.rows.insert(dyad, values);
                }
            }
        }
        Ok(self)
    }

    /// Place the columns of `other` beside those of `self`.
    ///
    /// Rows missing on either side are zero-filled.
    pub fn join(mut self, other: Self) -> Result<Self> {
        if let Some(dup) = other.columns.iter().find(|c| self.columns.contains(c)) {
            return Err(Error::invalid("columns", format!("'{dup}' appears in both tables")));
        }
        let left = self.columns.len();
        let right = other.columns.len();
        for row in self.rows.values_mut() {
            row.resize(left + right, 0.0);
        }
        for (dyad, values) in other.rows {
            let row = self.rows.entry(dyad).or_insert_with(|| vec![0.0; left + right]);
            row[left..].copy_from_slice(&values);
        }
        self.columns.extend(other.columns);
        Ok(self)
    }
}

/// Score every community of `communities` within `start..=end`.
///
/// Each hegemon adds its strength to `(year, hegemon, client)` once per
/// resolution at which it was found.
pub fn hegemony_scores<'a, I>(
    communities: I,
    membership: &SystemMembership,
    start: Year,
    end: Year,
    column: &str,
) -> Result<HegemonyScoreTable>
where
    I: IntoIterator<Item = &'a Community>,
    I::IntoIter: 'a,
{
    let mut table = HegemonyScoreTable::baseline(membership, start, end, column);
    let baseline = table.len();
    let increments = hegemony_increments(communities).filter(|inc| (start..=end).contains(&inc.dyad.year));
    table.accumulate(column, increments)?;
    info!(column, baseline, rows = table.len(), "scored hegemony");
    Ok(table)
}
