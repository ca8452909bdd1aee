//! Durable hegemons.

use super::HegemonyScoreTable;
use crate::config::TopConfig;
use crate::context::Year;
use crate::country::CountryId;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Qualifying-client counts per hegemon and year.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HegemonyTopTable {
    years: Vec<Year>,
    rows: BTreeMap<CountryId, Vec<u32>>,
}

impl HegemonyTopTable {
    /// Years with at least one qualifying client anywhere, ascending.
    pub fn years(&self) -> &[Year] {
        &self.years
    }

    /// Client counts per hegemon, aligned with [`years`](Self::years).
    pub fn rows(&self) -> &BTreeMap<CountryId, Vec<u32>> {
        &self.rows
    }

    /// Counts of one hegemon.
    pub fn counts(&self, hegemon: &CountryId) -> Option<&[u32]> {
        self.rows.get(hegemon).map(Vec::as_slice)
    }

    /// Retained hegemons.
    pub fn hegemons(&self) -> impl Iterator<Item = &CountryId> {
        self.rows.keys()
    }

    /// Whether no hegemon was retained.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep hegemons that are significant both per year and over all years.
///
/// A client counts for `(year, hegemon)` when its score in `column` exceeds
/// `one_year_threshold`. Counts are pivoted to one row per hegemon and one
/// column per year, missing cells zero, and rows whose total does not
/// exceed `all_time_threshold` are dropped.
pub fn hegemony_top(table: &HegemonyScoreTable, column: &str, config: &TopConfig) -> Result<HegemonyTopTable> {
    config.validate()?;
    let idx = table
        .column_index(column)
        .ok_or_else(|| Error::invalid("column", format!("no column named '{column}'")))?;

    let mut counts: BTreeMap<(CountryId, Year), u32> = BTreeMap::new();
    for (dyad, values) in table.rows() {
        if values[idx] > config.one_year_threshold {
            *counts.entry((dyad.ego.clone(), dyad.year)).or_insert(0) += 1;
        }
    }

    let years: Vec<Year> = counts
        .keys()
        .map(|(_, year)| *year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut pivot: BTreeMap<CountryId, Vec<u32>> = BTreeMap::new();
    for ((ego, year), n) in counts {
        let Ok(pos) = years.binary_search(&year) else { continue };
        pivot.entry(ego).or_insert_with(|| vec![0; years.len()])[pos] = n;
    }

    let candidates = pivot.len();
    pivot.retain(|_, row| f64::from(row.iter().sum::<u32>()) > config.all_time_threshold);
    info!(
        column,
        candidates,
        retained = pivot.len(),
        years = years.len(),
        "filtered durable hegemons"
    );

    Ok(HegemonyTopTable { years, rows: pivot })
}
