//! Country identifiers and the closed analysis vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Opaque country identifier, resolved upstream by name reconciliation.
///
/// Cloning is cheap; the name is shared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(Arc<str>);

impl CountryId {
    /// Create an identifier from a reconciled name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The reconciled name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CountryId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// The closed, year-independent set of countries valid for analysis.
///
/// Iteration order is the identifiers' sort order, which fixes node order in
/// every network built from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    countries: BTreeSet<CountryId>,
}

impl Vocabulary {
    /// Create a vocabulary from any collection of identifiers.
    pub fn new<I, C>(countries: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CountryId>,
    {
        Self {
            countries: countries.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of countries.
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, country: &CountryId) -> bool {
        self.countries.contains(country)
    }

    /// Countries in sort order.
    pub fn iter(&self) -> impl Iterator<Item = &CountryId> {
        self.countries.iter()
    }
}

impl<'a> IntoIterator for &'a Vocabulary {
    type Item = &'a CountryId;
    type IntoIter = std::collections::btree_set::Iter<'a, CountryId>;

    fn into_iter(self) -> Self::IntoIter {
        self.countries.iter()
    }
}

impl FromIterator<CountryId> for Vocabulary {
    fn from_iter<T: IntoIterator<Item = CountryId>>(iter: T) -> Self {
        Self {
            countries: iter.into_iter().collect(),
        }
    }
}
