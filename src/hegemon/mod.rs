//! Hegemons, their communities, and longitudinal hegemony scores.
//!
//! Within each detected community, members whose local centrality reaches a
//! threshold are designated hegemons. Every other member is part of a
//! hegemon's clientele; this includes co-hegemons, so two co-hegemons count
//! each other as clients. When `k` hegemons share a community each holds
//! strength `1/k`.
//!
//! Scores accumulate `strength` per `(year, hegemon, client)` over every
//! resolution at which the relation is detected. [`hegemony_top`] then keeps
//! hegemons that are significant both per year and over the whole period.

mod extract;
mod scores;
mod top;

pub use extract::{extract_communities, extract_community, Diagnostic};
pub use scores::{hegemony_increments, hegemony_scores, HegemonyScoreTable, ScoreIncrement};
pub use top::{hegemony_top, HegemonyTopTable};

use crate::context::Year;
use crate::country::CountryId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A locally dominant state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hegemon {
    name: CountryId,
    co_hegemons: Vec<CountryId>,
    clientele: Vec<CountryId>,
    centrality: f64,
}

impl Hegemon {
    pub(crate) fn new(
        name: CountryId,
        co_hegemons: Vec<CountryId>,
        clientele: Vec<CountryId>,
        centrality: f64,
    ) -> Self {
        Self {
            name,
            co_hegemons,
            clientele,
            centrality,
        }
    }

    /// The hegemonic country.
    pub fn name(&self) -> &CountryId {
        &self.name
    }

    /// Other hegemons of the same community, by descending centrality.
    pub fn co_hegemons(&self) -> &[CountryId] {
        &self.co_hegemons
    }

    /// Every other member of the community, co-hegemons included.
    pub fn clientele(&self) -> &[CountryId] {
        &self.clientele
    }

    /// Local centrality that qualified this hegemon.
    pub fn centrality(&self) -> f64 {
        self.centrality
    }

    /// Equal share of influence: `1 / (|co_hegemons| + 1)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn strength(&self) -> f64 {
        1.0 / (self.co_hegemons.len() + 1) as f64
    }
}

impl fmt::Display for Hegemon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3})", self.name, self.centrality)
    }
}

/// One detected community of one year at one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    members: Vec<CountryId>,
    hierarchy_score: f64,
    resolution: f64,
    hegemons: Option<Vec<Hegemon>>,
    year: Year,
}

impl Community {
    pub(crate) fn new(
        members: Vec<CountryId>,
        hierarchy_score: f64,
        resolution: f64,
        hegemons: Option<Vec<Hegemon>>,
        year: Year,
    ) -> Self {
        Self {
            members,
            hierarchy_score,
            resolution,
            hegemons,
            year,
        }
    }

    /// Members in vocabulary order.
    pub fn members(&self) -> &[CountryId] {
        &self.members
    }

    /// Number of members.
    pub fn population(&self) -> usize {
        self.members.len()
    }

    /// Global reaching centrality of the community's directed network.
    pub fn hierarchy_score(&self) -> f64 {
        self.hierarchy_score
    }

    /// Resolution step rescaled to a decimal (`step / 10`).
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Hegemons, or `None` when no member qualified.
    pub fn hegemons(&self) -> Option<&[Hegemon]> {
        self.hegemons.as_deref()
    }

    /// Observation year.
    pub fn year(&self) -> Year {
        self.year
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} community at resolution {} of {} (hierarchy score = {:.3})",
            self.year,
            self.resolution,
            self.population(),
            self.hierarchy_score
        )?;
        match &self.hegemons {
            Some(hegemons) => {
                let names: Vec<String> = hegemons.iter().map(ToString::to_string).collect();
                write!(f, " with hegemons [{}]", names.join(", "))
            }
            None => write!(f, " without hegemons"),
        }
    }
}
