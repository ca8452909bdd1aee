//! Community detection algorithms for graphs.
//!
//! Given a yearly relation network, find natural groupings where countries
//! within groups are densely related, and relations between groups are
//! sparse. Detection runs on the undirected projection: structural proximity
//! is symmetric even when the relations themselves are not.
//!
//! ## The Modularity Objective
//!
//! Louvain and greedy modularity optimize **modularity** Q, which compares
//! the actual edge weight within communities to the expected weight in a
//! random graph with the same degree sequence:
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where:
//! - m = total edge weight (sum of all edges)
//! - A_ij = edge weight between i and j
//! - k_i = weighted degree of node i
//! - γ = resolution parameter
//! - δ(c_i, c_j) = 1 if i and j are in same community
//!
//! ## The Resolution Parameter γ
//!
//! - **γ = 1**: Standard modularity (default)
//! - **γ > 1**: Smaller communities (higher penalty for merging)
//! - **γ < 1**: Larger communities (lower penalty for merging)
//!
//! Hegemony scoring sweeps γ over a range and counts a hegemon once per
//! resolution it survives, so the sweep acts as an ensemble vote.
//!
//! ## Algorithms
//!
//! | [`Algorithm`] | Detector | Resolution | Output |
//! |---------------|----------|------------|--------|
//! | `louvain` | [`Louvain`] | yes | partition |
//! | `greedy_modularity` | [`GreedyModularity`] | yes | partition |
//! | `lukes` | [`Lukes`] | no (`max_size`) | partition |
//! | `k_clique` | [`KClique`] | no (`k`) | overlapping |
//!
//! ## References
//!
//! - Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! - Clauset, Newman, Moore (2004). "Finding community structure in very large networks."
//! - Lukes (1974). "Efficient algorithm for the partitioning of trees."
//! - Palla et al. (2005). "Uncovering the overlapping community structure of
//!   complex networks in nature and society."

mod greedy;
mod kclique;
mod louvain;
mod lukes;
mod partition;
mod traits;

pub use greedy::GreedyModularity;
pub use kclique::KClique;
pub use louvain::Louvain;
pub use lukes::Lukes;
pub use partition::{partition_year, Assignment, YearPartition};
pub use traits::{CommunityDetection, RelationGraph};

#[cfg(test)]
pub(crate) use traits::test_graph;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of supported community detection methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    /// Multi-level modularity optimisation.
    Louvain,
    /// Size-bounded tree partitioning.
    Lukes,
    /// Agglomerative modularity optimisation.
    GreedyModularity,
    /// Clique percolation.
    KClique,
}

/// Parameters of the non-resolution detectors and the shared seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Seed for Louvain visit order and greedy tie-breaks.
    pub seed: u64,
    /// Largest cluster Lukes may form.
    pub max_size: usize,
    /// Smallest clique size for percolation.
    pub clique_size: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            seed: 100,
            max_size: 100_000,
            clique_size: 5,
        }
    }
}

impl Algorithm {
    /// Every supported algorithm.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Louvain,
        Algorithm::Lukes,
        Algorithm::GreedyModularity,
        Algorithm::KClique,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Louvain => "louvain",
            Algorithm::Lukes => "lukes",
            Algorithm::GreedyModularity => "greedy_modularity",
            Algorithm::KClique => "k_clique",
        }
    }

    /// Whether the result depends on the resolution parameter.
    ///
    /// Resolution-insensitive algorithms run once per year.
    pub fn is_resolution_sensitive(self) -> bool {
        matches!(self, Algorithm::Louvain | Algorithm::GreedyModularity)
    }

    /// Resolve the algorithm to a detector.
    pub fn detector(self, resolution: f64, params: &DetectionParams) -> Box<dyn CommunityDetection + Send + Sync> {
        match self {
            Algorithm::Louvain => Box::new(
                Louvain::new()
                    .with_resolution(resolution)
                    .with_seed(params.seed),
            ),
            Algorithm::GreedyModularity => Box::new(
                GreedyModularity::new()
                    .with_resolution(resolution)
                    .with_seed(params.seed),
            ),
            Algorithm::Lukes => Box::new(Lukes::new(params.max_size)),
            Algorithm::KClique => Box::new(KClique::new(params.clique_size)),
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Louvain
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // "louvian" is the spelling used by older run configurations.
        if s == "louvian" {
            return Ok(Algorithm::Louvain);
        }
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| Error::Unimplemented {
                kind: "community detection",
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for Algorithm {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.name().to_string()
    }
}
