//! Centrality measures over directed relation networks.
//!
//! A centrality assigns every node a score for how "powerful" its position
//! is. Hegemon designation compares *local* centrality (computed inside one
//! community) against a threshold; the *global* ranking over the whole
//! vocabulary is reported alongside the partition.
//!
//! ## Kinds
//!
//! | Kind | Name | Meaning |
//! |------|------|---------|
//! | [`OutDegree`] | `out-degree` | fraction of possible outgoing ties realised |
//! | [`OutDegreeWeighted`] | `out-degree-weighted` | raw sum of outgoing weights |
//! | [`Betweenness`] | `betweenness` | brokerage on shortest paths (Brandes) |
//! | [`Laplacian`] | `laplacian` | drop in Laplacian energy when the node is removed |
//! | [`PageRank`] | `pagerank` | PageRank on the **reversed** graph |
//!
//! PageRank runs on the reversed graph so that the flow it models goes from
//! recipients back to suppliers: a state that supplies many important
//! recipients ranks high.
//!
//! ## Ranking
//!
//! [`CentralityTable`] turns raw scores into ranks (descending, ties get the
//! average rank) and a status `|countries| / rank`, which is highest for
//! rank 1 and falls as rank worsens.
//!
//! ## Hierarchy
//!
//! [`global_reaching_centrality`] scores how hierarchically a directed
//! network is organised (Mones, Vicsek & Vicsek 2012). It is undefined for
//! edge-less networks and returns an error there instead of NaN.

mod betweenness;
mod degree;
mod laplacian;
mod pagerank;
mod reaching;
mod table;
mod traits;

pub use betweenness::Betweenness;
pub use degree::{OutDegree, OutDegreeWeighted};
pub use laplacian::Laplacian;
pub use pagerank::PageRank;
pub use reaching::{global_reaching_centrality, local_reaching_centrality};
pub use table::{CentralityRow, CentralityTable};
pub use traits::Centrality;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of supported centrality measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CentralityKind {
    /// Normalised out-degree.
    OutDegree,
    /// Sum of outgoing edge weights.
    OutDegreeWeighted,
    /// Shortest-path betweenness.
    Betweenness,
    /// Laplacian-energy centrality.
    Laplacian,
    /// PageRank on the reversed graph.
    PageRank,
}

impl CentralityKind {
    /// Every supported kind.
    pub const ALL: [CentralityKind; 5] = [
        CentralityKind::OutDegree,
        CentralityKind::OutDegreeWeighted,
        CentralityKind::Betweenness,
        CentralityKind::Laplacian,
        CentralityKind::PageRank,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            CentralityKind::OutDegree => "out-degree",
            CentralityKind::OutDegreeWeighted => "out-degree-weighted",
            CentralityKind::Betweenness => "betweenness",
            CentralityKind::Laplacian => "laplacian",
            CentralityKind::PageRank => "pagerank",
        }
    }

    /// Resolve the kind to its measure.
    pub fn measure(self) -> Box<dyn Centrality + Send + Sync> {
        match self {
            CentralityKind::OutDegree => Box::new(OutDegree),
            CentralityKind::OutDegreeWeighted => Box::new(OutDegreeWeighted),
            CentralityKind::Betweenness => Box::new(Betweenness::new()),
            CentralityKind::Laplacian => Box::new(Laplacian),
            CentralityKind::PageRank => Box::new(PageRank::new()),
        }
    }
}

impl Default for CentralityKind {
    fn default() -> Self {
        CentralityKind::OutDegree
    }
}

impl fmt::Display for CentralityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CentralityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CentralityKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::Unimplemented {
                kind: "centrality",
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for CentralityKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CentralityKind> for String {
    fn from(kind: CentralityKind) -> Self {
        kind.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in CentralityKind::ALL {
            assert_eq!(kind.name().parse::<CentralityKind>().unwrap(), kind);
            assert_eq!(kind.measure().name(), kind.name());
        }
    }

    #[test]
    fn test_unknown_kind_is_unimplemented() {
        let err = "eigenvector".parse::<CentralityKind>().unwrap_err();
        assert!(matches!(err, Error::Unimplemented { kind: "centrality", .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_kind_deserializes_from_name() {
        let kind: CentralityKind = serde_json::from_str("\"pagerank\"").unwrap();
        assert_eq!(kind, CentralityKind::PageRank);
        assert!(serde_json::from_str::<CentralityKind>("\"closeness\"").is_err());
    }
}
