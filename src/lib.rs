//! # hegemony
//!
//! Local hegemony detection in yearly networks of directed country relations
//! (arms transfers, trade, aid).
//!
//! For each year the relations form a directed weighted network over a fixed
//! vocabulary of countries. Community detection on its undirected projection
//! finds local systems; inside each system, members whose local centrality
//! passes a threshold are *hegemons* and the other members their clientele.
//! Sweeping the detection resolution and counting how often each
//! `(hegemon, client)` pair recurs gives a longitudinal hegemony score.
//!
//! ```text
//! TripleTable ─► NetworkBuilder ─► community::partition_year
//!                                        │
//!             hegemon::extract_communities (local network, centrality, GRC)
//!                                        │
//!             hegemony_scores ─► hegemony_top
//! ```
//!
//! [`pipeline::run`] drives the whole chain from an [`AnalysisContext`] and a
//! [`PipelineConfig`]. The `parallel` feature runs (year, resolution) units
//! on rayon; the `cli` feature builds the `hegemony` binary.

pub mod centrality;
pub mod community;
pub mod config;
pub mod context;
pub mod country;
/// Error types used across `hegemony`.
pub mod error;
pub mod hegemon;
pub mod io;
pub mod network;
pub mod pipeline;


pub use centrality::{global_reaching_centrality, CentralityKind, CentralityRow, CentralityTable};
pub use community::{partition_year, Algorithm, CommunityDetection, DetectionParams, YearPartition};
pub use config::{FailurePolicy, PipelineConfig, TopConfig};
pub use context::{AnalysisContext, Dyad, RelationTriple, SystemMembership, TripleTable, Year};
pub use country::{CountryId, Vocabulary};
pub use error::{Error, Result};
pub use hegemon::{
    hegemony_increments, hegemony_scores, hegemony_top, Community, Diagnostic, Hegemon, HegemonyScoreTable,
    HegemonyTopTable, ScoreIncrement,
};
pub use network::{DirectedNetwork, NetworkBuilder, RelationNetwork, UndirectedNetwork};
pub use pipeline::{detect_local_communities, run, CommunityIndex, Detection, PipelineOutput};
