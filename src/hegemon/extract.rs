//! Hegemon search inside detected communities.

use super::{Community, Hegemon};
use crate::centrality::{global_reaching_centrality, CentralityTable};
use crate::community::YearPartition;
use crate::config::{FailurePolicy, PipelineConfig};
use crate::context::{AnalysisContext, Year};
use crate::country::CountryId;
use crate::error::Result;
use crate::network::NetworkBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A community (or whole unit) that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Observation year.
    pub year: Year,
    /// Resolution step.
    pub resolution_step: u32,
    /// Community index within the partition; `None` when detection failed.
    pub community: Option<usize>,
    /// Rendered error.
    pub message: String,
}

/// Analyse one community of `year`.
///
/// The local network is rebuilt from the triples restricted to `members`
/// rather than taken from the global network. Members whose local
/// centrality reaches `config.centrality_threshold` become hegemons, ordered
/// by descending centrality.
pub fn extract_community(
    ctx: &AnalysisContext,
    year: Year,
    members: Vec<CountryId>,
    resolution_step: u32,
    config: &PipelineConfig,
) -> Result<Community> {
    let builder = NetworkBuilder::new().with_drop_non_positive(config.drop_non_positive);
    let local = builder.directed(ctx.triples(), &members, year);

    let mut table = CentralityTable::compute(&local, &members, config.centrality, "local")?;
    if config.normalize_local_centrality {
        table = table.normalized_by_max();
    }
    let hierarchy_score = global_reaching_centrality(&local)?;

    let candidates: Vec<(CountryId, f64)> = table
        .sorted_descending()
        .into_iter()
        .filter(|row| row.centrality >= config.centrality_threshold)
        .map(|row| (row.country.clone(), row.centrality))
        .collect();

    let gated = config.hierarchy_gate && hierarchy_score <= config.hierarchy_threshold;
    let hegemons = if gated || candidates.is_empty() {
        None
    } else {
        Some(
            candidates
                .iter()
                .map(|(name, centrality)| {
                    let co_hegemons = candidates
                        .iter()
                        .filter(|(other, _)| other != name)
                        .map(|(other, _)| other.clone())
                        .collect();
                    let clientele = members.iter().filter(|m| *m != name).cloned().collect();
                    Hegemon::new(name.clone(), co_hegemons, clientele, *centrality)
                })
                .collect(),
        )
    };

    debug!(
        year,
        resolution_step,
        population = members.len(),
        hierarchy_score,
        hegemons = hegemons.as_ref().map_or(0, Vec::len),
        gated,
        "analysed community"
    );

    Ok(Community::new(
        members,
        hierarchy_score,
        f64::from(resolution_step) / 10.0,
        hegemons,
        year,
    ))
}

/// Analyse every community of a partition.
///
/// Configuration errors always propagate. Other errors propagate under
/// [`FailurePolicy::Abort`]; under [`FailurePolicy::Skip`] the community is
/// dropped and a [`Diagnostic`] is returned in its place.
pub fn extract_communities(
    ctx: &AnalysisContext,
    partition: &YearPartition,
    resolution_step: u32,
    config: &PipelineConfig,
) -> Result<(Vec<Community>, Vec<Diagnostic>)> {
    let year = partition.year();
    let mut communities = Vec::new();
    let mut diagnostics = Vec::new();

    for (index, members) in partition.communities().into_iter().enumerate() {
        match extract_community(ctx, year, members, resolution_step, config) {
            Ok(community) => communities.push(community),
            Err(e) if e.is_configuration() || config.failure_policy == FailurePolicy::Abort => {
                return Err(e)
            }
            Err(e) => {
                warn!(year, resolution_step, community = index, error = %e, "skipping community");
                diagnostics.push(Diagnostic {
                    year,
                    resolution_step,
                    community: Some(index),
                    message: e.to_string(),
                });
            }
        }
    }
    Ok((communities, diagnostics))
}
