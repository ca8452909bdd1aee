//! End-to-end hegemony analysis.
//!
//! ```text
//! triples ─► yearly networks ─► (year, resolution) units ─► communities
//!                                                             │
//!                        top ◄─ scores ◄─ increments ◄────────┘
//! ```
//!
//! Units are independent: each builds its detector from the configuration
//! (with the configured seed) and reads the shared context immutably, so the
//! parallel and sequential runs produce the same index. Scores are then
//! folded in `(year, step, community)` order.

use crate::community::partition_year;
use crate::config::{FailurePolicy, PipelineConfig, TopConfig};
use crate::context::{AnalysisContext, Year};
use crate::error::Result;
use crate::hegemon::{extract_communities, hegemony_scores, hegemony_top, Community, Diagnostic};
use crate::hegemon::{HegemonyScoreTable, HegemonyTopTable};
use crate::network::{DirectedNetwork, NetworkBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Communities by year, then resolution step.
pub type CommunityIndex = BTreeMap<Year, BTreeMap<u32, Vec<Community>>>;

/// Detected communities and what was skipped on the way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detection {
    /// Communities by year and resolution step.
    pub communities: CommunityIndex,
    /// Skipped communities and units.
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Communities by year and resolution step.
    pub communities: CommunityIndex,
    /// Hegemony scores per dyad.
    pub scores: HegemonyScoreTable,
    /// Durable hegemons.
    pub top: HegemonyTopTable,
    /// Skipped communities and units.
    pub diagnostics: Vec<Diagnostic>,
}

type UnitOutput = (Year, u32, Vec<Community>, Vec<Diagnostic>);

fn run_unit(
    ctx: &AnalysisContext,
    network: &DirectedNetwork,
    step: u32,
    config: &PipelineConfig,
) -> Result<UnitOutput> {
    let year = network.year();
    let detector = config
        .algorithm
        .detector(f64::from(step) / 10.0, &config.detection_params());

    let partition = match partition_year(network, detector.as_ref(), config.centrality) {
        Ok(partition) => partition,
        Err(e) if e.is_configuration() || config.failure_policy == FailurePolicy::Abort => return Err(e),
        Err(e) => {
            warn!(year, resolution_step = step, error = %e, "skipping detection unit");
            let diagnostic = Diagnostic {
                year,
                resolution_step: step,
                community: None,
                message: e.to_string(),
            };
            return Ok((year, step, Vec::new(), vec![diagnostic]));
        }
    };

    let (communities, diagnostics) = extract_communities(ctx, &partition, step, config)?;
    debug!(
        year,
        resolution_step = step,
        communities = communities.len(),
        skipped = diagnostics.len(),
        "finished unit"
    );
    Ok((year, step, communities, diagnostics))
}

/// Detect communities and their hegemons for every year and resolution.
///
/// Resolution-sensitive algorithms run once per configured step; the others
/// run once per year under step `0`. A year whose communities are all
/// singletons yields an empty list.
pub fn detect_local_communities(ctx: &AnalysisContext, config: &PipelineConfig) -> Result<Detection> {
    config.validate()?;
    let (start, end) = config.year_range(ctx)?;
    let networks = NetworkBuilder::new()
        .with_drop_non_positive(config.drop_non_positive)
        .yearly(ctx.triples(), ctx.vocabulary(), start, end);

    let steps = config.effective_steps();
    let units: Vec<(&DirectedNetwork, u32)> = networks
        .values()
        .flat_map(|network| steps.iter().map(move |&step| (network, step)))
        .collect();
    info!(
        start,
        end,
        algorithm = %config.algorithm,
        centrality = %config.centrality,
        units = units.len(),
        "detecting local communities"
    );

    #[cfg(feature = "parallel")]
    let outputs: Vec<UnitOutput> = if config.parallel {
        units
            .par_iter()
            .map(|&(network, step)| run_unit(ctx, network, step, config))
            .collect::<Result<_>>()?
    } else {
        units
            .iter()
            .map(|&(network, step)| run_unit(ctx, network, step, config))
            .collect::<Result<_>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let outputs: Vec<UnitOutput> = {
        if config.parallel {
            warn!("built without the `parallel` feature; running sequentially");
        }
        units
            .iter()
            .map(|&(network, step)| run_unit(ctx, network, step, config))
            .collect::<Result<_>>()?
    };

    let mut detection = Detection::default();
    for (year, step, communities, diagnostics) in outputs {
        let _ = detection
            .communities
            .entry(year)
            .or_default()
            .insert(step, communities);
        detection.diagnostics.extend(diagnostics);
    }
    info!(
        communities = detection.communities.values().flat_map(BTreeMap::values).map(Vec::len).sum::<usize>(),
        skipped = detection.diagnostics.len(),
        "detected local communities"
    );
    Ok(detection)
}

/// Every community of `index`, in `(year, step)` order.
pub fn iter_communities(index: &CommunityIndex) -> impl Iterator<Item = &Community> {
    index.values().flat_map(BTreeMap::values).flatten()
}

/// Detect, score and filter.
pub fn run(ctx: &AnalysisContext, config: &PipelineConfig, top: &TopConfig) -> Result<PipelineOutput> {
    top.validate()?;
    let (start, end) = config.year_range(ctx)?;
    let Detection {
        communities,
        diagnostics,
    } = detect_local_communities(ctx, config)?;

    let scores = hegemony_scores(
        iter_communities(&communities),
        ctx.membership(),
        start,
        end,
        &config.relation,
    )?;
    let top = hegemony_top(&scores, &config.relation, top)?;

    Ok(PipelineOutput {
        communities,
        scores,
        top,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::centrality::CentralityKind;
    use crate::community::Algorithm;
    use crate::context::{Dyad, RelationTriple, TripleTable};

    fn two_blocs() -> Result<AnalysisContext> {
        let mut triples = Vec::new();
        for year in 2000..=2002 {
            for (ego, alter, value) in [
                ("A", "B", 10.0),
                ("A", "C", 8.0),
                ("B", "C", 1.0),
                ("X", "Y", 5.0),
                ("X", "Z", 5.0),
                ("Y", "Z", 1.0),
                ("C", "Z", 0.5),
            ] {
                triples.push(RelationTriple::new(year, ego, alter, value));
            }
        }
        AnalysisContext::from_triples(TripleTable::from_triples(triples)?)
    }

    #[test]
    fn test_index_covers_years_and_steps() -> Result<()> {
        let ctx = two_blocs()?;
        let config = PipelineConfig::new().with_resolution_steps([5, 10]);
        let detection = detect_local_communities(&ctx, &config)?;

        assert_eq!(detection.communities.keys().copied().collect::<Vec<_>>(), [2000, 2001, 2002]);
        for steps in detection.communities.values() {
            assert_eq!(steps.keys().copied().collect::<Vec<_>>(), [5, 10]);
        }
        assert!(detection.diagnostics.is_empty());
        Ok(())
    }

    #[test]
    fn test_resolution_insensitive_uses_step_zero() -> Result<()> {
        let ctx = two_blocs()?;
        let config = PipelineConfig::new().with_algorithm(Algorithm::Lukes);
        let detection = detect_local_communities(&ctx, &config)?;
        for steps in detection.communities.values() {
            assert_eq!(steps.keys().copied().collect::<Vec<_>>(), [0]);
        }
        Ok(())
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() -> Result<()> {
        let ctx = two_blocs()?;
        let config = PipelineConfig::new().with_resolution_range(2, 20);
        let sequential = detect_local_communities(&ctx, &config)?;
        let parallel = detect_local_communities(&ctx, &config.clone().with_parallel(true))?;
        assert_eq!(sequential.communities, parallel.communities);
        Ok(())
    }

    #[test]
    fn test_run_end_to_end() -> Result<()> {
        let ctx = two_blocs()?;
        let config = PipelineConfig::new()
            .with_resolution_steps([10])
            .with_centrality(CentralityKind::OutDegreeWeighted)
            .with_normalized_local_centrality(true)
            .with_relation("arms");
        let output = run(&ctx, &config, &TopConfig::new(0.0, 0.0))?;

        assert_eq!(output.communities[&2000][&10].len(), 2);
        let a_b = output.scores.score(&Dyad::new(2000, "A", "B"), "arms");
        assert_eq!(a_b, Some(1.0));
        assert!(output.top.hegemons().any(|h| h.as_str() == "A"));
        Ok(())
    }

    #[test]
    fn test_output_serializes_to_json() -> Result<()> {
        let ctx = two_blocs()?;
        let config = PipelineConfig::new().with_resolution_steps([10]).with_relation("arms");
        let output = run(&ctx, &config, &TopConfig::new(0.0, 0.0))?;

        let json = serde_json::to_string(&output)?;
        let back: PipelineOutput = serde_json::from_str(&json)?;
        assert_eq!(back.scores.len(), output.scores.len());
        assert_eq!(back.scores.columns(), ["arms"]);
        assert_eq!(
            back.scores.score(&Dyad::new(2001, "X", "Y"), "arms"),
            output.scores.score(&Dyad::new(2001, "X", "Y"), "arms")
        );
        assert_eq!(back.top, output.top);
        assert_eq!(back.communities[&2000][&10].len(), output.communities[&2000][&10].len());
        Ok(())
    }

    #[test]
    fn test_invalid_config_fails_fast() -> Result<()> {
        let ctx = two_blocs()?;
        let config = PipelineConfig::new().with_centrality_threshold(f64::INFINITY);
        assert!(detect_local_communities(&ctx, &config).is_err());
        Ok(())
    }
}
