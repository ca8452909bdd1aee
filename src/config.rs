//! Run configuration.
//!
//! [`PipelineConfig`] covers detection and hegemon extraction;
//! [`TopConfig`] covers the durable-hegemon filter. Both deserialize from
//! JSON with every field optional, and both are checked by `validate`
//! before a run starts.

use crate::centrality::CentralityKind;
use crate::community::{Algorithm, DetectionParams};
use crate::context::{AnalysisContext, Year};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// What to do when one community cannot be analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log, record a diagnostic, and continue with the next community.
    #[default]
    Skip,
    /// Stop the run with the first error.
    Abort,
}

/// Configuration of community detection and hegemon extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// First year analysed; defaults to the first year in the triples.
    pub year_start: Option<Year>,
    /// Last year analysed (inclusive); defaults to the last year in the triples.
    pub year_end: Option<Year>,
    /// Integer resolution steps; detection runs at `step / 10`.
    pub resolution_steps: Vec<u32>,
    /// Measure used for local and global centrality.
    pub centrality: CentralityKind,
    /// Minimum local centrality of a hegemon.
    pub centrality_threshold: f64,
    /// Community detection method.
    pub algorithm: Algorithm,
    /// Hierarchy score a community must exceed when gating is on.
    pub hierarchy_threshold: f64,
    /// Skip hegemon search in communities at or below `hierarchy_threshold`.
    pub hierarchy_gate: bool,
    /// Divide local centralities by the community maximum.
    pub normalize_local_centrality: bool,
    /// Per-community failure handling.
    pub failure_policy: FailurePolicy,
    /// Seed for Louvain and greedy modularity.
    pub seed: u64,
    /// Run (year, resolution) units on the rayon pool.
    pub parallel: bool,
    /// Largest cluster Lukes may form.
    pub lukes_max_size: usize,
    /// Clique size for k-clique percolation.
    pub clique_size: usize,
    /// Ignore relations with `value <= 0`.
    pub drop_non_positive: bool,
    /// Column name of the score table.
    pub relation: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let detection = DetectionParams::default();
        Self {
            year_start: None,
            year_end: None,
            resolution_steps: (2..20).collect(),
            centrality: CentralityKind::default(),
            centrality_threshold: 0.5,
            algorithm: Algorithm::default(),
            hierarchy_threshold: 0.0,
            hierarchy_gate: false,
            normalize_local_centrality: false,
            failure_policy: FailurePolicy::default(),
            seed: detection.seed,
            parallel: false,
            lukes_max_size: detection.max_size,
            clique_size: detection.clique_size,
            drop_non_positive: true,
            relation: "hegemony".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON configuration file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Restrict the run to `start..=end`.
    pub fn with_years(mut self, start: Year, end: Year) -> Self {
        self.year_start = Some(start);
        self.year_end = Some(end);
        self
    }

    /// Resolution steps `start..end`, as integers.
    pub fn with_resolution_range(mut self, start: u32, end: u32) -> Self {
        self.resolution_steps = (start..end).collect();
        self
    }

    /// Explicit resolution steps.
    pub fn with_resolution_steps(mut self, steps: impl IntoIterator<Item = u32>) -> Self {
        self.resolution_steps = steps.into_iter().collect();
        self
    }

    /// Set the centrality measure.
    pub fn with_centrality(mut self, kind: CentralityKind) -> Self {
        self.centrality = kind;
        self
    }

    /// Set the hegemon threshold.
    pub fn with_centrality_threshold(mut self, threshold: f64) -> Self {
        self.centrality_threshold = threshold;
        self
    }

    /// Set the detection method.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enable the hierarchy gate at `threshold`.
    pub fn with_hierarchy_gate(mut self, threshold: f64) -> Self {
        self.hierarchy_gate = true;
        self.hierarchy_threshold = threshold;
        self
    }

    /// Divide local centralities by their community maximum.
    pub fn with_normalized_local_centrality(mut self, normalize: bool) -> Self {
        self.normalize_local_centrality = normalize;
        self
    }

    /// Set the per-community failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the detection seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run units in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the Lukes cluster bound.
    pub fn with_lukes_max_size(mut self, max_size: usize) -> Self {
        self.lukes_max_size = max_size;
        self
    }

    /// Set the k-clique size.
    pub fn with_clique_size(mut self, k: usize) -> Self {
        self.clique_size = k;
        self
    }

    /// Keep or drop relations with `value <= 0`.
    pub fn with_drop_non_positive(mut self, drop: bool) -> Self {
        self.drop_non_positive = drop;
        self
    }

    /// Set the score column name.
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    /// Parameters handed to the detector resolver.
    pub fn detection_params(&self) -> DetectionParams {
        DetectionParams {
            seed: self.seed,
            max_size: self.lukes_max_size,
            clique_size: self.clique_size,
        }
    }

    /// Resolution keys the detector runs under.
    ///
    /// Resolution-insensitive algorithms run once, under key `0`.
    pub fn effective_steps(&self) -> Vec<u32> {
        if self.algorithm.is_resolution_sensitive() {
            self.resolution_steps.clone()
        } else {
            vec![0]
        }
    }

    /// Inclusive year range, filling gaps from the triples of `ctx`.
    pub fn year_range(&self, ctx: &AnalysisContext) -> Result<(Year, Year)> {
        let observed = ctx.triples().year_range();
        let start = self.year_start.or(observed.map(|(s, _)| s)).ok_or(Error::EmptyInput)?;
        let end = self.year_end.or(observed.map(|(_, e)| e)).ok_or(Error::EmptyInput)?;
        if start > end {
            return Err(Error::invalid(
                "year_end",
                format!("{end} precedes year_start {start}"),
            ));
        }
        Ok((start, end))
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> Result<()> {
        if !self.centrality_threshold.is_finite() {
            return Err(Error::invalid("centrality_threshold", "must be finite"));
        }
        if !self.hierarchy_threshold.is_finite() {
            return Err(Error::invalid("hierarchy_threshold", "must be finite"));
        }
        if self.algorithm.is_resolution_sensitive() && self.resolution_steps.is_empty() {
            return Err(Error::invalid("resolution_steps", "at least one step is required"));
        }
        if let (Some(start), Some(end)) = (self.year_start, self.year_end) {
            if start > end {
                return Err(Error::invalid(
                    "year_end",
                    format!("{end} precedes year_start {start}"),
                ));
            }
        }
        if self.lukes_max_size == 0 {
            return Err(Error::invalid("lukes_max_size", "must be at least 1"));
        }
        if self.clique_size < 2 {
            return Err(Error::invalid("clique_size", "must be at least 2"));
        }
        if self.relation.is_empty() {
            return Err(Error::invalid("relation", "must not be empty"));
        }
        Ok(())
    }
}

/// Thresholds of the durable-hegemon filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopConfig {
    /// A client counts in a year when its score exceeds this.
    pub one_year_threshold: f64,
    /// A hegemon is kept when its client count summed over years exceeds this.
    pub all_time_threshold: f64,
}

impl Default for TopConfig {
    fn default() -> Self {
        Self {
            one_year_threshold: 5.0,
            all_time_threshold: 100.0,
        }
    }
}

impl TopConfig {
    /// Explicit thresholds.
    pub fn new(one_year_threshold: f64, all_time_threshold: f64) -> Self {
        Self {
            one_year_threshold,
            all_time_threshold,
        }
    }

    /// All-time threshold of `(end - start) * min_clients`.
    pub fn scaled(start: Year, end: Year, min_clients: u32) -> Self {
        Self {
            all_time_threshold: f64::from(end - start) * f64::from(min_clients),
            ..Self::default()
        }
    }

    /// Set the per-year threshold.
    pub fn with_one_year_threshold(mut self, threshold: f64) -> Self {
        self.one_year_threshold = threshold;
        self
    }

    /// Reject non-finite thresholds.
    pub fn validate(&self) -> Result<()> {
        if !self.one_year_threshold.is_finite() {
            return Err(Error::invalid("one_year_threshold", "must be finite"));
        }
        if !self.all_time_threshold.is_finite() {
            return Err(Error::invalid("all_time_threshold", "must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.resolution_steps.first(), Some(&2));
        assert_eq!(config.resolution_steps.last(), Some(&19));
        assert_eq!(config.seed, 100);
        assert!(!config.hierarchy_gate);
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_insensitive_algorithm_runs_once() {
        let config = PipelineConfig::new().with_algorithm(Algorithm::Lukes);
        assert_eq!(config.effective_steps(), vec![0]);
        let config = PipelineConfig::new().with_resolution_steps([10]);
        assert_eq!(config.effective_steps(), vec![10]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let nan = PipelineConfig::new().with_centrality_threshold(f64::NAN);
        assert!(matches!(
            nan.validate(),
            Err(Error::InvalidParameter { name: "centrality_threshold", .. })
        ));
        assert!(PipelineConfig::new().with_years(2001, 2000).validate().is_err());
        assert!(PipelineConfig::new().with_resolution_steps([]).validate().is_err());
        assert!(PipelineConfig::new().with_clique_size(1).validate().is_err());
    }

    #[test]
    fn test_top_scaled() {
        let top = TopConfig::scaled(1992, 2022, 3);
        assert_eq!(top.all_time_threshold, 90.0);
        assert_eq!(top.one_year_threshold, 5.0);
    }

    #[test]
    fn test_json_partial_config() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{"algorithm": "louvian", "centrality": "out-degree-weighted", "failure_policy": "abort"}}"#
        )?;
        let config = PipelineConfig::from_json_file(file.path())?;
        assert_eq!(config.algorithm, Algorithm::Louvain);
        assert_eq!(config.centrality, CentralityKind::OutDegreeWeighted);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.centrality_threshold, 0.5);
        Ok(())
    }

    #[test]
    fn test_json_unknown_algorithm_fails() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"algorithm": "girvan_newman"}}"#)?;
        assert!(matches!(PipelineConfig::from_json_file(file.path()), Err(Error::Json(_))));
        Ok(())
    }
}
