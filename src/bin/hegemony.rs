//! Command-line hegemony analysis.
//!
//! Reads a triple CSV, optionally a vocabulary, a membership table and a
//! JSON configuration, runs detection and scoring, and writes
//! `scores.csv`, `top.csv`, `communities.json` and `diagnostics.json` into
//! the output directory.

use clap::Parser;
use hegemony::io::{read_membership, read_triples, read_vocabulary, write_communities, write_scores, write_top};
use hegemony::{
    run, Algorithm, AnalysisContext, CentralityKind, FailurePolicy, PipelineConfig, SystemMembership, TopConfig,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Detect local hegemons in yearly relation networks.
#[derive(Parser, Debug, Clone)]
#[command(name = "hegemony")]
#[command(about = "Detect local hegemons in yearly relation networks")]
struct Args {
    /// Relation triples (`year,ego,alter,value`)
    #[arg(long, env = "HEGEMONY_TRIPLES")]
    triples: PathBuf,

    /// Country vocabulary (`country`); defaults to every country in the triples
    #[arg(long, env = "HEGEMONY_VOCABULARY")]
    vocabulary: Option<PathBuf>,

    /// System membership (`year,country`); defaults to the vocabulary in every year
    #[arg(long, env = "HEGEMONY_MEMBERSHIP")]
    membership: Option<PathBuf>,

    /// JSON pipeline configuration; flags below override it
    #[arg(long, env = "HEGEMONY_CONFIG")]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(long, env = "HEGEMONY_OUT", default_value = "out")]
    out: PathBuf,

    /// First year
    #[arg(long)]
    year_start: Option<i32>,

    /// Last year (inclusive)
    #[arg(long)]
    year_end: Option<i32>,

    /// First resolution step (resolution = step / 10)
    #[arg(long)]
    res_start: Option<u32>,

    /// End of the resolution steps (exclusive)
    #[arg(long)]
    res_end: Option<u32>,

    /// Community detection: louvain, lukes, greedy_modularity, k_clique
    #[arg(long)]
    algorithm: Option<Algorithm>,

    /// Centrality: out-degree, out-degree-weighted, betweenness, laplacian, pagerank
    #[arg(long)]
    centrality: Option<CentralityKind>,

    /// Minimum local centrality of a hegemon
    #[arg(long)]
    centrality_threshold: Option<f64>,

    /// Only search for hegemons in communities whose hierarchy score exceeds this
    #[arg(long)]
    hierarchy_gate: Option<f64>,

    /// Divide local centralities by the community maximum
    #[arg(long)]
    normalize_local: bool,

    /// Abort on the first failing community instead of skipping it
    #[arg(long)]
    abort_on_error: bool,

    /// Run (year, resolution) units in parallel
    #[arg(long, env = "HEGEMONY_PARALLEL")]
    parallel: bool,

    /// Score column name
    #[arg(long)]
    relation: Option<String>,

    /// Score a client counts in a year above
    #[arg(long, default_value = "5")]
    one_year_threshold: f64,

    /// Qualifying clients per year a durable hegemon averages
    #[arg(long, default_value = "3")]
    min_clients_for_top: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn pipeline_config(&self) -> hegemony::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(start) = self.year_start {
            config.year_start = Some(start);
        }
        if let Some(end) = self.year_end {
            config.year_end = Some(end);
        }
        if self.res_start.is_some() || self.res_end.is_some() {
            config = config.with_resolution_range(self.res_start.unwrap_or(2), self.res_end.unwrap_or(20));
        }
        if let Some(algorithm) = self.algorithm {
            config = config.with_algorithm(algorithm);
        }
        if let Some(kind) = self.centrality {
            config = config.with_centrality(kind);
        }
        if let Some(threshold) = self.centrality_threshold {
            config = config.with_centrality_threshold(threshold);
        }
        if let Some(threshold) = self.hierarchy_gate {
            config = config.with_hierarchy_gate(threshold);
        }
        if self.normalize_local {
            config = config.with_normalized_local_centrality(true);
        }
        if self.abort_on_error {
            config = config.with_failure_policy(FailurePolicy::Abort);
        }
        if self.parallel {
            config = config.with_parallel(true);
        }
        if let Some(relation) = &self.relation {
            config = config.with_relation(relation.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

fn execute(args: &Args) -> hegemony::Result<()> {
    let config = args.pipeline_config()?;
    let triples = read_triples(&args.triples)?;

    let ctx = match (&args.vocabulary, &args.membership) {
        (None, None) => AnalysisContext::from_triples(triples)?,
        (vocabulary, membership) => {
            let vocabulary = match vocabulary {
                Some(path) => read_vocabulary(path)?,
                None => triples.vocabulary(),
            };
            let membership = match membership {
                Some(path) => read_membership(path)?,
                None => {
                    let (start, end) = triples.year_range().ok_or(hegemony::Error::EmptyInput)?;
                    SystemMembership::uniform(&vocabulary, start..=end)
                }
            };
            AnalysisContext::new(vocabulary, triples, membership)?
        }
    };

    let (start, end) = config.year_range(&ctx)?;
    let top = TopConfig::scaled(start, end, args.min_clients_for_top).with_one_year_threshold(args.one_year_threshold);
    let output = run(&ctx, &config, &top)?;

    std::fs::create_dir_all(&args.out)?;
    write_scores(&output.scores, args.out.join("scores.csv"))?;
    write_top(&output.top, args.out.join("top.csv"))?;
    write_communities(&output.communities, args.out.join("communities.json"))?;
    let diagnostics = BufWriter::new(File::create(args.out.join("diagnostics.json"))?);
    serde_json::to_writer_pretty(diagnostics, &output.diagnostics)?;

    info!(
        out = %args.out.display(),
        dyads = output.scores.len(),
        hegemons = output.top.hegemons().count(),
        skipped = output.diagnostics.len(),
        "analysis complete"
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hegemony={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = execute(&args) {
        error!("{e}");
        std::process::exit(if e.is_configuration() { 2 } else { 1 });
    }
}
