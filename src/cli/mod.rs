use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::core::release::{fingerprint, Release};
use crate::error::Result;
use crate::graph::builder::{build_graph, BuildOptions, GraphBuild};
use crate::graph::ops::{retain_latest, retain_latest_deps, retain_window};
use crate::graph::query::{
    betweenness, latest_transitive_dependencies, page_rank, transitive_dependencies,
    PAGE_RANK_DAMPING, PAGE_RANK_TOLERANCE,
};
use crate::graph::viz;
use crate::util::output;

#[derive(Parser, Debug)]
#[command(name = "depgraph")]
#[command(about = "Build and query a release-level dependency graph from a registry snapshot", long_about = None)]
pub struct Cli {
    /// Path to the catalog JSON document.
    #[arg(short, long)]
    pub input: PathBuf,
    /// Dependency constraints use the bracketed interval dialect.
    #[arg(long)]
    pub bracket_ranges: bool,
    /// Worker threads for edge building.
    #[arg(short, long)]
    pub jobs: Option<usize>,
    #[arg(short, long)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print node and edge counts for the (optionally filtered) graph.
    Stats(StatsArgs),
    /// List the transitive dependencies of one release.
    Deps(DepsArgs),
    /// Rank releases by a centrality metric.
    Rank(RankArgs),
    /// Write the graph as a GraphViz dot file.
    Dot(DotArgs),
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Keep only releases published at or after this RFC3339 instant.
    #[arg(long)]
    pub begin: Option<String>,
    /// Keep only releases published at or before this RFC3339 instant.
    #[arg(long)]
    pub end: Option<String>,
    /// Keep only the newest release of every package.
    #[arg(long)]
    pub latest_only: bool,
    /// Window filter, then keep the newest reachable release per package.
    #[arg(long)]
    pub latest_deps: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Package name of the root release.
    pub name: String,
    /// Version of the root release.
    pub version: String,
    /// Reduce the result to the newest release per package.
    #[arg(long)]
    pub latest: bool,
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct RankArgs {
    /// Centrality metric to compute.
    #[arg(long, value_enum, default_value = "pagerank")]
    pub metric: Metric,
    /// Number of releases to print.
    #[arg(long, default_value_t = 20)]
    pub top: usize,
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Metric {
    Pagerank,
    Betweenness,
}

#[derive(Args, Debug)]
pub struct DotArgs {
    /// Output path for the rendered digraph.
    #[arg(short, long)]
    pub output: PathBuf,
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Serialize)]
struct RankedRelease {
    #[serde(flatten)]
    release: Release,
    score: f64,
}

pub fn run(cli: Cli) -> Result<()> {
    let catalog = Catalog::from_path(&cli.input)?;
    if !cli.quiet {
        output::info(&format!(
            "read {} packages ({} releases) from {}",
            catalog.package_count(),
            catalog.release_count(),
            cli.input.display()
        ));
    }

    let options = BuildOptions {
        bracket_ranges: cli.bracket_ranges,
        jobs: cli.jobs,
        progress: !cli.quiet && console::Term::stderr().is_term(),
    };
    let mut build = build_graph(&catalog, &options);
    if !cli.quiet {
        output::info(&format!(
            "built graph: {} nodes, {} edges ({} constraints and {} versions skipped)",
            build.stats.releases,
            build.stats.edges,
            build.stats.skipped_constraints,
            build.stats.skipped_versions
        ));
    }

    match cli.command {
        Commands::Stats(args) => {
            apply_filters(&mut build, &args.filter)?;
            println!(
                "{} nodes, {} edges",
                build.graph.node_count(),
                build.graph.edge_count()
            );
        }
        Commands::Deps(args) => {
            apply_filters(&mut build, &args.filter)?;
            let root = fingerprint(&args.name, &args.version);
            let releases = if args.latest {
                latest_transitive_dependencies(&build.graph, &build.index, &root)
            } else {
                transitive_dependencies(&build.graph, &build.index, &root)
            };
            if releases.is_empty() {
                output::warn(&format!("release {root} is not in the graph"));
            }
            if args.json {
                println!("{}", serde_json::to_string_pretty(&releases).map_err(anyhow::Error::new)?);
            } else {
                for release in &releases {
                    println!("{release} ({})", release.timestamp);
                }
            }
        }
        Commands::Rank(args) => {
            apply_filters(&mut build, &args.filter)?;
            let scores = match args.metric {
                Metric::Pagerank => {
                    page_rank(&build.graph, PAGE_RANK_DAMPING, PAGE_RANK_TOLERANCE)
                }
                Metric::Betweenness => betweenness(&build.graph),
            };
            let mut ranked: Vec<RankedRelease> = scores
                .into_iter()
                .filter_map(|(id, score)| {
                    build.graph.node(id).map(|release| RankedRelease {
                        release: release.clone(),
                        score,
                    })
                })
                .collect();
            ranked.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.release.name.cmp(&b.release.name))
                    .then_with(|| a.release.version.cmp(&b.release.version))
            });
            ranked.truncate(args.top);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&ranked).map_err(anyhow::Error::new)?);
            } else {
                for entry in &ranked {
                    println!("{:.6} {}", entry.score, entry.release);
                }
            }
        }
        Commands::Dot(args) => {
            apply_filters(&mut build, &args.filter)?;
            let dot = viz::render_dot(&build.graph, "depgraph");
            fs::write(&args.output, dot)?;
            if !cli.quiet {
                output::info(&format!("wrote {}", args.output.display()));
            }
        }
    }

    Ok(())
}

fn apply_filters(build: &mut GraphBuild, filter: &FilterArgs) -> Result<()> {
    let window = match (&filter.begin, &filter.end) {
        (Some(begin), Some(end)) => Some((parse_instant(begin)?, parse_instant(end)?)),
        (None, None) => None,
        _ => return Err(anyhow!("--begin and --end must be given together").into()),
    };

    if filter.latest_deps {
        let (begin, end) =
            window.ok_or_else(|| anyhow!("--latest-deps requires --begin and --end"))?;
        retain_latest_deps(&mut build.graph, begin, end)?;
    } else if let Some((begin, end)) = window {
        retain_window(&mut build.graph, begin, end)?;
    }
    if filter.latest_only {
        retain_latest(&mut build.graph)?;
    }
    Ok(())
}

/// Accepts an RFC3339 instant, or a bare date meaning midnight UTC.
fn parse_instant(input: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant);
    }
    DateTime::parse_from_rfc3339(&format!("{input}T00:00:00Z"))
        .map_err(|err| anyhow!("invalid instant '{input}': {err}").into())
}

#[cfg(test)]
mod tests {
    use crate::cli::parse_instant;

    #[test]
    fn rfc3339_instants_parse() {
        assert!(parse_instant("2020-06-01T12:30:00Z").is_ok());
        assert!(parse_instant("2020-06-01T12:30:00+02:00").is_ok());
    }

    #[test]
    fn bare_dates_mean_midnight_utc() {
        let midnight = parse_instant("2020-06-01").expect("parse bare date");
        let explicit = parse_instant("2020-06-01T00:00:00Z").expect("parse explicit");
        assert_eq!(midnight, explicit);
    }

    #[test]
    fn nonsense_instants_error() {
        assert!(parse_instant("yesterday").is_err());
    }
}
