use std::borrow::Cow;
use std::collections::HashMap;

use semver::Version;

use crate::catalog::{Catalog, PackageRecord};
use crate::core::constraint::Constraint;
use crate::core::interval;
use crate::core::release::Release;
use crate::core::version::parse_version;
use crate::graph::index::ReleaseIndex;
use crate::graph::{NodeId, ReleaseGraph};
use crate::util::{output, parallel};

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Dependency constraints use the bracketed interval dialect and are
    /// translated before parsing.
    pub bracket_ranges: bool,
    /// Worker count for edge building; `None` or `Some(1)` builds
    /// sequentially.
    pub jobs: Option<usize>,
    /// Emit an erasable progress line on stderr while connecting packages.
    pub progress: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub packages: usize,
    pub releases: usize,
    pub edges: usize,
    /// Dependency entries dropped because their constraint did not parse.
    pub skipped_constraints: usize,
    /// Candidate versions dropped because they did not parse.
    pub skipped_versions: usize,
}

/// The constructed graph, its lookup index, and construction statistics.
#[derive(Debug)]
pub struct GraphBuild {
    pub graph: ReleaseGraph,
    pub index: ReleaseIndex,
    pub stats: BuildStats,
}

/// Materializes one node per (package, version) and one edge per satisfied
/// dependency constraint. Unparseable constraints and candidate versions
/// are skipped, never fatal; dependencies on unknown package names simply
/// contribute no edges.
pub fn build_graph(catalog: &Catalog, options: &BuildOptions) -> GraphBuild {
    let mut graph = ReleaseGraph::new();
    let mut index = ReleaseIndex::new();
    add_release_nodes(catalog, &mut graph, &mut index);

    let (candidates, skipped_versions) = parse_candidate_versions(&index);
    let mut stats = BuildStats {
        packages: catalog.package_count(),
        releases: graph.node_count(),
        skipped_versions,
        ..BuildStats::default()
    };

    let packages: Vec<&PackageRecord> = catalog.packages().collect();
    match options.jobs {
        Some(jobs) if jobs > 1 => {
            let results = parallel::map_bounded(packages, jobs, |package| {
                edges_for_package(package, &index, &candidates, options.bracket_ranges)
            });
            for (edges, skipped) in results {
                stats.skipped_constraints += skipped;
                for (from, to) in edges {
                    graph.set_edge(from, to);
                }
            }
        }
        _ => {
            let total = packages.len();
            for (done, package) in packages.into_iter().enumerate() {
                let (edges, skipped) =
                    edges_for_package(package, &index, &candidates, options.bracket_ranges);
                stats.skipped_constraints += skipped;
                for (from, to) in edges {
                    graph.set_edge(from, to);
                }
                if options.progress && (done % 512 == 0 || done + 1 == total) {
                    output::progress("connecting packages", done + 1, total);
                }
            }
            if options.progress {
                output::progress_done();
            }
        }
    }

    stats.edges = graph.edge_count();
    GraphBuild {
        graph,
        index,
        stats,
    }
}

fn add_release_nodes(catalog: &Catalog, graph: &mut ReleaseGraph, index: &mut ReleaseIndex) {
    for package in catalog.packages() {
        for (version, record) in &package.versions {
            let id = graph.add_node(Release::new(&package.name, version, &record.timestamp));
            if let Some(stale) = index.insert(&package.name, version, id) {
                // A repeated (name, version) keeps only the newest node.
                graph.remove_node(stale);
            }
        }
    }
}

/// Parses every known version of every package once, so constraint checks
/// do not re-parse candidates per dependent.
fn parse_candidate_versions(
    index: &ReleaseIndex,
) -> (HashMap<String, Vec<(String, Version)>>, usize) {
    let mut candidates = HashMap::new();
    let mut skipped = 0;
    for name in index.package_names() {
        let mut parsed = Vec::new();
        for raw in index.versions_of(name) {
            match parse_version(raw) {
                Ok(version) => parsed.push((raw.clone(), version)),
                Err(_) => skipped += 1,
            }
        }
        candidates.insert(name.to_string(), parsed);
    }
    (candidates, skipped)
}

fn edges_for_package(
    package: &PackageRecord,
    index: &ReleaseIndex,
    candidates: &HashMap<String, Vec<(String, Version)>>,
    bracket_ranges: bool,
) -> (Vec<(NodeId, NodeId)>, usize) {
    let mut edges = Vec::new();
    let mut skipped_constraints = 0;
    for (version, record) in &package.versions {
        let Some(from) = index.node_for(&package.name, version) else {
            continue;
        };
        for (dependency, raw) in &record.dependencies {
            let effective: Cow<'_, str> = if bracket_ranges {
                Cow::Owned(interval::translate(raw))
            } else {
                Cow::Borrowed(raw.as_str())
            };
            let constraint = match Constraint::parse(&effective) {
                Ok(constraint) => constraint,
                Err(_) => {
                    skipped_constraints += 1;
                    continue;
                }
            };
            let Some(versions) = candidates.get(dependency) else {
                continue;
            };
            for (candidate, parsed) in versions {
                if !constraint.check(parsed) {
                    continue;
                }
                if let Some(to) = index.node_for(dependency, candidate) {
                    if from != to {
                        edges.push((from, to));
                    }
                }
            }
        }
    }
    (edges, skipped_constraints)
}
