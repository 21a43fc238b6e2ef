use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::release::Release;
use crate::graph::index::ReleaseIndex;
use crate::graph::ops::{parse_timestamp, LatestTracker};
use crate::graph::{NodeId, ReleaseGraph};

pub const PAGE_RANK_DAMPING: f64 = 0.85;
pub const PAGE_RANK_TOLERANCE: f64 = 0.01;

/// Every release reachable from the given fingerprint by forward edges, in
/// depth-first pre-order with the root first. Unknown fingerprints, and
/// fingerprints whose node a projection removed, yield an empty result.
pub fn transitive_dependencies(
    graph: &ReleaseGraph,
    index: &ReleaseIndex,
    fingerprint: &str,
) -> Vec<Release> {
    let Some(root) = index
        .node_for_fingerprint(fingerprint)
        .filter(|id| graph.contains(*id))
    else {
        return Vec::new();
    };
    let mut result = Vec::new();
    let mut visited = HashSet::from([root]);
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        if let Some(release) = graph.node(current) {
            result.push(release.clone());
        }
        for dependency in graph.dependencies_of(current) {
            if visited.insert(dependency) {
                stack.push(dependency);
            }
        }
    }
    result
}

/// The transitive walk reduced to the newest release per package name
/// (later timestamp wins, ties break on higher semver), root first and the
/// remainder sorted by package name. Releases whose timestamp does not
/// parse are skipped: this is a derived view, not a structural mutation.
pub fn latest_transitive_dependencies(
    graph: &ReleaseGraph,
    index: &ReleaseIndex,
    fingerprint: &str,
) -> Vec<Release> {
    let walk = transitive_dependencies(graph, index, fingerprint);
    let Some((root, dependencies)) = walk.split_first() else {
        return Vec::new();
    };

    let mut tracker = LatestTracker::new();
    for release in dependencies {
        let Ok(published) = parse_timestamp(release) else {
            continue;
        };
        tracker.offer(&release.name, &release.version, published, release.clone());
    }

    let mut latest: Vec<Release> = tracker.into_values().collect();
    latest.sort_by(|a, b| a.name.cmp(&b.name));

    let mut result = Vec::with_capacity(latest.len() + 1);
    result.push(root.clone());
    result.extend(latest);
    result
}

/// Sparse PageRank over the directed graph. Dangling mass is redistributed
/// uniformly; iteration stops when the L1 delta drops below `tolerance`.
/// Scores sum to approximately one.
pub fn page_rank(graph: &ReleaseGraph, damping: f64, tolerance: f64) -> HashMap<NodeId, f64> {
    let ids: Vec<NodeId> = graph.node_ids().collect();
    let n = ids.len();
    if n == 0 {
        return HashMap::new();
    }
    let position: HashMap<NodeId, usize> = ids
        .iter()
        .copied()
        .enumerate()
        .map(|(position, id)| (id, position))
        .collect();
    let out_degree: Vec<usize> = ids
        .iter()
        .map(|id| graph.dependencies_of(*id).count())
        .collect();
    let incoming: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| {
            graph
                .dependents_of(*id)
                .map(|dependent| position[&dependent])
                .collect()
        })
        .collect();

    let uniform = 1.0 / n as f64;
    let mut ranks = vec![uniform; n];
    loop {
        let dangling: f64 = (0..n)
            .filter(|node| out_degree[*node] == 0)
            .map(|node| ranks[node])
            .sum();
        let base = (1.0 - damping) / n as f64 + damping * dangling / n as f64;
        let next: Vec<f64> = (0..n)
            .map(|node| {
                incoming[node]
                    .iter()
                    .map(|&source| damping * ranks[source] / out_degree[source] as f64)
                    .sum::<f64>()
                    + base
            })
            .collect();
        let delta: f64 = ranks
            .iter()
            .zip(&next)
            .map(|(old, new)| (old - new).abs())
            .sum();
        ranks = next;
        if delta < tolerance {
            break;
        }
    }
    ids.into_iter().zip(ranks).collect()
}

/// Brandes' betweenness centrality over unweighted directed edges.
/// Unnormalized; every node gets an entry, including zero scores.
pub fn betweenness(graph: &ReleaseGraph) -> HashMap<NodeId, f64> {
    let ids: Vec<NodeId> = graph.node_ids().collect();
    let n = ids.len();
    let position: HashMap<NodeId, usize> = ids
        .iter()
        .copied()
        .enumerate()
        .map(|(position, id)| (id, position))
        .collect();
    let adjacency: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| {
            graph
                .dependencies_of(*id)
                .map(|dependency| position[&dependency])
                .collect()
        })
        .collect();

    let mut centrality = vec![0.0; n];
    for source in 0..n {
        let mut order = Vec::new();
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut paths = vec![0.0_f64; n];
        let mut distance = vec![-1_i64; n];
        paths[source] = 1.0;
        distance[source] = 0;

        let mut queue = VecDeque::from([source]);
        while let Some(current) = queue.pop_front() {
            order.push(current);
            for &next in &adjacency[current] {
                if distance[next] < 0 {
                    distance[next] = distance[current] + 1;
                    queue.push_back(next);
                }
                if distance[next] == distance[current] + 1 {
                    paths[next] += paths[current];
                    predecessors[next].push(current);
                }
            }
        }

        let mut dependency = vec![0.0_f64; n];
        while let Some(sink) = order.pop() {
            for &via in &predecessors[sink] {
                dependency[via] += paths[via] / paths[sink] * (1.0 + dependency[sink]);
            }
            if sink != source {
                centrality[sink] += dependency[sink];
            }
        }
    }
    ids.into_iter().zip(centrality).collect()
}
