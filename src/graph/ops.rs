use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, FixedOffset};

use crate::core::release::Release;
use crate::core::version::parse_version;
use crate::graph::index::ReleaseIndex;
use crate::graph::{GraphError, NodeId, ReleaseGraph};

/// Parses a release's publish instant, surfacing a malformed timestamp as a
/// fatal error: the catalog is curated data and a bad timestamp means the
/// input is corrupt.
pub fn parse_timestamp(release: &Release) -> Result<DateTime<FixedOffset>, GraphError> {
    DateTime::parse_from_rfc3339(&release.timestamp).map_err(|source| {
        GraphError::MalformedTimestamp {
            fingerprint: release.fingerprint(),
            timestamp: release.timestamp.clone(),
            source,
        }
    })
}

/// True when `instant` lies in the closed interval `[begin, end]`.
pub fn in_window(
    instant: DateTime<FixedOffset>,
    begin: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> bool {
    instant >= begin && instant <= end
}

/// Removes every node published outside `[begin, end]`, together with all
/// incident edges.
pub fn retain_window(
    graph: &mut ReleaseGraph,
    begin: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<(), GraphError> {
    let mut stale = Vec::new();
    for (id, release) in graph.nodes() {
        let published = parse_timestamp(release)?;
        if !in_window(published, begin, end) {
            stale.push(id);
        }
    }
    for id in stale {
        graph.remove_node(id);
    }
    Ok(())
}

/// Keeps only the newest release of every package: later timestamp wins,
/// ties break on higher semver. Every other node is removed with its
/// incident edges.
pub fn retain_latest(graph: &mut ReleaseGraph) -> Result<(), GraphError> {
    let mut tracker = LatestTracker::new();
    for (id, release) in graph.nodes() {
        let published = parse_timestamp(release)?;
        tracker.offer(&release.name, &release.version, published, id);
    }
    let keep: HashSet<NodeId> = tracker.into_values().collect();
    let stale: Vec<NodeId> = graph.node_ids().filter(|id| !keep.contains(id)).collect();
    for id in stale {
        graph.remove_node(id);
    }
    Ok(())
}

/// Applies the window filter, then walks forward from every surviving root
/// and keeps only the newest reachable release per package name.
pub fn retain_latest_deps(
    graph: &mut ReleaseGraph,
    begin: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<(), GraphError> {
    retain_window(graph, begin, end)?;

    let mut tracker = LatestTracker::new();
    let roots: Vec<NodeId> = graph.node_ids().collect();
    for root in roots {
        let mut visited = HashSet::from([root]);
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if let Some(release) = graph.node(current) {
                let published = parse_timestamp(release)?;
                tracker.offer(&release.name, &release.version, published, current);
            }
            for dependency in graph.dependencies_of(current) {
                if visited.insert(dependency) {
                    stack.push(dependency);
                }
            }
        }
    }

    let keep: HashSet<NodeId> = tracker.into_values().collect();
    let stale: Vec<NodeId> = graph.node_ids().filter(|id| !keep.contains(id)).collect();
    for id in stale {
        graph.remove_node(id);
    }
    Ok(())
}

/// Legacy window filter: breadth-first from every in-window node, keeping
/// only edges whose dependency endpoint lies in the window and was
/// published strictly before its dependent. All other edges are stripped;
/// nodes are left in place.
pub fn retain_window_traversal(
    graph: &mut ReleaseGraph,
    begin: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<(), GraphError> {
    let (published, within) = window_membership(graph, begin, end)?;
    let mut connected = HashSet::new();
    for root in within.iter().copied().collect::<Vec<_>>() {
        mark_connected_edges(graph, &published, &within, root, &mut connected);
    }
    strip_unconnected_edges(graph, &connected);
    Ok(())
}

/// Single-root variant of the legacy filter. Unknown fingerprints are a
/// no-op.
pub fn retain_window_traversal_from(
    graph: &mut ReleaseGraph,
    index: &ReleaseIndex,
    fingerprint: &str,
    begin: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<(), GraphError> {
    let Some(root) = index
        .node_for_fingerprint(fingerprint)
        .filter(|id| graph.contains(*id))
    else {
        return Ok(());
    };
    let (published, within) = window_membership(graph, begin, end)?;
    let mut connected = HashSet::new();
    mark_connected_edges(graph, &published, &within, root, &mut connected);
    strip_unconnected_edges(graph, &connected);
    Ok(())
}

fn window_membership(
    graph: &ReleaseGraph,
    begin: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<(HashMap<NodeId, DateTime<FixedOffset>>, HashSet<NodeId>), GraphError> {
    let mut published = HashMap::new();
    let mut within = HashSet::new();
    for (id, release) in graph.nodes() {
        let instant = parse_timestamp(release)?;
        if in_window(instant, begin, end) {
            within.insert(id);
        }
        published.insert(id, instant);
    }
    Ok((published, within))
}

fn mark_connected_edges(
    graph: &ReleaseGraph,
    published: &HashMap<NodeId, DateTime<FixedOffset>>,
    within: &HashSet<NodeId>,
    root: NodeId,
    connected: &mut HashSet<(NodeId, NodeId)>,
) {
    let mut visited = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        for dependency in graph.dependencies_of(current) {
            if !within.contains(&dependency) {
                continue;
            }
            // The dependency cannot post-date its dependent.
            if published[&current] > published[&dependency] {
                connected.insert((current, dependency));
                if visited.insert(dependency) {
                    queue.push_back(dependency);
                }
            }
        }
    }
}

fn strip_unconnected_edges(graph: &mut ReleaseGraph, connected: &HashSet<(NodeId, NodeId)>) {
    let stale: Vec<(NodeId, NodeId)> = graph
        .edges()
        .filter(|edge| !connected.contains(edge))
        .collect();
    for (from, to) in stale {
        graph.remove_edge(from, to);
    }
}

/// Tracks the newest release per package name: later timestamp wins, ties
/// break on higher semver.
pub(crate) struct LatestTracker<T> {
    newest: HashMap<String, LatestCandidate<T>>,
}

struct LatestCandidate<T> {
    published: DateTime<FixedOffset>,
    version: String,
    value: T,
}

impl<T> LatestTracker<T> {
    pub(crate) fn new() -> Self {
        Self {
            newest: HashMap::new(),
        }
    }

    pub(crate) fn offer(
        &mut self,
        name: &str,
        version: &str,
        published: DateTime<FixedOffset>,
        value: T,
    ) {
        match self.newest.get_mut(name) {
            Some(current) => {
                if published > current.published
                    || (published == current.published && version_newer(version, &current.version))
                {
                    *current = LatestCandidate {
                        published,
                        version: version.to_string(),
                        value,
                    };
                }
            }
            None => {
                self.newest.insert(
                    name.to_string(),
                    LatestCandidate {
                        published,
                        version: version.to_string(),
                        value,
                    },
                );
            }
        }
    }

    pub(crate) fn into_values(self) -> impl Iterator<Item = T> {
        self.newest.into_values().map(|candidate| candidate.value)
    }
}

/// Semver comparison when both sides parse, lexicographic otherwise.
fn version_newer(candidate: &str, current: &str) -> bool {
    match (parse_version(candidate), parse_version(current)) {
        (Ok(a), Ok(b)) if a != b => a > b,
        _ => candidate > current,
    }
}
