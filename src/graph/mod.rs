use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::core::release::Release;

pub mod builder;
pub mod index;
pub mod ops;
pub mod query;
pub mod viz;

/// Opaque, stable identifier of a node. Identifiers are assigned
/// monotonically and never reused for the lifetime of a graph; callers must
/// not assume contiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("malformed timestamp '{timestamp}' on release {fingerprint}: {source}")]
    MalformedTimestamp {
        fingerprint: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Directed graph over releases: an arena of nodes plus per-node outgoing
/// and incoming neighbor sets. An edge from `u` to `v` records that `u`
/// depends on `v`.
#[derive(Debug, Default)]
pub struct ReleaseGraph {
    nodes: HashMap<NodeId, Release>,
    outgoing: HashMap<NodeId, HashSet<NodeId>>,
    incoming: HashMap<NodeId, HashSet<NodeId>>,
    next_id: u64,
    edge_count: usize,
}

impl ReleaseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node for the release and returns its fresh identifier.
    pub fn add_node(&mut self, release: Release) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, release);
        self.outgoing.insert(id, HashSet::new());
        self.incoming.insert(id, HashSet::new());
        id
    }

    /// Inserts a directed edge. Duplicates coalesce; self-edges and edges
    /// with a missing endpoint are refused. Returns whether the edge is new.
    pub fn set_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        if from == to || !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return false;
        }
        let inserted = self
            .outgoing
            .get_mut(&from)
            .map(|neighbors| neighbors.insert(to))
            .unwrap_or(false);
        if inserted {
            if let Some(neighbors) = self.incoming.get_mut(&to) {
                neighbors.insert(from);
            }
            self.edge_count += 1;
        }
        inserted
    }

    /// Removes an edge if present; missing edges are a no-op.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) {
        let removed = self
            .outgoing
            .get_mut(&from)
            .map(|neighbors| neighbors.remove(&to))
            .unwrap_or(false);
        if removed {
            if let Some(neighbors) = self.incoming.get_mut(&to) {
                neighbors.remove(&from);
            }
            self.edge_count -= 1;
        }
    }

    /// Removes a node together with every incident edge.
    pub fn remove_node(&mut self, id: NodeId) {
        if self.nodes.remove(&id).is_none() {
            return;
        }
        if let Some(dependencies) = self.outgoing.remove(&id) {
            for to in dependencies {
                if let Some(neighbors) = self.incoming.get_mut(&to) {
                    neighbors.remove(&id);
                }
                self.edge_count -= 1;
            }
        }
        if let Some(dependents) = self.incoming.remove(&id) {
            for from in dependents {
                if let Some(neighbors) = self.outgoing.get_mut(&from) {
                    if neighbors.remove(&id) {
                        self.edge_count -= 1;
                    }
                }
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Release> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.outgoing
            .get(&from)
            .map(|neighbors| neighbors.contains(&to))
            .unwrap_or(false)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Release)> {
        self.nodes.iter().map(|(id, release)| (*id, release))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.outgoing
            .iter()
            .flat_map(|(from, neighbors)| neighbors.iter().map(move |to| (*from, *to)))
    }

    /// Forward neighbors: the releases `id` depends on.
    pub fn dependencies_of(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing.get(&id).into_iter().flatten().copied()
    }

    /// Reverse neighbors: the releases that depend on `id`.
    pub fn dependents_of(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming.get(&id).into_iter().flatten().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
