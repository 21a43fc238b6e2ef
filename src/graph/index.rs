use std::collections::HashMap;

use crate::core::release::fingerprint;
use crate::graph::NodeId;

/// Secondary lookup maps built alongside the graph: release fingerprint to
/// node id, and package name to the versions the catalog declares for it.
/// Both are keyed by the full strings, so lookups cannot collide.
#[derive(Debug, Default)]
pub struct ReleaseIndex {
    fingerprint_to_node: HashMap<String, NodeId>,
    name_to_versions: HashMap<String, Vec<String>>,
}

impl ReleaseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a release. A repeated fingerprint keeps the latest node id
    /// and returns the displaced one.
    pub(crate) fn insert(&mut self, name: &str, version: &str, id: NodeId) -> Option<NodeId> {
        let previous = self.fingerprint_to_node.insert(fingerprint(name, version), id);
        if previous.is_none() {
            self.name_to_versions
                .entry(name.to_string())
                .or_default()
                .push(version.to_string());
        }
        previous
    }

    pub fn node_for(&self, name: &str, version: &str) -> Option<NodeId> {
        self.node_for_fingerprint(&fingerprint(name, version))
    }

    pub fn node_for_fingerprint(&self, fingerprint: &str) -> Option<NodeId> {
        self.fingerprint_to_node.get(fingerprint).copied()
    }

    /// Every version the catalog declared for the package, or an empty
    /// slice for unknown names.
    pub fn versions_of(&self, name: &str) -> &[String] {
        self.name_to_versions
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.name_to_versions.keys().map(String::as_str)
    }

    pub fn release_count(&self) -> usize {
        self.fingerprint_to_node.len()
    }
}
