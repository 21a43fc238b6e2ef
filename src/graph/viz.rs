use crate::graph::ReleaseGraph;

/// Renders the graph as a GraphViz digraph: one labeled line per release,
/// one line per edge. Output is sorted by node id so repeated runs diff
/// cleanly.
pub fn render_dot(graph: &ReleaseGraph, name: &str) -> String {
    let mut out = format!("digraph \"{}\" {{\n", escape_dot_label(name));
    let mut nodes: Vec<_> = graph.nodes().collect();
    nodes.sort_by_key(|(id, _)| *id);
    for (id, release) in nodes {
        out.push_str(&format!(
            "  {} [label=\"{}\\n{}\\n{}\"];\n",
            id.value(),
            escape_dot_label(&release.name),
            escape_dot_label(&release.version),
            escape_dot_label(&release.timestamp)
        ));
    }
    let mut edges: Vec<_> = graph.edges().collect();
    edges.sort();
    for (from, to) in edges {
        out.push_str(&format!("  {} -> {};\n", from.value(), to.value()));
    }
    out.push_str("}\n");
    out
}

fn escape_dot_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use crate::core::release::Release;
    use crate::graph::viz::render_dot;
    use crate::graph::ReleaseGraph;

    #[test]
    fn renders_nodes_and_edges() {
        let mut graph = ReleaseGraph::new();
        let a = graph.add_node(Release::new("a", "1.0.0", "2020-01-01T00:00:00Z"));
        let b = graph.add_node(Release::new("b", "2.0.0", "2019-01-01T00:00:00Z"));
        graph.set_edge(a, b);

        let dot = render_dot(&graph, "releases");
        assert!(dot.starts_with("digraph \"releases\" {"));
        assert!(dot.contains(&format!(
            "  {} [label=\"a\\n1.0.0\\n2020-01-01T00:00:00Z\"];\n",
            a.value()
        )));
        assert!(dot.contains(&format!("  {} -> {};\n", a.value(), b.value())));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn quotes_in_labels_are_escaped() {
        let mut graph = ReleaseGraph::new();
        graph.add_node(Release::new("we\"ird", "1.0.0", "2020-01-01T00:00:00Z"));
        let dot = render_dot(&graph, "releases");
        assert!(dot.contains("we\\\"ird"));
    }
}
