use crate::edge::Edge;

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Renders a DOT digraph listing every node followed by every arc.
pub fn render_dot<S: AsRef<str>>(nodes: &[S], edges: &[Edge]) -> String {
    let mut lines = Vec::with_capacity(nodes.len() + edges.len() + 2);
    lines.push("digraph G {".to_string());
    for node in nodes {
        lines.push(format!("  {};", quote(node.as_ref())));
    }
    for edge in edges {
        lines.push(format!("  {} -> {};", quote(&edge.source), quote(&edge.target)));
    }
    lines.push("}".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_escaped() {
        let dot = render_dot(&["a\"b"], &[]);
        assert_eq!(dot, "digraph G {\n  \"a\\\"b\";\n}");
    }
}
