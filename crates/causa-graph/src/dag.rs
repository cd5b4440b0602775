use std::collections::{BTreeMap, BTreeSet};

use causa_core::errors::{CausalError, ErrorInfo};

use crate::edge::Edge;

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    NotVisited,
    Visiting,
    Done,
}

/// Directed acyclic adjustment graph spanning every table column.
///
/// Arcs are only accepted when they keep the graph acyclic, so every value of
/// this type is a DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentModel {
    nodes: Vec<String>,
    index: BTreeMap<String, usize>,
    parents: Vec<BTreeSet<usize>>,
    children: Vec<BTreeSet<usize>>,
    arcs: Vec<(usize, usize)>,
}

impl AdjustmentModel {
    /// Creates an arc-free model over the provided nodes.
    pub fn new<S: AsRef<str>>(nodes: &[S]) -> Result<Self, CausalError> {
        let mut index = BTreeMap::new();
        let mut names = Vec::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            let name = node.as_ref().to_string();
            if index.insert(name.clone(), idx).is_some() {
                return Err(CausalError::Structure(
                    ErrorInfo::new("duplicate-node", "node appears twice in the model")
                        .with_context("node", &name),
                ));
            }
            names.push(name);
        }
        Ok(Self {
            parents: vec![BTreeSet::new(); names.len()],
            children: vec![BTreeSet::new(); names.len()],
            nodes: names,
            index,
            arcs: Vec::new(),
        })
    }

    /// Creates a model and inserts every edge, failing on the first invalid arc.
    pub fn from_edges<S: AsRef<str>>(nodes: &[S], edges: &[Edge]) -> Result<Self, CausalError> {
        let mut model = Self::new(nodes)?;
        for edge in edges {
            model.add_arc(&edge.source, &edge.target)?;
        }
        Ok(model)
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Arcs in insertion order.
    pub fn edges(&self) -> Vec<Edge> {
        self.arcs
            .iter()
            .map(|&(u, v)| Edge::new(self.nodes[u].clone(), self.nodes[v].clone()))
            .collect()
    }

    /// Number of arcs.
    pub fn edge_count(&self) -> usize {
        self.arcs.len()
    }

    /// Returns whether the arc `source -> target` is present.
    pub fn has_arc(&self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&u), Some(&v)) => self.children[u].contains(&v),
            _ => false,
        }
    }

    /// Inserts `source -> target`, rejecting unknown nodes, self loops and cycles.
    ///
    /// Inserting an arc that is already present is a no-op.
    pub fn add_arc(&mut self, source: &str, target: &str) -> Result<(), CausalError> {
        let u = self.node_index(source)?;
        let v = self.node_index(target)?;
        if u == v {
            return Err(CausalError::Structure(
                ErrorInfo::new("self-loop", "an arc cannot connect a node to itself")
                    .with_context("node", source),
            ));
        }
        if self.children[u].contains(&v) {
            return Ok(());
        }
        if self.reaches(v, u) {
            return Err(CausalError::Structure(
                ErrorInfo::new("would-create-cycle", "operation would introduce a directed cycle")
                    .with_context("source", source)
                    .with_context("target", target),
            ));
        }
        self.children[u].insert(v);
        self.parents[v].insert(u);
        self.arcs.push((u, v));
        Ok(())
    }

    /// Direct parents of a node, in node order.
    pub fn parents(&self, name: &str) -> Result<Vec<String>, CausalError> {
        let idx = self.node_index(name)?;
        Ok(self.names(&self.parents[idx]))
    }

    /// Returns whether a directed path `from -> ... -> to` exists.
    pub fn has_directed_path(&self, from: &str, to: &str) -> Result<bool, CausalError> {
        let u = self.node_index(from)?;
        let v = self.node_index(to)?;
        Ok(u != v && self.reaches(u, v))
    }

    /// Full acyclicity check by depth-first search.
    pub fn is_acyclic(&self) -> bool {
        let mut states = vec![VisitState::NotVisited; self.nodes.len()];
        (0..self.nodes.len()).all(|node| !self.dfs_finds_cycle(node, &mut states))
    }

    fn dfs_finds_cycle(&self, node: usize, states: &mut [VisitState]) -> bool {
        match states[node] {
            VisitState::Visiting => return true,
            VisitState::Done => return false,
            VisitState::NotVisited => {}
        }
        states[node] = VisitState::Visiting;
        for &next in &self.children[node] {
            if self.dfs_finds_cycle(next, states) {
                return true;
            }
        }
        states[node] = VisitState::Done;
        false
    }

    fn reaches(&self, from: usize, to: usize) -> bool {
        from == to || self.closure(from, &self.children).contains(&to)
    }

    fn closure(&self, start: usize, links: &[BTreeSet<usize>]) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &next in &links[node] {
                if next != start && seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        seen
    }

    fn names(&self, ids: &BTreeSet<usize>) -> Vec<String> {
        ids.iter().map(|&idx| self.nodes[idx].clone()).collect()
    }

    fn node_index(&self, name: &str) -> Result<usize, CausalError> {
        self.index.get(name).copied().ok_or_else(|| {
            CausalError::Structure(
                ErrorInfo::new("unknown-node", "node does not exist").with_context("node", name),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_and_path_queries_follow_arcs() {
        let model = AdjustmentModel::from_edges(
            &["w", "t", "m", "y"],
            &[Edge::new("w", "t"), Edge::new("t", "m"), Edge::new("m", "y"), Edge::new("w", "y")],
        )
        .unwrap();
        assert_eq!(model.parents("t").unwrap(), vec!["w"]);
        assert_eq!(model.parents("y").unwrap(), vec!["w", "m"]);
        assert!(model.has_directed_path("t", "y").unwrap());
        assert!(!model.has_directed_path("y", "t").unwrap());
    }

    #[test]
    fn repeated_arc_is_a_no_op() {
        let mut model = AdjustmentModel::new(&["a", "b"]).unwrap();
        model.add_arc("a", "b").unwrap();
        model.add_arc("a", "b").unwrap();
        assert_eq!(model.edge_count(), 1);
    }
}
