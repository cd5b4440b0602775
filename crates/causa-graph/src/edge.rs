use serde::{Deserialize, Serialize};

/// Directed pair of variable names as serialised in the result bundle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Tail of the arc.
    pub source: String,
    /// Head of the arc.
    pub target: String,
}

impl Edge {
    /// Creates an edge from `source` to `target`.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Returns the same pair with its direction flipped.
    pub fn reversed(&self) -> Self {
        Self::new(self.target.clone(), self.source.clone())
    }
}

/// Unordered pair whose orientation structure learning left unresolved.
///
/// The endpoints are stored sorted, so `first` is the alphabetically-first name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UndirectedPair {
    /// Alphabetically-first endpoint.
    pub first: String,
    /// Alphabetically-second endpoint.
    pub second: String,
}

impl UndirectedPair {
    /// Creates a pair, sorting the endpoints.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Visualisation edge for the pair: the alphabetically-first node is the source.
    pub fn representative(&self) -> Edge {
        Edge::new(self.first.clone(), self.second.clone())
    }
}

/// Raw adjacency emitted by structure learning.
///
/// Each entry is an ordered pair `(u, v)`; an unresolved adjacency is reported
/// as both `(u, v)` and `(v, u)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawAdjacency {
    /// Variables examined by the learner, in the order they were supplied.
    pub nodes: Vec<String>,
    /// Ordered adjacency pairs.
    pub edges: Vec<Edge>,
}

impl RawAdjacency {
    /// Creates an adjacency over `nodes` with no edges.
    pub fn new(nodes: Vec<String>) -> Self {
        Self {
            nodes,
            edges: Vec::new(),
        }
    }

    /// Appends the ordered pair `(source, target)`.
    pub fn push(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.edges.push(Edge::new(source, target));
    }
}
