use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::edge::{Edge, RawAdjacency, UndirectedPair};

/// Partition of a raw adjacency into safe arcs and unresolved pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeSets {
    /// Arcs whose reverse is absent from the raw adjacency.
    pub directed: Vec<Edge>,
    /// Pairs reported in both directions.
    pub undirected: Vec<UndirectedPair>,
    /// `directed` plus one representative per undirected pair, in discovery order.
    pub visualization: Vec<Edge>,
}

/// Splits raw adjacencies into strictly-directed arcs and undirected pairs.
///
/// A pair is undirected iff both `(u, v)` and `(v, u)` appear. Each undirected
/// pair contributes exactly one visualisation edge whose source is the
/// alphabetically-first endpoint. Repeated raw entries are reported once.
pub fn classify(raw: &RawAdjacency) -> EdgeSets {
    let present: BTreeSet<(&str, &str)> = raw
        .edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();

    let mut sets = EdgeSets::default();
    let mut seen_directed: BTreeSet<(&str, &str)> = BTreeSet::new();
    let mut seen_undirected: BTreeSet<UndirectedPair> = BTreeSet::new();

    for edge in &raw.edges {
        let (u, v) = (edge.source.as_str(), edge.target.as_str());
        if u == v {
            continue;
        }
        if present.contains(&(v, u)) {
            let pair = UndirectedPair::new(u, v);
            if seen_undirected.insert(pair.clone()) {
                sets.visualization.push(pair.representative());
                sets.undirected.push(pair);
            }
        } else if seen_directed.insert((u, v)) {
            sets.directed.push(edge.clone());
            sets.visualization.push(edge.clone());
        }
    }
    sets
}
