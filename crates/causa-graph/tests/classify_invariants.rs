use std::collections::BTreeSet;

use causa_graph::{classify, Edge, RawAdjacency, UndirectedPair};
use proptest::prelude::*;

const NAMES: [&str; 5] = ["a", "b", "c", "d", "e"];

fn raw_from_pairs(pairs: &[(usize, usize)]) -> RawAdjacency {
    let mut raw = RawAdjacency::new(NAMES.iter().map(|n| n.to_string()).collect());
    for &(u, v) in pairs {
        raw.push(NAMES[u], NAMES[v]);
    }
    raw
}

#[test]
fn reversed_pair_becomes_undirected() {
    let raw = raw_from_pairs(&[(1, 0), (0, 1), (2, 3)]);
    let sets = classify(&raw);
    assert_eq!(sets.directed, vec![Edge::new("c", "d")]);
    assert_eq!(sets.undirected, vec![UndirectedPair::new("b", "a")]);
    assert_eq!(sets.visualization, vec![Edge::new("a", "b"), Edge::new("c", "d")]);
}

proptest! {
    #[test]
    fn directed_edges_never_hold_both_directions(pairs in prop::collection::vec((0usize..5, 0usize..5), 0..20)) {
        let raw = raw_from_pairs(&pairs);
        let sets = classify(&raw);
        let directed: BTreeSet<_> = sets.directed.iter().cloned().collect();
        for edge in &sets.directed {
            prop_assert!(!directed.contains(&edge.reversed()));
            prop_assert_ne!(&edge.source, &edge.target);
        }
        prop_assert_eq!(directed.len(), sets.directed.len());
    }

    #[test]
    fn one_visualisation_edge_per_undirected_pair(pairs in prop::collection::vec((0usize..5, 0usize..5), 0..20)) {
        let raw = raw_from_pairs(&pairs);
        let sets = classify(&raw);
        prop_assert_eq!(sets.visualization.len(), sets.directed.len() + sets.undirected.len());
        for pair in &sets.undirected {
            prop_assert!(pair.first < pair.second);
            let reps = sets
                .visualization
                .iter()
                .filter(|e| UndirectedPair::new(e.source.clone(), e.target.clone()) == *pair)
                .count();
            prop_assert_eq!(reps, 1);
            prop_assert!(sets.visualization.contains(&Edge::new(pair.first.clone(), pair.second.clone())));
        }
    }
}
