use std::collections::{BTreeMap, BTreeSet};

use causa_core::errors::{CausalError, ErrorInfo};
use causa_graph::RawAdjacency;
use itertools::Itertools;
use tracing::trace;

use crate::citest::IndependenceTest;

/// Partially directed graph maintained while the PC search runs.
#[derive(Debug, Clone)]
struct Pdag {
    adj: Vec<BTreeSet<usize>>,
    oriented: BTreeSet<(usize, usize)>,
}

impl Pdag {
    fn complete(n: usize) -> Self {
        let adj = (0..n)
            .map(|i| (0..n).filter(|&j| j != i).collect())
            .collect();
        Self {
            adj,
            oriented: BTreeSet::new(),
        }
    }

    fn adjacent(&self, a: usize, b: usize) -> bool {
        self.adj[a].contains(&b)
    }

    fn remove(&mut self, a: usize, b: usize) {
        self.adj[a].remove(&b);
        self.adj[b].remove(&a);
    }

    fn is_directed(&self, a: usize, b: usize) -> bool {
        self.oriented.contains(&(a, b))
    }

    fn is_undirected(&self, a: usize, b: usize) -> bool {
        self.adjacent(a, b) && !self.is_directed(a, b) && !self.is_directed(b, a)
    }

    /// Orients `a -> b` unless the edge already points the other way.
    fn orient(&mut self, a: usize, b: usize) -> bool {
        if !self.adjacent(a, b) || self.is_directed(b, a) || self.is_directed(a, b) {
            return false;
        }
        self.oriented.insert((a, b));
        true
    }
}

/// Separating sets keyed by the sorted variable pair.
type SepSets = BTreeMap<(usize, usize), Vec<usize>>;

fn key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Removes every edge whose endpoints test independent given some subset of
/// neighbours, growing the conditioning size one step at a time.
///
/// Neighbour sets are frozen at the start of each depth so the result does not
/// depend on the order in which pairs are visited.
fn learn_skeleton<T: IndependenceTest + ?Sized>(
    graph: &mut Pdag,
    test: &T,
    alpha: f64,
) -> Result<SepSets, CausalError> {
    let n = graph.adj.len();
    let mut sepsets = SepSets::new();
    let mut depth = 0usize;
    loop {
        let frozen = graph.adj.clone();
        let mut testable = false;
        for x in 0..n {
            for &y in &frozen[x] {
                if !graph.adjacent(x, y) {
                    continue;
                }
                let others: Vec<usize> = frozen[x].iter().copied().filter(|&v| v != y).collect();
                if others.len() < depth {
                    continue;
                }
                testable = true;
                for cond in others.into_iter().combinations(depth) {
                    let p = test.p_value(x, y, &cond)?;
                    trace!(x, y, ?cond, p, "independence test");
                    if p > alpha {
                        graph.remove(x, y);
                        sepsets.insert(key(x, y), cond);
                        break;
                    }
                }
            }
        }
        if !testable {
            break;
        }
        depth += 1;
    }
    Ok(sepsets)
}

/// Orients `x -> z <- y` for every unshielded triple whose middle node is
/// absent from the separating set of its endpoints.
///
/// An edge oriented by an earlier collider is never reversed by a later one.
fn orient_colliders(graph: &mut Pdag, sepsets: &SepSets) {
    let n = graph.adj.len();
    for z in 0..n {
        let neighbours: Vec<usize> = graph.adj[z].iter().copied().collect();
        for (x, y) in neighbours.iter().copied().tuple_combinations() {
            if graph.adjacent(x, y) {
                continue;
            }
            let separated_by_z = sepsets
                .get(&key(x, y))
                .map(|set| set.contains(&z))
                .unwrap_or(false);
            if separated_by_z {
                continue;
            }
            graph.orient(x, z);
            graph.orient(y, z);
        }
    }
}

/// Applies orientation rules R1-R3 until no edge changes.
fn propagate_orientations(graph: &mut Pdag) {
    let n = graph.adj.len();
    loop {
        let mut changed = false;
        for a in 0..n {
            for b in 0..n {
                if !graph.is_undirected(a, b) {
                    continue;
                }
                // R1: c -> a - b with c, b non-adjacent.
                let r1 = graph.adj[a]
                    .iter()
                    .any(|&c| c != b && graph.is_directed(c, a) && !graph.adjacent(c, b));
                // R2: a -> c -> b.
                let r2 = graph.adj[a]
                    .iter()
                    .any(|&c| graph.is_directed(a, c) && graph.is_directed(c, b));
                // R3: a - c -> b and a - d -> b with c, d non-adjacent.
                let r3 = graph.adj[a]
                    .iter()
                    .copied()
                    .filter(|&c| c != b && graph.is_undirected(a, c) && graph.is_directed(c, b))
                    .tuple_combinations()
                    .any(|(c, d)| !graph.adjacent(c, d));
                if (r1 || r2 || r3) && graph.orient(a, b) {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Runs the PC search and reports the resulting pattern as a raw adjacency.
///
/// Oriented edges appear once; edges the search could not orient appear in
/// both directions.
pub fn pc_search<T: IndependenceTest + ?Sized>(
    names: &[String],
    test: &T,
    alpha: f64,
) -> Result<RawAdjacency, CausalError> {
    if names.len() != test.num_vars() {
        return Err(CausalError::Structure(
            ErrorInfo::new("variable-mismatch", "test and name list disagree on the variable count")
                .with_context("names", names.len())
                .with_context("test", test.num_vars()),
        ));
    }
    let mut graph = Pdag::complete(names.len());
    let sepsets = learn_skeleton(&mut graph, test, alpha)?;
    orient_colliders(&mut graph, &sepsets);
    propagate_orientations(&mut graph);

    let mut raw = RawAdjacency::new(names.to_vec());
    for a in 0..names.len() {
        for &b in graph.adj[a].iter().filter(|&&b| b > a) {
            if graph.is_directed(a, b) {
                raw.push(names[a].clone(), names[b].clone());
            } else if graph.is_directed(b, a) {
                raw.push(names[b].clone(), names[a].clone());
            } else {
                raw.push(names[a].clone(), names[b].clone());
                raw.push(names[b].clone(), names[a].clone());
            }
        }
    }
    Ok(raw)
}
