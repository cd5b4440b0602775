use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::{RngHandle, Table};
use causa_graph::{Edge, FallbackReason, LearnedStructure, RawAdjacency};
use causa_learn::{discover, PcLearner, SelectorOpts, StructureLearner};
use rand::Rng;
use rand_distr::StandardNormal;

struct FailingLearner;

impl StructureLearner for FailingLearner {
    fn algorithm(&self) -> &'static str {
        "failing"
    }

    fn alpha(&self) -> f64 {
        0.05
    }

    fn learn(&self, _table: &Table) -> Result<RawAdjacency, CausalError> {
        Err(CausalError::Structure(ErrorInfo::new("math-domain", "math domain error")))
    }
}

struct StrayLearner;

impl StructureLearner for StrayLearner {
    fn algorithm(&self) -> &'static str {
        "stray"
    }

    fn alpha(&self) -> f64 {
        0.05
    }

    fn learn(&self, table: &Table) -> Result<RawAdjacency, CausalError> {
        let mut raw = RawAdjacency::new(table.names());
        raw.push("X", "Y");
        raw.push("ghost", "Y");
        Ok(raw)
    }
}

fn collider_table(rows: usize, seed: u64) -> Table {
    let mut rng = RngHandle::from_seed(seed);
    let mut x = Vec::with_capacity(rows);
    let mut z = Vec::with_capacity(rows);
    let mut y = Vec::with_capacity(rows);
    for _ in 0..rows {
        x.push(rng.sample::<f64, _>(StandardNormal));
        z.push(rng.sample::<f64, _>(StandardNormal));
    }
    // Remove the sample correlation so X and Z test exactly independent.
    let mx = x.iter().sum::<f64>() / rows as f64;
    let mz = z.iter().sum::<f64>() / rows as f64;
    let cov: f64 = x.iter().zip(&z).map(|(a, b)| (a - mx) * (b - mz)).sum();
    let var: f64 = x.iter().map(|a| (a - mx) * (a - mx)).sum();
    for (zi, xi) in z.iter_mut().zip(&x) {
        *zi -= cov / var * (xi - mx);
    }
    for (xi, zi) in x.iter().zip(&z) {
        let noise: f64 = rng.sample(StandardNormal);
        y.push(xi + zi + 0.5 * noise);
    }
    Table::from_pairs([("X", x), ("Z", z), ("Y", y)]).unwrap()
}

#[test]
fn pc_recovers_collider_from_data() {
    let table = collider_table(1000, 11);
    let discovery = discover(&table, "X", "Y", &SelectorOpts::default(), &PcLearner::default()).unwrap();
    let LearnedStructure::Learned(sets) = discovery.structure else {
        panic!("expected learned structure");
    };
    assert!(sets.directed.contains(&Edge::new("X", "Y")));
    assert!(sets.directed.contains(&Edge::new("Z", "Y")));
    assert!(sets.undirected.is_empty());
}

#[test]
fn learner_error_becomes_fallback() {
    let table = collider_table(50, 3);
    let discovery = discover(&table, "X", "Y", &SelectorOpts::default(), &FailingLearner).unwrap();
    assert!(discovery.selection.is_some());
    match discovery.structure {
        LearnedStructure::Fallback(FallbackReason::LearningFailed { error }) => {
            assert_eq!(error.code(), "math-domain");
        }
        other => panic!("unexpected structure {other:?}"),
    }
}

#[test]
fn edge_on_unselected_column_becomes_fallback() {
    let table = collider_table(50, 3);
    let discovery = discover(&table, "X", "Y", &SelectorOpts::default(), &StrayLearner).unwrap();
    match discovery.structure {
        LearnedStructure::Fallback(FallbackReason::LearningFailed { error }) => {
            assert_eq!(error.code(), "unknown-node");
            assert_eq!(error.info().context.get("node").map(String::as_str), Some("ghost"));
        }
        other => panic!("unexpected structure {other:?}"),
    }
}

#[test]
fn constant_column_in_subset_fails_learning() {
    let rows = 40;
    let table = Table::from_pairs([
        ("T", vec![5.0; rows]),
        ("M", (0..rows).map(|i| (i as f64 * 0.3).sin()).collect()),
        ("Y", (0..rows).map(|i| (i as f64 * 0.7).cos()).collect()),
    ])
    .unwrap();
    let discovery = discover(&table, "T", "Y", &SelectorOpts::default(), &PcLearner::default()).unwrap();
    match discovery.structure {
        LearnedStructure::Fallback(FallbackReason::LearningFailed { error }) => {
            assert_eq!(error.code(), "undefined-correlation");
        }
        other => panic!("unexpected structure {other:?}"),
    }
}

#[test]
fn single_varying_column_skips_learning() {
    let rows = 20;
    let table = Table::from_pairs([
        ("T", vec![1.0; rows]),
        ("Y", (0..rows).map(|i| i as f64).collect()),
    ])
    .unwrap();
    let discovery = discover(&table, "T", "Y", &SelectorOpts::default(), &PcLearner::default()).unwrap();
    assert!(discovery.selection.is_none());
    assert_eq!(
        discovery.structure,
        LearnedStructure::Fallback(FallbackReason::InsufficientSignal { non_constant: 1 })
    );
}

#[test]
fn missing_treatment_is_fatal() {
    let table = collider_table(10, 1);
    let err = discover(&table, "nope", "Y", &SelectorOpts::default(), &PcLearner::default()).unwrap_err();
    assert!(err.is_fatal());
}
