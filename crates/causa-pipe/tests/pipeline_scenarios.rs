use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::{RngHandle, Table};
use causa_graph::{Edge, RawAdjacency};
use causa_learn::StructureLearner;
use causa_pipe::{run, run_with_learner, PipelineOpts};
use rand::Rng;
use rand_distr::StandardNormal;

struct ExplodingLearner;

impl StructureLearner for ExplodingLearner {
    fn algorithm(&self) -> &'static str {
        "PC"
    }

    fn alpha(&self) -> f64 {
        0.05
    }

    fn learn(&self, _table: &Table) -> Result<RawAdjacency, CausalError> {
        Err(CausalError::Structure(ErrorInfo::new("singular-correlation", "singular matrix")))
    }
}

/// Reports an arc onto a column the table does not have.
struct StrayLearner;

impl StructureLearner for StrayLearner {
    fn algorithm(&self) -> &'static str {
        "PC"
    }

    fn alpha(&self) -> f64 {
        0.05
    }

    fn learn(&self, table: &Table) -> Result<RawAdjacency, CausalError> {
        let mut raw = RawAdjacency::new(table.names());
        raw.push("T", "ghost");
        Ok(raw)
    }
}

fn seeded_opts() -> PipelineOpts {
    PipelineOpts {
        seed: Some(7),
        ..PipelineOpts::default()
    }
}

/// Binary T, an unrelated M and Y = 2T + noise.
fn binary_treatment_table(rows: usize, seed: u64) -> Table {
    let mut rng = RngHandle::from_seed(seed);
    let t: Vec<f64> = (0..rows).map(|i| (i % 2) as f64).collect();
    let m: Vec<f64> = (0..rows).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
    let y: Vec<f64> = t
        .iter()
        .map(|ti| 2.0 * ti + 0.5 * rng.sample::<f64, _>(StandardNormal))
        .collect();
    Table::from_pairs([("T", t), ("M", m), ("Y", y)]).unwrap()
}

#[test]
fn binary_treatment_recovers_effect_of_two() {
    let table = binary_treatment_table(200, 3);
    let bundle = run(&table, "T", "Y", &seeded_opts()).unwrap();

    assert_eq!(bundle.columns, vec!["T", "M", "Y"]);
    assert_eq!(bundle.learned_graph.nodes, bundle.columns);
    assert_eq!(bundle.learned_graph.algorithm, "PC");
    assert_eq!(bundle.learned_graph.alpha, 0.05);

    let value = bundle.estimate_value.unwrap();
    assert!((value - 2.0).abs() < 0.25, "estimated {value}");
    let summary = bundle.effect_size.summary().unwrap();
    let diff = summary.group_mean_diff.unwrap();
    assert!((diff - value).abs() < 0.25);
    assert!(summary.effect_score.is_finite());
    assert!(bundle.estimate.unwrap().contains("Mean value:"));
    assert!(bundle
        .refutation
        .unwrap()
        .starts_with("Refute: Add a random common cause"));
    assert!(bundle.estimand.contains("Estimand type: nonparametric-ate"));
}

#[test]
fn seeded_runs_are_identical() {
    let table = binary_treatment_table(120, 4);
    let a = run(&table, "T", "Y", &seeded_opts()).unwrap();
    let b = run(&table, "T", "Y", &seeded_opts()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn constant_treatment_degenerates_to_minimal_graph() {
    let rows = 50;
    let table = Table::from_pairs([
        ("T", vec![5.0; rows]),
        ("M", (0..rows).map(|i| (i as f64 * 0.37).sin()).collect()),
        ("Y", (0..rows).map(|i| (i as f64 * 0.11).cos()).collect()),
    ])
    .unwrap();
    let bundle = run(&table, "T", "Y", &seeded_opts()).unwrap();

    assert_eq!(bundle.learned_graph.edges_directed, vec![Edge::new("T", "Y")]);
    assert_eq!(bundle.learned_graph.edges, vec![Edge::new("T", "Y")]);
    assert!(bundle.learned_graph.fallback.is_some());
    assert_eq!(bundle.learned_graph.nodes, vec!["T", "M", "Y"]);
    assert!(bundle.learned_graph.dot.contains("\"T\" -> \"Y\";"));
    assert_eq!(bundle.estimate_value, None);
    assert!(bundle.estimate.unwrap().starts_with("Estimation failed: "));
    assert_eq!(bundle.refutation, None);
    assert!(bundle.effect_size.summary().is_none());
}

#[test]
fn matching_preference_falls_through_and_reports_last_failure() {
    let rows = 40;
    let table = Table::from_pairs([
        ("T", vec![5.0; rows]),
        ("Y", (0..rows).map(|i| i as f64).collect()),
    ])
    .unwrap();
    let opts = PipelineOpts {
        estimator: Some("propensity_score_matching".into()),
        ..seeded_opts()
    };
    let bundle = run(&table, "T", "Y", &opts).unwrap();
    let estimate = bundle.estimate.unwrap();
    assert!(estimate.starts_with("Estimation failed: "));
    assert!(estimate.contains("non-binary-treatment"));

    let json = serde_json::to_value(&bundle.effect_size).unwrap();
    assert!(json["error"].is_string());
}

#[test]
fn matching_preference_falls_back_to_regression() {
    let rows = 80;
    let t: Vec<f64> = (0..rows).map(|i| i as f64 / 10.0).collect();
    let y: Vec<f64> = t.iter().enumerate().map(|(i, ti)| 3.0 * ti + (i % 4) as f64 * 0.1).collect();
    let table = Table::from_pairs([("T", t), ("Y", y)]).unwrap();
    let opts = PipelineOpts {
        estimator: Some("psm".into()),
        ..seeded_opts()
    };
    let bundle = run(&table, "T", "Y", &opts).unwrap();
    assert!(bundle.estimate.unwrap().contains("backdoor.linear_regression"));
    assert!((bundle.estimate_value.unwrap() - 3.0).abs() < 0.05);
}

#[test]
fn learner_failure_forces_treatment_outcome_arc() {
    let table = binary_treatment_table(60, 9);
    let bundle = run_with_learner(&table, "T", "Y", &seeded_opts(), &ExplodingLearner).unwrap();
    assert_eq!(bundle.learned_graph.edges_directed, vec![Edge::new("T", "Y")]);
    assert_eq!(bundle.learned_graph.nodes, vec!["T", "M", "Y"]);
    assert!(bundle.estimate_value.is_some());
}

#[test]
fn stray_learner_node_forces_treatment_outcome_arc() {
    let table = binary_treatment_table(60, 9);
    let bundle = run_with_learner(&table, "T", "Y", &seeded_opts(), &StrayLearner).unwrap();
    assert_eq!(bundle.learned_graph.edges_directed, vec![Edge::new("T", "Y")]);
    assert_eq!(bundle.learned_graph.nodes, vec!["T", "M", "Y"]);
    let fallback = serde_json::to_value(bundle.learned_graph.fallback.as_ref().unwrap()).unwrap();
    assert_eq!(fallback["reason"], "learning_failed");
    assert!(bundle.estimate_value.is_some());
}

#[test]
fn nodes_cover_columns_outside_the_learned_subset() {
    let rows = 30;
    let mut rng = RngHandle::from_seed(12);
    let mut noise = |scale: f64| -> Vec<f64> {
        (0..rows)
            .map(|_| scale * rng.sample::<f64, _>(StandardNormal))
            .collect()
    };
    let a = noise(1.0);
    let b = noise(1.0);
    let c = noise(1.0);
    let t: Vec<f64> = (0..rows).map(|i| (i % 2) as f64).collect();
    let y: Vec<f64> = t.iter().zip(noise(0.3)).map(|(ti, e)| ti + e).collect();
    let table = Table::from_pairs([
        ("A", a),
        ("T", t),
        ("B", b),
        ("K", vec![1.0; rows]),
        ("C", c),
        ("Y", y),
    ])
    .unwrap();
    let opts = PipelineOpts {
        selector: causa_learn::SelectorOpts {
            min_vars: 3,
            max_vars: 3,
        },
        ..seeded_opts()
    };
    let bundle = run(&table, "T", "Y", &opts).unwrap();
    assert_eq!(bundle.learned_graph.nodes, vec!["A", "T", "B", "K", "C", "Y"]);
    for edge in &bundle.learned_graph.edges_directed {
        assert!(!bundle
            .learned_graph
            .edges_directed
            .contains(&edge.reversed()));
    }
}

#[test]
fn invalid_input_is_rejected_before_learning() {
    let table = binary_treatment_table(20, 1);
    let missing = run(&table, "T", "nope", &seeded_opts()).unwrap_err();
    assert!(missing.is_fatal());
    assert_eq!(missing.code(), "missing-column");

    let same = run(&table, "T", "T", &seeded_opts()).unwrap_err();
    assert_eq!(same.code(), "treatment-is-outcome");

    let bad_alpha = PipelineOpts {
        alpha: 0.0,
        ..seeded_opts()
    };
    assert_eq!(run(&table, "T", "Y", &bad_alpha).unwrap_err().code(), "invalid-alpha");

    let with_nan = Table::from_pairs([("T", vec![0.0, 1.0, 0.0]), ("Y", vec![1.0, f64::NAN, 2.0])]).unwrap();
    assert_eq!(run(&with_nan, "T", "Y", &seeded_opts()).unwrap_err().code(), "non-finite-value");

    let empty = Table::from_pairs([("T", Vec::new()), ("Y", Vec::new())]).unwrap();
    assert_eq!(run(&empty, "T", "Y", &seeded_opts()).unwrap_err().code(), "empty-table");
}

#[test]
fn disabled_refuter_leaves_refutation_null() {
    let table = binary_treatment_table(80, 2);
    let mut opts = seeded_opts();
    opts.refuter.enabled = false;
    let bundle = run(&table, "T", "Y", &opts).unwrap();
    assert_eq!(bundle.refutation, None);
    let json = serde_json::to_value(&bundle).unwrap();
    assert!(json["refutation"].is_null());
    assert!(json["learned_graph"]["edges_directed"].is_array());
}
