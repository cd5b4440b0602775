use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::{RngHandle, Table};
use causa_est::{
    estimate_effect, identify_effect, refute_random_common_cause, summarize_effect, EffectSize,
};
use causa_graph::{build_model, render_dot};
use causa_learn::{discover, PcLearner, StructureLearner};
use tracing::{debug, info};

use crate::bundle::{LearnedGraph, ResultBundle};
use crate::config::PipelineOpts;

fn check_inputs(
    table: &Table,
    treatment: &str,
    outcome: &str,
    opts: &PipelineOpts,
) -> Result<(), CausalError> {
    opts.validate()?;
    if table.n_rows() == 0 {
        return Err(CausalError::Input(
            ErrorInfo::new("empty-table", "table has no rows")
                .with_hint("clean and load the data before running the pipeline"),
        ));
    }
    if treatment == outcome {
        return Err(CausalError::Input(
            ErrorInfo::new("treatment-is-outcome", "treatment and outcome must be different columns")
                .with_context("column", treatment),
        ));
    }
    table.require(treatment)?;
    table.require(outcome)?;
    table.ensure_finite()
}

/// Runs the full pipeline with the PC learner at `opts.alpha`.
pub fn run(
    table: &Table,
    treatment: &str,
    outcome: &str,
    opts: &PipelineOpts,
) -> Result<ResultBundle, CausalError> {
    run_with_learner(table, treatment, outcome, opts, &PcLearner::new(opts.alpha))
}

/// Runs the full pipeline with a caller supplied structure learner.
///
/// Returns an error only for invalid input. Structure learning failures force
/// the minimal `treatment -> outcome` graph; estimation, refutation and
/// effect-size failures are reported inside the bundle.
pub fn run_with_learner<L: StructureLearner + ?Sized>(
    table: &Table,
    treatment: &str,
    outcome: &str,
    opts: &PipelineOpts,
    learner: &L,
) -> Result<ResultBundle, CausalError> {
    check_inputs(table, treatment, outcome, opts)?;
    let columns = table.names();

    let discovery = discover(table, treatment, outcome, &opts.selector, learner)?;
    let built = build_model(&discovery.structure, &columns, treatment, outcome)?;
    let estimand = identify_effect(table, &built.model, treatment, outcome)?;

    let cascade = estimate_effect(table, &estimand, opts.estimator.as_deref(), &opts.propensity);
    let estimate_text = cascade.summary();

    let refutation = match (&cascade.estimate, opts.refuter.enabled) {
        (Some(estimate), true) => {
            let rng = RngHandle::from_optional_seed(opts.seed);
            debug!(seed = rng.seed(), "refuting with random common cause");
            let text = match refute_random_common_cause(
                table,
                estimate,
                &opts.refuter,
                &opts.propensity,
                &rng,
            ) {
                Ok(refutation) => refutation.to_string(),
                Err(err) => format!("Refutation failed: {}", err.info()),
            };
            Some(text)
        }
        _ => None,
    };

    let effect_size = match &cascade.estimate {
        Some(estimate) => {
            EffectSize::from_result(summarize_effect(estimate.value, table, treatment, outcome))
        }
        None => EffectSize::Failed {
            error: "no causal estimate available".to_string(),
        },
    };

    let estimate_value = cascade.estimate.as_ref().map(|e| e.value);
    info!(
        treatment,
        outcome,
        arcs = built.directed.len(),
        fallback = built.fallback.is_some(),
        method = ?cascade.estimate.as_ref().map(|e| e.method),
        estimate = ?estimate_value,
        "causal analysis finished"
    );

    let nodes = built.model.nodes().to_vec();
    let dot = render_dot(&nodes, &built.directed);
    Ok(ResultBundle {
        columns,
        learned_graph: LearnedGraph {
            nodes,
            edges: built.visualization,
            edges_directed: built.directed,
            dot,
            algorithm: learner.algorithm().to_string(),
            alpha: learner.alpha(),
            fallback: built.fallback,
        },
        estimand: estimand.to_string(),
        estimate_value,
        estimate: estimate_text,
        refutation,
        effect_size,
    })
}
