#![deny(missing_docs)]
#![doc = "Backdoor identification, the estimation cascade, random common cause refutation and effect-size heuristics."]

mod cascade;
mod effect;
mod estimand;
/// Estimation strategies implementing the cascade methods.
pub mod estimators;
mod method;
/// Least squares and propensity model fitting.
pub mod regression;
mod refute;

pub use cascade::{estimate_effect, run_cascade, Attempt, CascadeOutcome, CausalEstimate};
pub use effect::{summarize_effect, EffectSize, EffectSizeSummary};
pub use estimand::{identify_effect, Estimand};
pub use estimators::{
    strategy, Estimator, LinearRegression, PropensityScoreMatching, PropensityScoreWeighting,
};
pub use method::{lookup_method, method_order, EstimatorMethod};
pub use refute::{refute_random_common_cause, RefuterOpts, Refutation};
pub use regression::PropensityOpts;
