use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Estimation strategies the cascade knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorMethod {
    /// Ordinary least squares of outcome on treatment and backdoor covariates.
    LinearRegression,
    /// Normalised inverse propensity weighting.
    PropensityScoreWeighting,
    /// Nearest-neighbour matching on the propensity score.
    PropensityScoreMatching,
}

impl EstimatorMethod {
    /// Order tried after any caller preference.
    pub const DEFAULT_ORDER: [EstimatorMethod; 3] = [
        EstimatorMethod::LinearRegression,
        EstimatorMethod::PropensityScoreWeighting,
        EstimatorMethod::PropensityScoreMatching,
    ];

    /// Short method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorMethod::LinearRegression => "linear_regression",
            EstimatorMethod::PropensityScoreWeighting => "propensity_score_weighting",
            EstimatorMethod::PropensityScoreMatching => "propensity_score_matching",
        }
    }

    /// Fully qualified name including the identification strategy.
    pub fn qualified_name(&self) -> String {
        format!("backdoor.{}", self.as_str())
    }
}

impl fmt::Display for EstimatorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing names. `None` means "no preference".
const METHOD_NAMES: &[(&str, Option<EstimatorMethod>)] = &[
    ("linear_regression", Some(EstimatorMethod::LinearRegression)),
    ("backdoor.linear_regression", Some(EstimatorMethod::LinearRegression)),
    ("propensity_score_weighting", Some(EstimatorMethod::PropensityScoreWeighting)),
    ("backdoor.propensity_score_weighting", Some(EstimatorMethod::PropensityScoreWeighting)),
    ("psw", Some(EstimatorMethod::PropensityScoreWeighting)),
    ("propensity_score_matching", Some(EstimatorMethod::PropensityScoreMatching)),
    ("backdoor.propensity_score_matching", Some(EstimatorMethod::PropensityScoreMatching)),
    ("psm", Some(EstimatorMethod::PropensityScoreMatching)),
    ("auto", None),
];

/// Maps a caller-supplied name to a method.
///
/// Unknown names resolve to `None` so the default order applies.
pub fn lookup_method(name: &str) -> Option<EstimatorMethod> {
    let normalized = name.trim().to_ascii_lowercase();
    match METHOD_NAMES.iter().find(|(key, _)| *key == normalized) {
        Some((_, method)) => *method,
        None => {
            warn!(estimator = name, "unknown estimator name; using default order");
            None
        }
    }
}

/// Preferred method first (when it resolves), then the defaults not yet listed.
pub fn method_order(preferred: Option<&str>) -> Vec<EstimatorMethod> {
    let mut order: Vec<EstimatorMethod> = preferred.and_then(lookup_method).into_iter().collect();
    for method in EstimatorMethod::DEFAULT_ORDER {
        if !order.contains(&method) {
            order.push(method);
        }
    }
    order
}
