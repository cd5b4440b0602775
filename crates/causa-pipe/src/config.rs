use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::serde::{from_json_slice, from_yaml_slice};
use causa_est::{PropensityOpts, RefuterOpts};
use causa_learn::{SelectorOpts, DEFAULT_ALPHA};
use serde::{Deserialize, Serialize};

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn config_error(code: &str, message: impl Into<String>) -> CausalError {
    CausalError::Input(ErrorInfo::new(code, message.into()))
}

/// Options for one pipeline run. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOpts {
    /// Significance level of the independence tests.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Preferred estimation method; `None` keeps the default order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimator: Option<String>,
    /// Master seed for the refuter; `None` draws one from the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Variable budget for structure learning.
    #[serde(default)]
    pub selector: SelectorOpts,
    /// Random common cause refuter settings.
    #[serde(default)]
    pub refuter: RefuterOpts,
    /// Propensity model settings shared by the weighting and matching estimators.
    #[serde(default)]
    pub propensity: PropensityOpts,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            estimator: None,
            seed: None,
            selector: SelectorOpts::default(),
            refuter: RefuterOpts::default(),
            propensity: PropensityOpts::default(),
        }
    }
}

impl PipelineOpts {
    /// Parses options from YAML.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, CausalError> {
        from_yaml_slice(bytes)
    }

    /// Parses options from JSON.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CausalError> {
        from_json_slice(bytes)
    }

    /// Rejects option values no run could honour.
    pub fn validate(&self) -> Result<(), CausalError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(CausalError::Input(
                ErrorInfo::new("invalid-alpha", "alpha must lie strictly between 0 and 1")
                    .with_context("alpha", self.alpha),
            ));
        }
        if self.selector.min_vars < 2 {
            return Err(CausalError::Input(
                ErrorInfo::new("invalid-selector", "selector.min_vars must be at least 2")
                    .with_context("min_vars", self.selector.min_vars),
            ));
        }
        if self.selector.max_vars < self.selector.min_vars {
            return Err(config_error(
                "invalid-selector",
                "selector.max_vars must not be below selector.min_vars",
            ));
        }
        let clip = &self.propensity;
        if !(clip.clip_min > 0.0 && clip.clip_min < clip.clip_max && clip.clip_max < 1.0) {
            return Err(config_error(
                "invalid-propensity-clip",
                "propensity clip bounds must satisfy 0 < clip_min < clip_max < 1",
            ));
        }
        if clip.l2_penalty < 0.0 || clip.max_iters == 0 {
            return Err(config_error(
                "invalid-propensity-model",
                "propensity l2_penalty must be non-negative and max_iters positive",
            ));
        }
        Ok(())
    }
}
