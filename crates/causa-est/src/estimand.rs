use std::fmt;

use causa_core::errors::CausalError;
use causa_core::Table;
use causa_graph::AdjustmentModel;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Backdoor estimand for the average treatment effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimand {
    /// Treatment variable.
    pub treatment: String,
    /// Outcome variable.
    pub outcome: String,
    /// Adjustment set conditioned on by the estimators.
    pub backdoor: Vec<String>,
    /// False when the graph only allowed a best-effort adjustment set.
    pub identified: bool,
    /// Whether the adjustment graph holds a directed path treatment -> outcome.
    pub directed_path: bool,
    /// Caveats raised during identification.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Estimand {
    /// Returns a copy with an extra adjustment variable.
    pub fn with_extra_covariate(&self, name: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.backdoor.push(name.into());
        copy
    }

    /// `E[Y|W...]` with the adjustment set spelled out.
    pub fn conditional_expectation(&self) -> String {
        if self.backdoor.is_empty() {
            format!("E[{}]", self.outcome)
        } else {
            format!("E[{}|{}]", self.outcome, self.backdoor.join(","))
        }
    }

    /// Regression formula realised by the estimators, e.g. `Y~T+W`.
    pub fn formula(&self) -> String {
        let mut terms = vec![self.treatment.clone()];
        terms.extend(self.backdoor.iter().cloned());
        format!("{}~{}", self.outcome, terms.join("+"))
    }
}

impl fmt::Display for Estimand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let given = if self.backdoor.is_empty() {
            String::new()
        } else {
            format!(",{}", self.backdoor.join(","))
        };
        writeln!(f, "Estimand type: nonparametric-ate")?;
        writeln!(f)?;
        writeln!(f, "### Estimand : 1")?;
        writeln!(f, "Estimand name: backdoor")?;
        writeln!(f, "Estimand expression:")?;
        writeln!(f, " d/d[{}]({})", self.treatment, self.conditional_expectation())?;
        write!(
            f,
            "Estimand assumption 1, Unconfoundedness: If U→{{{t}}} and U→{y} then P({y}|{t}{given},U) = P({y}|{t}{given})",
            t = self.treatment,
            y = self.outcome,
        )?;
        for note in &self.notes {
            write!(f, "\nNote: {note}")?;
        }
        Ok(())
    }
}

/// Derives a backdoor adjustment set from the adjustment graph.
///
/// The parents of the treatment block every backdoor path in a DAG. When the
/// outcome itself is a parent of the treatment no valid set exists; the outcome
/// is then dropped from the set and the estimand is flagged as not identified
/// instead of failing, so estimation can still produce a number.
pub fn identify_effect(
    data: &Table,
    model: &AdjustmentModel,
    treatment: &str,
    outcome: &str,
) -> Result<Estimand, CausalError> {
    data.require(treatment)?;
    data.require(outcome)?;

    let mut notes = Vec::new();
    let mut identified = true;
    let mut backdoor = Vec::new();
    for parent in model.parents(treatment)? {
        if parent == outcome {
            identified = false;
            notes.push(format!(
                "{outcome} is a parent of {treatment}; the effect is not identifiable from this graph"
            ));
            continue;
        }
        if data.contains(&parent) {
            backdoor.push(parent);
        }
    }

    let directed_path = model.has_directed_path(treatment, outcome)?;
    if !directed_path {
        notes.push(format!(
            "no directed path from {treatment} to {outcome} in the adjustment graph"
        ));
    }
    debug!(treatment, outcome, ?backdoor, identified, directed_path, "identified backdoor estimand");

    Ok(Estimand {
        treatment: treatment.to_string(),
        outcome: outcome.to_string(),
        backdoor,
        identified,
        directed_path,
        notes,
    })
}
