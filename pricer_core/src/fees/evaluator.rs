//! # Fee Evaluation
//!
//! Decides which fees apply to a job and what the non-percent ones cost.
//!
//! 1. Inactive fees are dropped.
//! 2. Required and hidden fees are included; selectable fees only when the
//!    job selected them.
//! 3. Every condition must match the job's attributes.
//! 4. Flat, per-gram and per-minute fees are priced here. Percent fees are
//!    returned unresolved: their base is only known once the pipeline has
//!    material and time costs, and resolving them there keeps them from
//!    compounding on each other.
//!
//! Per-minute fees use the billed minutes the pipeline passes in, the same
//! figure the time cost uses.

use serde::{Deserialize, Serialize};

use crate::fees::definition::{FeeDefinition, FeeScope, FeeValueType, Visibility};
use crate::job::JobInput;
use crate::units::Minutes;

/// A priced fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFee {
    pub id: String,
    pub name: String,
    pub scope: FeeScope,
    pub value_type: FeeValueType,
    /// Per model for MODEL fees, per order for ORDER fees
    pub amount: f64,
}

/// A percent fee waiting for its base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentFee {
    pub id: String,
    pub name: String,
    pub scope: FeeScope,
    pub percent_value: f64,
}

impl PercentFee {
    /// Resolve against `base`
    pub fn resolve(&self, base: f64) -> AppliedFee {
        AppliedFee {
            id: self.id.clone(),
            name: self.name.clone(),
            scope: self.scope,
            value_type: FeeValueType::Percent,
            amount: self.percent_value / 100.0 * base,
        }
    }
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeEvaluation {
    /// Non-percent fees, in configuration order
    pub applied: Vec<AppliedFee>,
    /// Percent fees, in configuration order
    pub percent: Vec<PercentFee>,
    /// Sum of non-percent MODEL fees (one model)
    pub model_subtotal: f64,
    /// Sum of non-percent ORDER fees
    pub order_subtotal: f64,
}

/// Whether the fee is in play for this job before conditions are checked.
pub fn is_included(fee: &FeeDefinition, job: &JobInput) -> bool {
    if !fee.active {
        return false;
    }
    match fee.visibility() {
        Visibility::Required | Visibility::Hidden => true,
        Visibility::Selectable { .. } => job.is_selected(&fee.id),
    }
}

/// Whether every condition of the fee matches the job.
pub fn conditions_match(fee: &FeeDefinition, job: &JobInput) -> bool {
    fee.conditions
        .iter()
        .all(|c| c.matches(job.attribute(&c.key).as_ref()))
}

/// Evaluate `fees` for `job` at `billed_minutes`.
pub fn evaluate(fees: &[FeeDefinition], job: &JobInput, billed_minutes: Minutes) -> FeeEvaluation {
    let mut out = FeeEvaluation::default();
    let grams = job.grams().value();

    for fee in fees {
        if !is_included(fee, job) {
            continue;
        }
        if !conditions_match(fee, job) {
            tracing::debug!(fee = %fee.id, "fee conditions not met");
            continue;
        }

        let value = fee.effective_value();
        let amount = match fee.value_type {
            FeeValueType::Flat => value,
            FeeValueType::PerGram => value * grams,
            FeeValueType::PerMinute => value * billed_minutes.value(),
            FeeValueType::Percent => {
                out.percent.push(PercentFee {
                    id: fee.id.clone(),
                    name: fee.name.clone(),
                    scope: fee.scope,
                    percent_value: value,
                });
                continue;
            }
            FeeValueType::Unknown => {
                tracing::warn!(fee = %fee.id, "fee has unknown type, contributing 0");
                0.0
            }
        };

        match fee.scope {
            FeeScope::Model => out.model_subtotal += amount,
            FeeScope::Order => out.order_subtotal += amount,
        }
        out.applied.push(AppliedFee {
            id: fee.id.clone(),
            name: fee.name.clone(),
            scope: fee.scope,
            value_type: fee.value_type,
            amount,
        });
    }

    tracing::debug!(
        applied = out.applied.len(),
        percent = out.percent.len(),
        model_subtotal = out.model_subtotal,
        order_subtotal = out.order_subtotal,
        "fees evaluated"
    );
    out
}
