//! # Fees
//!
//! Configured extra charges and the evaluator that decides which apply.
//!
//! - [`definition`] - [`FeeDefinition`], value types, scopes, visibility
//! - [`condition`] - typed `{key, operator, value}` conditions
//! - [`evaluator`] - [`evaluate`]: inclusion, conditions, non-percent amounts
//! - [`catalog`] - built-in post-processing services
//!
//! ## Example
//!
//! ```rust
//! use pricer_core::fees::{evaluate, FeeDefinition, FeeValueType, Visibility};
//! use pricer_core::job::JobInput;
//! use pricer_core::units::Minutes;
//!
//! let fees = vec![
//!     FeeDefinition::new("setup", "Setup", FeeValueType::Flat, 30.0)
//!         .with_visibility(Visibility::Required),
//!     FeeDefinition::new("sanding", "Sanding", FeeValueType::Flat, 50.0),
//! ];
//!
//! let job = JobInput::new("pla", 40.0, 1800.0);
//! let eval = evaluate(&fees, &job, Minutes(30.0));
//! assert_eq!(eval.model_subtotal, 30.0); // sanding was not selected
//! ```

pub mod catalog;
pub mod condition;
pub mod definition;
pub mod evaluator;

pub use catalog::post_processing_fees;
pub use condition::{AttributeValue, ComparisonDomain, ConditionOperator, FeeCondition};
pub use definition::{FeeDefinition, FeeScope, FeeValueType, Visibility};
pub use evaluator::{evaluate, AppliedFee, FeeEvaluation, PercentFee};

use std::collections::HashSet;

use serde_json::Value;

use crate::coerce;
use crate::errors::PricingError;

/// Percent values above this are almost certainly typos
pub const MAX_SANE_PERCENT: f64 = 100_000.0;

/// Admin-side validation of a fee list.
///
/// Reports blank names, duplicate ids, negative values, absurd percentages,
/// unknown types, incomplete conditions and unknown operators. Pricing
/// never calls this; it evaluates whatever it is given, failing soft.
pub fn validate_fees(fees: &[FeeDefinition]) -> Vec<PricingError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for fee in fees {
        let at = |field: &str| format!("fees[{}].{}", fee.id, field);

        if !seen.insert(fee.id.as_str()) {
            errors.push(PricingError::invalid_config(at("id"), "duplicate fee id"));
        }
        if fee.name.trim().is_empty() {
            errors.push(PricingError::invalid_config(at("name"), "name is required"));
        }
        if !fee.value.is_finite() || fee.value < 0.0 {
            errors.push(PricingError::invalid_config(at("value"), "must be >= 0"));
        }
        if fee.value_type == FeeValueType::Percent && fee.value > MAX_SANE_PERCENT {
            errors.push(PricingError::invalid_config(
                at("value"),
                format!("percent value {} exceeds {}", fee.value, MAX_SANE_PERCENT),
            ));
        }
        if fee.value_type == FeeValueType::Unknown {
            errors.push(PricingError::invalid_config(at("type"), "unknown fee type"));
        }

        for (idx, condition) in fee.conditions.iter().enumerate() {
            if !condition.is_complete() {
                errors.push(PricingError::invalid_config(
                    at(&format!("conditions[{}]", idx)),
                    "key, operator and value are required",
                ));
            } else if !condition.operator.is_known() {
                errors.push(PricingError::unknown_operator(&fee.id, condition.operator.as_str()));
            }
        }
    }

    errors
}

/// Validation of raw fee records, before the loader repairs them.
///
/// [`FeeDefinition::from_value`] clamps negative and unreadable values to 0
/// and the loader drops entries that are not objects, so those problems
/// are only visible here. The parsed list then goes through [`validate_fees`].
pub fn validate_fee_records(items: &[Value]) -> Vec<PricingError> {
    let mut errors = Vec::new();
    let mut fees = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        if !item.is_object() {
            errors.push(PricingError::invalid_config(format!("fees[{}]", idx), "expected an object"));
            continue;
        }

        let label = match item.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => idx.to_string(),
        };
        if let Some(raw_value) = coerce::field(item, &["value", "amount"]) {
            let at = format!("fees[{}].value", label);
            match coerce::number(raw_value) {
                None => errors.push(PricingError::invalid_config(at, format!("expected a number, got {}", raw_value))),
                Some(n) if n < 0.0 => errors.push(PricingError::invalid_config(at, "must be >= 0")),
                Some(_) => {}
            }
        }
        fees.push(FeeDefinition::from_value(item));
    }

    errors.extend(validate_fees(&fees));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_fees_pass() {
        assert!(validate_fees(&post_processing_fees()).is_empty());
    }

    #[test]
    fn test_validate_fees_reports_each_problem() {
        let fees = vec![
            FeeDefinition::from_value(&json!({
                "id": "a", "name": "", "type": "percent", "value": 200000,
                "conditions": [
                    { "key": "material", "operator": "between", "value": "x" },
                    { "key": "material", "operator": "equals", "value": "" }
                ]
            })),
            FeeDefinition::from_value(&json!({ "id": "a", "name": "Dup", "type": "per_kwh", "value": 1 })),
        ];

        let codes: Vec<_> = validate_fees(&fees).iter().map(|e| e.to_string()).collect();
        assert_eq!(codes.len(), 6, "{:?}", codes);
        assert!(codes.iter().any(|c| c.contains("name is required")));
        assert!(codes.iter().any(|c| c.contains("exceeds")));
        assert!(codes.iter().any(|c| c.contains("'between'")));
        assert!(codes.iter().any(|c| c.contains("conditions[1]")));
        assert!(codes.iter().any(|c| c.contains("duplicate fee id")));
        assert!(codes.iter().any(|c| c.contains("unknown fee type")));
    }

    #[test]
    fn test_missing_operator_is_incomplete_not_unknown() {
        let fee = FeeDefinition::from_value(&json!({
            "id": "c", "name": "Cond", "type": "flat", "value": 1,
            "conditions": [ { "key": "material", "value": "PLA" } ]
        }));
        let errors = validate_fees(&[fee]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_code(), "INVALID_CONFIG");
        assert!(errors[0].to_string().contains("key, operator and value are required"));
    }

    #[test]
    fn test_negative_value_from_typed_input() {
        let mut fee = FeeDefinition::new("n", "Negative", FeeValueType::Flat, 0.0);
        fee.value = -1.0;
        let errors = validate_fees(&[fee]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_validate_fee_records_sees_raw_values() {
        let errors = validate_fee_records(&[
            json!({ "id": 7, "name": "Legacy", "calculation_type": "flat", "amount": "-2" }),
            json!(42),
            json!({ "id": "ok", "name": "Fine", "type": "flat", "value": "12.5" }),
        ]);
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors[0].to_string().contains("fees[7].value"));
        assert!(errors[1].to_string().contains("fees[1]"));
    }
}
