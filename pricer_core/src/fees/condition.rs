//! # Fee Conditions
//!
//! A fee may carry an ordered list of `{key, operator, value}` conditions that
//! must all match the job's attributes before the fee applies.
//!
//! ## Comparison domain
//!
//! The job attribute decides how the operand is read:
//!
//! | attribute | operand coerced to | `equals` | `gte`/`lte` | `contains` |
//! |-----------|--------------------|----------|-------------|------------|
//! | number    | number (`"30"` ok) | numeric  | numeric     | no match   |
//! | boolean   | bool (`"true"`, `1`) | boolean | no match   | no match   |
//! | text      | text               | case-insensitive | numeric if both parse, else no match | case-insensitive substring |
//!
//! An operand that cannot be read in the attribute's domain never matches.
//! `not_equals` is always the negation of `equals`, so an absent attribute
//! or a domain mismatch *satisfies* `not_equals`: `quality not_equals Pro`
//! matches a job that carries no `quality` attribute at all.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed attribute or operand value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Read a JSON scalar; arrays, objects and null give `None`
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(AttributeValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(AttributeValue::Number),
            Value::String(s) => Some(AttributeValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Numeric reading: numbers as-is, numeric strings parsed
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
            AttributeValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            AttributeValue::Bool(_) => None,
        }
    }

    /// Boolean reading: bools as-is, `"true"/"false"/"1"/"0"`, `1`/`0`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Number(n) if *n == 1.0 => Some(true),
            AttributeValue::Number(n) if *n == 0.0 => Some(false),
            AttributeValue::Number(_) => None,
            AttributeValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
        }
    }

    /// True for an empty or whitespace-only text value
    pub fn is_blank(&self) -> bool {
        matches!(self, AttributeValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// Domain a comparison runs in, chosen by the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonDomain {
    Number,
    Boolean,
    Text,
}

impl ComparisonDomain {
    pub fn of(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Number(_) => ComparisonDomain::Number,
            AttributeValue::Bool(_) => ComparisonDomain::Boolean,
            AttributeValue::Text(_) => ComparisonDomain::Text,
        }
    }
}

/// Condition operator. Unknown names are kept so validation can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Gte,
    Lte,
    Contains,
    Unknown(String),
}

impl ConditionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::Gte => "gte",
            ConditionOperator::Lte => "lte",
            ConditionOperator::Contains => "contains",
            ConditionOperator::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ConditionOperator::Unknown(_))
    }
}

impl From<String> for ConditionOperator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "equals" => ConditionOperator::Equals,
            "not_equals" => ConditionOperator::NotEquals,
            "gte" => ConditionOperator::Gte,
            "lte" => ConditionOperator::Lte,
            "contains" => ConditionOperator::Contains,
            _ => ConditionOperator::Unknown(s),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> String {
        op.as_str().to_string()
    }
}

/// One `{key, operator, value}` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeCondition {
    /// Job attribute name, e.g. `material`, `infill_percent`
    pub key: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Option<AttributeValue>,
}

impl FeeCondition {
    pub fn new(key: impl Into<String>, operator: ConditionOperator, value: impl Into<AttributeValue>) -> Self {
        FeeCondition {
            key: key.into(),
            operator,
            value: Some(value.into()),
        }
    }

    /// Read a condition object leniently; `None` if it is not an object
    pub fn from_value(raw: &Value) -> Option<Self> {
        raw.as_object()?;
        Some(FeeCondition {
            key: raw.get("key").and_then(Value::as_str).unwrap_or_default().to_string(),
            operator: ConditionOperator::from(
                raw.get("operator").and_then(Value::as_str).unwrap_or_default().to_string(),
            ),
            value: raw.get("value").and_then(AttributeValue::from_json),
        })
    }

    /// Whether key, operator and value are all filled in
    pub fn is_complete(&self) -> bool {
        !self.key.trim().is_empty()
            && !self.operator.as_str().trim().is_empty()
            && self.value.as_ref().is_some_and(|v| !v.is_blank())
    }

    /// Evaluate against the job's value for `self.key` (`None` when absent).
    pub fn matches(&self, attribute: Option<&AttributeValue>) -> bool {
        match &self.operator {
            ConditionOperator::NotEquals => !equals(attribute, self.value.as_ref()),
            ConditionOperator::Equals => equals(attribute, self.value.as_ref()),
            ConditionOperator::Gte => ordered(attribute, self.value.as_ref(), |a, b| a >= b),
            ConditionOperator::Lte => ordered(attribute, self.value.as_ref(), |a, b| a <= b),
            ConditionOperator::Contains => contains(attribute, self.value.as_ref()),
            ConditionOperator::Unknown(name) => {
                tracing::warn!(operator = %name, key = %self.key, "unknown condition operator, treating as no match");
                false
            }
        }
    }
}

const NUMERIC_EPSILON: f64 = 1e-9;

fn equals(attribute: Option<&AttributeValue>, operand: Option<&AttributeValue>) -> bool {
    let (Some(attr), Some(operand)) = (attribute, operand) else {
        return false;
    };
    match ComparisonDomain::of(attr) {
        ComparisonDomain::Number => match (attr.as_number(), operand.as_number()) {
            (Some(a), Some(b)) => (a - b).abs() < NUMERIC_EPSILON,
            _ => false,
        },
        ComparisonDomain::Boolean => match (attr.as_bool(), operand.as_bool()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        ComparisonDomain::Text => match operand {
            AttributeValue::Text(b) => text_eq(&attr.to_string(), b),
            AttributeValue::Number(_) => match (attr.as_number(), operand.as_number()) {
                (Some(a), Some(b)) => (a - b).abs() < NUMERIC_EPSILON,
                _ => false,
            },
            AttributeValue::Bool(b) => attr.as_bool() == Some(*b),
        },
    }
}

fn ordered(
    attribute: Option<&AttributeValue>,
    operand: Option<&AttributeValue>,
    cmp: impl Fn(f64, f64) -> bool,
) -> bool {
    let (Some(attr), Some(operand)) = (attribute, operand) else {
        return false;
    };
    if ComparisonDomain::of(attr) == ComparisonDomain::Boolean {
        return false;
    }
    match (attr.as_number(), operand.as_number()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn contains(attribute: Option<&AttributeValue>, operand: Option<&AttributeValue>) -> bool {
    match (attribute, operand) {
        (Some(AttributeValue::Text(haystack)), Some(needle)) => haystack
            .to_lowercase()
            .contains(&needle.to_string().trim().to_lowercase()),
        _ => false,
    }
}

fn text_eq(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cond(key: &str, op: &str, value: Value) -> FeeCondition {
        FeeCondition::from_value(&json!({ "key": key, "operator": op, "value": value })).unwrap()
    }

    fn text(s: &str) -> AttributeValue {
        AttributeValue::Text(s.to_string())
    }

    #[test]
    fn test_text_equals_is_case_insensitive() {
        let c = cond("material", "equals", json!("PETG"));
        assert!(c.matches(Some(&text("petg"))));
        assert!(!c.matches(Some(&text("pla"))));
    }

    #[test]
    fn test_absent_attribute() {
        for op in ["equals", "gte", "lte", "contains"] {
            assert!(!cond("infill_percent", op, json!(20)).matches(None), "{} should not match", op);
        }
        assert!(cond("material", "not_equals", json!("PETG")).matches(None));
    }

    #[test]
    fn test_numeric_comparisons_with_numeric_strings() {
        let infill = AttributeValue::Number(30.0);
        assert!(cond("infill_percent", "gte", json!("30")).matches(Some(&infill)));
        assert!(cond("infill_percent", "lte", json!(30)).matches(Some(&infill)));
        assert!(!cond("infill_percent", "gte", json!(31)).matches(Some(&infill)));
        assert!(cond("infill_percent", "equals", json!("30.0")).matches(Some(&infill)));

        // text attribute holding a number still compares numerically for gte/lte
        assert!(cond("infill_percent", "gte", json!(25)).matches(Some(&text("30"))));
        // non-numeric text never satisfies gte
        assert!(!cond("quality_preset", "gte", json!(1)).matches(Some(&text("Pro"))));
    }

    #[test]
    fn test_numeric_operand_that_does_not_parse() {
        let infill = AttributeValue::Number(30.0);
        assert!(!cond("infill_percent", "gte", json!("lots")).matches(Some(&infill)));
        assert!(cond("infill_percent", "not_equals", json!("lots")).matches(Some(&infill)));
    }

    #[test]
    fn test_boolean_domain() {
        let supports = AttributeValue::Bool(true);
        assert!(cond("support_enabled", "equals", json!("true")).matches(Some(&supports)));
        assert!(cond("support_enabled", "equals", json!(true)).matches(Some(&supports)));
        assert!(cond("support_enabled", "equals", json!(1)).matches(Some(&supports)));
        assert!(!cond("support_enabled", "equals", json!("false")).matches(Some(&supports)));
        assert!(!cond("support_enabled", "gte", json!(0)).matches(Some(&supports)));
        // text attribute carrying a boolean
        assert!(cond("support_enabled", "equals", json!(false)).matches(Some(&text("false"))));
    }

    #[test]
    fn test_contains() {
        let preset = text("Pro Detail");
        assert!(cond("quality_preset", "contains", json!("detail")).matches(Some(&preset)));
        assert!(!cond("quality_preset", "contains", json!("draft")).matches(Some(&preset)));
        assert!(!cond("infill_percent", "contains", json!("3")).matches(Some(&AttributeValue::Number(30.0))));
    }

    #[test]
    fn test_unknown_operator_never_matches() {
        let c = cond("material", "between", json!("a"));
        assert_eq!(c.operator, ConditionOperator::Unknown("between".into()));
        assert!(!c.matches(Some(&text("a"))));
        assert!(!c.matches(None));
    }

    #[test]
    fn test_operator_serialization_keeps_unknown_name() {
        let c = cond("material", "between", json!("a"));
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["operator"], "between");
        let back: FeeCondition = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_completeness() {
        assert!(cond("material", "equals", json!("PLA")).is_complete());
        assert!(!cond("material", "equals", json!("")).is_complete());
        assert!(!cond("", "equals", json!("PLA")).is_complete());
        assert!(!FeeCondition::from_value(&json!({ "key": "material", "operator": "equals" }))
            .unwrap()
            .is_complete());
    }
}
