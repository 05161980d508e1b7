//! # Fee Definitions
//!
//! A configured extra charge: what it costs ([`FeeValueType`] + `value`), how
//! often it applies ([`FeeScope`]), whether the customer can toggle it
//! ([`Visibility`]), and when it applies (conditions).
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "id": "support-removal",
//!   "name": "Support removal",
//!   "type": "per_minute",
//!   "value": 0.5,
//!   "scope": "MODEL",
//!   "required": false,
//!   "selectable": false,
//!   "active": true,
//!   "conditions": [{ "key": "support_enabled", "operator": "equals", "value": true }]
//! }
//! ```
//!
//! Fee records saved by older backends use a different shape
//! (`calculation_type`, `amount`, `application_type`, `enabled`);
//! [`FeeDefinition::from_value`] reads both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::coerce;
use crate::fees::condition::FeeCondition;

/// Unit of a fee's `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeValueType {
    /// Absolute amount
    #[default]
    Flat,
    /// Amount per gram of material
    PerGram,
    /// Amount per billed minute
    PerMinute,
    /// Percentage of the non-percent subtotal
    Percent,
    /// Unrecognised type; contributes nothing
    #[serde(other)]
    Unknown,
}

impl FeeValueType {
    /// Parse current and legacy type names (`fixed` is the old `flat`)
    pub fn parse(s: &str) -> Self {
        match s {
            "flat" | "fixed" => FeeValueType::Flat,
            "per_gram" => FeeValueType::PerGram,
            "per_minute" => FeeValueType::PerMinute,
            "percent" => FeeValueType::Percent,
            _ => FeeValueType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeeValueType::Flat => "flat",
            FeeValueType::PerGram => "per_gram",
            FeeValueType::PerMinute => "per_minute",
            FeeValueType::Percent => "percent",
            FeeValueType::Unknown => "unknown",
        }
    }
}

/// How often a fee is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeeScope {
    /// Once per model, multiplied by quantity
    #[default]
    #[serde(rename = "MODEL")]
    Model,
    /// Once per order
    #[serde(rename = "ORDER")]
    Order,
}

/// Whether and how the customer sees a fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Always charged, shown but not toggleable
    Required,
    /// Customer opts in; `selected_by_default` is the initial UI state
    Selectable { selected_by_default: bool },
    /// Neither required nor selectable: always charged, not shown
    Hidden,
}

/// One configured fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub value_type: FeeValueType,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub scope: FeeScope,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub selectable: bool,
    #[serde(default)]
    pub selected_by_default: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub conditions: Vec<FeeCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

fn default_true() -> bool {
    true
}

impl FeeDefinition {
    /// A new active, selectable MODEL fee with no conditions.
    pub fn new(id: impl Into<String>, name: impl Into<String>, value_type: FeeValueType, value: f64) -> Self {
        FeeDefinition {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            value_type,
            value: coerce::clamp_min0(value),
            scope: FeeScope::Model,
            required: false,
            selectable: true,
            selected_by_default: false,
            active: true,
            conditions: Vec::new(),
            updated_at: None,
            updated_by: None,
        }
    }

    pub fn with_scope(mut self, scope: FeeScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        match visibility {
            Visibility::Required => {
                self.required = true;
                self.selectable = false;
                self.selected_by_default = true;
            }
            Visibility::Selectable { selected_by_default } => {
                self.required = false;
                self.selectable = true;
                self.selected_by_default = selected_by_default;
            }
            Visibility::Hidden => {
                self.required = false;
                self.selectable = false;
                self.selected_by_default = false;
            }
        }
        self
    }

    pub fn with_condition(mut self, condition: FeeCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Visibility derived from the flags; `required` wins over `selectable`.
    pub fn visibility(&self) -> Visibility {
        if self.required {
            Visibility::Required
        } else if self.selectable {
            Visibility::Selectable {
                selected_by_default: self.selected_by_default,
            }
        } else {
            Visibility::Hidden
        }
    }

    /// Value clamped to `>= 0`
    pub fn effective_value(&self) -> f64 {
        coerce::clamp_min0(self.value)
    }

    /// Enforce the flag invariants and clamp the value.
    ///
    /// Required fees are never selectable and always selected; a fee that is
    /// not selectable is never selected by default.
    pub fn normalize(mut self) -> Self {
        self.value = coerce::clamp_min0(self.value);
        if self.required {
            self.selectable = false;
            self.selected_by_default = true;
        } else if !self.selectable {
            self.selected_by_default = false;
        }
        if self.id.trim().is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        self
    }

    /// Read a fee record leniently, current or legacy shape.
    ///
    /// Never fails: unreadable fields take their defaults. Records without
    /// an id get a fresh UUID.
    pub fn from_value(raw: &Value) -> FeeDefinition {
        let looks_current = ["type", "scope", "value", "required"]
            .iter()
            .any(|k| raw.get(*k).is_some());
        if looks_current {
            from_current(raw)
        } else {
            from_legacy(raw)
        }
    }
}

fn string_field(raw: &Value, keys: &[&str]) -> String {
    coerce::field(raw, keys)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn id_field(raw: &Value) -> String {
    match raw.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn bool_field(raw: &Value, keys: &[&str], default: bool) -> bool {
    coerce::field(raw, keys).and_then(coerce::boolean).unwrap_or(default)
}

fn timestamp_field(raw: &Value) -> Option<DateTime<Utc>> {
    coerce::field(raw, &["updated_at"])
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_conditions(raw: Option<&Value>) -> Vec<FeeCondition> {
    let list = match raw {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    list.iter().filter_map(FeeCondition::from_value).collect()
}

fn from_current(raw: &Value) -> FeeDefinition {
    let type_name = string_field(raw, &["type"]);
    let value_type = if type_name.is_empty() {
        FeeValueType::Flat
    } else {
        FeeValueType::parse(&type_name)
    };
    if value_type == FeeValueType::Unknown {
        tracing::warn!(fee_type = %type_name, "unknown fee type, fee will contribute 0");
    }

    let scope = match string_field(raw, &["scope"]).to_uppercase().as_str() {
        "ORDER" => FeeScope::Order,
        _ => FeeScope::Model,
    };

    FeeDefinition {
        id: id_field(raw),
        name: string_field(raw, &["name"]),
        description: string_field(raw, &["description"]),
        category: string_field(raw, &["category"]),
        value_type,
        value: coerce::field(raw, &["value", "amount"])
            .and_then(coerce::non_negative)
            .unwrap_or(0.0),
        scope,
        required: bool_field(raw, &["required"], false),
        selectable: bool_field(raw, &["selectable"], true),
        selected_by_default: bool_field(raw, &["selected_by_default", "selectedByDefault"], false),
        active: bool_field(raw, &["active", "enabled"], true),
        conditions: parse_conditions(raw.get("conditions")),
        updated_at: timestamp_field(raw),
        updated_by: coerce::field(raw, &["updated_by"])
            .and_then(Value::as_str)
            .map(str::to_string),
    }
    .normalize()
}

fn from_legacy(raw: &Value) -> FeeDefinition {
    let calculation = coerce::field(raw, &["calculation_type", "calculationType"])
        .and_then(Value::as_str)
        .unwrap_or("fixed");
    let application = coerce::field(raw, &["application_type", "applicationType"])
        .and_then(Value::as_str)
        .unwrap_or("per_model");
    let amount = coerce::field(raw, &["amount"])
        .and_then(coerce::non_negative)
        .unwrap_or(0.0);

    // hourly legacy fees are stored per minute
    let (value_type, value) = match calculation {
        "per_hour" => (FeeValueType::PerMinute, amount / 60.0),
        "per_gram" => (FeeValueType::PerGram, amount),
        "per_minute" => (FeeValueType::PerMinute, amount),
        "percent" => (FeeValueType::Percent, amount),
        _ => (FeeValueType::Flat, amount),
    };

    let mut fee = FeeDefinition::new(
        id_field(raw),
        string_field(raw, &["name"]),
        value_type,
        value,
    );
    fee.scope = if application == "once_per_order" {
        FeeScope::Order
    } else {
        FeeScope::Model
    };
    fee.active = matches!(raw.get("enabled"), Some(Value::Bool(true)))
        || raw.get("enabled").and_then(Value::as_f64) == Some(1.0);
    fee.normalize()
}
