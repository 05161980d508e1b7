//! # Job Input
//!
//! One priceable unit: a model printed `quantity` times in one material.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "material": "PETG",
//!   "material_grams": 84.5,
//!   "print_time_seconds": 7200,
//!   "quantity": 3,
//!   "express_delivery": false,
//!   "selected_fee_ids": ["sanding"],
//!   "attributes": { "quality_preset": "Pro", "support_enabled": true, "infill_percent": 20 }
//! }
//! ```
//!
//! The storefront's camelCase names (`materialGrams`, `printTimeSeconds`,
//! `expressDelivery`, `postProcessing`) are accepted as aliases.
//!
//! Scalar top-level fields that are not job fields (`qualityPreset`,
//! `infill_percent`, ...) are also read as condition attributes, with
//! camelCase names mapped to snake_case. Entries in `attributes` win.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;
use crate::errors::{PricingError, PricingResult};
use crate::fees::AttributeValue;
use crate::units::Grams;

/// Material used when a job names none
pub const DEFAULT_MATERIAL: &str = "pla";

/// Per-job pricing input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    #[serde(default = "default_material")]
    pub material: String,

    #[serde(alias = "materialGrams")]
    pub material_grams: f64,

    #[serde(alias = "printTimeSeconds")]
    pub print_time_seconds: f64,

    /// Raw requested quantity; see [`JobInput::quantity`]
    #[serde(default = "default_quantity")]
    pub quantity: f64,

    #[serde(default, alias = "expressDelivery")]
    pub express_delivery: bool,

    /// Ids of selectable fees the customer opted into
    #[serde(default, alias = "selectedFeeIds", alias = "postProcessing")]
    pub selected_fee_ids: BTreeSet<String>,

    /// Extra attributes for fee conditions
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// Keys `from_value` reads as job fields rather than condition attributes
const JOB_FIELDS: [&str; 12] = [
    "material",
    "material_grams",
    "materialGrams",
    "print_time_seconds",
    "printTimeSeconds",
    "quantity",
    "express_delivery",
    "expressDelivery",
    "selected_fee_ids",
    "selectedFeeIds",
    "postProcessing",
    "attributes",
];

/// `infillPercent` -> `infill_percent`; snake_case passes through
pub fn attribute_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 4);
    for (i, ch) in name.trim().chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 && !key.ends_with('_') {
                key.push('_');
            }
            key.push(ch.to_ascii_lowercase());
        } else {
            key.push(ch);
        }
    }
    key
}

fn scalar_attributes<'a>(
    out: &mut BTreeMap<String, AttributeValue>,
    entries: impl Iterator<Item = (&'a String, &'a Value)>,
) {
    for (name, value) in entries {
        if let Some(value) = AttributeValue::from_json(value) {
            out.insert(attribute_key(name), value);
        }
    }
}

fn default_material() -> String {
    DEFAULT_MATERIAL.to_string()
}

fn default_quantity() -> f64 {
    1.0
}

/// Floor of the input, minimum 1. Non-finite input gives 1.
pub fn normalize_quantity(raw: f64) -> u32 {
    if !raw.is_finite() || raw < 1.0 {
        return 1;
    }
    raw.floor().min(u32::MAX as f64) as u32
}

impl JobInput {
    pub fn new(material: impl Into<String>, material_grams: f64, print_time_seconds: f64) -> Self {
        JobInput {
            material: material.into(),
            material_grams,
            print_time_seconds,
            quantity: 1.0,
            express_delivery: false,
            selected_fee_ids: BTreeSet::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_express(mut self, express: bool) -> Self {
        self.express_delivery = express;
        self
    }

    pub fn select_fee(mut self, fee_id: impl Into<String>) -> Self {
        self.selected_fee_ids.insert(fee_id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Normalized quantity (integer >= 1)
    pub fn quantity(&self) -> u32 {
        normalize_quantity(self.quantity)
    }

    /// Lowercased material key, `pla` when blank
    pub fn material_key(&self) -> String {
        let key = self.material.trim().to_lowercase();
        if key.is_empty() {
            DEFAULT_MATERIAL.to_string()
        } else {
            key
        }
    }

    /// Material mass, clamped to `>= 0`
    pub fn grams(&self) -> Grams {
        Grams(coerce::clamp_min0(self.material_grams))
    }

    pub fn seconds(&self) -> f64 {
        coerce::clamp_min0(self.print_time_seconds)
    }

    pub fn is_selected(&self, fee_id: &str) -> bool {
        self.selected_fee_ids.contains(fee_id)
    }

    /// Attribute lookup for fee conditions.
    ///
    /// Explicit attributes win; `material`, `quantity` and
    /// `express_delivery` fall back to the job's own fields.
    pub fn attribute(&self, key: &str) -> Option<AttributeValue> {
        if let Some(value) = self.attributes.get(key) {
            return Some(value.clone());
        }
        match key {
            "material" => Some(AttributeValue::Text(self.material_key())),
            "quantity" => Some(AttributeValue::Number(f64::from(self.quantity()))),
            "express_delivery" => Some(AttributeValue::Bool(self.express_delivery)),
            _ => None,
        }
    }

    /// Read a raw job record leniently.
    ///
    /// `material_grams` and `print_time_seconds` are part of the caller's
    /// contract: a record that omits either is rejected with
    /// [`PricingError::MissingField`]. Present but unreadable numbers read
    /// as 0, like every other malformed value.
    pub fn from_value(raw: &Value) -> PricingResult<JobInput> {
        if !raw.is_object() {
            return Err(PricingError::invalid_input("job", raw.to_string(), "expected a JSON object"));
        }

        let grams = coerce::field(raw, &["material_grams", "materialGrams"])
            .ok_or_else(|| PricingError::missing_field("material_grams"))?;
        let seconds = coerce::field(raw, &["print_time_seconds", "printTimeSeconds"])
            .ok_or_else(|| PricingError::missing_field("print_time_seconds"))?;

        let selected_fee_ids = ["selected_fee_ids", "selectedFeeIds", "postProcessing"]
            .iter()
            .filter_map(|k| raw.get(*k).and_then(Value::as_array))
            .flatten()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        // top-level extras first, so the nested `attributes` object wins
        let mut attributes = BTreeMap::new();
        if let Some(map) = raw.as_object() {
            scalar_attributes(&mut attributes, map.iter().filter(|(k, _)| !JOB_FIELDS.contains(&k.as_str())));
        }
        if let Some(map) = raw.get("attributes").and_then(Value::as_object) {
            scalar_attributes(&mut attributes, map.iter());
        }

        Ok(JobInput {
            material: coerce::field(raw, &["material"])
                .and_then(coerce::text)
                .unwrap_or(DEFAULT_MATERIAL)
                .to_string(),
            material_grams: coerce::non_negative(grams).unwrap_or(0.0),
            print_time_seconds: coerce::non_negative(seconds).unwrap_or(0.0),
            quantity: coerce::field(raw, &["quantity"])
                .and_then(coerce::number)
                .unwrap_or(1.0),
            express_delivery: coerce::field(raw, &["express_delivery", "expressDelivery"])
                .and_then(coerce::boolean)
                .unwrap_or(false),
            selected_fee_ids,
            attributes,
        })
    }
}
