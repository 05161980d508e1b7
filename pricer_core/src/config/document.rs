//! # Pricing Configuration Document
//!
//! The single-tenant blob a caller hands in: material prices, tenant pricing
//! rules and the fee list.
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "material_prices": { "pla": 0.5, "petg": 0.7 },
//!   "tenant_pricing": { "rate_per_hour": 150, "rounding_enabled": true },
//!   "fees": [ { "id": "setup", "name": "Setup", "type": "flat", "value": 30, "required": true } ]
//! }
//! ```
//!
//! [`PricingConfig::from_value`] reads it leniently. `materialPrices` is
//! accepted for `material_prices`, a `materials` row list stands in when no
//! table is given, and a top-level `timeRate` supplies the hourly rate when
//! the pricing rules do not.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;
use crate::config::materials::{MaterialEntry, MaterialPriceTable};
use crate::config::rules::{resolve, validate_rules, PricingRules};
use crate::errors::{PricingError, PricingResult};
use crate::fees::{post_processing_fees, validate_fee_records, FeeDefinition};
use crate::job::JobInput;
use crate::pipeline::{self, PriceBreakdown};

/// Current schema version for saved configuration documents
pub const SCHEMA_VERSION: &str = "0.1.0";

/// A complete, resolved pricing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub version: String,
    pub material_prices: MaterialPriceTable,
    #[serde(rename = "tenant_pricing")]
    pub rules: PricingRules,
    pub fees: Vec<FeeDefinition>,
}

impl Default for PricingConfig {
    /// Built-in material prices, default rules and the post-processing catalog
    fn default() -> Self {
        PricingConfig {
            version: SCHEMA_VERSION.to_string(),
            material_prices: MaterialPriceTable::builtin().clone(),
            rules: PricingRules::default(),
            fees: post_processing_fees(),
        }
    }
}

impl PricingConfig {
    /// Resolve a raw document. Never fails; see the module docs for aliases.
    pub fn from_value(raw: &Value) -> PricingConfig {
        if !raw.is_object() && !raw.is_null() {
            tracing::warn!("pricing config is not an object, using defaults");
        }

        let version = coerce::field(raw, &["version"])
            .and_then(coerce::text)
            .unwrap_or(SCHEMA_VERSION)
            .to_string();

        PricingConfig {
            version,
            material_prices: read_material_prices(raw),
            rules: read_rules(raw),
            fees: read_fees(raw),
        }
    }

    /// Price a typed job
    pub fn quote(&self, job: &JobInput) -> PriceBreakdown {
        pipeline::price(&self.rules, job, &self.material_prices, &self.fees)
    }

    /// Price a raw job record; fails only when the record breaks the
    /// caller contract (see [`JobInput::from_value`])
    pub fn quote_value(&self, raw_job: &Value) -> PricingResult<PriceBreakdown> {
        let job = JobInput::from_value(raw_job)?;
        Ok(self.quote(&job))
    }

    /// Admin-side validation of a raw document.
    ///
    /// Collects every problem [`from_value`](Self::from_value) would
    /// silently repair. An empty result means the document is clean.
    pub fn validate(raw: &Value) -> Vec<PricingError> {
        if !raw.is_object() {
            return vec![PricingError::invalid_config("", "expected an object")];
        }

        let mut errors = Vec::new();

        if let Some(prices) = coerce::field(raw, &["material_prices", "materialPrices"]) {
            match prices.as_object() {
                None => errors.push(PricingError::invalid_config("material_prices", "expected an object")),
                Some(map) => {
                    for (key, price) in map {
                        let ok = coerce::number(price).map(|n| n >= 0.0).unwrap_or(false);
                        if !ok {
                            errors.push(PricingError::invalid_config(
                                format!("material_prices.{}", key),
                                format!("expected a price >= 0, got {}", price),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(pricing) = coerce::field(raw, &["tenant_pricing", "tenantPricing"]) {
            errors.extend(validate_rules(pricing));
        }

        match raw.get("fees") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => errors.extend(validate_fee_records(items)),
            Some(_) => errors.push(PricingError::invalid_config("fees", "expected an array")),
        }

        errors
    }
}

fn read_material_prices(raw: &Value) -> MaterialPriceTable {
    if let Some(table) = coerce::field(raw, &["material_prices", "materialPrices"]).and_then(MaterialPriceTable::from_value) {
        return table;
    }

    if let Some(rows) = raw.get("materials").and_then(Value::as_array) {
        let entries: Vec<MaterialEntry> = rows
            .iter()
            .filter_map(|row| {
                let name = coerce::field(row, &["name"]).and_then(coerce::text)?;
                Some(MaterialEntry {
                    name: name.to_string(),
                    price: coerce::field(row, &["price"]).and_then(coerce::non_negative).unwrap_or(0.0),
                    enabled: coerce::field(row, &["enabled"]).and_then(coerce::boolean).unwrap_or(true),
                })
            })
            .collect();
        return MaterialPriceTable::from_materials(&entries);
    }

    MaterialPriceTable::builtin().clone()
}

fn read_rules(raw: &Value) -> PricingRules {
    let pricing = coerce::field(raw, &["tenant_pricing", "tenantPricing"]).unwrap_or(&Value::Null);
    let mut rules = resolve(pricing);

    if coerce::field(pricing, &["rate_per_hour"]).is_none() {
        if let Some(rate) = coerce::field(raw, &["timeRate", "time_rate"]).and_then(coerce::non_negative) {
            rules.rate_per_hour = rate;
        }
    }
    rules
}

fn read_fees(raw: &Value) -> Vec<FeeDefinition> {
    match raw.get("fees") {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| {
                let ok = item.is_object();
                if !ok {
                    tracing::warn!(entry = %item, "skipping malformed fee entry");
                }
                ok
            })
            .map(FeeDefinition::from_value)
            .collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            tracing::warn!(fees = %other, "fees is not an array, ignoring");
            Vec::new()
        }
    }
}
