//! # Configuration
//!
//! Everything a tenant configures, resolved into complete typed records.
//!
//! - [`rules`] - [`PricingRules`] and the lenient [`resolve`]r
//! - [`materials`] - [`MaterialPriceTable`] with its fallback chain
//! - [`document`] - [`PricingConfig`], the whole configuration blob

pub mod document;
pub mod materials;
pub mod rules;

pub use document::{PricingConfig, SCHEMA_VERSION};
pub use materials::{
    material_key_from_name, MaterialEntry, MaterialPrice, MaterialPriceTable, PriceSource,
    DEFAULT_PLA_PRICE_PER_GRAM, FALLBACK_MATERIAL,
};
pub use rules::{
    resolve, round_to_step, validate_rules, MarkupMode, MarkupPolicy, PricingRules, RoundingMode,
    RoundingPolicy, RoundingStep, Threshold, DEFAULT_RATE_PER_HOUR,
};
