//! # Pricing Rules
//!
//! Tenant-level pricing policy and the resolver that turns a partial,
//! possibly malformed override record into a complete [`PricingRules`].
//!
//! ## Accepted shapes
//!
//! The resolver reads both the nested shape that [`PricingRules`] serializes
//! to and the flat `tenant_pricing` shape saved by the admin pricing screen.
//! When both are present the nested field wins.
//!
//! ```json
//! { "rate_per_hour": 120, "rounding": { "enabled": true, "step": 5 } }
//! { "rate_per_hour": 120, "rounding_enabled": true, "rounding_step": 5 }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pricer_core::config::{resolve, MarkupMode};
//! use serde_json::json;
//!
//! let rules = resolve(&json!({
//!     "rate_per_hour": -20,
//!     "markup_enabled": "1",
//!     "markup_mode": "percent",
//!     "rounding_step": 7
//! }));
//!
//! assert_eq!(rules.rate_per_hour, 0.0);          // negative clamps to 0
//! assert!(rules.markup.enabled);
//! assert_eq!(rules.markup.mode, MarkupMode::Percent);
//! assert_eq!(rules.rounding.step.value(), 5.0);  // out of domain -> default
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;
use crate::errors::PricingError;

/// Default hourly machine rate
pub const DEFAULT_RATE_PER_HOUR: f64 = 150.0;

/// An optional floor: `value` only matters when `enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub enabled: bool,
    pub value: f64,
}

impl Threshold {
    /// A disabled threshold that would use `value` once switched on
    pub const fn disabled(value: f64) -> Self {
        Threshold {
            enabled: false,
            value,
        }
    }

    /// An enabled threshold
    pub const fn enabled(value: f64) -> Self {
        Threshold {
            enabled: true,
            value,
        }
    }

    /// The floor to enforce, if any
    pub fn floor(&self) -> Option<f64> {
        self.enabled.then_some(self.value)
    }
}

/// Allowed rounding increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RoundingStep {
    One,
    Five,
    Ten,
    Fifty,
}

impl RoundingStep {
    /// Step size in currency units
    pub fn value(self) -> f64 {
        f64::from(u32::from(self))
    }

    /// Accepts only exact integral values in the allowed set
    pub fn from_f64(n: f64) -> Option<Self> {
        if n.fract() != 0.0 || !(0.0..=u32::MAX as f64).contains(&n) {
            return None;
        }
        RoundingStep::try_from(n as u32).ok()
    }
}

impl TryFrom<u32> for RoundingStep {
    type Error = String;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(RoundingStep::One),
            5 => Ok(RoundingStep::Five),
            10 => Ok(RoundingStep::Ten),
            50 => Ok(RoundingStep::Fifty),
            other => Err(format!("rounding step must be 1, 5, 10 or 50, got {}", other)),
        }
    }
}

impl From<RoundingStep> for u32 {
    fn from(step: RoundingStep) -> u32 {
        match step {
            RoundingStep::One => 1,
            RoundingStep::Five => 5,
            RoundingStep::Ten => 10,
            RoundingStep::Fifty => 50,
        }
    }
}

/// How a value snaps to the rounding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Nearest multiple, halves round up
    #[default]
    Nearest,
    /// Next multiple at or above the value
    Up,
}

impl RoundingMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nearest" => Some(RoundingMode::Nearest),
            "up" => Some(RoundingMode::Up),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingMode::Nearest => "nearest",
            RoundingMode::Up => "up",
        }
    }
}

/// Round `value` to a multiple of `step`.
///
/// A non-positive step rounds to whole units. Values reaching the pipeline
/// are never negative, so half-up and half-away-from-zero coincide.
pub fn round_to_step(value: f64, step: f64, mode: RoundingMode) -> f64 {
    let s = if step > 0.0 { step } else { 1.0 };
    match mode {
        RoundingMode::Up => (value / s).ceil() * s,
        RoundingMode::Nearest => (value / s + 0.5).floor() * s,
    }
}

/// Rounding policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    pub enabled: bool,
    pub step: RoundingStep,
    pub mode: RoundingMode,
    /// Round only the final order total, never the per-model price
    pub smart_rounding_only: bool,
}

impl RoundingPolicy {
    /// Apply the step and mode, ignoring `enabled`
    pub fn round(&self, value: f64) -> f64 {
        round_to_step(value, self.step.value(), self.mode)
    }
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        RoundingPolicy {
            enabled: false,
            step: RoundingStep::Five,
            mode: RoundingMode::Nearest,
            smart_rounding_only: true,
        }
    }
}

/// How markup is added on top of base cost plus fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupMode {
    /// Fixed amount per model
    #[default]
    Flat,
    /// Percentage of material + time + fees
    Percent,
    /// Raise the per-model subtotal to at least `value`
    MinFlat,
}

impl MarkupMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flat" => Some(MarkupMode::Flat),
            "percent" => Some(MarkupMode::Percent),
            "min_flat" => Some(MarkupMode::MinFlat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkupMode::Flat => "flat",
            MarkupMode::Percent => "percent",
            MarkupMode::MinFlat => "min_flat",
        }
    }
}

/// Markup policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkupPolicy {
    pub enabled: bool,
    pub mode: MarkupMode,
    pub value: f64,
}

impl Default for MarkupPolicy {
    fn default() -> Self {
        MarkupPolicy {
            enabled: false,
            mode: MarkupMode::Flat,
            value: 20.0,
        }
    }
}

/// Fully-populated tenant pricing rules.
///
/// Every numeric field is `>= 0`. Build one with [`resolve`] from raw
/// configuration, or start from `PricingRules::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Machine time rate per hour
    pub rate_per_hour: f64,
    /// Minimum billed print time in minutes
    pub min_billed_minutes: Threshold,
    /// Minimum price of one model (before quantity)
    pub min_price_per_model: Threshold,
    /// Minimum total of the whole order
    pub min_order_total: Threshold,
    pub rounding: RoundingPolicy,
    pub markup: MarkupPolicy,
}

impl Default for PricingRules {
    fn default() -> Self {
        PricingRules {
            rate_per_hour: DEFAULT_RATE_PER_HOUR,
            min_billed_minutes: Threshold::disabled(30.0),
            min_price_per_model: Threshold::disabled(99.0),
            min_order_total: Threshold::disabled(199.0),
            rounding: RoundingPolicy::default(),
            markup: MarkupPolicy::default(),
        }
    }
}

/// Nested field first (`group.key`), then the flat admin key.
fn lookup<'a>(raw: &'a Value, group: &str, key: &str, flat: &str) -> Option<&'a Value> {
    raw.get(group)
        .and_then(|g| g.get(key))
        .filter(|v| !v.is_null())
        .or_else(|| coerce::field(raw, &[flat]))
}

/// Nested field first, then the flat key, keeping the first that `read` accepts.
fn read_field<T>(
    raw: &Value,
    group: &str,
    key: &str,
    flat: &str,
    read: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    raw.get(group)
        .and_then(|g| g.get(key))
        .and_then(&read)
        .or_else(|| raw.get(flat).and_then(&read))
}

fn resolve_threshold(raw: &Value, group: &str, default: Threshold) -> Threshold {
    Threshold {
        enabled: read_field(raw, group, "enabled", &format!("{}_enabled", group), coerce::boolean)
            .unwrap_or(default.enabled),
        value: read_field(raw, group, "value", &format!("{}_value", group), coerce::non_negative)
            .unwrap_or(default.value),
    }
}

/// Merge raw overrides with the documented defaults.
///
/// Never fails. A field that is missing, of the wrong type or outside its
/// domain takes the default; negative numbers clamp to 0. Resolving the
/// serialized form of an already-resolved record returns it unchanged.
pub fn resolve(raw: &Value) -> PricingRules {
    let d = PricingRules::default();
    if !raw.is_object() {
        if !raw.is_null() {
            tracing::warn!("pricing overrides are not an object, using defaults");
        }
        return d;
    }

    let rate_per_hour = coerce::field(raw, &["rate_per_hour"])
        .and_then(coerce::non_negative)
        .unwrap_or(d.rate_per_hour);

    let rounding = RoundingPolicy {
        enabled: read_field(raw, "rounding", "enabled", "rounding_enabled", coerce::boolean)
            .unwrap_or(d.rounding.enabled),
        step: read_field(raw, "rounding", "step", "rounding_step", |v| {
            coerce::number(v).and_then(RoundingStep::from_f64)
        })
        .unwrap_or(d.rounding.step),
        mode: read_field(raw, "rounding", "mode", "rounding_mode", |v| {
            coerce::text(v).and_then(RoundingMode::parse)
        })
        .unwrap_or(d.rounding.mode),
        smart_rounding_only: read_field(raw, "rounding", "smart_rounding_only", "smart_rounding_enabled", coerce::boolean)
            .unwrap_or(d.rounding.smart_rounding_only),
    };

    let markup = MarkupPolicy {
        enabled: read_field(raw, "markup", "enabled", "markup_enabled", coerce::boolean)
            .unwrap_or(d.markup.enabled),
        mode: read_field(raw, "markup", "mode", "markup_mode", |v| {
            coerce::text(v).and_then(MarkupMode::parse)
        })
        .unwrap_or(d.markup.mode),
        value: read_field(raw, "markup", "value", "markup_value", coerce::non_negative)
            .unwrap_or(d.markup.value),
    };

    PricingRules {
        rate_per_hour,
        min_billed_minutes: resolve_threshold(raw, "min_billed_minutes", d.min_billed_minutes),
        min_price_per_model: resolve_threshold(raw, "min_price_per_model", d.min_price_per_model),
        min_order_total: resolve_threshold(raw, "min_order_total", d.min_order_total),
        rounding,
        markup,
    }
}

/// Admin-side validation of raw pricing overrides.
///
/// Reports every problem the resolver would silently repair. Absent fields
/// are fine; they take defaults.
pub fn validate_rules(raw: &Value) -> Vec<PricingError> {
    let mut errors = Vec::new();
    if !raw.is_object() {
        errors.push(PricingError::invalid_config("tenant_pricing", "expected an object"));
        return errors;
    }

    let amounts = [
        ("rate_per_hour", coerce::field(raw, &["rate_per_hour"])),
        ("min_billed_minutes_value", lookup(raw, "min_billed_minutes", "value", "min_billed_minutes_value")),
        ("min_price_per_model_value", lookup(raw, "min_price_per_model", "value", "min_price_per_model_value")),
        ("min_order_total_value", lookup(raw, "min_order_total", "value", "min_order_total_value")),
        ("markup_value", lookup(raw, "markup", "value", "markup_value")),
    ];
    for (path, value) in amounts {
        let Some(value) = value else { continue };
        match coerce::number(value) {
            None => errors.push(PricingError::invalid_config(path, format!("expected a number, got {}", value))),
            Some(n) if n < 0.0 => errors.push(PricingError::invalid_config(path, "must be >= 0")),
            Some(_) => {}
        }
    }

    if let Some(step) = lookup(raw, "rounding", "step", "rounding_step") {
        if coerce::number(step).and_then(RoundingStep::from_f64).is_none() {
            errors.push(PricingError::invalid_config(
                "rounding_step",
                format!("must be one of 1, 5, 10, 50, got {}", step),
            ));
        }
    }

    if let Some(mode) = lookup(raw, "rounding", "mode", "rounding_mode") {
        if coerce::text(mode).and_then(RoundingMode::parse).is_none() {
            errors.push(PricingError::invalid_config(
                "rounding_mode",
                format!("must be 'nearest' or 'up', got {}", mode),
            ));
        }
    }

    if let Some(mode) = lookup(raw, "markup", "mode", "markup_mode") {
        if coerce::text(mode).and_then(MarkupMode::parse).is_none() {
            errors.push(PricingError::invalid_config(
                "markup_mode",
                format!("must be 'flat', 'percent' or 'min_flat', got {}", mode),
            ));
        }
    }

    errors
}
