//! # Material Price Table
//!
//! Price per gram keyed by lowercase material identifier.
//!
//! Lookups never fail. A key missing from the table falls back to the table's
//! own `pla` entry, and a table without `pla` falls back to the built-in PLA
//! price.
//!
//! ## Example
//!
//! ```rust
//! use pricer_core::config::MaterialPriceTable;
//!
//! let table = MaterialPriceTable::from_pairs([("petg", 0.9), ("pla", 0.4)]);
//! assert_eq!(table.price_per_gram("PETG"), 0.9);
//! assert_eq!(table.price_per_gram("nylon"), 0.4);   // table's pla
//!
//! let bare = MaterialPriceTable::from_pairs([("petg", 0.9)]);
//! assert_eq!(bare.price_per_gram("nylon"), 0.5);    // built-in pla
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;

/// Key every lookup falls back to
pub const FALLBACK_MATERIAL: &str = "pla";

/// Built-in PLA price per gram, the last link of the fallback chain
pub const DEFAULT_PLA_PRICE_PER_GRAM: f64 = 0.5;

static DEFAULT_MATERIAL_PRICES: Lazy<MaterialPriceTable> = Lazy::new(|| {
    MaterialPriceTable::from_pairs([
        ("pla", DEFAULT_PLA_PRICE_PER_GRAM),
        ("abs", 0.6),
        ("petg", 0.7),
        ("tpu", 1.2),
        ("wood", 0.8),
        ("carbon", 1.5),
    ])
});

/// One row of the admin materials list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Material key -> price per gram.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialPriceTable(BTreeMap<String, f64>);

impl MaterialPriceTable {
    /// The built-in default table
    pub fn builtin() -> &'static MaterialPriceTable {
        &DEFAULT_MATERIAL_PRICES
    }

    /// Build from `(key, price)` pairs; keys are lowercased, prices clamped to `>= 0`
    pub fn from_pairs<K: AsRef<str>>(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        MaterialPriceTable(
            pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().trim().to_lowercase(), coerce::clamp_min0(v)))
                .collect(),
        )
    }

    /// Build from admin material rows.
    ///
    /// Disabled and unnamed rows are skipped. The key is the name lowercased
    /// with each whitespace run replaced by `_` ("Carbon PLA" -> "carbon_pla").
    pub fn from_materials(entries: &[MaterialEntry]) -> Self {
        MaterialPriceTable(
            entries
                .iter()
                .filter(|m| m.enabled && !m.name.trim().is_empty())
                .map(|m| (material_key_from_name(&m.name), coerce::clamp_min0(m.price)))
                .collect(),
        )
    }

    /// Read a `{ key: price }` object leniently.
    ///
    /// Returns `None` when `raw` is not an object. Unreadable prices read as 0.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let map = raw.as_object()?;
        Some(MaterialPriceTable(
            map.iter()
                .map(|(k, v)| (k.trim().to_lowercase(), coerce::non_negative(v).unwrap_or(0.0)))
                .collect(),
        ))
    }

    /// Price per gram for `key`, following the fallback chain.
    pub fn price_per_gram(&self, key: &str) -> f64 {
        self.lookup(key).price_per_gram
    }

    /// Price lookup that also reports which link of the chain answered.
    pub fn lookup(&self, key: &str) -> MaterialPrice {
        let key = key.trim().to_lowercase();
        if let Some(&price) = self.0.get(&key) {
            return MaterialPrice {
                key,
                price_per_gram: coerce::clamp_min0(price),
                source: PriceSource::Table,
            };
        }

        if let Some(&price) = self.0.get(FALLBACK_MATERIAL) {
            tracing::warn!(material = %key, "unknown material, using table pla price");
            return MaterialPrice {
                key,
                price_per_gram: coerce::clamp_min0(price),
                source: PriceSource::TablePla,
            };
        }

        tracing::warn!(material = %key, "unknown material and no pla entry, using built-in pla price");
        MaterialPrice {
            key,
            price_per_gram: DEFAULT_PLA_PRICE_PER_GRAM,
            source: PriceSource::BuiltinPla,
        }
    }

    pub fn insert(&mut self, key: &str, price: f64) {
        self.0.insert(key.trim().to_lowercase(), coerce::clamp_min0(price));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(&key.trim().to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Which link of the fallback chain produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Table,
    TablePla,
    BuiltinPla,
}

/// Result of a material price lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPrice {
    /// Normalized key that was requested
    pub key: String,
    pub price_per_gram: f64,
    pub source: PriceSource,
}

/// Admin material name to table key
pub fn material_key_from_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
