//! # pricer_core - 3D Print Pricing Engine
//!
//! `pricer_core` computes the price of a 3D-print job from a tenant's pricing
//! configuration: material and machine-time cost, configurable fees with
//! conditions, express delivery, markup, minimum charges and rounding. The
//! storefront quote and the admin pricing sandbox both go through the same
//! [`pipeline::price`], so they always agree.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: every function takes its configuration as an argument
//! - **Fail-soft**: malformed configuration is coerced to defaults, never an error
//! - **JSON-First**: all records implement Serialize/Deserialize
//! - **One pipeline**: fixed stage order, one implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use pricer_core::config::PricingConfig;
//! use serde_json::json;
//!
//! let config = PricingConfig::from_value(&json!({
//!     "material_prices": { "pla": 0.5 },
//!     "tenant_pricing": { "rate_per_hour": 100 }
//! }));
//!
//! let quote = config
//!     .quote_value(&json!({ "material": "pla", "material_grams": 100, "print_time_seconds": 3600, "quantity": 2 }))
//!     .unwrap();
//! assert_eq!(quote.total, 300.0);
//! ```
//!
//! ## Modules
//!
//! - [`config`] - pricing rules, material prices, the configuration document
//! - [`fees`] - fee definitions, conditions and evaluation
//! - [`job`] - per-job input
//! - [`pipeline`] - the price computation and its breakdown
//! - [`sandbox`] - admin preview adapter
//! - [`format`] - display helpers
//! - [`units`] - type-safe unit wrappers
//! - [`errors`] - structured error types
//! - [`file_io`] - atomic config saves and lenient loads

pub mod coerce;
pub mod config;
pub mod errors;
pub mod fees;
pub mod file_io;
pub mod format;
pub mod job;
pub mod pipeline;
pub mod sandbox;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use config::{PricingConfig, PricingRules};
pub use errors::{PricingError, PricingResult};
pub use file_io::{load_config, save_config};
pub use job::JobInput;
pub use pipeline::{price, PriceBreakdown};
