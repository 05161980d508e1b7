//! # Pricing Sandbox
//!
//! The admin "test with example" calculator. It takes a hypothetical part
//! described by raw numbers instead of a material key and a fee list, and
//! prices it through the same [`pipeline::price`](crate::pipeline::price)
//! the storefront uses, so the preview can never drift from real quotes.
//!
//! ## Example
//!
//! ```rust
//! use pricer_core::config::PricingRules;
//! use pricer_core::sandbox::{preview, SandboxInput};
//!
//! let rules = PricingRules { rate_per_hour: 100.0, ..PricingRules::default() };
//! let result = preview(&rules, &SandboxInput::default());
//!
//! // 100 g at 0.6 + 60 min at 100/h
//! assert_eq!(result.total, 160.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{MaterialPriceTable, PricingRules};
use crate::fees::{FeeDefinition, FeeValueType, Visibility};
use crate::job::JobInput;
use crate::pipeline::{self, PriceBreakdown};
use crate::units::{Minutes, Seconds};

/// Material key the sandbox prices under
const SANDBOX_MATERIAL: &str = "sandbox";

/// Id of the synthetic fee carrying `fees_total`
pub const SANDBOX_FEE_ID: &str = "sandbox_fees";

/// A hypothetical part for the preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxInput {
    pub material_price_per_g: f64,
    pub weight_g: f64,
    pub time_min: f64,
    pub quantity: f64,
    /// Flat fees per model
    pub fees_total: f64,
}

impl Default for SandboxInput {
    fn default() -> Self {
        SandboxInput {
            material_price_per_g: 0.6,
            weight_g: 100.0,
            time_min: 60.0,
            quantity: 1.0,
            fees_total: 0.0,
        }
    }
}

impl SandboxInput {
    /// The equivalent job, material table and fee list
    fn to_pipeline_input(&self) -> (JobInput, MaterialPriceTable, Vec<FeeDefinition>) {
        let seconds: Seconds = Minutes(self.time_min).into();
        let job = JobInput::new(SANDBOX_MATERIAL, self.weight_g, seconds.value()).with_quantity(self.quantity);
        let table = MaterialPriceTable::from_pairs([(SANDBOX_MATERIAL, self.material_price_per_g)]);
        let fees = vec![
            FeeDefinition::new(SANDBOX_FEE_ID, "Fees", FeeValueType::Flat, self.fees_total)
                .with_visibility(Visibility::Hidden),
        ];
        (job, table, fees)
    }
}

/// Price the sandbox part under `rules`.
pub fn preview(rules: &PricingRules, input: &SandboxInput) -> PriceBreakdown {
    let (job, table, fees) = input.to_pipeline_input();
    tracing::debug!(?input, "sandbox preview");
    pipeline::price(rules, &job, &table, &fees)
}
