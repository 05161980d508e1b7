//! Built-in post-processing services offered on the model upload page.
//!
//! Each is a selectable flat MODEL fee; a job opts in by listing the id in
//! `selected_fee_ids` (the storefront sends them as `postProcessing`).

use crate::fees::definition::{FeeDefinition, FeeValueType, Visibility};

/// `(id, name, price per model)`
const POST_PROCESSING: [(&str, &str, f64); 4] = [
    ("sanding", "Sanding", 50.0),
    ("painting", "Painting", 120.0),
    ("assembly", "Assembly", 200.0),
    ("drilling", "Drilling", 80.0),
];

pub const POST_PROCESSING_CATEGORY: &str = "post_processing";

/// The post-processing services as fee definitions.
pub fn post_processing_fees() -> Vec<FeeDefinition> {
    POST_PROCESSING
        .iter()
        .map(|(id, name, price)| {
            FeeDefinition::new(*id, *name, FeeValueType::Flat, *price)
                .with_visibility(Visibility::Selectable { selected_by_default: false })
                .with_category(POST_PROCESSING_CATEGORY)
        })
        .collect()
}
