//! Price breakdown returned by the pipeline.

use serde::{Deserialize, Serialize};

use crate::fees::AppliedFee;
use crate::units::Minutes;

/// What a breakdown line stands for. UIs translate by kind, not label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Material,
    PrintTime,
    AdditionalFees,
    Express,
    Markup,
    MinPricePerModel,
    MinOrderTotal,
    Rounding,
}

impl LineKind {
    /// Default English label
    pub fn label(&self) -> &'static str {
        match self {
            LineKind::Material => "Material",
            LineKind::PrintTime => "Print time",
            LineKind::AdditionalFees => "Additional fees",
            LineKind::Express => "Express",
            LineKind::Markup => "Markup",
            LineKind::MinPricePerModel => "Per-model minimum",
            LineKind::MinOrderTotal => "Order minimum",
            LineKind::Rounding => "Rounding",
        }
    }

    /// Markers flag a policy for the UI and always carry amount 0
    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            LineKind::MinPricePerModel | LineKind::MinOrderTotal | LineKind::Rounding
        )
    }
}

/// One display line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineKind,
    pub label: String,
    pub amount: f64,
}

impl LineItem {
    pub fn new(kind: LineKind, amount: f64) -> Self {
        LineItem {
            kind,
            label: kind.label().to_string(),
            amount,
        }
    }

    pub fn marker(kind: LineKind) -> Self {
        LineItem::new(kind, 0.0)
    }
}

/// Cost components of one model, before quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCost {
    pub material: f64,
    pub time: f64,
    /// MODEL fees, non-percent and percent
    pub fees: f64,
    pub express: f64,
    pub markup: f64,
}

impl ModelCost {
    /// Material + time + fees + express
    pub fn base_plus_fees(&self) -> f64 {
        self.material + self.time + self.fees + self.express
    }
}

/// Which policies changed the price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingFlags {
    pub min_price_per_model_applied: bool,
    pub min_order_total_applied: bool,
    /// Per-model price moved when rounded (non-smart rounding)
    pub rounding_per_model_applied: bool,
    /// Order total moved when rounded
    pub rounding_final_applied: bool,
}

/// Full result of one pricing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Display lines in fixed order
    pub lines: Vec<LineItem>,
    /// Every fee that applied, percent fees resolved
    pub fees: Vec<AppliedFee>,
    pub material_key: String,
    pub price_per_gram: f64,
    pub actual_minutes: Minutes,
    pub billed_minutes: Minutes,
    pub quantity: u32,
    pub model: ModelCost,
    /// ORDER-scope fees, charged once
    pub order_fees: f64,
    /// Per-model price after markup and per-model minimum
    pub per_model: f64,
    /// `per_model` after per-model rounding (equal when not rounded)
    pub per_model_rounded: f64,
    /// Total before the order total was rounded. With per-model rounding
    /// this is `per_model_rounded * quantity + order_fees`, before the order
    /// minimum.
    pub total_before_rounding: f64,
    pub total: f64,
    pub flags: PricingFlags,
}

impl PriceBreakdown {
    /// Amount of the first line of `kind`
    pub fn line(&self, kind: LineKind) -> Option<f64> {
        self.lines.iter().find(|l| l.kind == kind).map(|l| l.amount)
    }

    pub fn has_line(&self, kind: LineKind) -> bool {
        self.lines.iter().any(|l| l.kind == kind)
    }

    /// Sum of the monetary (non-marker) lines
    pub fn lines_total(&self) -> f64 {
        self.lines
            .iter()
            .filter(|l| !l.kind.is_marker())
            .map(|l| l.amount)
            .sum()
    }
}
