//! # Price Pipeline
//!
//! The single pricing computation used by both the storefront quote and the
//! admin sandbox. Stages run in a fixed order:
//!
//! ```text
//! base (material + billed time)
//!   -> fees (non-percent, then express surcharge)
//!   -> percent fees
//!   -> markup
//!   -> per-model minimum
//!   -> x quantity (+ ORDER fees)
//!   -> order minimum
//!   -> rounding
//! ```
//!
//! With smart rounding only the final total is rounded. Otherwise the
//! per-model price is rounded before the quantity multiply, the total is
//! brought back onto the step once ORDER fees are added, and the order
//! minimum is enforced on that rounded total, so rounding down can never
//! undercut it.
//!
//! All arithmetic is plain `f64`. Currency amounts are not fixed-point, so a
//! per-model price like `150.00000000000003` can tip an `up` rounding into
//! the next step.
//!
//! ## Example
//!
//! ```rust
//! use pricer_core::config::{MaterialPriceTable, PricingRules};
//! use pricer_core::job::JobInput;
//! use pricer_core::pipeline::price;
//!
//! let rules = PricingRules { rate_per_hour: 100.0, ..PricingRules::default() };
//! let job = JobInput::new("pla", 100.0, 3600.0).with_quantity(2.0);
//!
//! let breakdown = price(&rules, &job, MaterialPriceTable::builtin(), &[]);
//! assert_eq!(breakdown.model.material, 50.0);
//! assert_eq!(breakdown.model.time, 100.0);
//! assert_eq!(breakdown.per_model, 150.0);
//! assert_eq!(breakdown.total, 300.0);
//! ```

pub mod breakdown;

pub use breakdown::{LineItem, LineKind, ModelCost, PriceBreakdown, PricingFlags};

use crate::config::{MarkupMode, MarkupPolicy, MaterialPriceTable, PricingRules};
use crate::fees::{evaluate, FeeDefinition, FeeScope};
use crate::job::JobInput;
use crate::units::{Hours, Minutes, Seconds};

/// Express delivery adds this share of material + time + non-percent fees
pub const EXPRESS_SURCHARGE_RATE: f64 = 0.5;

/// Markup to add on top of `subtotal`.
///
/// `min_flat` adds only what is needed to lift `subtotal` to the target.
pub fn markup_amount(policy: &MarkupPolicy, subtotal: f64) -> f64 {
    if !policy.enabled {
        return 0.0;
    }
    match policy.mode {
        MarkupMode::Flat => policy.value,
        MarkupMode::Percent => subtotal * policy.value / 100.0,
        MarkupMode::MinFlat => (policy.value - subtotal).max(0.0),
    }
}

/// Price one job.
///
/// Infallible: every malformed input has already been coerced by the
/// config resolver, the fee reader or [`JobInput`]'s accessors.
pub fn price(
    rules: &PricingRules,
    job: &JobInput,
    materials: &MaterialPriceTable,
    fees: &[FeeDefinition],
) -> PriceBreakdown {
    let quantity = job.quantity();
    let qty = f64::from(quantity);

    // ----- base
    let material_price = materials.lookup(&job.material_key());
    let material = job.grams().value() * material_price.price_per_gram;

    let actual_minutes: Minutes = Seconds(job.seconds()).into();
    let billed_minutes = match rules.min_billed_minutes.floor() {
        Some(floor) => actual_minutes.at_least(Minutes(floor)),
        None => actual_minutes,
    };
    let time = Hours::from(billed_minutes).value() * rules.rate_per_hour;
    tracing::debug!(material, time, billed_minutes = billed_minutes.value(), "base cost");

    // ----- fees
    let evaluation = evaluate(fees, job, billed_minutes);
    let express = if job.express_delivery {
        (material + time + evaluation.model_subtotal) * EXPRESS_SURCHARGE_RATE
    } else {
        0.0
    };

    // percent fees share one base and never see each other
    let model_percent_base = material + time + evaluation.model_subtotal + express;
    let order_percent_base = model_percent_base * qty + evaluation.order_subtotal;

    let mut applied_fees = evaluation.applied.clone();
    let mut model_percent = 0.0;
    let mut order_percent = 0.0;
    for pending in &evaluation.percent {
        let resolved = match pending.scope {
            FeeScope::Model => pending.resolve(model_percent_base),
            FeeScope::Order => pending.resolve(order_percent_base),
        };
        match resolved.scope {
            FeeScope::Model => model_percent += resolved.amount,
            FeeScope::Order => order_percent += resolved.amount,
        }
        applied_fees.push(resolved);
    }

    let model_fees = evaluation.model_subtotal + model_percent;
    let order_fees = evaluation.order_subtotal + order_percent;
    tracing::debug!(model_fees, order_fees, express, "fees resolved");

    // ----- markup
    let mut model = ModelCost {
        material,
        time,
        fees: model_fees,
        express,
        markup: 0.0,
    };
    let subtotal = model.base_plus_fees();
    model.markup = markup_amount(&rules.markup, subtotal);
    let markup = model.markup;
    let mut per_model = subtotal + markup;

    // ----- minima
    let mut flags = PricingFlags::default();
    if let Some(min_model) = rules.min_price_per_model.floor() {
        if per_model < min_model {
            per_model = min_model;
            flags.min_price_per_model_applied = true;
        }
    }

    let rounding = &rules.rounding;
    let per_model_rounded = if rounding.enabled && !rounding.smart_rounding_only {
        let rounded = rounding.round(per_model);
        flags.rounding_per_model_applied = rounded != per_model;
        rounded
    } else {
        per_model
    };

    let mut total = per_model_rounded * qty + order_fees;
    let mut total_before_rounding = total;
    if rounding.enabled && !rounding.smart_rounding_only {
        // ORDER fees are added after per-model rounding and can leave the step
        total = rounding.round(total);
        flags.rounding_final_applied = total != total_before_rounding;
    }

    if let Some(min_order) = rules.min_order_total.floor() {
        if total < min_order {
            total = min_order;
            flags.min_order_total_applied = true;
        }
    }

    // ----- rounding
    if rounding.enabled && rounding.smart_rounding_only {
        total_before_rounding = total;
        total = rounding.round(total);
        flags.rounding_final_applied = total != total_before_rounding;
    }
    tracing::debug!(per_model, per_model_rounded, quantity, total, "price computed");

    let mut lines = vec![
        LineItem::new(LineKind::Material, material * qty),
        LineItem::new(LineKind::PrintTime, time * qty),
    ];
    let fee_line = model_fees * qty + order_fees;
    if fee_line > 0.0 {
        lines.push(LineItem::new(LineKind::AdditionalFees, fee_line));
    }
    if express > 0.0 {
        lines.push(LineItem::new(LineKind::Express, express * qty));
    }
    if markup > 0.0 {
        lines.push(LineItem::new(LineKind::Markup, markup * qty));
    }
    if flags.min_price_per_model_applied {
        lines.push(LineItem::marker(LineKind::MinPricePerModel));
    }
    if flags.min_order_total_applied {
        lines.push(LineItem::marker(LineKind::MinOrderTotal));
    }
    if rounding.enabled {
        lines.push(LineItem::marker(LineKind::Rounding));
    }

    PriceBreakdown {
        lines,
        fees: applied_fees,
        material_key: material_price.key,
        price_per_gram: material_price.price_per_gram,
        actual_minutes,
        billed_minutes,
        quantity,
        model,
        order_fees,
        per_model,
        per_model_rounded,
        total_before_rounding,
        total,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RoundingMode, RoundingPolicy, RoundingStep, Threshold};
    use crate::fees::{FeeValueType, Visibility};

    fn rules() -> PricingRules {
        PricingRules {
            rate_per_hour: 100.0,
            ..PricingRules::default()
        }
    }

    fn rounding(step: RoundingStep, mode: RoundingMode, smart: bool) -> RoundingPolicy {
        RoundingPolicy {
            enabled: true,
            step,
            mode,
            smart_rounding_only: smart,
        }
    }

    fn reference_job() -> JobInput {
        JobInput::new("pla", 100.0, 3600.0).with_quantity(2.0)
    }

    fn hidden(id: &str, value_type: FeeValueType, value: f64) -> FeeDefinition {
        FeeDefinition::new(id, id, value_type, value).with_visibility(Visibility::Hidden)
    }

    fn materials() -> &'static MaterialPriceTable {
        MaterialPriceTable::builtin()
    }

    #[test]
    fn test_reference_quote() {
        let b = price(&rules(), &reference_job(), materials(), &[]);
        assert_eq!(b.model.material, 50.0);
        assert_eq!(b.model.time, 100.0);
        assert_eq!(b.per_model, 150.0);
        assert_eq!(b.total, 300.0);
        assert_eq!(b.quantity, 2);
        assert_eq!(b.line(LineKind::Material), Some(100.0));
        assert_eq!(b.line(LineKind::PrintTime), Some(200.0));
        assert_eq!(b.lines.len(), 2);
        assert_eq!(b.flags, PricingFlags::default());
    }

    #[test]
    fn test_per_model_minimum() {
        let mut r = rules();
        r.min_price_per_model = Threshold::enabled(200.0);
        let b = price(&r, &reference_job(), materials(), &[]);

        assert_eq!(b.per_model, 200.0);
        assert_eq!(b.total, 400.0);
        assert!(b.flags.min_price_per_model_applied);
        assert!(b.has_line(LineKind::MinPricePerModel));
        assert_eq!(b.line(LineKind::MinPricePerModel), Some(0.0));
    }

    #[test]
    fn test_smart_rounding_of_final_total() {
        let mut r = rules();
        r.rounding = rounding(RoundingStep::Five, RoundingMode::Nearest, true);
        // 966 g of pla at 0.5 = 483, no print time
        let job = JobInput::new("pla", 966.0, 0.0);
        let b = price(&r, &job, materials(), &[]);

        assert_eq!(b.total_before_rounding, 483.0);
        assert_eq!(b.total, 485.0);
        assert!(b.flags.rounding_final_applied);
        assert!(!b.flags.rounding_per_model_applied);
        assert_eq!(b.lines.last().map(|l| l.kind), Some(LineKind::Rounding));
    }

    #[test]
    fn test_rounding_up() {
        let mut r = rules();
        r.rounding = rounding(RoundingStep::Five, RoundingMode::Up, true);
        let job = JobInput::new("pla", 962.0, 0.0); // 481
        assert_eq!(price(&r, &job, materials(), &[]).total, 485.0);
    }

    #[test]
    fn test_rounding_marker_present_even_when_nothing_moves() {
        let mut r = rules();
        r.rounding = rounding(RoundingStep::Ten, RoundingMode::Nearest, true);
        let b = price(&r, &reference_job(), materials(), &[]);
        assert_eq!(b.total, 300.0);
        assert!(!b.flags.rounding_final_applied);
        assert!(b.has_line(LineKind::Rounding));
    }

    #[test]
    fn test_per_model_rounding_before_quantity() {
        let mut r = rules();
        r.rounding = rounding(RoundingStep::Ten, RoundingMode::Up, false);
        // per model 50 + 100 + 3 = 153 -> 160, x2
        let fees = vec![hidden("setup", FeeValueType::Flat, 3.0)];
        let b = price(&r, &reference_job(), materials(), &fees);

        assert_eq!(b.per_model, 153.0);
        assert_eq!(b.per_model_rounded, 160.0);
        assert_eq!(b.total, 320.0);
        assert!(b.flags.rounding_per_model_applied);
    }

    #[test]
    fn test_per_model_rounding_keeps_order_fees_on_step() {
        let mut r = rules();
        r.rounding = rounding(RoundingStep::Ten, RoundingMode::Up, false);
        let fees = vec![hidden("packing", FeeValueType::Flat, 3.0).with_scope(FeeScope::Order)];
        let b = price(&r, &reference_job(), materials(), &fees);

        assert_eq!(b.per_model_rounded, 150.0);
        assert_eq!(b.total_before_rounding, 303.0);
        assert_eq!(b.total, 310.0);
        assert_eq!(b.total % 10.0, 0.0);
        assert!(b.flags.rounding_final_applied);
        assert!(!b.flags.rounding_per_model_applied);
    }

    #[test]
    fn test_order_minimum_wins_over_rounding_down() {
        let mut r = rules();
        r.rounding = rounding(RoundingStep::Fifty, RoundingMode::Nearest, false);
        r.min_order_total = Threshold::enabled(151.0);
        // 302 g of pla = 151 per model, rounds down to 150
        let job = JobInput::new("pla", 302.0, 0.0);
        let b = price(&r, &job, materials(), &[]);

        assert_eq!(b.per_model_rounded, 150.0);
        assert_eq!(b.total, 151.0);
        assert!(b.flags.min_order_total_applied);
        assert!(b.has_line(LineKind::MinOrderTotal));
    }

    #[test]
    fn test_min_billed_minutes_only_changes_time() {
        let job = JobInput::new("petg", 40.0, 600.0); // 10 minutes
        let plain = price(&rules(), &job, materials(), &[]);

        let mut r = rules();
        r.min_billed_minutes = Threshold::enabled(30.0);
        let floored = price(&r, &job, materials(), &[]);

        assert_eq!(plain.model.material, floored.model.material);
        assert!((plain.model.time - 100.0 / 6.0).abs() < 1e-9);
        assert!((floored.model.time - 50.0).abs() < 1e-9);
        assert_eq!(floored.actual_minutes, Minutes(10.0));
        assert_eq!(floored.billed_minutes, Minutes(30.0));
    }

    #[test]
    fn test_per_minute_fee_uses_billed_minutes() {
        let mut r = rules();
        r.min_billed_minutes = Threshold::enabled(30.0);
        let fees = vec![hidden("operator", FeeValueType::PerMinute, 1.0)];
        let b = price(&r, &JobInput::new("pla", 0.0, 600.0), materials(), &fees);
        assert_eq!(b.fees[0].amount, 30.0);
        assert!((b.model.time - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_fees_do_not_compound() {
        let table = MaterialPriceTable::from_pairs([("pla", 1.0)]);
        let fees = vec![
            hidden("ten", FeeValueType::Percent, 10.0),
            hidden("twenty", FeeValueType::Percent, 20.0),
        ];
        let b = price(&rules(), &JobInput::new("pla", 100.0, 0.0), &table, &fees);

        let amounts: Vec<f64> = b.fees.iter().map(|f| f.amount).collect();
        assert_eq!(amounts, vec![10.0, 20.0]);
        assert_eq!(b.per_model, 130.0);
    }

    #[test]
    fn test_express_and_percent_base() {
        let fees = vec![
            hidden("setup", FeeValueType::Flat, 50.0),
            hidden("insurance", FeeValueType::Percent, 10.0),
        ];
        let job = JobInput::new("pla", 100.0, 3600.0).with_express(true);
        let b = price(&rules(), &job, materials(), &fees);

        // 50 + 100 + 50 = 200 -> express 100; percent on 300
        assert_eq!(b.model.express, 100.0);
        assert_eq!(b.fees[1].amount, 30.0);
        assert_eq!(b.model.fees, 80.0);
        assert_eq!(b.per_model, 330.0);
        assert_eq!(b.line(LineKind::Express), Some(100.0));
        assert_eq!(b.line(LineKind::AdditionalFees), Some(80.0));
    }

    #[test]
    fn test_markup_modes() {
        let mut r = rules();
        r.markup.enabled = true;

        r.markup.mode = MarkupMode::Flat;
        r.markup.value = 20.0;
        assert_eq!(price(&r, &reference_job(), materials(), &[]).per_model, 170.0);

        r.markup.mode = MarkupMode::Percent;
        r.markup.value = 10.0;
        assert_eq!(price(&r, &reference_job(), materials(), &[]).per_model, 165.0);

        r.markup.mode = MarkupMode::MinFlat;
        r.markup.value = 200.0;
        let raised = price(&r, &reference_job(), materials(), &[]);
        assert_eq!(raised.per_model, 200.0);
        assert_eq!(raised.model.markup, 50.0);
        assert_eq!(raised.line(LineKind::Markup), Some(100.0));

        r.markup.value = 100.0;
        let untouched = price(&r, &reference_job(), materials(), &[]);
        assert_eq!(untouched.per_model, 150.0);
        assert_eq!(untouched.model.markup, 0.0);
        assert!(!untouched.has_line(LineKind::Markup));
    }

    #[test]
    fn test_markup_disabled_adds_nothing() {
        let policy = MarkupPolicy {
            enabled: false,
            mode: MarkupMode::Flat,
            value: 999.0,
        };
        assert_eq!(markup_amount(&policy, 10.0), 0.0);
    }

    #[test]
    fn test_order_scope_fees_are_charged_once() {
        let fees = vec![
            hidden("packing", FeeValueType::Flat, 30.0).with_scope(FeeScope::Order),
            hidden("check", FeeValueType::Flat, 5.0),
        ];
        let job = reference_job().with_quantity(3.0);
        let b = price(&rules(), &job, materials(), &fees);

        assert_eq!(b.per_model, 155.0);
        assert_eq!(b.order_fees, 30.0);
        assert_eq!(b.total, 495.0);
        assert_eq!(b.line(LineKind::AdditionalFees), Some(45.0));
    }

    #[test]
    fn test_order_scope_percent_fee_base() {
        let fees = vec![
            hidden("packing", FeeValueType::Flat, 50.0).with_scope(FeeScope::Order),
            hidden("service", FeeValueType::Percent, 10.0).with_scope(FeeScope::Order),
        ];
        let b = price(&rules(), &reference_job(), materials(), &fees);
        // 150 x 2 + 50 = 350 -> 35
        assert_eq!(b.order_fees, 85.0);
        assert_eq!(b.total, 385.0);
    }

    #[test]
    fn test_unknown_material_uses_pla() {
        let b = price(&rules(), &JobInput::new("unobtainium", 100.0, 0.0), materials(), &[]);
        assert_eq!(b.price_per_gram, 0.5);
        assert_eq!(b.material_key, "unobtainium");
    }

    #[test]
    fn test_quantity_is_normalized() {
        let b = price(&rules(), &reference_job().with_quantity(0.0), materials(), &[]);
        assert_eq!(b.quantity, 1);
        assert_eq!(b.total, 150.0);

        let b = price(&rules(), &reference_job().with_quantity(2.9), materials(), &[]);
        assert_eq!(b.total, 300.0);

        let b = price(&rules(), &reference_job().with_quantity(-5.0), materials(), &[]);
        assert_eq!(b.quantity, 1);
    }

    #[test]
    fn test_line_order_with_everything_enabled() {
        let mut r = rules();
        r.markup.enabled = true;
        r.min_price_per_model = Threshold::enabled(1000.0);
        r.min_order_total = Threshold::enabled(5000.0);
        r.rounding = rounding(RoundingStep::One, RoundingMode::Nearest, true);
        let fees = vec![hidden("setup", FeeValueType::Flat, 10.0)];
        let job = reference_job().with_express(true);

        let kinds: Vec<LineKind> = price(&r, &job, materials(), &fees).lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Material,
                LineKind::PrintTime,
                LineKind::AdditionalFees,
                LineKind::Express,
                LineKind::Markup,
                LineKind::MinPricePerModel,
                LineKind::MinOrderTotal,
                LineKind::Rounding,
            ]
        );
    }

    #[test]
    fn test_lines_total_matches_unfloored_total() {
        let mut r = rules();
        r.markup.enabled = true;
        let fees = vec![hidden("setup", FeeValueType::Flat, 10.0)];
        let b = price(&r, &reference_job().with_express(true), materials(), &fees);
        assert!((b.lines_total() - b.total).abs() < 1e-9);
    }
}
