//! Linear cost objective with scaled coefficients.
//!
//! Flows are in scaled units, so per-unit rates are multiplied by the scale
//! factor; labour hours and pallet counts are unscaled and take their rates
//! directly. Disposal defaults to a zero rate so it stays a pressure-relief
//! channel for aged stock; a policy layer may price it through the cost
//! structure.

use coldchain_core::DayKind;

use crate::builder::PlanVariables;
use crate::model::ModelSpec;
use crate::prep::PreparedInput;
use crate::scale::ScaleFactor;

pub(crate) fn build(
    model: &mut ModelSpec,
    vars: &PlanVariables,
    prepared: &PreparedInput<'_>,
    scale: &ScaleFactor,
) {
    let costs = &prepared.input.costs;
    let calendar = &prepared.input.calendar;

    // Labour: regular + overtime buckets on fixed days, premium on
    // non-fixed days.
    for (&(n, t), &base) in &vars.labor_base {
        let premium = vars.labor_premium[&(n, t)];
        match calendar.day(n, t).expect("calendar").kind {
            DayKind::Fixed {
                regular_rate,
                overtime_rate,
                ..
            } => {
                model.add_objective_term(base, regular_rate);
                model.add_objective_term(premium, overtime_rate);
            }
            DayKind::NonFixed { premium_rate, .. } => {
                model.add_objective_term(premium, premium_rate);
            }
        }
    }

    // Transport: per-route per-unit rates.
    for (&(r, _, _), &transit) in &vars.in_transit {
        let rate = costs.transport_rate(r);
        if rate != 0.0 {
            model.add_objective_term(transit, scale.cost(rate));
        }
    }

    // Holding: per-pallet-day rates by state; entry charges when configured.
    for (&(_, _, s, _), &pallet) in &vars.pallet_count {
        let rate = costs.holding.rate(s);
        if rate != 0.0 {
            model.add_objective_term(pallet, rate);
        }
    }
    if let Some(charge) = costs.pallet_entry_charge {
        for &entry in vars.pallet_entry.values() {
            model.add_objective_term(entry, charge);
        }
    }

    // Changeover: fixed cost per product start.
    for &start in vars.product_start.values() {
        model.add_objective_term(start, costs.changeover_cost);
    }

    // Shortage penalty.
    for &shortage in vars.shortage.values() {
        model.add_objective_term(shortage, scale.cost(costs.shortage_penalty));
    }

    // Disposal: free by default, chargeable by policy.
    let disposal_rate = costs.disposal_cost;
    if disposal_rate != 0.0 {
        for &disposal in vars.disposal.values() {
            model.add_objective_term(disposal, scale.cost(disposal_rate));
        }
    }
}
