//! Pallet ceilings for storage: integer pallet counts cover end-of-day
//! inventory, so holding cost truthfully charges partial pallets.

use coldchain_core::constants::UNITS_PER_PALLET;

use crate::builder::PlanVariables;
use crate::index::PlanIndex;
use crate::model::{LinExpr, ModelSpec, RowSense};
use crate::prep::PreparedInput;
use crate::scale::ScaleFactor;

pub(crate) fn add_rows(
    model: &mut ModelSpec,
    vars: &PlanVariables,
    prepared: &PreparedInput<'_>,
    index: &PlanIndex,
    scale: &ScaleFactor,
) {
    let start = prepared.horizon().start;
    let per_pallet = scale.units_per_pallet();

    for &(n, p, s, t) in &index.inventory {
        let pallet = vars.pallet_count[&(n, p, s, t)];

        // units_per_pallet * pallets >= inventory (ceiling lift).
        let expr = LinExpr::new()
            .term(pallet, per_pallet)
            .term(vars.inventory[&(n, p, s, t)], -1.0);
        model.add_row(
            format!("pallet_fit[{},{},{},{}]", n, p, s, t),
            expr,
            RowSense::Ge,
            0.0,
        );

        // Entry charge: pallets appearing today beyond yesterday's count.
        // Stock already on hand at the snapshot entered storage before the
        // horizon and is not charged.
        if let Some(&entry) = vars.pallet_entry.get(&(n, p, s, t)) {
            let mut expr = LinExpr::new().term(pallet, 1.0).term(entry, -1.0);
            let rhs = if t == start {
                prepared
                    .initial
                    .get(&(n, p, s))
                    .map(|qty| (qty / UNITS_PER_PALLET).ceil())
                    .unwrap_or(0.0)
            } else {
                let prev = t.pred_opt().expect("date underflow");
                if let Some(&prior) = vars.pallet_count.get(&(n, p, s, prev)) {
                    expr.add_term(prior, -1.0);
                }
                0.0
            };
            model.add_row(
                format!("pallet_in[{},{},{},{}]", n, p, s, t),
                expr,
                RowSense::Le,
                rhs,
            );
        }
    }
}
