//! Demand satisfaction: consumption out of consumable states plus shortage
//! meets the forecast exactly. Frozen stock cannot be consumed directly.

use crate::builder::PlanVariables;
use crate::model::{LinExpr, ModelSpec, RowSense};
use crate::prep::PreparedInput;
use crate::scale::ScaleFactor;

pub(crate) fn add_rows(
    model: &mut ModelSpec,
    vars: &PlanVariables,
    prepared: &PreparedInput<'_>,
    scale: &ScaleFactor,
) {
    let network = prepared.network();

    for (&(n, p, t), &quantity) in &prepared.demand {
        let node = network.node(n).expect("validated demand node");
        let mut expr = LinExpr::new();
        for s in node.storage_states() {
            if let Some(&consumed) = vars.demand_consumed.get(&(n, p, s, t)) {
                expr.add_term(consumed, 1.0);
            }
        }
        expr.add_term(vars.shortage[&(n, p, t)], 1.0);
        model.add_row(
            format!("demand[{},{},{}]", n, p, t),
            expr,
            RowSense::Eq,
            scale.flow(quantity),
        );
    }
}
