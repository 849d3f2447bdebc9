//! State balance: material conservation per (node, product, state, date).
//!
//! End-of-day inventory equals yesterday's stock plus inflows minus
//! outflows, exactly. Initial inventory enters as a virtual inflow on the
//! planning start date; its age is handled by the shelf-life bands, not
//! here.

use crate::builder::{inflow_terms, outflow_terms, PlanVariables};
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
    let network = prepared.network();
    let start = prepared.horizon().start;

    for &(n, p, s, t) in &index.inventory {
        let node = network.node(n).expect("indexed node");
        let mut expr = LinExpr::new();
        expr.add_term(vars.inventory[&(n, p, s, t)], 1.0);

        if t > start {
            let prev = t.pred_opt().expect("date underflow");
            if let Some(&v) = vars.inventory.get(&(n, p, s, prev)) {
                expr.add_term(v, -1.0);
            }
        }

        for v in inflow_terms(vars, network, node, p, s, t) {
            expr.add_term(v, -1.0);
        }
        for v in outflow_terms(vars, network, node, p, s, t) {
            expr.add_term(v, 1.0);
        }

        let rhs = if t == start {
            prepared
                .initial
                .get(&(n, p, s))
                .map(|&qty| scale.flow(qty))
                .unwrap_or(0.0)
        } else {
            0.0
        };

        model.add_row(
            format!("balance[{},{},{},{}]", n, p, s, t),
            expr,
            RowSense::Eq,
            rhs,
        );
    }
}
