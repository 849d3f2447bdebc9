//! Sliding-window shelf-life bands.
//!
//! For each (node, product, state, date t) with shelf life L, end-of-day
//! inventory must be covered by inflows within the trailing window
//! (t−L, t]. Under the balance equality this caps the age of every unit on
//! hand at L days without any age-cohort variables: outflows taken over any
//! trailing window never exceed the inflows that window supplied.
//!
//! Initial inventory participates with its snapshot-stamped entry date: it
//! counts toward the window only while `date - snapshot < L`. Once its
//! window closes, end-of-day stock can no longer include it, so aged units
//! must leave through an outflow; disposal is the only channel guaranteed
//! to exist. Without disposal variables, any horizon longer than L is
//! infeasible whenever aged stock is present.

use crate::builder::{inflow_terms, PlanVariables};
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
        let life = s.shelf_life_days();
        let window_start = t - chrono::Duration::days(life - 1);

        let initial = prepared.initial.get(&(n, p, s)).copied();
        let initial_in_window = match (initial, prepared.snapshot_age_at(t)) {
            (Some(_), Some(age)) => age < life,
            _ => false,
        };

        // Skip rows the balance equality already implies: when the window
        // reaches back to the start and the initial stock (if any) is still
        // inside it, inventory <= all inflows holds trivially.
        if window_start <= start && (initial.is_none() || initial_in_window) {
            continue;
        }

        let mut expr = LinExpr::new();
        expr.add_term(vars.inventory[&(n, p, s, t)], 1.0);
        let mut date = window_start.max(start);
        while date <= t {
            for v in inflow_terms(vars, network, node, p, s, date) {
                expr.add_term(v, -1.0);
            }
            date = date.succ_opt().expect("date overflow");
        }

        let rhs = if initial_in_window {
            scale.flow(initial.unwrap_or(0.0))
        } else {
            0.0
        };

        model.add_row(
            format!("freshness[{},{},{},{}]", n, p, s, t),
            expr,
            RowSense::Le,
            rhs,
        );
    }
}
