//! Truck pallet loading: per-product ceilings lift shipment units onto
//! integer pallets, and each truck's pallets fit its capacity.

use std::collections::BTreeMap;

use coldchain_core::NodeId;

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
    let network = prepared.network();
    let per_pallet = scale.units_per_pallet();

    // Per-product pallet lift: the loads of every truck serving the trip
    // jointly cover the departing units. Vacuous trips (no transit variable)
    // get no row at all, avoiding spurious infeasibilities.
    for (&(r, p, t), &transit) in &vars.in_transit {
        let route = network.route(r).expect("indexed route");
        let serving = network.trucks_serving(route);
        if serving.is_empty() {
            continue;
        }
        let mut expr = LinExpr::new().term(transit, -1.0);
        let mut any_load = false;
        for truck in serving {
            if let Some(&load) = vars
                .truck_load
                .get(&(truck.id, route.destination(), p, t))
            {
                expr.add_term(load, per_pallet);
                any_load = true;
            }
        }
        if any_load {
            model.add_row(format!("truck_lift[{},{},{}]", r, p, t), expr, RowSense::Ge, 0.0);
        }
    }

    // Per-truck capacity on each dispatch date, across destinations and
    // products.
    for truck in network.trucks() {
        let Some(dispatch) = index.truck_dispatch.get(&truck.id) else {
            continue;
        };
        for &t in dispatch {
            let mut loads: BTreeMap<(NodeId, coldchain_core::ProductId), crate::model::VarId> =
                BTreeMap::new();
            for &dest in &truck.destinations {
                for product in &prepared.input.products {
                    if let Some(&load) = vars.truck_load.get(&(truck.id, dest, product.id, t)) {
                        loads.insert((dest, product.id), load);
                    }
                }
            }
            if loads.is_empty() {
                continue;
            }
            let mut expr = LinExpr::new();
            for load in loads.values() {
                expr.add_term(*load, 1.0);
            }
            model.add_row(
                format!("truck_cap[{},{}]", truck.id, t),
                expr,
                RowSense::Le,
                truck.pallet_capacity as f64,
            );
        }
    }
}
