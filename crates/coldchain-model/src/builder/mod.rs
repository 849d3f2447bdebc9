//! Decision-variable pool and constraint assembly.
//!
//! [`PlanVariables`] creates every variable family over the sparse index and
//! keeps semantic-key maps so constraints, the objective and the extractor
//! all address variables by (node, product, state, date) tuples instead of
//! raw column indices. Constraint families live in submodules; each one adds
//! rows to the shared [`ModelSpec`].

mod balance;
mod demand;
mod pallets;
mod production;
mod shelf_life;
mod trucks;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use coldchain_core::{
    DayKind, Network, NodeId, NodeSpec, PlanResult, ProductId, RouteId, StorageState, TruckId,
};

use crate::index::PlanIndex;
use crate::model::{ModelSpec, VarId};
use crate::objective;
use crate::prep::PreparedInput;
use crate::scale::ScaleFactor;
use crate::solver::SolveConfig;

/// Semantic-key maps for every decision-variable family.
#[derive(Debug, Default)]
pub struct PlanVariables {
    pub production: BTreeMap<(NodeId, ProductId, NaiveDate), VarId>,
    pub mix_count: BTreeMap<(NodeId, ProductId, NaiveDate), VarId>,
    pub product_produced: BTreeMap<(NodeId, ProductId, NaiveDate), VarId>,
    pub product_start: BTreeMap<(NodeId, ProductId, NaiveDate), VarId>,
    /// 1 iff the node runs production at all that day.
    pub day_active: BTreeMap<(NodeId, NaiveDate), VarId>,
    pub inventory: BTreeMap<(NodeId, ProductId, StorageState, NaiveDate), VarId>,
    /// Keyed by (route, product, departure date); the departure state is the
    /// route's, so it needs no key slot.
    pub in_transit: BTreeMap<(RouteId, ProductId, NaiveDate), VarId>,
    pub thaw: BTreeMap<(NodeId, ProductId, NaiveDate), VarId>,
    pub freeze: BTreeMap<(NodeId, ProductId, NaiveDate), VarId>,
    pub pallet_count: BTreeMap<(NodeId, ProductId, StorageState, NaiveDate), VarId>,
    /// Net-new pallets in storage per day; only populated when the cost
    /// structure carries an entry charge.
    pub pallet_entry: BTreeMap<(NodeId, ProductId, StorageState, NaiveDate), VarId>,
    pub truck_load: BTreeMap<(TruckId, NodeId, ProductId, NaiveDate), VarId>,
    pub labor_used: BTreeMap<(NodeId, NaiveDate), VarId>,
    pub labor_paid: BTreeMap<(NodeId, NaiveDate), VarId>,
    /// Regular-rate bucket of paid hours (capacity `fixed_hours` on fixed
    /// days, zero on non-fixed days).
    pub labor_base: BTreeMap<(NodeId, NaiveDate), VarId>,
    /// Overtime/premium bucket of paid hours.
    pub labor_premium: BTreeMap<(NodeId, NaiveDate), VarId>,
    pub demand_consumed: BTreeMap<(NodeId, ProductId, StorageState, NaiveDate), VarId>,
    pub shortage: BTreeMap<(NodeId, ProductId, NaiveDate), VarId>,
    pub disposal: BTreeMap<(NodeId, ProductId, StorageState, NaiveDate), VarId>,
}

impl PlanVariables {
    fn create(
        model: &mut ModelSpec,
        prepared: &PreparedInput<'_>,
        index: &PlanIndex,
        scale: &ScaleFactor,
        config: &SolveConfig,
    ) -> PlanResult<Self> {
        let network = prepared.network();
        let mut vars = PlanVariables::default();

        for &(n, p, t) in &index.production {
            let node = network.node(n).expect("indexed node");
            let Some(mfg) = node.manufacturing.as_ref() else {
                continue;
            };
            let cap = scale.flow(mfg.max_daily_units);
            let upm = product_mix_size(prepared, p);
            let max_mixes = (mfg.max_daily_units / upm).ceil();
            vars.production.insert(
                (n, p, t),
                model.continuous(format!("prod[{},{},{}]", n, p, t), 0.0, cap),
            );
            vars.mix_count.insert(
                (n, p, t),
                model.integer(format!("mix[{},{},{}]", n, p, t), 0.0, max_mixes),
            );
            vars.product_produced.insert(
                (n, p, t),
                model.binary(format!("made[{},{},{}]", n, p, t)),
            );
            vars.product_start.insert(
                (n, p, t),
                model.binary(format!("start[{},{},{}]", n, p, t)),
            );
        }

        for &(n, t) in &index.labor_days {
            vars.day_active
                .insert((n, t), model.binary(format!("active[{},{}]", n, t)));
            vars.labor_used.insert(
                (n, t),
                model.continuous(format!("hours_used[{},{}]", n, t), 0.0, f64::INFINITY),
            );
            vars.labor_paid.insert(
                (n, t),
                model.continuous(format!("hours_paid[{},{}]", n, t), 0.0, f64::INFINITY),
            );
            // The base bucket's capacity is the day's fixed hours; a
            // non-fixed day pays everything at the premium rate.
            let base_cap = match &prepared.input.calendar.day(n, t).expect("calendar").kind {
                DayKind::Fixed { fixed_hours, .. } => *fixed_hours,
                DayKind::NonFixed { .. } => 0.0,
            };
            vars.labor_base.insert(
                (n, t),
                model.continuous(format!("hours_base[{},{}]", n, t), 0.0, base_cap),
            );
            vars.labor_premium.insert(
                (n, t),
                model.continuous(format!("hours_prem[{},{}]", n, t), 0.0, f64::INFINITY),
            );
        }

        for &(n, p, s, t) in &index.inventory {
            vars.inventory.insert(
                (n, p, s, t),
                model.continuous(format!("inv[{},{},{},{}]", n, p, s, t), 0.0, f64::INFINITY),
            );
            let pallet_name = format!("pallets[{},{},{},{}]", n, p, s, t);
            let pallet = if config.integer_pallets {
                model.integer(pallet_name, 0.0, f64::INFINITY)
            } else {
                model.continuous(pallet_name, 0.0, f64::INFINITY)
            };
            vars.pallet_count.insert((n, p, s, t), pallet);
            if prepared.input.costs.pallet_entry_charge.is_some() {
                let entry_name = format!("pallets_in[{},{},{},{}]", n, p, s, t);
                let entry = if config.integer_pallets {
                    model.integer(entry_name, 0.0, f64::INFINITY)
                } else {
                    model.continuous(entry_name, 0.0, f64::INFINITY)
                };
                vars.pallet_entry.insert((n, p, s, t), entry);
            }
            vars.disposal.insert(
                (n, p, s, t),
                model.continuous(
                    format!("dispose[{},{},{},{}]", n, p, s, t),
                    0.0,
                    f64::INFINITY,
                ),
            );
        }

        for &(r, p, t) in &index.transit {
            vars.in_transit.insert(
                (r, p, t),
                model.continuous(format!("ship[{},{},{}]", r, p, t), 0.0, f64::INFINITY),
            );
        }

        for &(n, p, t) in &index.thaw {
            vars.thaw.insert(
                (n, p, t),
                model.continuous(format!("thaw[{},{},{}]", n, p, t), 0.0, f64::INFINITY),
            );
        }
        for &(n, p, t) in &index.freeze {
            vars.freeze.insert(
                (n, p, t),
                model.continuous(format!("freeze[{},{},{}]", n, p, t), 0.0, f64::INFINITY),
            );
        }

        for truck in network.trucks() {
            let dispatch = &index.truck_dispatch[&truck.id];
            for &t in dispatch {
                for &dest in &truck.destinations {
                    let Some(route) = network.route_between(truck.origin, dest) else {
                        continue;
                    };
                    for product in &prepared.input.products {
                        if !vars.in_transit.contains_key(&(route.id, product.id, t)) {
                            continue;
                        }
                        let name =
                            format!("load[{},{},{},{}]", truck.id, dest, product.id, t);
                        let load = if config.integer_pallets {
                            model.integer(name, 0.0, truck.pallet_capacity as f64)
                        } else {
                            model.continuous(name, 0.0, truck.pallet_capacity as f64)
                        };
                        vars.truck_load.insert((truck.id, dest, product.id, t), load);
                    }
                }
            }
        }

        for (&(n, p, t), &qty) in &prepared.demand {
            let node = network.node(n).expect("validated demand node");
            let bound = scale.flow(qty);
            for s in node.storage_states() {
                if !s.consumable() {
                    continue;
                }
                vars.demand_consumed.insert(
                    (n, p, s, t),
                    model.continuous(format!("eat[{},{},{},{}]", n, p, s, t), 0.0, bound),
                );
            }
            vars.shortage.insert(
                (n, p, t),
                model.continuous(format!("short[{},{},{}]", n, p, t), 0.0, bound),
            );
        }

        Ok(vars)
    }
}

/// Build the full scaled model: variables, constraint rows, objective.
pub fn build_model(
    prepared: &PreparedInput<'_>,
    index: &PlanIndex,
    scale: &ScaleFactor,
    config: &SolveConfig,
) -> PlanResult<(ModelSpec, PlanVariables)> {
    let mut model = ModelSpec::new();
    let vars = PlanVariables::create(&mut model, prepared, index, scale, config)?;

    balance::add_rows(&mut model, &vars, prepared, index, scale);
    shelf_life::add_rows(&mut model, &vars, prepared, index, scale);
    production::add_rows(&mut model, &vars, prepared, index, scale);
    pallets::add_rows(&mut model, &vars, prepared, index, scale);
    trucks::add_rows(&mut model, &vars, prepared, index, scale);
    demand::add_rows(&mut model, &vars, prepared, scale);
    objective::build(&mut model, &vars, prepared, scale);

    debug!(
        vars = model.num_vars(),
        integers = model.num_integer_vars(),
        rows = model.num_rows(),
        "model assembled"
    );
    Ok((model, vars))
}

pub(crate) fn product_mix_size(prepared: &PreparedInput<'_>, product: ProductId) -> f64 {
    prepared
        .input
        .product(product)
        .map(|p| p.units_per_mix)
        .unwrap_or(1.0)
}

/// Variables flowing *into* state `s` at (node, product, date): production
/// (ambient at the manufacturer), route arrivals in that state, and in-place
/// transitions into it. The initial-inventory injection is a constant and
/// handled by the callers.
pub(crate) fn inflow_terms(
    vars: &PlanVariables,
    network: &Network,
    node: &NodeSpec,
    product: ProductId,
    state: StorageState,
    date: NaiveDate,
) -> Vec<VarId> {
    let mut terms = Vec::new();
    if state == StorageState::Ambient {
        if let Some(&v) = vars.production.get(&(node.id, product, date)) {
            terms.push(v);
        }
    }
    for route in network.routes() {
        if route.destination() != node.id || route.arrival_state(node) != state {
            continue;
        }
        let departed = date - chrono::Duration::days(route.transit_days());
        if let Some(&v) = vars.in_transit.get(&(route.id, product, departed)) {
            terms.push(v);
        }
    }
    if state == StorageState::Thawed {
        if let Some(&v) = vars.thaw.get(&(node.id, product, date)) {
            terms.push(v);
        }
    }
    if state == StorageState::Frozen {
        if let Some(&v) = vars.freeze.get(&(node.id, product, date)) {
            terms.push(v);
        }
    }
    terms
}

/// Variables flowing *out of* state `s` at (node, product, date): route
/// departures in that state, transitions out of it, demand consumption and
/// disposal.
pub(crate) fn outflow_terms(
    vars: &PlanVariables,
    network: &Network,
    node: &NodeSpec,
    product: ProductId,
    state: StorageState,
    date: NaiveDate,
) -> Vec<VarId> {
    let mut terms = Vec::new();
    for route in network.routes() {
        if route.origin() != node.id || route.departure_state() != state {
            continue;
        }
        if let Some(&v) = vars.in_transit.get(&(route.id, product, date)) {
            terms.push(v);
        }
    }
    if state == StorageState::Frozen {
        if let Some(&v) = vars.thaw.get(&(node.id, product, date)) {
            terms.push(v);
        }
    }
    if state == StorageState::Ambient {
        if let Some(&v) = vars.freeze.get(&(node.id, product, date)) {
            terms.push(v);
        }
    }
    if let Some(&v) = vars.demand_consumed.get(&(node.id, product, state, date)) {
        terms.push(v);
    }
    if let Some(&v) = vars.disposal.get(&(node.id, product, state, date)) {
        terms.push(v);
    }
    terms
}
