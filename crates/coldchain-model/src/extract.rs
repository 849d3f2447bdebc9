//! Result extraction: read variable values, restore physical units, and
//! populate the validated result document.

use tracing::debug;

use coldchain_core::{DayKind, PlanResult};
use coldchain_schemas::{
    ConsumptionRecord, CostBreakdown, DisposalRecord, InventoryCell, LaborDayHours, PlanSolution,
    ProductionBatch, QualityMetrics, Shipment, StateTransition, TransitionKind,
};

use crate::builder::{product_mix_size, PlanVariables};
use crate::prep::PreparedInput;
use crate::scale::ScaleFactor;
use crate::solver::SolveOutcome;

/// Physical-unit threshold below which a flow is treated as solver noise.
const FLOW_EPSILON: f64 = 1e-4;

/// Formulation tag embedded in the result document.
pub const MODEL_TYPE: &str = "aggregate-flow";

pub fn extract_solution(
    prepared: &PreparedInput<'_>,
    vars: &PlanVariables,
    outcome: &SolveOutcome,
    scale: &ScaleFactor,
) -> PlanResult<PlanSolution> {
    let network = prepared.network();
    let calendar = &prepared.input.calendar;
    let costs = &prepared.input.costs;

    let mut solution = PlanSolution::new(MODEL_TYPE, outcome.termination.to_string());
    solution.mip_gap = outcome.mip_gap;

    for (&(n, p, s, t), &var) in &vars.inventory {
        let quantity = scale.unscale(outcome.value(var));
        if quantity > FLOW_EPSILON {
            solution.inventory.push(InventoryCell {
                node: n,
                product: p,
                state: s,
                date: t,
                quantity,
            });
        }
    }

    for (&(n, p, t), &var) in &vars.production {
        let raw = scale.unscale(outcome.value(var));
        if raw <= FLOW_EPSILON {
            continue;
        }
        // Production is mix-granular; snap away solver noise.
        let mix_size = product_mix_size(prepared, p);
        let quantity = (raw / mix_size).round() * mix_size;
        solution.production_batches.push(ProductionBatch {
            node: n,
            product: p,
            date: t,
            quantity,
        });
    }
    solution.total_production = solution.production_batches.iter().map(|b| b.quantity).sum();

    for (&(r, p, t), &var) in &vars.in_transit {
        let quantity = scale.unscale(outcome.value(var));
        if quantity <= FLOW_EPSILON {
            continue;
        }
        let route = network.route(r).expect("indexed route");
        let destination = network
            .node(route.destination())
            .expect("validated destination");
        solution.shipments.push(Shipment {
            route: r,
            origin: route.origin(),
            destination: destination.id,
            product: p,
            departure_date: t,
            arrival_date: t + chrono::Duration::days(route.transit_days()),
            departure_state: route.departure_state(),
            arrival_state: route.arrival_state(destination),
            quantity,
        });
    }

    for (kind, flows) in [
        (TransitionKind::Thaw, &vars.thaw),
        (TransitionKind::Freeze, &vars.freeze),
    ] {
        for (&(n, p, t), &var) in flows {
            let quantity = scale.unscale(outcome.value(var));
            if quantity > FLOW_EPSILON {
                solution.transitions.push(StateTransition {
                    node: n,
                    product: p,
                    date: t,
                    kind,
                    quantity,
                });
            }
        }
    }

    for (&(n, p, s, t), &var) in &vars.demand_consumed {
        let quantity = scale.unscale(outcome.value(var));
        if quantity > FLOW_EPSILON {
            solution.consumption.push(ConsumptionRecord {
                node: n,
                product: p,
                state: s,
                date: t,
                quantity,
            });
        }
    }

    for (&(n, p, s, t), &var) in &vars.disposal {
        let quantity = scale.unscale(outcome.value(var));
        if quantity > FLOW_EPSILON {
            solution.disposals.push(DisposalRecord {
                node: n,
                product: p,
                state: s,
                date: t,
                quantity,
            });
        }
    }

    let mut labor_cost = 0.0;
    for (&(n, t), &used_var) in &vars.labor_used {
        let used = outcome.value(used_var);
        let paid = outcome.value(vars.labor_paid[&(n, t)]);
        let base = outcome.value(vars.labor_base[&(n, t)]);
        let premium = outcome.value(vars.labor_premium[&(n, t)]);
        labor_cost += match calendar.day(n, t).expect("calendar").kind {
            DayKind::Fixed {
                regular_rate,
                overtime_rate,
                ..
            } => base * regular_rate + premium * overtime_rate,
            DayKind::NonFixed { premium_rate, .. } => premium * premium_rate,
        };
        solution.labor.push(LaborDayHours {
            node: n,
            date: t,
            used,
            paid,
        });
    }

    let transport_cost: f64 = solution
        .shipments
        .iter()
        .map(|s| s.quantity * costs.transport_rate(s.route))
        .sum();

    let mut holding_cost = 0.0;
    for (&(_, _, s, _), &var) in &vars.pallet_count {
        holding_cost += outcome.value(var) * costs.holding.rate(s);
    }
    if let Some(charge) = costs.pallet_entry_charge {
        for &var in vars.pallet_entry.values() {
            holding_cost += outcome.value(var) * charge;
        }
    }

    let changeover_cost: f64 = vars
        .product_start
        .values()
        .map(|&v| outcome.value(v).round() * costs.changeover_cost)
        .sum();

    let total_shortage: f64 = vars
        .shortage
        .values()
        .map(|&v| scale.unscale(outcome.value(v)))
        .sum();
    let shortage_cost = total_shortage * costs.shortage_penalty;

    let disposal_cost: f64 = solution
        .disposals
        .iter()
        .map(|r| r.quantity * costs.disposal_cost)
        .sum();

    solution.costs = CostBreakdown {
        labor: labor_cost,
        transport: transport_cost,
        holding: holding_cost,
        changeover: changeover_cost,
        shortage: shortage_cost,
        disposal: disposal_cost,
        // The scaled formulation leaves cost in plan currency, so the
        // solver objective doubles as an independent cross-check on the
        // recomputed components.
        total: outcome.objective_value,
    };

    let total_demand: f64 = prepared.demand.values().sum();
    let total_satisfied: f64 = solution.consumption.iter().map(|c| c.quantity).sum();
    let fill_rate = if total_demand > 0.0 {
        (total_satisfied / total_demand).clamp(0.0, 1.0)
    } else {
        1.0
    };
    solution.metrics = QualityMetrics {
        fill_rate,
        total_demand,
        total_satisfied,
    };

    solution.validate()?;
    debug!(
        batches = solution.production_batches.len(),
        shipments = solution.shipments.len(),
        fill = solution.metrics.fill_rate,
        "solution extracted"
    );
    Ok(solution)
}
