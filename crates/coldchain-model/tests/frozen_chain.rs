//! Frozen buffer chain: freeze at the plant, hold frozen, thaw on arrival.

use chrono::NaiveDate;
use coldchain_core::{
    calendar::fixed_day, Capability, ForecastEntry, HoldingRates, Leg, ManufacturingData,
    Network, NodeId, NodeSpec, PlanningHorizon, PlanningInput, ProductId, ProductSpec, Route,
    RouteId, StorageState, TransportMode,
};
use coldchain_model::{solve_plan, HighsSolver, SolveConfig};
use coldchain_schemas::TransitionKind;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, day).unwrap()
}

fn frozen_chain_input() -> PlanningInput {
    let mut network = Network::new();
    network
        .add_node(
            NodeSpec::new(
                NodeId::new(1),
                "Plant",
                vec![
                    Capability::Produces,
                    Capability::StoresAmbient,
                    Capability::StoresFrozen,
                ],
            )
            .with_manufacturing(
                ManufacturingData::new(1000.0, 20000.0).with_overheads(0.5, 0.5, 1.0, 0.0),
            ),
        )
        .unwrap();
    network
        .add_node(NodeSpec::new(
            NodeId::new(2),
            "Buffer",
            vec![Capability::StoresFrozen, Capability::FrozenBuffer],
        ))
        .unwrap();
    network
        .add_node(NodeSpec::new(
            NodeId::new(3),
            "Spoke",
            vec![Capability::ServesDemand],
        ))
        .unwrap();
    network
        .add_route(Route::new(
            RouteId::new(1),
            vec![Leg {
                origin: NodeId::new(1),
                destination: NodeId::new(2),
                transit_days: 1,
                mode: TransportMode::Frozen,
            }],
        ))
        .unwrap();
    network
        .add_route(Route::new(
            RouteId::new(2),
            vec![Leg {
                origin: NodeId::new(2),
                destination: NodeId::new(3),
                transit_days: 2,
                mode: TransportMode::Frozen,
            }],
        ))
        .unwrap();

    let mut input = PlanningInput::new(PlanningHorizon::new(d(1), d(10)).unwrap(), network);
    input.products.push(ProductSpec {
        id: ProductId::new(1),
        sku: "GF-BREAD".into(),
        units_per_mix: 500.0,
    });
    for day in 1..=10 {
        input
            .calendar
            .insert(NodeId::new(1), fixed_day(d(day), 8.0, 25.0, 37.5));
    }
    input.costs.shortage_penalty = 20.0;
    input.costs.changeover_cost = 50.0;
    input.costs.holding = HoldingRates {
        ambient: 0.1,
        frozen: 0.05,
        thawed: 0.1,
    };
    input.costs.transport_rates.insert(RouteId::new(1), 0.05);
    input.costs.transport_rates.insert(RouteId::new(2), 0.08);
    input.forecast.push(ForecastEntry {
        node: NodeId::new(3),
        sku: "GF-BREAD".into(),
        date: d(10),
        quantity: 2000.0,
    });
    input
}

#[test]
fn test_thaw_on_arrival_chain() {
    let outcome = solve_plan(
        &frozen_chain_input(),
        &SolveConfig::default(),
        &HighsSolver::new(),
    )
    .unwrap();
    let solution = &outcome.solution;

    assert!((solution.metrics.fill_rate - 1.0).abs() < 1e-6);
    assert!((solution.total_production - 2000.0).abs() < 0.01);

    // Ambient stock freezes at the plant before shipping.
    let frozen: f64 = solution
        .transitions
        .iter()
        .filter(|t| t.kind == TransitionKind::Freeze && t.node == NodeId::new(1))
        .map(|t| t.quantity)
        .sum();
    assert!((frozen - 2000.0).abs() < 0.01);

    // The buffer-to-spoke leg departs frozen and lands thawed with a fresh
    // clock.
    let last_leg = solution
        .shipments
        .iter()
        .find(|s| s.route == RouteId::new(2))
        .unwrap();
    assert_eq!(last_leg.departure_state, StorageState::Frozen);
    assert_eq!(last_leg.arrival_state, StorageState::Thawed);
    assert!(last_leg.state_change());
    assert!(last_leg.arrival_date <= d(10));

    // Demand is served out of thawed stock only.
    assert!(solution
        .consumption
        .iter()
        .all(|c| c.state == StorageState::Thawed && c.node == NodeId::new(3)));
    let consumed: f64 = solution.consumption.iter().map(|c| c.quantity).sum();
    assert!((consumed - 2000.0).abs() < 0.01);
}

#[test]
fn test_thawed_batch_restarts_clock() {
    let outcome = solve_plan(
        &frozen_chain_input(),
        &SolveConfig::default(),
        &HighsSolver::new(),
    )
    .unwrap();

    let arrival_date = outcome
        .solution
        .shipments
        .iter()
        .find(|s| s.route == RouteId::new(2))
        .unwrap()
        .arrival_date;

    // The thawed batch at the spoke was minted on arrival: provenance set,
    // state-entry clock equal to the arrival date, production date older.
    let thawed = outcome
        .ledger
        .batches
        .iter()
        .find(|b| b.location == NodeId::new(3) && b.state == StorageState::Thawed)
        .expect("a thawed batch at the spoke");
    assert!(thawed.provenance.is_some());
    assert_eq!(thawed.state_entry_date, arrival_date);
    assert!(thawed.production_date < arrival_date);
    assert_eq!(thawed.remaining_quantity, 0.0); // consumed by day 10
}
