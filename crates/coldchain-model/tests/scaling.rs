//! Scale-factor invariance: the conditioning transform must not move any
//! decision or any physical quantity in the result.

use chrono::NaiveDate;
use coldchain_core::{
    calendar::fixed_day, Capability, ForecastEntry, HoldingRates, Leg, ManufacturingData,
    Network, NodeId, NodeSpec, PlanningHorizon, PlanningInput, ProductId, ProductSpec, Route,
    RouteId, TransportMode,
};
use coldchain_model::{solve_plan, HighsSolver, SolveConfig};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, day).unwrap()
}

fn delivery_input() -> PlanningInput {
    let mut network = Network::new();
    network
        .add_node(
            NodeSpec::new(
                NodeId::new(1),
                "Plant",
                vec![Capability::Produces, Capability::StoresAmbient],
            )
            .with_manufacturing(
                ManufacturingData::new(1000.0, 20000.0).with_overheads(0.5, 0.5, 1.0, 0.0),
            ),
        )
        .unwrap();
    network
        .add_node(NodeSpec::new(
            NodeId::new(2),
            "Spoke",
            vec![Capability::ServesDemand, Capability::StoresAmbient],
        ))
        .unwrap();
    network
        .add_route(Route::new(
            RouteId::new(1),
            vec![Leg {
                origin: NodeId::new(1),
                destination: NodeId::new(2),
                transit_days: 1,
                mode: TransportMode::Ambient,
            }],
        ))
        .unwrap();

    let mut input = PlanningInput::new(PlanningHorizon::new(d(1), d(4)).unwrap(), network);
    input.products.push(ProductSpec {
        id: ProductId::new(1),
        sku: "GF-BREAD".into(),
        units_per_mix: 400.0,
    });
    for day in 1..=4 {
        input
            .calendar
            .insert(NodeId::new(1), fixed_day(d(day), 8.0, 25.0, 37.5));
    }
    input.costs.shortage_penalty = 10.0;
    input.costs.changeover_cost = 50.0;
    input.costs.holding = HoldingRates {
        ambient: 0.1,
        frozen: 0.2,
        thawed: 0.1,
    };
    input.costs.transport_rates.insert(RouteId::new(1), 0.05);
    input.forecast.push(ForecastEntry {
        node: NodeId::new(2),
        sku: "GF-BREAD".into(),
        date: d(3),
        quantity: 4000.0,
    });
    input
}

#[test]
fn test_solutions_identical_across_scale_factors() {
    let input = delivery_input();
    let solver = HighsSolver::new();

    let base = solve_plan(
        &input,
        &SolveConfig {
            scale_factor: 1000.0,
            ..SolveConfig::default()
        },
        &solver,
    )
    .unwrap()
    .solution;
    let doubled = solve_plan(
        &input,
        &SolveConfig {
            scale_factor: 2000.0,
            ..SolveConfig::default()
        },
        &solver,
    )
    .unwrap()
    .solution;

    // Integer and binary decisions are unchanged.
    assert_eq!(
        base.production_batches.len(),
        doubled.production_batches.len()
    );
    for (a, b) in base
        .production_batches
        .iter()
        .zip(&doubled.production_batches)
    {
        assert_eq!(a.date, b.date);
        assert!((a.quantity - b.quantity).abs() < 1e-6);
    }

    // Physical flows and costs come back in the same units.
    assert_eq!(base.shipments.len(), doubled.shipments.len());
    for (a, b) in base.shipments.iter().zip(&doubled.shipments) {
        assert_eq!(a.departure_date, b.departure_date);
        assert!((a.quantity - b.quantity).abs() < 1e-4);
    }
    assert!((base.costs.total - doubled.costs.total).abs() < 1e-4);
    assert!((base.metrics.fill_rate - doubled.metrics.fill_rate).abs() < 1e-9);
}

#[test]
fn test_unit_scale_factor_also_solves() {
    // S = 1 disables the conditioning entirely; the plan must not change.
    let input = delivery_input();
    let unscaled = solve_plan(
        &input,
        &SolveConfig {
            scale_factor: 1.0,
            ..SolveConfig::default()
        },
        &HighsSolver::new(),
    )
    .unwrap()
    .solution;

    assert!((unscaled.total_production - 4000.0).abs() < 0.01);
    assert!((unscaled.metrics.fill_rate - 1.0).abs() < 1e-6);
}
