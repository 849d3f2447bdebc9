//! Sparse index builder: enumerates the exact sets every variable family is
//! defined on. Built once per solve, deterministic (BTree ordering
//! throughout), and the single source of sparsity for the builders.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use coldchain_core::{NodeId, PlanResult, ProductId, RouteId, StorageState, TruckId};

use crate::prep::PreparedInput;

/// The enumerated variable index for one solve.
#[derive(Debug)]
pub struct PlanIndex {
    /// Horizon dates, ascending.
    pub dates: Vec<NaiveDate>,
    /// (manufacturer, product, date) production triples.
    pub production: Vec<(NodeId, ProductId, NaiveDate)>,
    /// (node, product, owned state, date) inventory cells.
    pub inventory: Vec<(NodeId, ProductId, StorageState, NaiveDate)>,
    /// (route, product, departure date) with arrival inside the horizon.
    pub transit: Vec<(RouteId, ProductId, NaiveDate)>,
    /// (node, product, date) where frozen stock can thaw in place.
    pub thaw: Vec<(NodeId, ProductId, NaiveDate)>,
    /// (node, product, date) where ambient stock can be frozen in place.
    pub freeze: Vec<(NodeId, ProductId, NaiveDate)>,
    /// Dispatch dates per truck, from its weekly pattern.
    pub truck_dispatch: BTreeMap<TruckId, BTreeSet<NaiveDate>>,
    /// (manufacturer, date) labour days.
    pub labor_days: Vec<(NodeId, NaiveDate)>,
}

impl PlanIndex {
    pub fn build(prepared: &PreparedInput<'_>) -> PlanResult<Self> {
        let network = prepared.network();
        let dates = prepared.horizon().dates();
        let products: Vec<ProductId> = prepared.input.products.iter().map(|p| p.id).collect();

        let mut production = Vec::new();
        let mut labor_days = Vec::new();
        for node in network.manufacturers() {
            for &date in &dates {
                labor_days.push((node.id, date));
                for &product in &products {
                    production.push((node.id, product, date));
                }
            }
        }

        let mut inventory = Vec::new();
        let mut thaw = Vec::new();
        let mut freeze = Vec::new();
        for node in network.nodes() {
            let states = node.storage_states();
            for &product in &products {
                for &state in &states {
                    for &date in &dates {
                        inventory.push((node.id, product, state, date));
                    }
                }
                // In-place transitions only where both endpoint states live.
                let owns = |s: StorageState| states.contains(&s);
                if owns(StorageState::Frozen) && owns(StorageState::Thawed) {
                    for &date in &dates {
                        thaw.push((node.id, product, date));
                    }
                }
                if owns(StorageState::Ambient) && owns(StorageState::Frozen) {
                    for &date in &dates {
                        freeze.push((node.id, product, date));
                    }
                }
            }
        }

        let mut truck_dispatch: BTreeMap<TruckId, BTreeSet<NaiveDate>> = BTreeMap::new();
        for truck in network.trucks() {
            let dispatch: BTreeSet<NaiveDate> = dates
                .iter()
                .copied()
                .filter(|d| truck.operates_on(d.weekday()))
                .collect();
            truck_dispatch.insert(truck.id, dispatch);
        }

        let horizon_end = prepared.horizon().end;
        let mut transit = Vec::new();
        for route in network.routes() {
            let serving = network.trucks_serving(route);
            let transit_days = route.transit_days();
            for &dep in &dates {
                let arrival = dep + chrono::Duration::days(transit_days);
                if arrival > horizon_end {
                    continue;
                }
                // Truck-served routes only depart on a serving truck's days.
                if !serving.is_empty()
                    && !serving.iter().any(|t| {
                        truck_dispatch
                            .get(&t.id)
                            .is_some_and(|days| days.contains(&dep))
                    })
                {
                    continue;
                }
                for &product in &products {
                    transit.push((route.id, product, dep));
                }
            }
        }

        production.sort_unstable();
        inventory.sort_unstable();
        transit.sort_unstable();
        thaw.sort_unstable();
        freeze.sort_unstable();
        labor_days.sort_unstable();

        Ok(Self {
            dates,
            production,
            inventory,
            transit,
            thaw,
            freeze,
            truck_dispatch,
            labor_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prep::preprocess;
    use chrono::NaiveDate;
    use coldchain_core::{
        calendar::fixed_day, Capability, Leg, ManufacturingData, Network, NodeSpec,
        PlanningHorizon, PlanningInput, ProductSpec, Route, TransportMode, Truck,
    };

    fn d(day: u32) -> NaiveDate {
        // 2026-06-01 is a Monday
        NaiveDate::from_ymd_opt(2026, 6, day).unwrap()
    }

    fn fixture() -> PlanningInput {
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
                .with_manufacturing(ManufacturingData::new(1000.0, 20000.0)),
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
            .add_route(Route::new(
                RouteId::new(1),
                vec![Leg {
                    origin: NodeId::new(1),
                    destination: NodeId::new(2),
                    transit_days: 2,
                    mode: TransportMode::Frozen,
                }],
            ))
            .unwrap();

        let mut input =
            PlanningInput::new(PlanningHorizon::new(d(1), d(7)).unwrap(), network);
        input.products.push(ProductSpec {
            id: ProductId::new(1),
            sku: "GF-BREAD".into(),
            units_per_mix: 400.0,
        });
        for day in 1..=7 {
            input
                .calendar
                .insert(NodeId::new(1), fixed_day(d(day), 12.0, 25.0, 37.5));
        }
        input
    }

    #[test]
    fn test_inventory_cells_respect_state_ownership() {
        let input = fixture();
        let prepared = preprocess(&input).unwrap();
        let index = PlanIndex::build(&prepared).unwrap();

        // Plant owns ambient+frozen+thawed, buffer frozen only: 4 states * 7 days.
        assert_eq!(index.inventory.len(), 4 * 7);
        assert!(!index
            .inventory
            .iter()
            .any(|(n, _, s, _)| *n == NodeId::new(2) && *s != StorageState::Frozen));
    }

    #[test]
    fn test_transitions_filtered_by_states() {
        let input = fixture();
        let prepared = preprocess(&input).unwrap();
        let index = PlanIndex::build(&prepared).unwrap();

        // Plant owns ambient+frozen -> freeze allowed; frozen+thawed -> thaw allowed.
        assert!(index.freeze.iter().all(|(n, _, _)| *n == NodeId::new(1)));
        assert!(index.thaw.iter().all(|(n, _, _)| *n == NodeId::new(1)));
        // Frozen-only buffer gets neither.
        assert!(!index.thaw.iter().any(|(n, _, _)| *n == NodeId::new(2)));
    }

    #[test]
    fn test_transit_departures_must_arrive_in_horizon() {
        let input = fixture();
        let prepared = preprocess(&input).unwrap();
        let index = PlanIndex::build(&prepared).unwrap();

        // 2-day transit, 7-day horizon: departures day 1..=5 only.
        let deps: Vec<NaiveDate> = index.transit.iter().map(|(_, _, t)| *t).collect();
        assert_eq!(deps.len(), 5);
        assert!(deps.iter().all(|t| *t <= d(5)));
    }

    #[test]
    fn test_truck_pattern_restricts_departures() {
        let mut input = fixture();
        input
            .network
            .add_truck(Truck::new(
                TruckId::new(1),
                "Monday only",
                NodeId::new(1),
                vec![NodeId::new(2)],
                vec![chrono::Weekday::Mon],
            ))
            .unwrap();
        let prepared = preprocess(&input).unwrap();
        let index = PlanIndex::build(&prepared).unwrap();

        // Only Monday 2026-06-01 departs within the week.
        let deps: Vec<NaiveDate> = index.transit.iter().map(|(_, _, t)| *t).collect();
        assert_eq!(deps, vec![d(1)]);
        assert_eq!(index.truck_dispatch[&TruckId::new(1)].len(), 1);
    }

    #[test]
    fn test_deterministic_ordering() {
        let input = fixture();
        let prepared = preprocess(&input).unwrap();
        let a = PlanIndex::build(&prepared).unwrap();
        let b = PlanIndex::build(&prepared).unwrap();
        assert_eq!(a.inventory, b.inventory);
        assert_eq!(a.transit, b.transit);
        assert_eq!(a.production, b.production);
    }
}
