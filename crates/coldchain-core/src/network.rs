//! Nodes, legs, routes and trucks: the distribution network.
//!
//! The network is a directed multigraph over capability-typed nodes. Legs are
//! the physical edges; a [`Route`] is an ordered chain of legs that moves
//! goods from its first origin to its last destination without intermediate
//! storage (multi-leg routes model through-shipments; storage between hops is
//! modeled with two routes and inventory at the hub). Trucks put a pallet
//! capacity and a weekly departure pattern on top of routes.

use std::collections::HashMap;

use chrono::Weekday;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TRUCK_PALLETS;
use crate::error::{PlanError, PlanResult};
use crate::{NodeId, RouteId, StorageState, TruckId};

/// What a node is able to do. A node carries a set of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Manufactures product (requires [`ManufacturingData`]).
    Produces,
    /// Holds ambient-state inventory.
    StoresAmbient,
    /// Holds frozen-state inventory.
    StoresFrozen,
    /// Receives forecast demand.
    ServesDemand,
    /// Long-term frozen holding point; shipments out of it may thaw on
    /// arrival downstream.
    FrozenBuffer,
}

/// Production parameters for a manufacturing node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturingData {
    /// Production rate in units per hour.
    pub rate_units_per_hour: f64,
    /// Hard ceiling on units produced per day, across all products.
    pub max_daily_units: f64,
    /// Overhead hours at the start of any production day.
    pub startup_hours: f64,
    /// Overhead hours at the end of any production day.
    pub shutdown_hours: f64,
    /// Overhead hours per product switch within a day.
    pub changeover_hours: f64,
    /// Fixed overhead hours per product produced that day.
    pub per_product_hours: f64,
}

impl ManufacturingData {
    pub fn new(rate_units_per_hour: f64, max_daily_units: f64) -> Self {
        Self {
            rate_units_per_hour,
            max_daily_units,
            startup_hours: 0.0,
            shutdown_hours: 0.0,
            changeover_hours: 0.0,
            per_product_hours: 0.0,
        }
    }

    pub fn with_overheads(
        mut self,
        startup: f64,
        shutdown: f64,
        changeover: f64,
        per_product: f64,
    ) -> Self {
        self.startup_hours = startup;
        self.shutdown_hours = shutdown;
        self.changeover_hours = changeover;
        self.per_product_hours = per_product;
        self
    }
}

/// A node in the distribution network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub name: String,
    pub capabilities: Vec<Capability>,
    /// Present iff the node has [`Capability::Produces`].
    pub manufacturing: Option<ManufacturingData>,
}

impl NodeSpec {
    pub fn new(id: NodeId, name: impl Into<String>, capabilities: Vec<Capability>) -> Self {
        Self {
            id,
            name: name.into(),
            capabilities,
            manufacturing: None,
        }
    }

    pub fn with_manufacturing(mut self, data: ManufacturingData) -> Self {
        self.manufacturing = Some(data);
        self
    }

    pub fn has(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    pub fn produces(&self) -> bool {
        self.has(Capability::Produces)
    }

    pub fn serves_demand(&self) -> bool {
        self.has(Capability::ServesDemand)
    }

    /// Inventory states this node owns. Thawed stock exists wherever demand
    /// is served or ambient goods are stored; a frozen-only buffer owns no
    /// thawed variable at all.
    pub fn storage_states(&self) -> Vec<StorageState> {
        let mut states = Vec::new();
        if self.has(Capability::StoresAmbient) {
            states.push(StorageState::Ambient);
        }
        if self.has(Capability::StoresFrozen) {
            states.push(StorageState::Frozen);
        }
        if self.serves_demand() || self.has(Capability::StoresAmbient) {
            states.push(StorageState::Thawed);
        }
        states
    }

    pub fn owns_state(&self, state: StorageState) -> bool {
        self.storage_states().contains(&state)
    }

    /// True for nodes whose only storage mode is frozen.
    pub fn frozen_only(&self) -> bool {
        self.owns_state(StorageState::Frozen)
            && !self.owns_state(StorageState::Ambient)
            && !self.owns_state(StorageState::Thawed)
    }
}

/// Transport mode of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Ambient,
    Frozen,
}

/// A single directed transport leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub origin: NodeId,
    pub destination: NodeId,
    pub transit_days: i64,
    pub mode: TransportMode,
}

/// An ordered chain of legs with a fixed origin and destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub legs: Vec<Leg>,
}

impl Route {
    pub fn new(id: RouteId, legs: Vec<Leg>) -> Self {
        Self { id, legs }
    }

    pub fn origin(&self) -> NodeId {
        self.legs[0].origin
    }

    pub fn destination(&self) -> NodeId {
        self.legs[self.legs.len() - 1].destination
    }

    /// Total transit time, the sum over legs.
    pub fn transit_days(&self) -> i64 {
        self.legs.iter().map(|l| l.transit_days).sum()
    }

    /// Mode of the final leg, which decides the arrival state.
    pub fn mode(&self) -> TransportMode {
        self.legs[self.legs.len() - 1].mode
    }

    /// State goods are drawn from at the origin.
    pub fn departure_state(&self) -> StorageState {
        match self.legs[0].mode {
            TransportMode::Frozen => StorageState::Frozen,
            TransportMode::Ambient => StorageState::Ambient,
        }
    }

    /// State goods land in at the destination. A frozen route terminating at
    /// a frozen-only node stays frozen; otherwise frozen goods thaw on
    /// arrival and restart their shelf-life clock in the thawed state.
    pub fn arrival_state(&self, destination: &NodeSpec) -> StorageState {
        match self.mode() {
            TransportMode::Ambient => StorageState::Ambient,
            TransportMode::Frozen => {
                if destination.frozen_only() {
                    StorageState::Frozen
                } else {
                    StorageState::Thawed
                }
            }
        }
    }
}

/// A named scheduled vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truck {
    pub id: TruckId,
    pub name: String,
    pub origin: NodeId,
    pub destinations: Vec<NodeId>,
    /// Weekdays on which this truck departs.
    pub departure_days: Vec<Weekday>,
    pub pallet_capacity: u32,
}

impl Truck {
    pub fn new(
        id: TruckId,
        name: impl Into<String>,
        origin: NodeId,
        destinations: Vec<NodeId>,
        departure_days: Vec<Weekday>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            origin,
            destinations,
            departure_days,
            pallet_capacity: DEFAULT_TRUCK_PALLETS,
        }
    }

    pub fn with_capacity(mut self, pallets: u32) -> Self {
        self.pallet_capacity = pallets;
        self
    }

    pub fn operates_on(&self, weekday: Weekday) -> bool {
        self.departure_days.contains(&weekday)
    }

    pub fn serves(&self, origin: NodeId, destination: NodeId) -> bool {
        self.origin == origin && self.destinations.contains(&destination)
    }
}

/// The network container: node table, leg graph, routes and trucks.
///
/// Routes and trucks are validated on insertion; a route referencing an
/// unknown node or a truck without a backing route is rejected immediately.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<NodeSpec>,
    routes: Vec<Route>,
    trucks: Vec<Truck>,
    /// Leg connectivity, for topology queries. Node weights are the ids of
    /// the node table; edges carry the legs of every registered route.
    pub graph: DiGraph<NodeId, Leg>,
    node_lookup: HashMap<NodeId, usize>,
    graph_lookup: HashMap<NodeId, NodeIndex>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: NodeSpec) -> PlanResult<()> {
        if self.node_lookup.contains_key(&node.id) {
            return Err(PlanError::input(
                "network.nodes",
                format!("duplicate node id {}", node.id),
            ));
        }
        if node.produces() && node.manufacturing.is_none() {
            return Err(PlanError::input(
                "network.nodes",
                format!("node '{}' produces but has no manufacturing data", node.name),
            ));
        }
        let idx = self.graph.add_node(node.id);
        self.graph_lookup.insert(node.id, idx);
        self.node_lookup.insert(node.id, self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    pub fn add_route(&mut self, route: Route) -> PlanResult<()> {
        if route.legs.is_empty() {
            return Err(PlanError::input(
                "network.routes",
                format!("route {} has no legs", route.id),
            ));
        }
        let mut expected_origin = None;
        for leg in &route.legs {
            for end in [leg.origin, leg.destination] {
                if !self.node_lookup.contains_key(&end) {
                    return Err(PlanError::input(
                        "network.routes",
                        format!("route {} references unknown node {}", route.id, end),
                    ));
                }
            }
            if let Some(prev) = expected_origin {
                if leg.origin != prev {
                    return Err(PlanError::input(
                        "network.routes",
                        format!("route {} legs do not chain at node {}", route.id, leg.origin),
                    ));
                }
            }
            expected_origin = Some(leg.destination);
        }

        // Endpoint states must exist: goods depart from a state the origin
        // stores and land in a state the destination owns.
        let origin = self.node(route.origin()).expect("validated above");
        if !origin.owns_state(route.departure_state()) {
            return Err(PlanError::input(
                "network.routes",
                format!(
                    "route {} departs {} but node '{}' does not store that state",
                    route.id,
                    route.departure_state(),
                    origin.name
                ),
            ));
        }
        let destination = self.node(route.destination()).expect("validated above");
        let arrival = route.arrival_state(destination);
        if !destination.owns_state(arrival) {
            return Err(PlanError::input(
                "network.routes",
                format!(
                    "route {} arrives {} but node '{}' does not store that state",
                    route.id, arrival, destination.name
                ),
            ));
        }

        for leg in &route.legs {
            let from = self.graph_lookup[&leg.origin];
            let to = self.graph_lookup[&leg.destination];
            self.graph.add_edge(from, to, leg.clone());
        }
        self.routes.push(route);
        Ok(())
    }

    pub fn add_truck(&mut self, truck: Truck) -> PlanResult<()> {
        if !self.node_lookup.contains_key(&truck.origin) {
            return Err(PlanError::input(
                "network.trucks",
                format!("truck '{}' departs from unknown node {}", truck.name, truck.origin),
            ));
        }
        for dest in &truck.destinations {
            if self.route_between(truck.origin, *dest).is_none() {
                return Err(PlanError::input(
                    "network.trucks",
                    format!(
                        "truck '{}' serves {} -> {} but no route connects them",
                        truck.name, truck.origin, dest
                    ),
                ));
            }
        }
        self.trucks.push(truck);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeSpec> {
        self.node_lookup.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn node_by_name(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn trucks(&self) -> &[Truck] {
        &self.trucks
    }

    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// Canonical route for an origin/destination pair: the first registered
    /// route connecting them.
    pub fn route_between(&self, origin: NodeId, destination: NodeId) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| r.origin() == origin && r.destination() == destination)
    }

    pub fn manufacturers(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.iter().filter(|n| n.produces())
    }

    pub fn demand_nodes(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.iter().filter(|n| n.serves_demand())
    }

    /// Whether goods can move from `from` to `to` over registered legs.
    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        match (self.graph_lookup.get(&from), self.graph_lookup.get(&to)) {
            (Some(&a), Some(&b)) => {
                a == b || petgraph::algo::has_path_connecting(&self.graph, a, b, None)
            }
            _ => false,
        }
    }

    /// Trucks that can carry a given route's flow.
    pub fn trucks_serving(&self, route: &Route) -> Vec<&Truck> {
        self.trucks
            .iter()
            .filter(|t| t.serves(route.origin(), route.destination()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant() -> NodeSpec {
        NodeSpec::new(
            NodeId::new(1),
            "Plant",
            vec![
                Capability::Produces,
                Capability::StoresAmbient,
                Capability::StoresFrozen,
            ],
        )
        .with_manufacturing(ManufacturingData::new(1000.0, 20000.0))
    }

    fn buffer() -> NodeSpec {
        NodeSpec::new(
            NodeId::new(2),
            "Buffer",
            vec![Capability::StoresFrozen, Capability::FrozenBuffer],
        )
    }

    fn spoke() -> NodeSpec {
        NodeSpec::new(NodeId::new(3), "Spoke", vec![Capability::ServesDemand])
    }

    #[test]
    fn test_storage_state_derivation() {
        assert_eq!(
            plant().storage_states(),
            vec![StorageState::Ambient, StorageState::Frozen, StorageState::Thawed]
        );
        assert_eq!(buffer().storage_states(), vec![StorageState::Frozen]);
        assert!(buffer().frozen_only());
        // A pure demand spoke owns only thawed stock.
        assert_eq!(spoke().storage_states(), vec![StorageState::Thawed]);
    }

    #[test]
    fn test_arrival_state_thaws_unless_frozen_only() {
        let leg = |o: usize, d: usize| Leg {
            origin: NodeId::new(o),
            destination: NodeId::new(d),
            transit_days: 1,
            mode: TransportMode::Frozen,
        };
        let to_buffer = Route::new(RouteId::new(1), vec![leg(1, 2)]);
        let to_spoke = Route::new(RouteId::new(2), vec![leg(2, 3)]);

        assert_eq!(to_buffer.arrival_state(&buffer()), StorageState::Frozen);
        assert_eq!(to_spoke.arrival_state(&spoke()), StorageState::Thawed);
        assert_eq!(to_buffer.departure_state(), StorageState::Frozen);
    }

    #[test]
    fn test_route_transit_sums_legs() {
        let route = Route::new(
            RouteId::new(1),
            vec![
                Leg {
                    origin: NodeId::new(1),
                    destination: NodeId::new(2),
                    transit_days: 1,
                    mode: TransportMode::Ambient,
                },
                Leg {
                    origin: NodeId::new(2),
                    destination: NodeId::new(3),
                    transit_days: 2,
                    mode: TransportMode::Ambient,
                },
            ],
        );
        assert_eq!(route.transit_days(), 3);
        assert_eq!(route.origin(), NodeId::new(1));
        assert_eq!(route.destination(), NodeId::new(3));
    }

    #[test]
    fn test_network_rejects_unknown_references() {
        let mut network = Network::new();
        network.add_node(plant()).unwrap();

        let bad_route = Route::new(
            RouteId::new(1),
            vec![Leg {
                origin: NodeId::new(1),
                destination: NodeId::new(99),
                transit_days: 1,
                mode: TransportMode::Ambient,
            }],
        );
        assert!(matches!(
            network.add_route(bad_route),
            Err(PlanError::Input { .. })
        ));

        let bad_truck = Truck::new(
            TruckId::new(1),
            "T1",
            NodeId::new(1),
            vec![NodeId::new(99)],
            vec![Weekday::Mon],
        );
        assert!(matches!(
            network.add_truck(bad_truck),
            Err(PlanError::Input { .. })
        ));
    }

    #[test]
    fn test_network_rejects_producer_without_rates() {
        let mut network = Network::new();
        let node = NodeSpec::new(NodeId::new(1), "NoRates", vec![Capability::Produces]);
        assert!(network.add_node(node).is_err());
    }

    #[test]
    fn test_broken_leg_chain_rejected() {
        let mut network = Network::new();
        network.add_node(plant()).unwrap();
        network.add_node(buffer()).unwrap();
        network.add_node(spoke()).unwrap();
        let route = Route::new(
            RouteId::new(1),
            vec![
                Leg {
                    origin: NodeId::new(1),
                    destination: NodeId::new(2),
                    transit_days: 1,
                    mode: TransportMode::Ambient,
                },
                Leg {
                    // does not start where the previous leg ended
                    origin: NodeId::new(1),
                    destination: NodeId::new(3),
                    transit_days: 1,
                    mode: TransportMode::Ambient,
                },
            ],
        );
        assert!(network.add_route(route).is_err());
    }

    #[test]
    fn test_connectivity_follows_legs() {
        let mut network = Network::new();
        network.add_node(plant()).unwrap();
        network.add_node(buffer()).unwrap();
        network.add_node(spoke()).unwrap();
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

        assert!(network.is_connected(NodeId::new(1), NodeId::new(2)));
        assert!(!network.is_connected(NodeId::new(2), NodeId::new(1)));
        assert!(!network.is_connected(NodeId::new(1), NodeId::new(3)));
        assert!(!network.is_connected(NodeId::new(1), NodeId::new(99)));
    }

    #[test]
    fn test_trucks_serving() {
        let mut network = Network::new();
        network.add_node(plant()).unwrap();
        network.add_node(buffer()).unwrap();
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
            .add_truck(Truck::new(
                TruckId::new(1),
                "Mon/Thu",
                NodeId::new(1),
                vec![NodeId::new(2)],
                vec![Weekday::Mon, Weekday::Thu],
            ))
            .unwrap();

        let route = network.route(RouteId::new(1)).unwrap();
        assert_eq!(network.trucks_serving(route).len(), 1);
        assert!(network.trucks()[0].operates_on(Weekday::Mon));
        assert!(!network.trucks()[0].operates_on(Weekday::Tue));
        assert_eq!(network.trucks()[0].pallet_capacity, 44);
    }
}
