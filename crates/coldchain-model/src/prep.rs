//! Input preprocessing: alias resolution, location mapping, state inference.
//!
//! Runs before anything touches the model. Every rejection here is an
//! [`PlanError::Input`] naming the offending field and entity; nothing
//! downstream re-validates these conditions.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use coldchain_core::{
    NodeId, PlanError, PlanResult, PlanningInput, ProductId, StorageState,
};

/// The normalized view of a [`PlanningInput`] the rest of the pipeline
/// consumes. Borrows the input read-only for the duration of a solve.
#[derive(Debug)]
pub struct PreparedInput<'a> {
    pub input: &'a PlanningInput,
    /// Demand aggregated per (node, product, date), canonical products only.
    pub demand: BTreeMap<(NodeId, ProductId, NaiveDate), f64>,
    /// Initial inventory aggregated per (node, product, state).
    pub initial: BTreeMap<(NodeId, ProductId, StorageState), f64>,
    /// Snapshot date; present whenever `initial` is non-empty.
    pub snapshot_date: Option<NaiveDate>,
}

impl<'a> PreparedInput<'a> {
    pub fn horizon(&self) -> &coldchain_core::PlanningHorizon {
        &self.input.horizon
    }

    pub fn network(&self) -> &coldchain_core::Network {
        &self.input.network
    }

    /// Age in days of the initial-inventory snapshot at `date`.
    pub fn snapshot_age_at(&self, date: NaiveDate) -> Option<i64> {
        self.snapshot_date.map(|s| (date - s).num_days())
    }
}

/// Normalize and validate a planning dataset.
///
/// Forecast entries dated outside the horizon are ignored (forecasts
/// routinely span more than the solve window); every other inconsistency is
/// rejected.
pub fn preprocess(input: &PlanningInput) -> PlanResult<PreparedInput<'_>> {
    validate_products(input)?;

    if !input.initial_inventory.is_empty() && input.snapshot_date.is_none() {
        return Err(PlanError::input(
            "snapshot_date",
            "initial inventory present without a snapshot date",
        ));
    }
    if let Some(snapshot) = input.snapshot_date {
        if snapshot > input.horizon.start {
            return Err(PlanError::input(
                "snapshot_date",
                format!(
                    "snapshot date {} is after the planning start {}",
                    snapshot, input.horizon.start
                ),
            ));
        }
    }

    let manufacturers: Vec<NodeId> = input.network.manufacturers().map(|n| n.id).collect();
    input
        .calendar
        .validate_coverage(&manufacturers, &input.horizon.dates())?;

    let demand = resolve_forecast(input)?;
    let initial = resolve_initial_inventory(input)?;

    // A demand node nothing can reach and nothing is stocked at will only
    // ever be served by shortage; worth flagging before the solve.
    let demand_nodes: std::collections::BTreeSet<NodeId> =
        demand.keys().map(|&(n, _, _)| n).collect();
    for node in demand_nodes {
        let supplied = manufacturers
            .iter()
            .any(|&m| input.network.is_connected(m, node))
            || initial.keys().any(|&(n, _, _)| {
                n == node || input.network.is_connected(n, node)
            });
        if !supplied {
            tracing::warn!(node = %node, "demand node has no supply path or stock");
        }
    }

    Ok(PreparedInput {
        input,
        demand,
        initial,
        snapshot_date: input.snapshot_date,
    })
}

fn validate_products(input: &PlanningInput) -> PlanResult<()> {
    for product in &input.products {
        if product.units_per_mix <= 0.0 {
            return Err(PlanError::input(
                "products.units_per_mix",
                format!("product '{}' has non-positive mix size", product.sku),
            ));
        }
        let dupes = input
            .products
            .iter()
            .filter(|p| p.sku == product.sku)
            .count();
        if dupes > 1 {
            return Err(PlanError::input(
                "products.sku",
                format!("duplicate SKU '{}'", product.sku),
            ));
        }
    }
    Ok(())
}

fn resolve_forecast(
    input: &PlanningInput,
) -> PlanResult<BTreeMap<(NodeId, ProductId, NaiveDate), f64>> {
    let mut demand = BTreeMap::new();
    for entry in &input.forecast {
        if entry.quantity < 0.0 {
            return Err(PlanError::input(
                "forecast.quantity",
                format!(
                    "negative demand {} for '{}' at node {} on {}",
                    entry.quantity, entry.sku, entry.node, entry.date
                ),
            ));
        }
        let node = input.network.node(entry.node).ok_or_else(|| {
            PlanError::input(
                "forecast.node",
                format!("forecast references unknown node {}", entry.node),
            )
        })?;
        if !node.serves_demand() {
            return Err(PlanError::input(
                "forecast.node",
                format!("node '{}' does not serve demand", node.name),
            ));
        }
        let product = input.resolve_sku(&entry.sku).ok_or_else(|| {
            PlanError::input(
                "forecast.sku",
                format!("forecast references unknown SKU '{}'", entry.sku),
            )
        })?;
        if !input.horizon.contains(entry.date) || entry.quantity == 0.0 {
            continue;
        }
        *demand
            .entry((entry.node, product.id, entry.date))
            .or_insert(0.0) += entry.quantity;
    }
    Ok(demand)
}

fn resolve_initial_inventory(
    input: &PlanningInput,
) -> PlanResult<BTreeMap<(NodeId, ProductId, StorageState), f64>> {
    let mut initial = BTreeMap::new();
    for entry in &input.initial_inventory {
        if entry.quantity < 0.0 {
            return Err(PlanError::input(
                "initial_inventory.quantity",
                format!(
                    "negative quantity {} for '{}' at '{}'",
                    entry.quantity, entry.sku, entry.location
                ),
            ));
        }
        if entry.quantity == 0.0 {
            continue;
        }
        let node_id = input.resolve_location(&entry.location).ok_or_else(|| {
            PlanError::input(
                "initial_inventory.location",
                format!("unknown storage location '{}'", entry.location),
            )
        })?;
        let node = self::node(input, node_id)?;
        let product = input.resolve_sku(&entry.sku).ok_or_else(|| {
            PlanError::input(
                "initial_inventory.sku",
                format!("initial inventory references unknown SKU '{}'", entry.sku),
            )
        })?;
        let state = match entry.state {
            Some(state) => {
                if !node.owns_state(state) {
                    return Err(PlanError::input(
                        "initial_inventory.state",
                        format!("node '{}' cannot store {} stock", node.name, state),
                    ));
                }
                state
            }
            None => infer_state(node)?,
        };
        *initial.entry((node_id, product.id, state)).or_insert(0.0) += entry.quantity;
    }
    Ok(initial)
}

fn node<'a>(
    input: &'a PlanningInput,
    id: NodeId,
) -> PlanResult<&'a coldchain_core::NodeSpec> {
    input.network.node(id).ok_or_else(|| {
        PlanError::input(
            "initial_inventory.location",
            format!("location alias points at unknown node {}", id),
        )
    })
}

/// Infer the storage state of an untagged inventory row from where it sits:
/// a frozen-only node implies frozen stock; otherwise ambient wins over
/// thawed.
fn infer_state(node: &coldchain_core::NodeSpec) -> PlanResult<StorageState> {
    let states = node.storage_states();
    if node.frozen_only() {
        return Ok(StorageState::Frozen);
    }
    if states.contains(&StorageState::Ambient) {
        return Ok(StorageState::Ambient);
    }
    states.first().copied().ok_or_else(|| {
        PlanError::input(
            "initial_inventory.state",
            format!("node '{}' has no storage modes", node.name),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use coldchain_core::{
        calendar::fixed_day, Capability, ForecastEntry, InventoryEntry, ManufacturingData,
        Network, NodeSpec, PlanningHorizon, ProductSpec,
    };

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, day).unwrap()
    }

    fn input_fixture() -> PlanningInput {
        let mut network = Network::new();
        network
            .add_node(
                NodeSpec::new(
                    NodeId::new(1),
                    "Plant",
                    vec![
                        Capability::Produces,
                        Capability::StoresAmbient,
                        Capability::ServesDemand,
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

        let mut input = PlanningInput::new(
            PlanningHorizon::new(d(1), d(3)).unwrap(),
            network,
        );
        input.products.push(ProductSpec {
            id: ProductId::new(1),
            sku: "GF-BREAD".into(),
            units_per_mix: 400.0,
        });
        for day in 1..=3 {
            input
                .calendar
                .insert(NodeId::new(1), fixed_day(d(day), 12.0, 25.0, 37.5));
        }
        input
    }

    #[test]
    fn test_missing_snapshot_date_rejected() {
        let mut input = input_fixture();
        input.initial_inventory.push(InventoryEntry {
            location: "Plant".into(),
            sku: "GF-BREAD".into(),
            state: None,
            quantity: 100.0,
        });
        let err = preprocess(&input).unwrap_err();
        assert!(matches!(err, PlanError::Input { ref field, .. } if field == "snapshot_date"));
    }

    #[test]
    fn test_alias_and_location_resolution() {
        let mut input = input_fixture();
        input
            .product_aliases
            .insert("BREAD-OLD".into(), "GF-BREAD".into());
        input
            .location_aliases
            .insert("4070".into(), NodeId::new(2));
        input.snapshot_date = Some(d(1));
        input.initial_inventory.push(InventoryEntry {
            location: "4070".into(),
            sku: "BREAD-OLD".into(),
            state: None,
            quantity: 640.0,
        });

        let prepared = preprocess(&input).unwrap();
        // Storage code resolved to the frozen buffer, state inferred frozen.
        assert_eq!(
            prepared.initial[&(NodeId::new(2), ProductId::new(1), StorageState::Frozen)],
            640.0
        );
    }

    #[test]
    fn test_unknown_sku_rejected() {
        let mut input = input_fixture();
        input.forecast.push(ForecastEntry {
            node: NodeId::new(1),
            sku: "NOPE".into(),
            date: d(2),
            quantity: 10.0,
        });
        let err = preprocess(&input).unwrap_err();
        assert!(matches!(err, PlanError::Input { ref field, .. } if field == "forecast.sku"));
    }

    #[test]
    fn test_forecast_outside_horizon_ignored() {
        let mut input = input_fixture();
        input.forecast.push(ForecastEntry {
            node: NodeId::new(1),
            sku: "GF-BREAD".into(),
            date: d(25),
            quantity: 10.0,
        });
        let prepared = preprocess(&input).unwrap();
        assert!(prepared.demand.is_empty());
    }

    #[test]
    fn test_duplicate_forecast_rows_aggregate() {
        let mut input = input_fixture();
        for _ in 0..2 {
            input.forecast.push(ForecastEntry {
                node: NodeId::new(1),
                sku: "GF-BREAD".into(),
                date: d(2),
                quantity: 150.0,
            });
        }
        let prepared = preprocess(&input).unwrap();
        assert_eq!(
            prepared.demand[&(NodeId::new(1), ProductId::new(1), d(2))],
            300.0
        );
    }

    #[test]
    fn test_calendar_gap_rejected() {
        let mut input = input_fixture();
        input.horizon = PlanningHorizon::new(d(1), d(5)).unwrap();
        let err = preprocess(&input).unwrap_err();
        assert!(matches!(err, PlanError::Input { ref field, .. } if field == "calendar"));
    }

    #[test]
    fn test_explicit_state_must_be_storable() {
        let mut input = input_fixture();
        input.snapshot_date = Some(d(1));
        input.initial_inventory.push(InventoryEntry {
            location: "Plant".into(),
            sku: "GF-BREAD".into(),
            state: Some(StorageState::Frozen),
            quantity: 10.0,
        });
        assert!(preprocess(&input).is_err());
    }

    #[test]
    fn test_snapshot_after_start_rejected() {
        let mut input = input_fixture();
        input.snapshot_date = Some(d(2));
        input.initial_inventory.push(InventoryEntry {
            location: "Plant".into(),
            sku: "GF-BREAD".into(),
            state: None,
            quantity: 10.0,
        });
        assert!(preprocess(&input).is_err());
    }
}
