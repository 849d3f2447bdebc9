//! The typed planning dataset: everything a solve consumes, read-only.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::LaborCalendar;
use crate::costs::CostStructure;
use crate::error::{PlanError, PlanResult};
use crate::forecast::{ForecastEntry, InventoryEntry};
use crate::network::Network;
use crate::{NodeId, ProductId};

/// Inclusive date range the plan covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanningHorizon {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PlanningHorizon {
    pub fn new(start: NaiveDate, end: NaiveDate) -> PlanResult<Self> {
        if end < start {
            return Err(PlanError::input(
                "horizon",
                format!("horizon end {} precedes start {}", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// All dates in the horizon, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut out = Vec::with_capacity(self.num_days() as usize);
        let mut d = self.start;
        while d <= self.end {
            out.push(d);
            d = d.succ_opt().expect("date overflow");
        }
        out
    }
}

/// A product with its mix granularity. Production happens in integer
/// multiples of `units_per_mix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub id: ProductId,
    pub sku: String,
    pub units_per_mix: f64,
}

/// Full input to a solve. Borrowed read-only for the duration of the solve;
/// the model owns no part of it.
#[derive(Debug, Clone)]
pub struct PlanningInput {
    pub horizon: PlanningHorizon,
    pub network: Network,
    pub products: Vec<ProductSpec>,
    pub calendar: LaborCalendar,
    pub costs: CostStructure,
    pub forecast: Vec<ForecastEntry>,
    pub initial_inventory: Vec<InventoryEntry>,
    /// Date the initial inventory was counted. Required whenever
    /// `initial_inventory` is non-empty; ages derive from it.
    pub snapshot_date: Option<NaiveDate>,
    /// Alternate SKU identifier -> canonical SKU.
    pub product_aliases: HashMap<String, String>,
    /// Storage-location code -> node (e.g. "4070" -> frozen buffer).
    pub location_aliases: HashMap<String, NodeId>,
}

impl PlanningInput {
    pub fn new(horizon: PlanningHorizon, network: Network) -> Self {
        Self {
            horizon,
            network,
            products: Vec::new(),
            calendar: LaborCalendar::new(),
            costs: CostStructure::default(),
            forecast: Vec::new(),
            initial_inventory: Vec::new(),
            snapshot_date: None,
            product_aliases: HashMap::new(),
            location_aliases: HashMap::new(),
        }
    }

    pub fn product(&self, id: ProductId) -> Option<&ProductSpec> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_by_sku(&self, sku: &str) -> Option<&ProductSpec> {
        self.products.iter().find(|p| p.sku == sku)
    }

    /// Resolve a possibly-aliased SKU to its product.
    pub fn resolve_sku(&self, sku: &str) -> Option<&ProductSpec> {
        let canonical = self.product_aliases.get(sku).map(String::as_str).unwrap_or(sku);
        self.product_by_sku(canonical)
    }

    /// Resolve a storage-location code to a node id, trying aliases first
    /// and node names second.
    pub fn resolve_location(&self, location: &str) -> Option<NodeId> {
        if let Some(&node) = self.location_aliases.get(location) {
            return Some(node);
        }
        self.network.node_by_name(location).map(|n| n.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, day).unwrap()
    }

    #[test]
    fn test_horizon_dates() {
        let horizon = PlanningHorizon::new(d(1), d(4)).unwrap();
        assert_eq!(horizon.num_days(), 4);
        assert_eq!(horizon.dates().len(), 4);
        assert!(horizon.contains(d(3)));
        assert!(!horizon.contains(d(5)));
    }

    #[test]
    fn test_horizon_rejects_reversed_range() {
        assert!(PlanningHorizon::new(d(4), d(1)).is_err());
    }

    #[test]
    fn test_sku_alias_resolution() {
        let horizon = PlanningHorizon::new(d(1), d(2)).unwrap();
        let mut input = PlanningInput::new(horizon, Network::new());
        input.products.push(ProductSpec {
            id: ProductId::new(1),
            sku: "GF-BREAD".into(),
            units_per_mix: 400.0,
        });
        input
            .product_aliases
            .insert("BREAD-OLD".into(), "GF-BREAD".into());

        assert_eq!(input.resolve_sku("GF-BREAD").unwrap().id, ProductId::new(1));
        assert_eq!(input.resolve_sku("BREAD-OLD").unwrap().id, ProductId::new(1));
        assert!(input.resolve_sku("NOPE").is_none());
    }
}
