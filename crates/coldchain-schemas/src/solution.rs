//! The validated plan result document.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use coldchain_core::constants::SUM_TOLERANCE;
use coldchain_core::{NodeId, ProductId, RouteId, StorageState};

use crate::{SchemaViolation, SCHEMA_VERSION};

/// End-of-day inventory at one (node, product, state, date) cell.
///
/// Carried as a sorted record list rather than a keyed map: JSON objects
/// cannot key on tuples. [`PlanSolution::inventory_map`] rebuilds the keyed
/// view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCell {
    pub node: NodeId,
    pub product: ProductId,
    pub state: StorageState,
    pub date: NaiveDate,
    pub quantity: f64,
}

/// One non-zero production decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub node: NodeId,
    pub product: ProductId,
    pub date: NaiveDate,
    pub quantity: f64,
}

/// One non-zero aggregate shipment on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub route: RouteId,
    pub origin: NodeId,
    pub destination: NodeId,
    pub product: ProductId,
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub departure_state: StorageState,
    pub arrival_state: StorageState,
    pub quantity: f64,
}

impl Shipment {
    /// Whether goods change state on arrival (frozen thawing at the dock).
    pub fn state_change(&self) -> bool {
        self.departure_state != self.arrival_state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Thaw,
    Freeze,
}

/// An in-place state transition at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub node: NodeId,
    pub product: ProductId,
    pub date: NaiveDate,
    pub kind: TransitionKind,
    pub quantity: f64,
}

/// Demand satisfied out of a consumable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub node: NodeId,
    pub product: ProductId,
    pub state: StorageState,
    pub date: NaiveDate,
    pub quantity: f64,
}

/// Stock leaving through the zero-cost disposal channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisposalRecord {
    pub node: NodeId,
    pub product: ProductId,
    pub state: StorageState,
    pub date: NaiveDate,
    pub quantity: f64,
}

/// Cost components in plan currency. Pallet-entry charges fold into
/// `holding`; `disposal` is zero unless a policy layer priced the disposal
/// channel in the cost structure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub labor: f64,
    pub transport: f64,
    pub holding: f64,
    pub changeover: f64,
    pub shortage: f64,
    pub disposal: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub fn component_sum(&self) -> f64 {
        self.labor + self.transport + self.holding + self.changeover + self.shortage
            + self.disposal
    }
}

/// Labour hours for one node-day, both sides of the paid/used contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborDayHours {
    pub node: NodeId,
    pub date: NaiveDate,
    pub used: f64,
    pub paid: f64,
}

/// Service-quality rollup.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub fill_rate: f64,
    pub total_demand: f64,
    pub total_satisfied: f64,
}

/// The complete validated result of one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSolution {
    pub schema_version: u32,
    /// Formulation tag, e.g. "aggregate-flow".
    pub model_type: String,
    /// Solver termination classification.
    pub termination: String,
    /// Relative MIP gap when the solver proved one (0.0 at optimality).
    pub mip_gap: Option<f64>,
    pub total_production: f64,
    pub inventory: Vec<InventoryCell>,
    pub production_batches: Vec<ProductionBatch>,
    pub shipments: Vec<Shipment>,
    pub transitions: Vec<StateTransition>,
    pub consumption: Vec<ConsumptionRecord>,
    pub disposals: Vec<DisposalRecord>,
    pub costs: CostBreakdown,
    pub labor: Vec<LaborDayHours>,
    pub metrics: QualityMetrics,
}

impl PlanSolution {
    /// Empty shell with the current schema version; the extractor fills it.
    pub fn new(model_type: impl Into<String>, termination: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            model_type: model_type.into(),
            termination: termination.into(),
            mip_gap: None,
            total_production: 0.0,
            inventory: Vec::new(),
            production_batches: Vec::new(),
            shipments: Vec::new(),
            transitions: Vec::new(),
            consumption: Vec::new(),
            disposals: Vec::new(),
            costs: CostBreakdown::default(),
            labor: Vec::new(),
            metrics: QualityMetrics::default(),
        }
    }

    /// Keyed view over the inventory records.
    pub fn inventory_map(&self) -> BTreeMap<(NodeId, ProductId, StorageState, NaiveDate), f64> {
        self.inventory
            .iter()
            .map(|c| ((c.node, c.product, c.state, c.date), c.quantity))
            .collect()
    }

    /// Enforce the cross-field invariants. Any violation means the producing
    /// pipeline is buggy; callers must treat it as fatal.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        let sum = self.costs.component_sum();
        if !within_relative(self.costs.total, sum, SUM_TOLERANCE) {
            return Err(SchemaViolation::new(
                "costs.total",
                format!("{:.4}", self.costs.total),
                format!("component sum {:.4} (±1%)", sum),
            ));
        }

        let batch_sum: f64 = self.production_batches.iter().map(|b| b.quantity).sum();
        if !within_relative(self.total_production, batch_sum, SUM_TOLERANCE) {
            return Err(SchemaViolation::new(
                "total_production",
                format!("{:.4}", self.total_production),
                format!("batch sum {:.4} (±1%)", batch_sum),
            ));
        }

        for day in &self.labor {
            if day.paid < day.used - 1e-6 {
                return Err(SchemaViolation::new(
                    format!("labor[{} @ {}].paid", day.node, day.date),
                    format!("{:.4}", day.paid),
                    format!(">= used {:.4}", day.used),
                ));
            }
        }

        let fill = self.metrics.fill_rate;
        if !(-1e-9..=1.0 + 1e-9).contains(&fill) {
            return Err(SchemaViolation::new(
                "metrics.fill_rate",
                format!("{:.6}", fill),
                "within [0, 1]",
            ));
        }

        for cell in &self.inventory {
            if cell.quantity < -1e-6 {
                return Err(SchemaViolation::new(
                    format!(
                        "inventory[{} {} {} {}]",
                        cell.node, cell.product, cell.state, cell.date
                    ),
                    format!("{:.4}", cell.quantity),
                    ">= 0",
                ));
            }
        }

        Ok(())
    }

    /// One-screen human rendering, deterministic.
    pub fn summary(&self) -> String {
        format!(
            "{} | production {:.0} | shipments {} | fill {:.1}% | cost {:.2} \
             (labor {:.2}, transport {:.2}, holding {:.2}, changeover {:.2}, \
             shortage {:.2}, disposal {:.2})",
            self.termination,
            self.total_production,
            self.shipments.len(),
            self.metrics.fill_rate * 100.0,
            self.costs.total,
            self.costs.labor,
            self.costs.transport,
            self.costs.holding,
            self.costs.changeover,
            self.costs.shortage,
            self.costs.disposal,
        )
    }
}

fn within_relative(observed: f64, expected: f64, tolerance: f64) -> bool {
    let scale = expected.abs().max(observed.abs());
    if scale < 1e-9 {
        return true;
    }
    (observed - expected).abs() <= tolerance * scale
}
