//! Batch-level FEFO trace types.
//!
//! The allocator expands the aggregate plan into batches with stable ids and
//! chronological event logs. Batches never point at each other; provenance
//! is an id reference, so splits simply create new records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use coldchain_core::{BatchId, NodeId, ProductId, RouteId, StorageState};

/// One event in a batch's life, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    Production {
        date: NaiveDate,
        quantity: f64,
    },
    Departure {
        date: NaiveDate,
        route: RouteId,
        destination: NodeId,
        quantity: f64,
    },
    Arrival {
        date: NaiveDate,
        node: NodeId,
        /// True when the goods changed state at the dock (frozen -> thawed).
        state_change: bool,
    },
    Thaw {
        date: NaiveDate,
        quantity: f64,
    },
    Freeze {
        date: NaiveDate,
        quantity: f64,
    },
    Consumption {
        date: NaiveDate,
        quantity: f64,
    },
    Disposal {
        date: NaiveDate,
        quantity: f64,
    },
}

/// A batch record at the end of the allocation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchTrace {
    pub id: BatchId,
    pub origin_node: NodeId,
    pub product: ProductId,
    /// Quantity the batch was created with (manufactured, seeded, or split).
    pub manufactured_quantity: f64,
    /// Quantity still attached to this record after all events.
    pub remaining_quantity: f64,
    pub production_date: NaiveDate,
    pub state: StorageState,
    /// Date the batch entered its current state; the shelf-life clock.
    pub state_entry_date: NaiveDate,
    pub location: NodeId,
    /// Batch this one was split or transitioned from, if any.
    pub provenance: Option<BatchId>,
    pub events: Vec<BatchEvent>,
}

/// Links a source batch to an aggregate shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentAllocation {
    /// Index into the solution's shipment list.
    pub shipment_index: usize,
    pub batch: BatchId,
    pub quantity: f64,
}

/// A batch-level consumption record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConsumption {
    pub batch: BatchId,
    pub node: NodeId,
    pub product: ProductId,
    pub state: StorageState,
    pub date: NaiveDate,
    pub quantity: f64,
}

/// A batch-level disposal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDisposal {
    pub batch: BatchId,
    pub node: NodeId,
    pub product: ProductId,
    pub state: StorageState,
    pub date: NaiveDate,
    pub quantity: f64,
}

/// Everything the FEFO pass produced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FefoLedger {
    pub batches: Vec<BatchTrace>,
    pub allocations: Vec<ShipmentAllocation>,
    pub consumptions: Vec<BatchConsumption>,
    pub disposals: Vec<BatchDisposal>,
}
