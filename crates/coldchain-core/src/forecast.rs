//! Demand forecast and initial inventory snapshot, as received from the
//! surrounding tool. Entries carry raw SKU and location strings; the model
//! crate's preprocessor resolves them to canonical ids.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{NodeId, StorageState};

/// One forecast row: demand for a SKU at a node on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub node: NodeId,
    /// Raw SKU identifier; may be an alias of the canonical product SKU.
    pub sku: String,
    pub date: NaiveDate,
    pub quantity: f64,
}

/// One initial-inventory row from the snapshot.
///
/// `location` is a free-form storage code: either a node name or a code
/// mapped through the dataset's location aliases (e.g. "4070" for the frozen
/// buffer). `state` may be omitted and is then inferred from the resolved
/// node's capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub location: String,
    pub sku: String,
    pub state: Option<StorageState>,
    pub quantity: f64,
}
