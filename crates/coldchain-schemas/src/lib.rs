//! Serializable schema types for plan results and FEFO batch traces.
//!
//! This crate defines the validated, schema-versioned document the planning
//! core hands to external collaborators (dashboards, persistence layers).
//! The document is plain serde data with deterministic ordering; it carries
//! no solver state and is immutable once produced.
//!
//! Cross-field invariants are enforced by [`PlanSolution::validate`], which
//! fails construction-time with a [`SchemaViolation`] naming the field and
//! the observed vs expected values. A violation is always a bug in the
//! producing pipeline, never a recoverable condition.

use coldchain_core::PlanError;
use thiserror::Error;

mod solution;
mod trace;

pub use solution::{
    ConsumptionRecord, CostBreakdown, DisposalRecord, InventoryCell, LaborDayHours, PlanSolution,
    ProductionBatch, QualityMetrics, Shipment, StateTransition, TransitionKind,
};
pub use trace::{
    BatchConsumption, BatchDisposal, BatchEvent, BatchTrace, FefoLedger, ShipmentAllocation,
};

/// Version stamp embedded in every serialized result.
pub const SCHEMA_VERSION: u32 = 1;

/// A cross-field invariant failure in the result document.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("schema violation ({field}): observed {observed}, expected {expected}")]
pub struct SchemaViolation {
    pub field: String,
    pub observed: String,
    pub expected: String,
}

impl SchemaViolation {
    pub fn new(
        field: impl Into<String>,
        observed: impl std::fmt::Display,
        expected: impl std::fmt::Display,
    ) -> Self {
        Self {
            field: field.into(),
            observed: observed.to_string(),
            expected: expected.to_string(),
        }
    }
}

impl From<SchemaViolation> for PlanError {
    fn from(v: SchemaViolation) -> Self {
        PlanError::Schema {
            field: v.field,
            observed: v.observed,
            expected: v.expected,
        }
    }
}
