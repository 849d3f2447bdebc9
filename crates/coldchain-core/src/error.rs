//! Unified error taxonomy for the planning core.
//!
//! Every failure surfaced by the core maps to one of the [`PlanError`]
//! variants. Each variant carries a structured payload (field, entity,
//! observed vs expected) so callers can render a concrete fix; presentation
//! belongs to the surrounding tool. The core never retries and never
//! swallows: anything outside this taxonomy is a programmer bug and panics.

use thiserror::Error;

/// Unified error type for all planning operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Malformed or inconsistent inputs, raised at preprocessing.
    #[error("invalid input ({field}): {message}")]
    Input { field: String, message: String },

    /// The solver returned an unusable state (no incumbent, crashed,
    /// unbounded).
    #[error("solver failure: {message}")]
    Solver { message: String },

    /// The solver proved the model infeasible. Carries the termination
    /// condition and a hint at the usual culprits.
    #[error("model infeasible ({termination}): {hint}")]
    Infeasible { termination: String, hint: String },

    /// The extracted result violates one of its own cross-field invariants.
    /// Fatal: indicates a bug in the formulation or extraction.
    #[error("result schema violation ({field}): observed {observed}, expected {expected}")]
    Schema {
        field: String,
        observed: String,
        expected: String,
    },

    /// FEFO batch allocation failed to reconcile with the aggregate flows.
    /// Fatal: indicates a bug in extraction or a rounding loss.
    #[error("batch allocation failed: {message}")]
    Allocation { message: String },
}

/// Convenience type alias for Results using PlanError.
pub type PlanResult<T> = Result<T, PlanError>;

impl PlanError {
    /// Input-rejection error naming the offending field.
    pub fn input(field: impl Into<String>, message: impl Into<String>) -> Self {
        PlanError::Input {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn solver(message: impl Into<String>) -> Self {
        PlanError::Solver {
            message: message.into(),
        }
    }

    pub fn allocation(message: impl Into<String>) -> Self {
        PlanError::Allocation {
            message: message.into(),
        }
    }

    /// Standard infeasibility report. The hint points at the two mechanisms
    /// that absorb most real-world infeasibilities.
    pub fn infeasible(termination: impl Into<String>) -> Self {
        PlanError::Infeasible {
            termination: termination.into(),
            hint: "inspect shelf-life bands (disposal enabled?) and truck capacities".into(),
        }
    }
}
