//! Solver adapter seam.
//!
//! The formulation is solver-agnostic; this module owns the only boundary
//! where a concrete solver appears. Backends implement [`MipSolver`] over
//! the abstract [`ModelSpec`](crate::model::ModelSpec) and classify their
//! termination into [`TerminationCondition`]. An infeasible or unbounded
//! model is an error, never a silent zero plan; a time-limit stop with a
//! loaded incumbent is returned and the caller decides whether it suffices.

mod highs;

pub use self::highs::HighsSolver;

use coldchain_core::constants::DEFAULT_SCALE_FACTOR;
use coldchain_core::PlanResult;

use crate::model::{ModelSpec, VarId};

/// Solve parameters.
#[derive(Debug, Clone)]
pub struct SolveConfig {
    /// Wall-clock budget handed to the solver.
    pub time_limit_seconds: f64,
    /// Relative MIP optimality gap tolerance.
    pub mip_gap: f64,
    /// Forward solver log output.
    pub verbose: bool,
    /// Coefficient scale factor (flows divided, costs multiplied).
    pub scale_factor: f64,
    /// Integer pallet variables for storage and trucks; when false the model
    /// uses continuous pallet counts and reports fractional pallet costs.
    pub integer_pallets: bool,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: 300.0, // 5 minutes
            mip_gap: 0.01,             // 1% gap
            verbose: false,
            scale_factor: DEFAULT_SCALE_FACTOR,
            integer_pallets: true,
        }
    }
}

/// Classification of how the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCondition {
    /// Proven optimal within the gap tolerance.
    Optimal,
    /// A feasible incumbent without an optimality proof.
    Feasible,
    /// Proven infeasible (surfaced through an error, with this label).
    Infeasible,
    /// Time limit hit with an incumbent loaded.
    TimeLimitReached,
    /// Proven unbounded (surfaced through an error, with this label).
    Unbounded,
}

impl std::fmt::Display for TerminationCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationCondition::Optimal => "optimal",
            TerminationCondition::Feasible => "feasible",
            TerminationCondition::Infeasible => "infeasible",
            TerminationCondition::TimeLimitReached => "time_limit_reached",
            TerminationCondition::Unbounded => "unbounded",
        };
        write!(f, "{}", s)
    }
}

/// Result of a successful solve: an incumbent and its classification.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub termination: TerminationCondition,
    /// Objective value of the incumbent, in plan currency (the scaled
    /// formulation keeps cost unchanged).
    pub objective_value: f64,
    /// One value per model variable, in solver (scaled) units.
    pub values: Vec<f64>,
    /// Relative gap when proven (0.0 at optimality; None when the backend
    /// does not report one).
    pub mip_gap: Option<f64>,
    /// Wall-clock solve time in seconds.
    pub solve_seconds: f64,
}

impl SolveOutcome {
    #[inline]
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }
}

/// A MIP backend. One implementation per solver library; the adapter owns
/// marshalling both the model and the termination classification.
pub trait MipSolver {
    /// Backend identifier, e.g. "highs".
    fn id(&self) -> &str;

    fn solve(&self, model: &ModelSpec, config: &SolveConfig) -> PlanResult<SolveOutcome>;
}
