//! # coldchain-model: Optimization Core
//!
//! Plans production and distribution for a perishable-goods supply chain
//! over a multi-week horizon: how much to produce per day and SKU, how to
//! route shipments across the hub-and-spoke network under truck capacity,
//! how to manage ambient/frozen/thawed state transitions under distinct
//! shelf lives, and how to satisfy demand at minimum total cost.
//!
//! ## Pipeline
//!
//! ```text
//! PlanningInput
//!   └─ prep ──────── alias resolution, state inference, fail-fast checks
//!   └─ index ─────── sparse enumeration of every variable family
//!   └─ builder ───── decision variables + constraint rows (scaled)
//!   └─ objective ─── linear cost expression (scaled coefficients)
//!   └─ solver ────── MipSolver trait; HiGHS backend
//!   └─ extract ───── unscale, populate validated PlanSolution
//!   └─ fefo ──────── expand aggregate flows into batch-level traces
//! ```
//!
//! The entry point is [`solve_plan`]; everything in between is exposed for
//! testing and for callers that want to intercept the pipeline.
//!
//! ## Shelf-life formulation
//!
//! No age-cohort variables exist. For every (node, product, state, date) the
//! model requires end-of-day inventory to be covered by inflows within the
//! trailing shelf-life window, which implicitly bounds the age of every unit
//! on hand. Aged initial inventory whose window has closed can therefore not
//! remain in stock and must exit through the zero-cost disposal channel; the
//! FEFO pass afterwards reconstructs exact per-batch ages outside the MIP.
//!
//! ## Scaling
//!
//! All flow variables are divided by a single scale factor (default 1000)
//! and cost coefficients multiplied by it, keeping the constraint matrix
//! well-conditioned without changing any decision. Integer variables (mix
//! counts, pallet counts, binaries) are never scaled.

pub mod builder;
pub mod extract;
pub mod fefo;
pub mod index;
pub mod model;
pub mod objective;
pub mod planner;
pub mod prep;
pub mod scale;
pub mod solver;

pub use builder::{build_model, PlanVariables};
pub use extract::extract_solution;
pub use fefo::allocate_batches;
pub use index::PlanIndex;
pub use model::{LinExpr, ModelSpec, RowSense, RowSpec, VarId, VarSpec};
pub use planner::{solve_plan, PlanOutcome};
pub use prep::{preprocess, PreparedInput};
pub use scale::ScaleFactor;
pub use solver::{HighsSolver, MipSolver, SolveConfig, SolveOutcome, TerminationCondition};
